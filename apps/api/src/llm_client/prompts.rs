// Shared prompt fragments and prompt-building utilities.
// Each feature that needs LLM calls defines its own prompts.rs alongside it.

/// Appended to every prompt that expects a JSON reply.
pub const JSON_ONLY_INSTRUCTION: &str = "\
    Respond with a single valid JSON object only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences.";

/// Returns at most `max_chars` characters of `text`, never splitting a character.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}
