// Comparison LLM prompt templates.
// Replies are plain prose; nothing here asks for JSON.

use crate::llm_client::prompts::truncate_chars;

/// Max characters of each draft sent with a characteristics prompt.
pub const SUMMARY_TEXT_LIMIT: usize = 4000;
/// Max characters of each draft sent with the key-differences prompt.
pub const DIFFERENCES_TEXT_LIMIT: usize = 2000;

const SUMMARY_PROMPT_TEMPLATE: &str = r#"Analyze the characteristics of Draft {draft_number} below and provide a brief summary of its tone, style, structure, and main ideas in 2-3 sentences.

{essay_text}"#;

const DIFFERENCES_PROMPT_TEMPLATE: &str = r#"Compare these two essay drafts and identify the key differences in tone, structure, ideas, and writing style.
Provide 3-5 bullet points highlighting the main differences.

Draft 1:
{first_text}

Draft 2:
{second_text}"#;

pub fn build_summary_prompt(draft_number: u8, essay_text: &str) -> String {
    SUMMARY_PROMPT_TEMPLATE
        .replace("{draft_number}", &draft_number.to_string())
        .replace("{essay_text}", truncate_chars(essay_text, SUMMARY_TEXT_LIMIT))
}

pub fn build_differences_prompt(first_text: &str, second_text: &str) -> String {
    DIFFERENCES_PROMPT_TEMPLATE
        .replace("{first_text}", truncate_chars(first_text, DIFFERENCES_TEXT_LIMIT))
        .replace("{second_text}", truncate_chars(second_text, DIFFERENCES_TEXT_LIMIT))
}
