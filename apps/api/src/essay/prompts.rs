// Essay analysis LLM prompt templates.
// All prompts for the essay module are defined here.

/// Max essay characters sent with a correction prompt.
pub const CORRECTION_TEXT_LIMIT: usize = 5000;
/// Max essay characters sent with a grammar prompt.
pub const GRAMMAR_TEXT_LIMIT: usize = 2000;

pub const CORRECTION_PROMPT_TEMPLATE: &str = r#"You are an expert writing assistant specializing in {essay_type}s.
Analyze the following essay and provide corrections with tracked changes:
1. Use <del>text</del> for text that should be deleted
2. Use <ins>text</ins> for text that should be added
3. Focus on grammar, style, clarity, and {essay_type_lower} specific improvements
4. Maintain the original meaning and structure
5. Provide specific suggestions for improvement

Return a valid JSON object:
{
  "essay_type": "{essay_type}",
  "essay_score": "numerical score out of 100",
  "corrected_essay": "Essay text with <del> and <ins> tags for tracked changes",
  "suggestions": ["specific suggestion 1", "specific suggestion 2", "specific suggestion 3"]
}

{json_only}

Essay to analyze:
"""
{essay_text}
""""#;

pub const GRAMMAR_PROMPT_TEMPLATE: &str = r#"Analyze the following essay for grammar and style issues.
Provide an overall score out of 100 and specific suggestions for improvement in JSON format:
{
  "overall_score": "score out of 100",
  "suggestions": ["suggestion 1", "suggestion 2"]
}

{json_only}

Essay text:
{essay_text}"#;
