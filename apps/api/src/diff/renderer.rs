//! Diff Renderer: turns aligner output into tagged word diffs, annotated opcodes,
//! and a side-by-side view (structured rows plus an HTML table).

use serde::{Deserialize, Serialize};

use crate::diff::aligner::{align, DiffSummary, OpTag, Opcode};

pub const NO_DIFFERENCES_MESSAGE: &str = "No differences found";

/// Marker style used when tagging changed tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Markup {
    /// `[del]word[/del]` / `[ins]word[/ins]`, tokens emitted verbatim.
    Brackets,
    /// `<del>word</del>` / `<ins>word</ins>`, tokens HTML-escaped.
    Html,
}

impl Markup {
    fn plain(self, token: &str) -> String {
        match self {
            Markup::Brackets => token.to_string(),
            Markup::Html => escape_html(token),
        }
    }

    fn deleted(self, token: &str) -> String {
        match self {
            Markup::Brackets => format!("[del]{token}[/del]"),
            Markup::Html => format!("<del>{}</del>", escape_html(token)),
        }
    }

    fn inserted(self, token: &str) -> String {
        match self {
            Markup::Brackets => format!("[ins]{token}[/ins]"),
            Markup::Html => format!("<ins>{}</ins>", escape_html(token)),
        }
    }
}

/// Word-level diff of one line pair: deletions marked on the original,
/// insertions marked on the revised.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordDiff {
    pub original: String,
    pub revised: String,
}

/// An opcode annotated with the text it covers on each side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpcodeView {
    pub tag: OpTag,
    pub original_start: usize,
    pub original_end: usize,
    pub revised_start: usize,
    pub revised_end: usize,
    pub original_text_snippet: String,
    pub revised_text_snippet: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowKind {
    Unchanged,
    Changed,
    Deleted,
    Inserted,
}

/// One row of the side-by-side view. Line numbers are 1-based; `None` on the side
/// that has no line for this row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedRow {
    pub kind: RowKind,
    pub original_line: Option<usize>,
    pub revised_line: Option<usize>,
    pub original: String,
    pub revised: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderedView {
    pub has_differences: bool,
    pub message: Option<String>,
    pub rows: Vec<RenderedRow>,
    pub html: String,
}

/// Tags a line pair with bracket markers.
pub fn tag_word_diff(original: &str, revised: &str) -> WordDiff {
    tag_word_diff_with(original, revised, Markup::Brackets)
}

/// Tokenizes both lines on whitespace, aligns the tokens, and marks every token
/// outside an `equal` opcode on the side it belongs to.
pub fn tag_word_diff_with(original: &str, revised: &str, markup: Markup) -> WordDiff {
    let left: Vec<&str> = original.split_whitespace().collect();
    let right: Vec<&str> = revised.split_whitespace().collect();
    let summary = align(&left, &right);

    let mut tagged_left = Vec::with_capacity(left.len());
    let mut tagged_right = Vec::with_capacity(right.len());

    for opcode in &summary.opcodes {
        let left_tokens = &left[opcode.original_range()];
        let right_tokens = &right[opcode.revised_range()];
        if opcode.tag == OpTag::Equal {
            tagged_left.extend(left_tokens.iter().map(|t| markup.plain(t)));
            tagged_right.extend(right_tokens.iter().map(|t| markup.plain(t)));
        } else {
            tagged_left.extend(left_tokens.iter().map(|t| markup.deleted(t)));
            tagged_right.extend(right_tokens.iter().map(|t| markup.inserted(t)));
        }
    }

    WordDiff {
        original: tagged_left.join(" "),
        revised: tagged_right.join(" "),
    }
}

/// Attaches the covered text to each opcode. Lines of a multi-line range are joined with `\n`.
pub fn annotate_opcodes<S: AsRef<str>>(
    summary: &DiffSummary,
    original: &[S],
    revised: &[S],
) -> Vec<OpcodeView> {
    summary
        .opcodes
        .iter()
        .map(|opcode| OpcodeView {
            tag: opcode.tag,
            original_start: opcode.original_start,
            original_end: opcode.original_end,
            revised_start: opcode.revised_start,
            revised_end: opcode.revised_end,
            original_text_snippet: join_lines(&original[opcode.original_range()]),
            revised_text_snippet: join_lines(&revised[opcode.revised_range()]),
        })
        .collect()
}

/// Builds the side-by-side view for two documents from their line-level summary.
///
/// Lines inside a `replace` opcode are paired index-wise and word-diffed; surplus lines
/// on the longer side become deleted or inserted rows.
pub fn render_view<S: AsRef<str>>(
    summary: &DiffSummary,
    original: &[S],
    revised: &[S],
) -> RenderedView {
    let mut rows = Vec::new();
    for opcode in &summary.opcodes {
        push_rows(&mut rows, opcode, original, revised);
    }

    let has_differences = summary.has_differences();
    let html = render_html(&rows, original, revised);

    RenderedView {
        has_differences,
        message: (!has_differences).then(|| NO_DIFFERENCES_MESSAGE.to_string()),
        rows,
        html,
    }
}

fn push_rows<S: AsRef<str>>(
    rows: &mut Vec<RenderedRow>,
    opcode: &Opcode,
    original: &[S],
    revised: &[S],
) {
    match opcode.tag {
        OpTag::Equal => {
            for (i, j) in opcode.original_range().zip(opcode.revised_range()) {
                rows.push(RenderedRow {
                    kind: RowKind::Unchanged,
                    original_line: Some(i + 1),
                    revised_line: Some(j + 1),
                    original: original[i].as_ref().to_string(),
                    revised: revised[j].as_ref().to_string(),
                });
            }
        }
        OpTag::Delete => {
            rows.extend(opcode.original_range().map(|i| deleted_row(i, original)));
        }
        OpTag::Insert => {
            rows.extend(opcode.revised_range().map(|j| inserted_row(j, revised)));
        }
        OpTag::Replace => {
            let paired = opcode
                .original_range()
                .len()
                .min(opcode.revised_range().len());
            for offset in 0..paired {
                let (i, j) = (opcode.original_start + offset, opcode.revised_start + offset);
                let words = tag_word_diff(original[i].as_ref(), revised[j].as_ref());
                rows.push(RenderedRow {
                    kind: RowKind::Changed,
                    original_line: Some(i + 1),
                    revised_line: Some(j + 1),
                    original: words.original,
                    revised: words.revised,
                });
            }
            rows.extend(
                (opcode.original_start + paired..opcode.original_end)
                    .map(|i| deleted_row(i, original)),
            );
            rows.extend(
                (opcode.revised_start + paired..opcode.revised_end)
                    .map(|j| inserted_row(j, revised)),
            );
        }
    }
}

fn deleted_row<S: AsRef<str>>(i: usize, original: &[S]) -> RenderedRow {
    RenderedRow {
        kind: RowKind::Deleted,
        original_line: Some(i + 1),
        revised_line: None,
        original: Markup::Brackets.deleted(original[i].as_ref()),
        revised: String::new(),
    }
}

fn inserted_row<S: AsRef<str>>(j: usize, revised: &[S]) -> RenderedRow {
    RenderedRow {
        kind: RowKind::Inserted,
        original_line: None,
        revised_line: Some(j + 1),
        original: String::new(),
        revised: Markup::Brackets.inserted(revised[j].as_ref()),
    }
}

/// HTML table with one `<tr>` per row. Cell text is re-derived from the source lines
/// so the output carries `<del>`/`<ins>` markup and escaped content.
fn render_html<S: AsRef<str>>(rows: &[RenderedRow], original: &[S], revised: &[S]) -> String {
    if rows.is_empty() {
        return format!("<p class=\"diff-empty\">{NO_DIFFERENCES_MESSAGE}</p>");
    }

    let mut html = String::from("<table class=\"diff\">\n");
    for row in rows {
        let (left, right) = match row.kind {
            RowKind::Changed => {
                let words = tag_word_diff_with(
                    line_at(original, row.original_line),
                    line_at(revised, row.revised_line),
                    Markup::Html,
                );
                (words.original, words.revised)
            }
            RowKind::Unchanged => (
                escape_html(line_at(original, row.original_line)),
                escape_html(line_at(revised, row.revised_line)),
            ),
            RowKind::Deleted => (
                Markup::Html.deleted(line_at(original, row.original_line)),
                String::new(),
            ),
            RowKind::Inserted => (
                String::new(),
                Markup::Html.inserted(line_at(revised, row.revised_line)),
            ),
        };
        html.push_str(&format!(
            "<tr class=\"{}\"><td class=\"lineno\">{}</td><td>{}</td><td class=\"lineno\">{}</td><td>{}</td></tr>\n",
            row_class(row.kind),
            line_label(row.original_line),
            left,
            line_label(row.revised_line),
            right,
        ));
    }
    html.push_str("</table>");
    html
}

fn line_at<S: AsRef<str>>(lines: &[S], line: Option<usize>) -> &str {
    line.and_then(|n| lines.get(n - 1))
        .map(|s| s.as_ref())
        .unwrap_or("")
}

fn line_label(line: Option<usize>) -> String {
    line.map(|n| n.to_string()).unwrap_or_default()
}

fn row_class(kind: RowKind) -> &'static str {
    match kind {
        RowKind::Unchanged => "unchanged",
        RowKind::Changed => "changed",
        RowKind::Deleted => "deleted",
        RowKind::Inserted => "inserted",
    }
}

fn join_lines<S: AsRef<str>>(lines: &[S]) -> String {
    lines
        .iter()
        .map(|l| l.as_ref())
        .collect::<Vec<_>>()
        .join("\n")
}

fn escape_html(text: &str) -> String {
    quick_xml::escape::escape(text).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inserted_word_is_marked_on_revised_only() {
        let words = tag_word_diff("The quick fox", "The quick brown fox");
        assert_eq!(words.original, "The quick fox");
        assert_eq!(words.revised, "The quick [ins]brown[/ins] fox");
    }

    #[test]
    fn test_replaced_words_are_marked_on_both_sides() {
        let words = tag_word_diff("I has a cat", "I have a cat");
        assert_eq!(words.original, "I [del]has[/del] a cat");
        assert_eq!(words.revised, "I [ins]have[/ins] a cat");
    }

    #[test]
    fn test_each_token_is_wrapped_individually() {
        let words = tag_word_diff("keep old words", "keep");
        assert_eq!(words.original, "keep [del]old[/del] [del]words[/del]");
        assert_eq!(words.revised, "keep");
    }

    #[test]
    fn test_html_markup_escapes_tokens() {
        let words = tag_word_diff_with("a <b>", "a <i>", Markup::Html);
        assert_eq!(words.original, "a <del>&lt;b&gt;</del>");
        assert_eq!(words.revised, "a <ins>&lt;i&gt;</ins>");
    }

    #[test]
    fn test_annotated_opcodes_carry_snippets() {
        let original = vec!["The cat sat.", "It was happy."];
        let revised = vec!["The cat sat.", "It was very happy.", "The end."];
        let summary = align(&original, &revised);
        let views = annotate_opcodes(&summary, &original, &revised);

        assert_eq!(views.len(), 2);
        assert_eq!(views[0].tag, OpTag::Equal);
        assert_eq!(views[0].original_text_snippet, "The cat sat.");
        assert_eq!(views[1].tag, OpTag::Replace);
        assert_eq!(views[1].original_text_snippet, "It was happy.");
        assert_eq!(views[1].revised_text_snippet, "It was very happy.\nThe end.");
    }

    #[test]
    fn test_one_sided_opcodes_have_empty_snippet_on_missing_side() {
        let original: Vec<&str> = vec![];
        let revised = vec!["new line"];
        let summary = align(&original, &revised);
        let views = annotate_opcodes(&summary, &original, &revised);
        assert_eq!(views[0].tag, OpTag::Insert);
        assert_eq!(views[0].original_text_snippet, "");
        assert_eq!(views[0].revised_text_snippet, "new line");
    }

    #[test]
    fn test_replace_rows_pair_lines_and_spill_surplus_as_inserts() {
        let original = vec!["The cat sat.", "It was happy."];
        let revised = vec!["The cat sat.", "It was very happy.", "The end."];
        let summary = align(&original, &revised);
        let view = render_view(&summary, &original, &revised);

        assert!(view.has_differences);
        assert!(view.message.is_none());
        let kinds: Vec<RowKind> = view.rows.iter().map(|r| r.kind).collect();
        assert_eq!(
            kinds,
            vec![RowKind::Unchanged, RowKind::Changed, RowKind::Inserted]
        );
        assert_eq!(view.rows[1].revised, "It was [ins]very[/ins] happy.");
        assert_eq!(view.rows[2].revised_line, Some(3));
        assert_eq!(view.rows[2].original_line, None);
        assert_eq!(view.rows[2].revised, "[ins]The end.[/ins]");
    }

    #[test]
    fn test_deleted_lines_render_on_original_side() {
        let original = vec!["keep", "drop"];
        let revised = vec!["keep"];
        let summary = align(&original, &revised);
        let view = render_view(&summary, &original, &revised);
        assert_eq!(view.rows[1].kind, RowKind::Deleted);
        assert_eq!(view.rows[1].original, "[del]drop[/del]");
        assert!(view.html.contains("<del>drop</del>"));
    }

    #[test]
    fn test_empty_documents_report_no_differences() {
        let empty: Vec<String> = vec![];
        let summary = align(&empty, &empty);
        let view = render_view(&summary, &empty, &empty);
        assert!(!view.has_differences);
        assert_eq!(view.message.as_deref(), Some(NO_DIFFERENCES_MESSAGE));
        assert!(view.rows.is_empty());
        assert!(view.html.contains(NO_DIFFERENCES_MESSAGE));
    }

    #[test]
    fn test_identical_documents_report_no_differences() {
        let lines = vec!["same", "text"];
        let summary = align(&lines, &lines);
        let view = render_view(&summary, &lines, &lines);
        assert!(!view.has_differences);
        assert_eq!(view.rows.len(), 2);
        assert!(view.rows.iter().all(|r| r.kind == RowKind::Unchanged));
    }

    #[test]
    fn test_html_escapes_unchanged_text() {
        let original = vec!["a < b & c"];
        let summary = align(&original, &original);
        let view = render_view(&summary, &original, &original);
        assert!(view.html.contains("a &lt; b &amp; c"));
        assert!(view.html.starts_with("<table class=\"diff\">"));
    }
}
