//! Shared tree-sitter plumbing used by every per-language extractor:
//! position conversion, safe string slicing, recursion-depth guards, and
//! the "most recent doc comment carries forward" bookkeeping from spec
//! §4.3 and §9.

use tree_sitter::Node;

use crate::model::{Position, Span};

/// Maximum AST recursion depth before a subtree is skipped rather than
/// risking a stack overflow on pathological input.
pub const MAX_AST_DEPTH: usize = 500;

#[inline]
pub fn check_recursion_depth(depth: usize) -> bool {
    if depth > MAX_AST_DEPTH {
        if crate::config::is_global_debug_enabled() {
            eprintln!("WARNING: max AST depth ({MAX_AST_DEPTH}) exceeded, skipping subtree");
        }
        return false;
    }
    true
}

pub fn position_at(point: tree_sitter::Point, byte_offset: usize) -> Position {
    Position::new(point.row as u32 + 1, point.column as u32 + 1, byte_offset)
}

pub fn span_of(node: &Node) -> Span {
    Span::new(
        position_at(node.start_position(), node.start_byte()),
        position_at(node.end_position(), node.end_byte()),
    )
}

pub fn text_of<'a>(node: &Node, source: &'a str) -> &'a str {
    source.get(node.byte_range()).unwrap_or("")
}

/// The 1-indexed line containing a byte offset, without re-parsing.
pub fn line_at(source: &str, byte_offset: usize) -> u32 {
    source[..byte_offset.min(source.len())]
        .bytes()
        .filter(|&b| b == b'\n')
        .count() as u32
        + 1
}

pub fn trimmed_line_text(source: &str, line_1indexed: u32) -> String {
    source
        .lines()
        .nth(line_1indexed.saturating_sub(1) as usize)
        .unwrap_or("")
        .trim()
        .to_string()
}

/// Safely truncate at a UTF-8 character boundary (avoids panics on
/// multi-byte characters split mid-codepoint).
pub fn safe_truncate_str(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut boundary = max_bytes;
    while boundary > 0 && !s.is_char_boundary(boundary) {
        boundary -= 1;
    }
    &s[..boundary]
}

/// Strip a language's comment delimiters, keeping only the prose.
pub fn strip_comment_delimiters(raw: &str, line_prefixes: &[&str], block: Option<(&str, &str)>) -> String {
    let trimmed = raw.trim();
    if let Some((open, close)) = block {
        if let Some(body) = trimmed.strip_prefix(open).and_then(|s| s.strip_suffix(close)) {
            return body
                .lines()
                .map(|l| l.trim().trim_start_matches('*').trim())
                .collect::<Vec<_>>()
                .join("\n")
                .trim()
                .to_string();
        }
    }
    trimmed
        .lines()
        .map(|line| {
            let mut line = line.trim();
            for prefix in line_prefixes {
                if let Some(stripped) = line.strip_prefix(prefix) {
                    line = stripped.trim_start();
                    break;
                }
            }
            line
        })
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// Tracks the most recent doc comment seen while walking a sibling list,
/// per spec §4.3: "skip comment nodes but remember the most recent
/// doc-style comment; associate it with the next symbol. Reset on any
/// non-comment, non-symbol node." Per spec §9 this intentionally carries
/// forward across blank lines rather than resetting on them.
#[derive(Default)]
pub struct DocCarry {
    pending: Option<String>,
}

impl DocCarry {
    pub fn new() -> Self {
        Self { pending: None }
    }

    pub fn see_comment(&mut self, text: String) {
        self.pending = Some(text);
    }

    pub fn reset(&mut self) {
        self.pending = None;
    }

    /// Consume the pending doc comment, if any, for the symbol about to be
    /// emitted.
    pub fn take(&mut self) -> Option<String> {
        self.pending.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn safe_truncate_respects_multibyte_boundary() {
        let text = "Status: \u{1F50D} Active";
        let truncated = safe_truncate_str(text, 10);
        assert!(truncated.len() <= 10);
        assert!(text.starts_with(truncated));
    }

    #[test]
    fn doc_carry_resets_explicitly() {
        let mut carry = DocCarry::new();
        carry.see_comment("hello".into());
        carry.reset();
        assert_eq!(carry.take(), None);
    }

    #[test]
    fn doc_carry_yields_once() {
        let mut carry = DocCarry::new();
        carry.see_comment("docs".into());
        assert_eq!(carry.take(), Some("docs".to_string()));
        assert_eq!(carry.take(), None);
    }

    #[test]
    fn strip_line_comment_delimiters() {
        let stripped = strip_comment_delimiters("/// Greets the caller.", &["///", "//"], None);
        assert_eq!(stripped, "Greets the caller.");
    }

    #[test]
    fn strip_block_comment_delimiters() {
        let stripped =
            strip_comment_delimiters("/**\n * Greets the caller.\n */", &[], Some(("/**", "*/")));
        assert_eq!(stripped, "Greets the caller.");
    }
}
