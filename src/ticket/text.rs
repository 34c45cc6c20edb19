//! Plain-text helpers for submitted messages
//!
//! Submissions arrive with `<br>` line breaks and the occasional stray tag;
//! table previews and CSV cells want plain text.

use regex::Regex;
use std::sync::OnceLock;

fn line_break_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)<br\s*/?>").expect("valid regex"))
}

fn tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<[^>]+>").expect("valid regex"))
}

/// Turn `<br>` into newlines, drop every other tag, trim
pub fn strip_tags(html: &str) -> String {
    let text = line_break_re().replace_all(html, "\n");
    tag_re().replace_all(&text, "").trim().to_string()
}

/// Collapse every whitespace run (newlines included) into one space
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Keep at most `max` characters
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_tags() {
        assert_eq!(strip_tags("Hello<br>world"), "Hello\nworld");
        assert_eq!(strip_tags("a<BR />b<br/>c"), "a\nb\nc");
        assert_eq!(strip_tags("  <b>bold</b> text  "), "bold text");
        assert_eq!(strip_tags(""), "");
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("a \n\n b\t c"), "a b c");
        assert_eq!(collapse_whitespace("   "), "");
    }

    #[test]
    fn test_truncate_chars_is_char_safe() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(truncate_chars("abc", 3), "abc");
    }
}
