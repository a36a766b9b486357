use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A single diary entry scraped from the forum.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    /// Numeric id from the container's `postid_<n>` attribute, `0` when missing.
    pub id: i64,
    /// Publication time as shown on the page. `None` when the date could not be
    /// parsed; such posts are still delivered and sort before dated ones.
    pub post_date: Option<NaiveDateTime>,
    /// Deep link to the post, empty when the page offered none.
    pub url: String,
    pub author: String,
    pub content: String,
    pub preview: String,
}

impl fmt::Display for Post {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} {}: {}", self.id, self.author, self.preview)
    }
}

/// Cut `text` to `max_chars` codepoints and append `...`.
///
/// Text with fewer than `max_chars` codepoints is returned unchanged. Cutting
/// happens on `char` boundaries, so multi-byte characters are never split.
#[must_use]
pub fn truncate(text: &str, max_chars: usize) -> String {
    if max_chars == 0 {
        return String::new();
    }

    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => format!("{}...", &text[..byte_idx]),
        // Exactly `max_chars` codepoints still gets the ellipsis.
        None if text.chars().count() == max_chars => format!("{text}..."),
        None => text.to_string(),
    }
}

/// First `max_words` whitespace-separated words of `text`, joined by single spaces.
///
/// Appends `...` when words were dropped.
#[must_use]
pub fn word_preview(text: &str, max_words: usize) -> String {
    let mut words = text.split_whitespace();
    let preview = words
        .by_ref()
        .take(max_words)
        .collect::<Vec<_>>()
        .join(" ");

    if words.next().is_some() {
        format!("{preview}...")
    } else {
        preview
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_short_text_unchanged() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("", 10), "");
    }

    #[test]
    fn test_truncate_multibyte() {
        assert_eq!(truncate("héllo", 3), "hél...");
        assert_eq!(truncate("Привет, мир", 6), "Привет...");
    }

    #[test]
    fn test_truncate_exact_length_gets_ellipsis() {
        assert_eq!(truncate("abc", 3), "abc...");
    }

    #[test]
    fn test_truncate_zero() {
        assert_eq!(truncate("anything", 0), "");
    }

    #[test]
    fn test_truncate_bound() {
        let text = "日本語のテキストはとても長いです";
        for max in 1..20 {
            let result = truncate(text, max);
            assert!(result.chars().count() <= max + 3);
            // Slicing on a non-boundary would have panicked; check the prefix too.
            assert!(text.starts_with(result.trim_end_matches("...")));
        }
    }

    #[test]
    fn test_word_preview() {
        assert_eq!(word_preview("one two three four", 2), "one two...");
        assert_eq!(word_preview("  one\n two  ", 5), "one two");
        assert_eq!(word_preview("", 3), "");
    }

    #[test]
    fn test_display() {
        let post = Post {
            id: 7,
            author: "Alice".to_string(),
            preview: "Hi...".to_string(),
            ..Post::default()
        };
        assert_eq!(post.to_string(), "#7 Alice: Hi...");
    }
}
