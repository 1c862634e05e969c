/// Text helpers: HTML escaping and word counting.
use std::fmt;

/// Escapes `& < > " '` for safe inclusion in markup.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            _ => out.push(c),
        }
    }
    out
}

/// Word and character totals for a piece of text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WordCount {
    /// Whitespace-separated, non-empty tokens.
    pub words: usize,
    /// Unicode scalar values, whitespace included.
    pub characters: usize,
}

impl WordCount {
    pub fn of(text: &str) -> Self {
        Self {
            words: text.split_whitespace().count(),
            characters: text.chars().count(),
        }
    }
}

impl fmt::Display for WordCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Words: {} | Characters: {}", self.words, self.characters)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<a href="x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#039;Jerry&#039;&lt;/a&gt;"
        );
        assert_eq!(escape_html("plain"), "plain");
    }

    #[test]
    fn test_word_count() {
        let wc = WordCount::of("  Hello   world\n\tagain ");
        assert_eq!(wc.words, 3);
        assert_eq!(wc.characters, 23);
        assert_eq!(WordCount::of(""), WordCount::default());
    }

    #[test]
    fn test_word_count_unicode_characters() {
        let wc = WordCount::of("héllo 世界");
        assert_eq!(wc.words, 2);
        assert_eq!(wc.characters, 8);
    }

    #[test]
    fn test_word_count_display() {
        assert_eq!(
            WordCount::of("a b").to_string(),
            "Words: 2 | Characters: 3"
        );
    }
}
