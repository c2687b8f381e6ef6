//! Character-level text cleanup.

/// Keep only letters, digits, spaces, commas and periods.
///
/// Letters and digits include non-ASCII ones. The function is idempotent.
pub fn remove_punctuation(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | ',' | '.'))
        .collect()
}

/// Replace every whitespace run with a single space.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remove_punctuation_example() {
        assert_eq!(remove_punctuation("Hello, World! 123."), "Hello, World 123.");
    }

    #[test]
    fn test_remove_punctuation_keeps_allowed_set() {
        assert_eq!(
            remove_punctuation("Café — naïve; (x+y)=z? 3.5, ok"),
            "Café  naïve xyz 3.5, ok"
        );
        assert_eq!(remove_punctuation("line\nbreak\ttab"), "linebreaktab");
        assert_eq!(remove_punctuation("@#$%^&*"), "");
    }

    #[test]
    fn test_remove_punctuation_idempotent() {
        let samples = [
            "Hello, World! 123.",
            "It's a \"pooled\" investment vehicle...",
            "Ünïcödé: 東京 2024/06/25 <b>bold</b>",
            "",
        ];
        for s in samples {
            let once = remove_punctuation(s);
            assert_eq!(remove_punctuation(&once), once);
            assert!(once
                .chars()
                .all(|c| c.is_alphanumeric() || c == ' ' || c == ',' || c == '.'));
        }
    }

    #[test]
    fn test_normalize_whitespace() {
        assert_eq!(normalize_whitespace("  a\n\nb\t c  "), "a b c");
    }
}
