//! Canonical text cleaning.

use std::sync::LazyLock;

use regex::Regex;

static NON_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\s]").unwrap());
static DIGIT_RUNS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").unwrap());
static WHITESPACE_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Lowercasing, punctuation- and digit-stripping normalizer.
///
/// Performs, in order:
/// - Unicode lowercasing
/// - replaces every character that is neither a word character nor whitespace with a space
/// - replaces digit runs with a space
/// - collapses whitespace runs into one space and trims both ends
///
/// The output contains only non-digit word characters separated by single
/// spaces, so `clean(clean(s)) == clean(s)`.
///
/// ```
/// use commflow::preprocess::TextNormalizer;
///
/// let normalizer = TextNormalizer::new();
/// assert_eq!(normalizer.clean("  Order #42 -- SHIPPED!  "), "order shipped");
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct TextNormalizer;

impl TextNormalizer {
    pub fn new() -> Self {
        Self
    }

    /// Clean `text`. Empty input yields an empty string.
    pub fn clean(&self, text: &str) -> String {
        if text.is_empty() {
            return String::new();
        }

        let lowered = text.to_lowercase();
        let no_punct = NON_WORD.replace_all(&lowered, " ");
        let no_digits = DIGIT_RUNS.replace_all(&no_punct, " ");
        WHITESPACE_RUNS
            .replace_all(&no_digits, " ")
            .trim()
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clean(text: &str) -> String {
        TextNormalizer::new().clean(text)
    }

    #[test]
    fn empty_input_yields_empty_string() {
        assert_eq!(clean(""), "");
    }

    #[test]
    fn lowercases_and_strips_punctuation() {
        assert_eq!(clean("Hello, World!"), "hello world");
    }

    #[test]
    fn punctuation_between_words_becomes_a_separator() {
        assert_eq!(clean("e-mail/fax"), "e mail fax");
    }

    #[test]
    fn strips_digit_runs() {
        assert_eq!(clean("Invoice 2024 due in 30 days"), "invoice due in days");
        assert_eq!(clean("abc123def"), "abc def");
    }

    #[test]
    fn collapses_whitespace() {
        assert_eq!(clean("  lots \t of\n\n   space  "), "lots of space");
    }

    #[test]
    fn keeps_underscores_and_non_ascii_letters() {
        assert_eq!(clean("Café_Menu ÜBER"), "café_menu über");
    }

    #[test]
    fn pure_punctuation_cleans_to_empty() {
        assert_eq!(clean("?!... --- ###"), "");
    }

    #[test]
    fn cleaning_is_idempotent() {
        let samples = [
            "",
            "   ",
            "Hello, World!",
            "Meeting at 10:30am w/ Dr. Smith (ACME Corp.) — $1,200",
            "İstanbul ÆØÅ ß ẞ ǅ",
            "snake_case__and   CamelCase!!",
            "١٢٣ arabic digits ٤٥٦ and ５ fullwidth",
            "emoji 🎉 party 🎉",
            "tab\tnew\nline\r\nend",
        ];
        for sample in samples {
            let once = clean(sample);
            assert_eq!(clean(&once), once, "not idempotent for {sample:?}");
        }
    }
}
