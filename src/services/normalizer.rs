use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Which characters count as word characters when cleaning text
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum WordCharset {
    /// `[A-Za-z0-9_]` only; accented letters are stripped
    #[default]
    Ascii,
    /// Unicode letters, marks, digits and connector punctuation
    Unicode,
}

fn ascii_strip() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^A-Za-z0-9_\s]").expect("valid ascii strip pattern"))
}

fn unicode_strip() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^\w\s]").expect("valid unicode strip pattern"))
}

fn space_runs() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r" +").expect("valid space pattern"))
}

/// Clean OCR output: drop non-word, non-whitespace characters, collapse
/// runs of spaces (newlines are kept) and trim.
///
/// `normalize(normalize(x)) == normalize(x)` for every input.
pub fn normalize(text: &str, charset: WordCharset) -> String {
    let strip = match charset {
        WordCharset::Ascii => ascii_strip(),
        WordCharset::Unicode => unicode_strip(),
    };
    let stripped = strip.replace_all(text, "");

    space_runs().replace_all(&stripped, " ").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_punctuation_and_accents() {
        assert_eq!(
            normalize("Hé!!  llo\n\nWorld  ", WordCharset::Ascii),
            "H llo\n\nWorld"
        );
    }

    #[test]
    fn test_unicode_keeps_accents() {
        assert_eq!(
            normalize("Hé!!  llo\n\nWorld  ", WordCharset::Unicode),
            "Hé llo\n\nWorld"
        );
        assert_eq!(normalize("Straße, café.", WordCharset::Unicode), "Straße café");
    }

    #[test]
    fn test_collapses_spaces_not_newlines() {
        assert_eq!(
            normalize("a    b\n\n\nc   d", WordCharset::Ascii),
            "a b\n\n\nc d"
        );
    }

    #[test]
    fn test_keeps_tabs_and_underscores() {
        assert_eq!(normalize("snake_case\tcol2", WordCharset::Ascii), "snake_case\tcol2");
    }

    #[test]
    fn test_trims_all_whitespace() {
        assert_eq!(normalize("\n\t  Total: $42.00  \n", WordCharset::Ascii), "Total 4200");
    }

    #[test]
    fn test_empty_and_symbol_only() {
        assert_eq!(normalize("", WordCharset::Ascii), "");
        assert_eq!(normalize("!@#$%^&*()", WordCharset::Ascii), "");
        assert_eq!(normalize("  -- ** --  ", WordCharset::Unicode), "");
    }

    #[test]
    fn test_idempotent() {
        let samples = [
            "Hé!!  llo\n\nWorld  ",
            "  Invoice #123 :: due 2024-01-01 \n  Amount   $5 ",
            "日本語 テキスト!!",
            "\u{00a0}nbsp\u{00a0} spaces ",
            "tabs\t\t and  spaces \n \n",
            "",
        ];

        for charset in [WordCharset::Ascii, WordCharset::Unicode] {
            for sample in samples {
                let once = normalize(sample, charset);
                let twice = normalize(&once, charset);
                assert_eq!(once, twice, "not idempotent for {:?} ({:?})", sample, charset);
            }
        }
    }

    #[test]
    fn test_ascii_output_charset() {
        let out = normalize("Ünïcödé ✓ 123 ok_go\nnext", WordCharset::Ascii);
        assert!(out
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c.is_whitespace()));
        assert_eq!(out, "ncd 123 ok_go\nnext");
    }
}
