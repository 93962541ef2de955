//! Regex pre-tokenization.
//!
//! Text is cut into pre-tokens with the GPT-2 split pattern. Merges never
//! cross a pre-token boundary.

use ahash::{AHashMap, AHashSet};
use compact_str::CompactString;
use fancy_regex::Regex;
use std::sync::OnceLock;

/// The GPT-2 pre-tokenization pattern.
///
/// Contractions, optionally space-prefixed letter runs, digit runs and
/// punctuation runs, then whitespace. The `(?!\S)` lookahead leaves the last
/// space of a run for the following word.
pub const GPT2_PATTERN: &str =
    r"'(?:[sdmt]|ll|ve|re)| ?\p{L}+| ?\p{N}+| ?[^\s\p{L}\p{N}]+|\s+(?!\S)|\s+";

fn gpt2_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(GPT2_PATTERN).expect("Invalid regex pattern"))
}

/// Split text into pre-tokens, in order of appearance.
///
/// A regex runtime error (backtrack limit) ends the scan early.
pub fn pre_tokenize(text: &str) -> Vec<&str> {
    let mut chunks = Vec::new();
    for mat in gpt2_regex().find_iter(text) {
        match mat {
            Ok(m) => chunks.push(m.as_str()),
            Err(err) => {
                tracing::warn!(%err, "pre-tokenization stopped early");
                break;
            }
        }
    }
    chunks
}

/// Count occurrences of each distinct pre-token.
pub fn count_pre_tokens<S: AsRef<str>>(chunks: &[S]) -> AHashMap<CompactString, u64> {
    let mut counts: AHashMap<CompactString, u64> = AHashMap::with_capacity(chunks.len());
    for chunk in chunks {
        *counts.entry(CompactString::new(chunk.as_ref())).or_default() += 1;
    }
    counts
}

/// Distinct pre-tokens in first-occurrence order.
pub fn distinct_in_order<S: AsRef<str>>(chunks: &[S]) -> Vec<CompactString> {
    let mut seen = AHashSet::with_capacity(chunks.len());
    chunks
        .iter()
        .map(|c| c.as_ref())
        .filter(|c| seen.insert(*c))
        .map(CompactString::new)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_words_keep_leading_space() {
        assert_eq!(
            pre_tokenize("low low lower"),
            vec!["low", " low", " lower"]
        );
    }

    #[test]
    fn test_contractions_and_punctuation() {
        assert_eq!(
            pre_tokenize("it's 42, ok!"),
            vec!["it", "'s", " 42", ",", " ok", "!"]
        );
    }

    #[test]
    fn test_whitespace_runs() {
        // The last space of a run attaches to the next word
        assert_eq!(pre_tokenize("a   b"), vec!["a", "  ", " b"]);
        assert_eq!(pre_tokenize("end  "), vec!["end", "  "]);
        assert_eq!(pre_tokenize("x\ny"), vec!["x", "\n", "y"]);
    }

    #[test]
    fn test_empty_string() {
        assert!(pre_tokenize("").is_empty());
    }

    #[test]
    fn test_unicode_letters() {
        assert_eq!(pre_tokenize("café naïve"), vec!["café", " naïve"]);
    }

    #[test]
    fn test_count_pre_tokens() {
        let chunks = pre_tokenize("low low low lower");
        let counts = count_pre_tokens(&chunks);
        assert_eq!(counts.get("low"), Some(&1));
        assert_eq!(counts.get(" low"), Some(&2));
        assert_eq!(counts.get(" lower"), Some(&1));

        assert_eq!(
            distinct_in_order(&chunks),
            vec!["low", " low", " lower"]
        );
    }
}
