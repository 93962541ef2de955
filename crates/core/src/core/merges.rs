//! Merge primitives for step-replayable BPE.
//!
//! Pairs and merge records are keyed by token strings rather than ids so the
//! log can be displayed and replayed without a vocabulary lookup.

use crate::core::priority::Score;
use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::iter;

/// Separator used in the composite key of a pair.
pub const PAIR_KEY_SEPARATOR: char = '|';

/// An ordered pair of adjacent tokens.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pair {
    /// Left token
    pub left: CompactString,
    /// Right token
    pub right: CompactString,
}

impl Pair {
    /// Create a new pair.
    pub fn new(left: impl Into<CompactString>, right: impl Into<CompactString>) -> Self {
        Self {
            left: left.into(),
            right: right.into(),
        }
    }

    /// The token created by merging this pair.
    pub fn merged(&self) -> CompactString {
        let mut merged = self.left.clone();
        merged.push_str(&self.right);
        merged
    }

    /// Combined length of both tokens, in chars.
    #[inline]
    pub fn char_len(&self) -> usize {
        self.left.chars().count() + self.right.chars().count()
    }

    /// The composite key, `left|right`.
    pub fn key(&self) -> String {
        format!("{}{}{}", self.left, PAIR_KEY_SEPARATOR, self.right)
    }

    /// Compare the composite keys of two pairs by code point, without allocating.
    pub fn cmp_key(&self, other: &Self) -> Ordering {
        self.key_chars().cmp(other.key_chars())
    }

    fn key_chars(&self) -> impl Iterator<Item = char> + '_ {
        self.left
            .chars()
            .chain(iter::once(PAIR_KEY_SEPARATOR))
            .chain(self.right.chars())
    }
}

impl fmt::Display for Pair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} + {}", self.left, self.right)
    }
}

/// Apply a single merge to a token sequence.
///
/// One greedy left-to-right pass: every non-overlapping occurrence of
/// `(left, right)` becomes `merged`. The output is not re-scanned.
pub fn apply_merge<S: AsRef<str>>(
    tokens: &[S],
    left: &str,
    right: &str,
    merged: &str,
) -> Vec<CompactString> {
    let mut result = Vec::with_capacity(tokens.len());
    let mut i = 0;

    while i < tokens.len() {
        if i + 1 < tokens.len() && tokens[i].as_ref() == left && tokens[i + 1].as_ref() == right {
            result.push(CompactString::new(merged));
            i += 2;
        } else {
            result.push(CompactString::new(tokens[i].as_ref()));
            i += 1;
        }
    }

    result
}

/// How a merge was performed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MergeKind {
    /// An ordinary merge of two adjacent tokens inside a pre-token.
    Pair,
    /// Two adjacent single-token pre-tokens joined into a composite pre-token.
    Supermerge {
        left_pre_token: CompactString,
        right_pre_token: CompactString,
    },
}

/// A component token judged to be a scaffold after a merge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScaffoldMark {
    /// The component token
    pub token: CompactString,
    /// Its standalone frequency after the merge
    pub remaining: u64,
    /// Frequency of the runner-up candidate
    pub threshold: u64,
    /// The runner-up pair, if any
    pub runner_up: Option<Pair>,
}

/// Variant-specific metadata recorded with each merge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "variant", rename_all = "snake_case")]
pub enum MergeDetail {
    #[default]
    Plain,
    WordPiece {
        /// `freq(pair) / (freq(left) * freq(right))`
        score: f64,
    },
    Scaffold {
        /// Frequency of the runner-up pair
        threshold: u64,
        /// Scaffolds marked by this merge
        marked: Vec<ScaffoldMark>,
    },
    AttentionGuided {
        alpha: f64,
        hybrid_score: f64,
        frequency_score: f64,
        attention_score: f64,
    },
    Morph {
        morpheme_preserving: bool,
    },
}

/// One entry of the merge log.
///
/// The ordered log is the trained model: every intermediate state can be
/// rebuilt by replaying records onto the initial segmentation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergeRecord {
    /// 1-based step number
    pub step: usize,
    /// Pair merge or supermerge
    pub kind: MergeKind,
    /// The merged pair
    pub pair: Pair,
    /// The resulting token
    pub merged: CompactString,
    /// Frequency of the pair when it was selected
    pub count: u64,
    /// Ranking score when it was selected
    pub score: Score,
    /// Variant metadata
    pub detail: MergeDetail,
}

impl MergeRecord {
    /// Whether this record joins two pre-tokens.
    #[inline]
    pub fn is_supermerge(&self) -> bool {
        matches!(self.kind, MergeKind::Supermerge { .. })
    }
}

impl fmt::Display for MergeRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = if self.is_supermerge() { '⊕' } else { '+' };
        write!(
            f,
            "#{} {} {} {} -> {} ({})",
            self.step, self.pair.left, op, self.pair.right, self.merged, self.count
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toks(s: &[&str]) -> Vec<CompactString> {
        s.iter().map(|t| CompactString::new(t)).collect()
    }

    #[test]
    fn test_apply_merge() {
        let tokens = ["l", "o", "w", "e", "r"];
        assert_eq!(
            apply_merge(&tokens, "l", "o", "lo"),
            toks(&["lo", "w", "e", "r"])
        );
    }

    #[test]
    fn test_apply_merge_is_single_pass() {
        // "aaa" merges once at the front, the trailing "a" is not re-paired
        let tokens = ["a", "a", "a"];
        assert_eq!(apply_merge(&tokens, "a", "a", "aa"), toks(&["aa", "a"]));

        let tokens = ["a", "a", "a", "a"];
        assert_eq!(apply_merge(&tokens, "a", "a", "aa"), toks(&["aa", "aa"]));
    }

    #[test]
    fn test_apply_merge_no_match() {
        let tokens = ["x", "y"];
        assert_eq!(apply_merge(&tokens, "y", "x", "yx"), toks(&["x", "y"]));
        assert!(apply_merge::<&str>(&[], "a", "b", "ab").is_empty());
    }

    #[test]
    fn test_pair_key_order() {
        let ow = Pair::new("o", "w");
        let lo = Pair::new("l", "o");
        assert_eq!(ow.cmp_key(&lo), Ordering::Greater);
        assert_eq!(ow.key(), "o|w");

        // The separator takes part in the comparison
        let a = Pair::new("ab", "c");
        let b = Pair::new("a", "bc");
        assert_eq!(a.cmp_key(&b), a.key().cmp(&b.key()));
    }

    #[test]
    fn test_pair_merged_and_len() {
        let pair = Pair::new(" l", "ow");
        assert_eq!(pair.merged(), " low");
        assert_eq!(pair.char_len(), 4);
        assert_eq!(pair.to_string(), " l + ow");
    }
}
