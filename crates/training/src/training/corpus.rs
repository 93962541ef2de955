//! Corpus state for step-replayable training.
//!
//! A corpus holds every distinct pre-token with its occurrence count and its
//! current segmentation, plus the left-to-right pre-token sequence. Pair and
//! token frequencies are always weighted by pre-token count.

use ahash::AHashMap;
use bpelab_core::{apply_merge, count_pre_tokens, distinct_in_order, MergeKind, MergeRecord, Pair};
use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// A distinct pre-token and its current segmentation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    /// The pre-token string
    pub pre_token: CompactString,
    /// Number of occurrences in the text
    pub count: u64,
    /// Current tokens, concatenating back to `pre_token`
    pub tokens: Vec<CompactString>,
}

impl Segment {
    /// Tokens contributed to the whole text by this pre-token.
    #[inline]
    pub fn weighted_len(&self) -> u64 {
        self.tokens.len() as u64 * self.count
    }
}

/// Segmentation of every live pre-token, in first-occurrence order.
pub type Segmentation = Vec<Segment>;

/// Total number of tokens in a segmentation.
pub fn total_tokens(segmentation: &[Segment]) -> u64 {
    segmentation.iter().map(Segment::weighted_len).sum()
}

/// Mutable training state.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    /// Distinct pre-tokens in first-occurrence order
    segments: Vec<Segment>,
    /// Pre-token string -> position in `segments`
    index: AHashMap<CompactString, usize>,
    /// Pre-token sequence as positions in `segments`
    sequence: Vec<usize>,
}

impl Corpus {
    /// Build a corpus from pre-token chunks.
    ///
    /// `seed` gives the initial segmentation of each distinct pre-token and
    /// is called once per distinct pre-token, in first-occurrence order.
    pub fn build<S, F>(chunks: &[S], mut seed: F) -> Self
    where
        S: AsRef<str>,
        F: FnMut(&str) -> Vec<CompactString>,
    {
        let counts = count_pre_tokens(chunks);
        let distinct = distinct_in_order(chunks);

        let mut segments = Vec::with_capacity(distinct.len());
        let mut index = AHashMap::with_capacity(distinct.len());
        for pre_token in distinct {
            let count = counts.get(&pre_token).copied().unwrap_or_default();
            let tokens = seed(pre_token.as_str());
            index.insert(pre_token.clone(), segments.len());
            segments.push(Segment {
                pre_token,
                count,
                tokens,
            });
        }

        let sequence = chunks
            .iter()
            .filter_map(|c| index.get(c.as_ref()).copied())
            .collect();

        Self {
            segments,
            index,
            sequence,
        }
    }

    /// All segments, including pre-tokens fully absorbed by supermerges.
    #[inline]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Segments that still occur in the text.
    pub fn live(&self) -> impl Iterator<Item = &Segment> + '_ {
        self.segments.iter().filter(|s| s.count > 0)
    }

    /// Snapshot of the live segments.
    pub fn segmentation(&self) -> Segmentation {
        self.live().cloned().collect()
    }

    /// Look up a pre-token.
    pub fn segment(&self, pre_token: &str) -> Option<&Segment> {
        self.index.get(pre_token).map(|&i| &self.segments[i])
    }

    /// The pre-token sequence, in text order.
    pub fn sequence(&self) -> Vec<CompactString> {
        self.sequence
            .iter()
            .map(|&i| self.segments[i].pre_token.clone())
            .collect()
    }

    /// Total token count: sum of `len(tokens) * count`.
    pub fn token_count(&self) -> u64 {
        self.live().map(Segment::weighted_len).sum()
    }

    /// Weighted frequency of every adjacent pair.
    pub fn count_pairs(&self) -> AHashMap<Pair, u64> {
        let mut pair_counts: AHashMap<Pair, u64> = AHashMap::new();

        for segment in self.live() {
            for window in segment.tokens.windows(2) {
                let pair = Pair::new(window[0].clone(), window[1].clone());
                *pair_counts.entry(pair).or_insert(0) += segment.count;
            }
        }

        pair_counts
    }

    /// Weighted frequency of every token.
    pub fn token_counts(&self) -> AHashMap<CompactString, u64> {
        let mut token_counts: AHashMap<CompactString, u64> = AHashMap::new();

        for segment in self.live() {
            for token in &segment.tokens {
                *token_counts.entry(token.clone()).or_insert(0) += segment.count;
            }
        }

        token_counts
    }

    /// Weighted frequency of a single token.
    pub fn token_frequency(&self, token: &str) -> u64 {
        self.live()
            .map(|s| s.tokens.iter().filter(|t| t.as_str() == token).count() as u64 * s.count)
            .sum()
    }

    /// Merge a pair in every pre-token.
    pub fn apply_merge(&mut self, pair: &Pair, merged: &str) {
        for segment in &mut self.segments {
            if segment.tokens.len() > 1 {
                segment.tokens = apply_merge(&segment.tokens, &pair.left, &pair.right, merged);
            }
        }
    }

    /// Count adjacent pre-token pairs eligible for a supermerge.
    ///
    /// Both pre-tokens must currently be a single token. Occurrences are
    /// counted greedily left to right without overlap, matching
    /// [`Corpus::supermerge`].
    pub fn count_supermerges(&self) -> AHashMap<Pair, u64> {
        let mut counts: AHashMap<(usize, usize), u64> = AHashMap::new();
        let mut last_start: AHashMap<(usize, usize), usize> = AHashMap::new();

        for (i, window) in self.sequence.windows(2).enumerate() {
            let (a, b) = (window[0], window[1]);
            if self.segments[a].tokens.len() != 1 || self.segments[b].tokens.len() != 1 {
                continue;
            }
            if let Some(&prev) = last_start.get(&(a, b)) {
                if prev + 1 == i {
                    continue;
                }
            }
            last_start.insert((a, b), i);
            *counts.entry((a, b)).or_insert(0) += 1;
        }

        counts
            .into_iter()
            .map(|((a, b), n)| {
                let pair = Pair::new(
                    self.segments[a].pre_token.clone(),
                    self.segments[b].pre_token.clone(),
                );
                (pair, n)
            })
            .collect()
    }

    /// Join adjacent occurrences of two pre-tokens into one composite.
    ///
    /// Returns the number of adjacencies replaced. The composite's count
    /// grows by that number and each component's count drops by it.
    pub fn supermerge(&mut self, left: &str, right: &str, merged: &str) -> u64 {
        let (Some(&a), Some(&b)) = (self.index.get(left), self.index.get(right)) else {
            return 0;
        };

        let composite = match self.index.get(merged) {
            Some(&c) => c,
            None => {
                let c = self.segments.len();
                let pre_token = CompactString::new(merged);
                self.index.insert(pre_token.clone(), c);
                self.segments.push(Segment {
                    pre_token: pre_token.clone(),
                    count: 0,
                    tokens: vec![pre_token],
                });
                c
            }
        };

        let mut sequence = Vec::with_capacity(self.sequence.len());
        let mut replaced = 0u64;
        let mut i = 0;
        while i < self.sequence.len() {
            if i + 1 < self.sequence.len() && self.sequence[i] == a && self.sequence[i + 1] == b {
                sequence.push(composite);
                replaced += 1;
                i += 2;
            } else {
                sequence.push(self.sequence[i]);
                i += 1;
            }
        }
        self.sequence = sequence;

        self.segments[composite].count += replaced;
        self.segments[a].count = self.segments[a].count.saturating_sub(replaced);
        self.segments[b].count = self.segments[b].count.saturating_sub(replaced);

        replaced
    }

    /// Re-apply a logged merge.
    pub fn replay(&mut self, record: &MergeRecord) {
        match &record.kind {
            MergeKind::Pair => self.apply_merge(&record.pair, &record.merged),
            MergeKind::Supermerge {
                left_pre_token,
                right_pre_token,
            } => {
                self.supermerge(left_pre_token, right_pre_token, &record.merged);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::training::policy::char_tokens;
    use bpelab_core::pre_tokenize;

    fn corpus(text: &str) -> Corpus {
        Corpus::build(&pre_tokenize(text), char_tokens)
    }

    #[test]
    fn test_build_keeps_first_occurrence_order() {
        let corpus = corpus("low low low lower lowest");
        let pre_tokens: Vec<&str> = corpus.live().map(|s| s.pre_token.as_str()).collect();
        assert_eq!(pre_tokens, vec!["low", " low", " lower", " lowest"]);
        assert_eq!(corpus.segment(" low").map(|s| s.count), Some(2));
        assert_eq!(corpus.sequence().len(), 5);
        assert_eq!(corpus.token_count(), 24);
    }

    #[test]
    fn test_count_pairs() {
        let corpus = corpus("low low low lower lowest");
        let pairs = corpus.count_pairs();
        assert_eq!(pairs.get(&Pair::new("o", "w")), Some(&5));
        assert_eq!(pairs.get(&Pair::new("l", "o")), Some(&5));
        assert_eq!(pairs.get(&Pair::new(" ", "l")), Some(&4));
        assert_eq!(pairs.get(&Pair::new("e", "r")), Some(&1));

        let tokens = corpus.token_counts();
        assert_eq!(tokens.get("w"), Some(&5));
        assert_eq!(corpus.token_frequency(" "), 4);
    }

    #[test]
    fn test_apply_merge() {
        let mut corpus = corpus("low low low lower lowest");
        corpus.apply_merge(&Pair::new("o", "w"), "ow");
        assert_eq!(corpus.token_count(), 19);
        assert_eq!(corpus.segment("low").unwrap().tokens, vec!["l", "ow"]);
        assert_eq!(corpus.token_frequency("ow"), 5);
        assert_eq!(corpus.token_frequency("o"), 0);
    }

    #[test]
    fn test_supermerge() {
        let mut corpus = Corpus::build(&[" of", " the", " cat", " of", " the"], |pt| {
            vec![CompactString::new(pt)]
        });

        let counts = corpus.count_supermerges();
        assert_eq!(counts.get(&Pair::new(" of", " the")), Some(&2));
        assert_eq!(counts.get(&Pair::new(" the", " cat")), Some(&1));

        assert_eq!(corpus.supermerge(" of", " the", " of the"), 2);
        assert_eq!(corpus.sequence(), vec![" of the", " cat", " of the"]);
        assert_eq!(corpus.segment(" of").map(|s| s.count), Some(0));
        assert_eq!(corpus.segment(" of the").map(|s| s.count), Some(2));
        assert_eq!(corpus.token_count(), 3);
        // Absorbed pre-tokens are not live
        assert_eq!(corpus.segmentation().len(), 2);
    }

    #[test]
    fn test_supermerge_counts_do_not_overlap() {
        let corpus = Corpus::build(&["a", "a", "a"], |pt| vec![CompactString::new(pt)]);
        assert_eq!(corpus.count_supermerges().get(&Pair::new("a", "a")), Some(&1));

        let corpus = Corpus::build(&["a", "a", "a", "a"], |pt| vec![CompactString::new(pt)]);
        assert_eq!(corpus.count_supermerges().get(&Pair::new("a", "a")), Some(&2));
    }

    #[test]
    fn test_supermerge_requires_single_tokens() {
        let corpus = corpus(" of the");
        assert!(corpus.count_supermerges().is_empty());
    }
}
