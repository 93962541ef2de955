//! Per-round statistics handed to merge policies.

use super::corpus::Corpus;
use ahash::AHashMap;
use bpelab_core::{MergeCandidate, Pair, Vocabulary};
use compact_str::CompactString;

/// Frequencies of one training round, taken before the merge is applied.
#[derive(Debug, Clone, Default)]
pub struct RoundStats {
    /// Pair -> weighted frequency
    pub pair_counts: AHashMap<Pair, u64>,
    /// Token -> weighted frequency
    pub token_counts: AHashMap<CompactString, u64>,
    /// Highest pair frequency of the round
    pub max_pair_count: u64,
}

impl RoundStats {
    /// Collect statistics over the current segmentation.
    pub fn collect(corpus: &Corpus) -> Self {
        let pair_counts = corpus.count_pairs();
        let token_counts = corpus.token_counts();
        let max_pair_count = pair_counts.values().copied().max().unwrap_or(0);
        Self {
            pair_counts,
            token_counts,
            max_pair_count,
        }
    }

    /// Frequency of a token, 0 if absent.
    #[inline]
    pub fn token_count(&self, token: &str) -> u64 {
        self.token_counts.get(token).copied().unwrap_or(0)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pair_counts.is_empty()
    }
}

/// Everything a policy may inspect once a merge has been applied.
pub struct AppliedMerge<'a> {
    /// 1-based step of the merge
    pub step: usize,
    /// The winning candidate
    pub candidate: &'a MergeCandidate,
    /// The next eligible candidate in rank order
    pub runner_up: Option<&'a MergeCandidate>,
    /// Statistics from before the merge
    pub stats: &'a RoundStats,
    /// Corpus after the merge
    pub corpus: &'a Corpus,
    /// Vocabulary including the merged token
    pub vocab: &'a Vocabulary,
}

impl AppliedMerge<'_> {
    /// The merged token.
    pub fn merged(&self) -> CompactString {
        self.candidate.pair.merged()
    }
}
