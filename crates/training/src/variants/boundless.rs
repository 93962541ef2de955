//! Boundless-BPE: let frequent word sequences become single tokens.
//!
//! Besides ordinary pair merges, two adjacent pre-tokens that are each a
//! single token can be joined by a supermerge into one composite pre-token.
//! A supermerge wins a round only when it is strictly more frequent than the
//! best ordinary pair.

use crate::training::{Corpus, MergePolicy, Trainer, TrainingConfig, MIN_MERGE_FREQUENCY};
use bpelab_core::{MergeCandidate, MergeKind, Result, Vocabulary};
use compact_str::CompactString;

#[derive(Debug, Clone, Copy, Default)]
pub struct BoundlessPolicy;

impl MergePolicy for BoundlessPolicy {
    fn supermerge(&self, corpus: &Corpus, vocab: &Vocabulary) -> Option<MergeCandidate> {
        corpus
            .count_supermerges()
            .into_iter()
            .filter(|(pair, count)| {
                *count >= MIN_MERGE_FREQUENCY && !vocab.contains(&pair.merged())
            })
            .map(|(pair, count)| MergeCandidate::new(pair, count))
            .max()
    }
}

/// BPE with cross-pre-token supermerges.
pub type BoundlessBpe = Trainer<BoundlessPolicy>;

/// A composite pre-token and the two pre-tokens it joined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Superword {
    pub composite: CompactString,
    pub left: CompactString,
    pub right: CompactString,
    pub step: usize,
}

impl Trainer<BoundlessPolicy> {
    pub fn new(text: &str, max_merges: usize) -> Self {
        Self::with_config(text, TrainingConfig::with_max_merges(max_merges))
    }

    pub fn with_config(text: &str, config: TrainingConfig) -> Self {
        Self::with_policy(text, config, BoundlessPolicy)
    }

    /// The pre-token sequence after `step` merges.
    pub fn sequence_at_step(&self, step: usize) -> Result<Vec<CompactString>> {
        Ok(self.state_at_step(step)?.sequence())
    }

    /// Every composite created by a supermerge, in merge order.
    pub fn superwords(&self) -> Vec<Superword> {
        self.merges()
            .iter()
            .filter_map(|record| match &record.kind {
                MergeKind::Supermerge {
                    left_pre_token,
                    right_pre_token,
                } => Some(Superword {
                    composite: record.merged.clone(),
                    left: left_pre_token.clone(),
                    right: right_pre_token.clone(),
                    step: record.step,
                }),
                MergeKind::Pair => None,
            })
            .collect()
    }
}
