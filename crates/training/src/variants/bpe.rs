//! Standard BPE: merge the most frequent adjacent pair.

use crate::training::{MergePolicy, Trainer, TrainingConfig};

/// Frequency-only policy. Every hook keeps its default.
#[derive(Debug, Clone, Copy, Default)]
pub struct BpePolicy;

impl MergePolicy for BpePolicy {}

/// Standard byte-pair encoding over characters.
pub type Bpe = Trainer<BpePolicy>;

impl Trainer<BpePolicy> {
    /// Train on `text` with up to `max_merges` merges.
    pub fn new(text: &str, max_merges: usize) -> Self {
        Self::with_config(text, TrainingConfig::with_max_merges(max_merges))
    }

    pub fn with_config(text: &str, config: TrainingConfig) -> Self {
        Self::with_policy(text, config, BpePolicy)
    }
}
