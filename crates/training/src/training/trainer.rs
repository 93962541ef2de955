//! Step-replayable BPE trainer.
//!
//! The trainer computes the whole merge log eagerly at construction. Every
//! query then rebuilds the requested state by replaying the first `k`
//! records onto a clone of the initial segmentation, so no intermediate
//! snapshot is ever stored.

use super::corpus::{Corpus, Segmentation};
use super::policy::{char_token, MergePolicy};
use super::round::{AppliedMerge, RoundStats};
use bpelab_core::{
    pre_tokenize, sort_pairs, MergeCandidate, MergeKind, MergeRecord, NormalizationForm,
    Normalizer, Pair, PairPriorityQueue, Result, TokenizerError, VocabEntry, VocabSource,
    Vocabulary,
};
use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Pairs seen fewer times than this are never merged.
pub const MIN_MERGE_FREQUENCY: u64 = 2;

/// Default number of merges to compute.
pub const DEFAULT_MAX_MERGES: usize = 10;

/// Configuration shared by every variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Upper bound on the number of merges
    pub max_merges: usize,
    /// Unicode normalization applied before pre-tokenization
    pub normalization: NormalizationForm,
}

impl TrainingConfig {
    /// Default configuration with a different merge budget.
    pub fn with_max_merges(max_merges: usize) -> Self {
        Self {
            max_merges,
            ..Default::default()
        }
    }
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            max_merges: DEFAULT_MAX_MERGES,
            normalization: NormalizationForm::None,
        }
    }
}

/// The winner of one training round.
enum Selection {
    Pair {
        candidate: MergeCandidate,
        runner_up: Option<MergeCandidate>,
    },
    Supermerge(MergeCandidate),
}

/// Generic merge-loop driver, parameterized by a [`MergePolicy`].
#[derive(Debug, Clone)]
pub struct Trainer<P: MergePolicy> {
    /// Input text as given
    text: String,
    /// Configuration
    config: TrainingConfig,
    /// Variant behaviour
    policy: P,
    /// Segmentation before the first merge
    initial: Corpus,
    /// Vocabulary entries present before the first merge, in index order
    seeds: Vec<(CompactString, VocabSource)>,
    /// Final vocabulary
    vocab: Vocabulary,
    /// The merge log
    merges: Vec<MergeRecord>,
}

impl<P: MergePolicy> Trainer<P> {
    /// Build an engine and compute its full merge log.
    pub fn with_policy(text: &str, config: TrainingConfig, mut policy: P) -> Self {
        let normalized = Normalizer::new(config.normalization).normalize(text);
        let chunks = pre_tokenize(&normalized);
        let initial = Corpus::build(&chunks, |pt| policy.seed(pt));

        let mut seeds = base_entries(&initial, &policy);
        let mut vocab = Vocabulary::with_capacity(seeds.len() + config.max_merges);
        for (token, _) in &seeds {
            vocab.add_token(token);
        }
        for (token, source) in policy.extra_seeds(&vocab) {
            if vocab.insert_new(&token).is_some() {
                seeds.push((token, source));
            }
        }

        tracing::debug!(
            pre_tokens = initial.segments().len(),
            seeds = seeds.len(),
            tokens = initial.token_count(),
            "Corpus prepared"
        );

        let mut trainer = Self {
            text: text.to_string(),
            config,
            policy,
            initial,
            seeds,
            vocab,
            merges: Vec::new(),
        };
        trainer.train();
        trainer
    }

    /// Main training loop.
    fn train(&mut self) {
        tracing::info!(max_merges = self.config.max_merges, "Starting BPE training");

        let mut corpus = self.initial.clone();

        while self.merges.len() < self.config.max_merges {
            let step = self.merges.len() + 1;
            let stats = RoundStats::collect(&corpus);

            let Some(selection) = self.select(&corpus, &stats) else {
                break;
            };

            let record = match selection {
                Selection::Pair {
                    candidate,
                    runner_up,
                } => {
                    let merged = candidate.pair.merged();
                    self.vocab.add_token(&merged);
                    corpus.apply_merge(&candidate.pair, &merged);

                    let detail = self.policy.on_merge_applied(&AppliedMerge {
                        step,
                        candidate: &candidate,
                        runner_up: runner_up.as_ref(),
                        stats: &stats,
                        corpus: &corpus,
                        vocab: &self.vocab,
                    });

                    MergeRecord {
                        step,
                        kind: MergeKind::Pair,
                        merged,
                        count: candidate.count,
                        score: candidate.score,
                        pair: candidate.pair,
                        detail,
                    }
                }
                Selection::Supermerge(candidate) => {
                    let merged = candidate.pair.merged();
                    self.vocab.add_token(&merged);
                    corpus.supermerge(&candidate.pair.left, &candidate.pair.right, &merged);

                    let detail = self.policy.on_merge_applied(&AppliedMerge {
                        step,
                        candidate: &candidate,
                        runner_up: None,
                        stats: &stats,
                        corpus: &corpus,
                        vocab: &self.vocab,
                    });

                    MergeRecord {
                        step,
                        kind: MergeKind::Supermerge {
                            left_pre_token: candidate.pair.left.clone(),
                            right_pre_token: candidate.pair.right.clone(),
                        },
                        merged,
                        count: candidate.count,
                        score: candidate.score,
                        pair: candidate.pair,
                        detail,
                    }
                }
            };

            tracing::debug!(step, merge = %record, "Merged");
            self.merges.push(record);
        }

        tracing::info!(
            merges = self.merges.len(),
            tokens = corpus.token_count(),
            "Finished training"
        );
    }

    /// Pick the winner of a round, or `None` when training should stop.
    fn select(&self, corpus: &Corpus, stats: &RoundStats) -> Option<Selection> {
        let mut queue: PairPriorityQueue = stats
            .pair_counts
            .iter()
            .map(|(pair, &count)| {
                let score = self.policy.score(pair, count, stats);
                MergeCandidate::with_score(pair.clone(), count, score)
            })
            .collect();

        let accept = |candidate: &MergeCandidate| {
            let merged = candidate.pair.merged();
            !self.vocab.contains(&merged) && self.policy.is_eligible(&candidate.pair, &merged)
        };
        let best = queue.pop_matching(&accept);
        let runner_up = queue.pop_matching(&accept);

        if let Some(candidate) = self.policy.supermerge(corpus, &self.vocab) {
            let beats_pair = best.as_ref().map_or(true, |b| candidate.count > b.count);
            if candidate.count >= MIN_MERGE_FREQUENCY && beats_pair {
                return Some(Selection::Supermerge(candidate));
            }
        }

        match best {
            Some(candidate) if candidate.count >= MIN_MERGE_FREQUENCY => Some(Selection::Pair {
                candidate,
                runner_up,
            }),
            Some(candidate) => {
                tracing::trace!(
                    pair = %candidate.pair,
                    count = candidate.count,
                    "Stopping: best pair below minimum frequency"
                );
                None
            }
            None => {
                tracing::trace!("Stopping: no eligible pair left");
                None
            }
        }
    }

    /// Replay the first `step` merges onto the initial segmentation.
    pub fn state_at_step(&self, step: usize) -> Result<Corpus> {
        TokenizerError::check_step(step, self.merges.len())?;
        let mut corpus = self.initial.clone();
        for record in &self.merges[..step] {
            corpus.replay(record);
        }
        Ok(corpus)
    }

    /// Segmentation of every live pre-token after `step` merges.
    pub fn tokens_at_step(&self, step: usize) -> Result<Segmentation> {
        Ok(self.state_at_step(step)?.segmentation())
    }

    /// Segmentation before the given 1-based merge was applied.
    pub fn snapshot_before(&self, step: usize) -> Result<Segmentation> {
        let max = self.merges.len();
        if step == 0 {
            return Err(TokenizerError::StepOutOfRange { step, max });
        }
        TokenizerError::check_step(step, max)?;
        self.tokens_at_step(step - 1)
    }

    /// Total token count after `step` merges.
    pub fn token_count(&self, step: usize) -> Result<u64> {
        Ok(self.state_at_step(step)?.token_count())
    }

    /// Total token count before any merge.
    pub fn initial_token_count(&self) -> u64 {
        self.initial.token_count()
    }

    /// Initial token count divided by the count after `step` merges.
    pub fn compression_ratio(&self, step: usize) -> Result<f64> {
        let count = self.token_count(step)?;
        if count == 0 {
            return Ok(1.0);
        }
        Ok(self.initial_token_count() as f64 / count as f64)
    }

    /// Ranked pair frequencies of the round following `step` merges.
    pub fn pair_counts_at_step(&self, step: usize) -> Result<Vec<(Pair, u64)>> {
        let mut pairs: Vec<(Pair, u64)> = self
            .state_at_step(step)?
            .count_pairs()
            .into_iter()
            .collect();
        sort_pairs(&mut pairs);
        Ok(pairs)
    }

    /// Vocabulary listing after `step` merges.
    pub fn vocab_at_step(&self, step: usize) -> Result<Vec<VocabEntry>> {
        TokenizerError::check_step(step, self.merges.len())?;

        let mut entries = Vec::with_capacity(self.seeds.len() + step);
        for (index, (token, source)) in self.seeds.iter().enumerate() {
            entries.push(VocabEntry {
                token: token.clone(),
                index: index as u32,
                step: 0,
                source: source.clone(),
                count: None,
                scaffold: self.policy.is_suppressed(token, step),
            });
        }

        for (offset, record) in self.merges[..step].iter().enumerate() {
            let source = match &record.kind {
                MergeKind::Pair => VocabSource::Merge {
                    left: record.pair.left.clone(),
                    right: record.pair.right.clone(),
                },
                MergeKind::Supermerge {
                    left_pre_token,
                    right_pre_token,
                } => VocabSource::Supermerge {
                    left: left_pre_token.clone(),
                    right: right_pre_token.clone(),
                },
            };
            entries.push(VocabEntry {
                token: record.merged.clone(),
                index: (self.seeds.len() + offset) as u32,
                step: record.step,
                source,
                count: Some(record.count),
                scaffold: self.policy.is_suppressed(&record.merged, step),
            });
        }

        Ok(entries)
    }

    /// The merge log.
    #[inline]
    pub fn merges(&self) -> &[MergeRecord] {
        &self.merges
    }

    /// Number of merges computed.
    #[inline]
    pub fn merge_count(&self) -> usize {
        self.merges.len()
    }

    /// Vocabulary after the last merge.
    #[inline]
    pub fn vocab(&self) -> &Vocabulary {
        &self.vocab
    }

    /// Vocabulary entries present before the first merge.
    #[inline]
    pub fn seeds(&self) -> &[(CompactString, VocabSource)] {
        &self.seeds
    }

    /// The initial segmentation.
    #[inline]
    pub fn initial(&self) -> &Corpus {
        &self.initial
    }

    #[inline]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[inline]
    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    #[inline]
    pub fn policy(&self) -> &P {
        &self.policy
    }
}

/// Seed vocabulary: base characters by code point, then variant seeds sorted.
fn base_entries<P: MergePolicy>(corpus: &Corpus, policy: &P) -> Vec<(CompactString, VocabSource)> {
    let mut chars = BTreeSet::new();
    let mut variants = BTreeMap::new();

    for segment in corpus.segments() {
        for token in &segment.tokens {
            match policy.classify(token) {
                VocabSource::Base => chars.extend(token.chars()),
                source => {
                    variants.entry(token.clone()).or_insert(source);
                }
            }
        }
    }

    chars
        .into_iter()
        .map(|c| (char_token(c), VocabSource::Base))
        .chain(variants)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Plain;

    impl MergePolicy for Plain {}

    fn train(text: &str, max_merges: usize) -> Trainer<Plain> {
        Trainer::with_policy(text, TrainingConfig::with_max_merges(max_merges), Plain)
    }

    #[test]
    fn test_basic_training() {
        let trainer = train("aaabdaabac", 10);
        assert!(trainer.merge_count() > 0);
        assert!(trainer.vocab().contains("a"));
        assert_eq!(trainer.merges()[0].step, 1);
    }

    #[test]
    fn test_empty_text() {
        let trainer = train("", 10);
        assert_eq!(trainer.merge_count(), 0);
        assert_eq!(trainer.initial_token_count(), 0);
        assert!(trainer.tokens_at_step(0).unwrap().is_empty());
        assert!(trainer.vocab_at_step(0).unwrap().is_empty());
        assert_eq!(trainer.compression_ratio(0), Ok(1.0));
    }

    #[test]
    fn test_zero_merges() {
        let trainer = train("hello hello", 0);
        assert_eq!(trainer.merge_count(), 0);
        let vocab = trainer.vocab_at_step(0).unwrap();
        let tokens: Vec<&str> = vocab.iter().map(|e| e.token.as_str()).collect();
        assert_eq!(tokens, vec![" ", "e", "h", "l", "o"]);
    }

    #[test]
    fn test_min_frequency_stops_training() {
        // Every pair occurs once
        let trainer = train("abcdef", 10);
        assert_eq!(trainer.merge_count(), 0);
    }

    #[test]
    fn test_step_out_of_range() {
        let trainer = train("low low low", 1);
        assert_eq!(trainer.merge_count(), 1);
        assert_eq!(
            trainer.tokens_at_step(2),
            Err(TokenizerError::StepOutOfRange { step: 2, max: 1 })
        );
        assert!(trainer.token_count(5).is_err());
        assert!(trainer.vocab_at_step(2).is_err());
        assert!(trainer.snapshot_before(2).is_err());
    }

    #[test]
    fn test_snapshot_before() {
        let trainer = train("low low low", 2);
        assert_eq!(trainer.snapshot_before(1), trainer.tokens_at_step(0));
        assert_eq!(trainer.snapshot_before(2), trainer.tokens_at_step(1));
        assert_eq!(
            trainer.snapshot_before(0),
            Err(TokenizerError::StepOutOfRange { step: 0, max: 2 })
        );
    }

    #[test]
    fn test_pair_counts_at_step() {
        let trainer = train("low low low lower lowest", 1);
        let pairs = trainer.pair_counts_at_step(0).unwrap();
        assert_eq!(pairs[0], (Pair::new("o", "w"), 5));
        assert_eq!(pairs[1], (Pair::new("l", "o"), 5));

        let pairs = trainer.pair_counts_at_step(1).unwrap();
        assert_eq!(pairs[0], (Pair::new("l", "ow"), 5));
    }

    #[test]
    fn test_normalization() {
        let config = TrainingConfig {
            max_merges: 0,
            normalization: NormalizationForm::NFC,
        };
        let trainer = Trainer::with_policy("e\u{0301}", config, Plain);
        assert_eq!(trainer.initial_token_count(), 1);
        assert_eq!(trainer.text(), "e\u{0301}");
    }
}
