//! AG-BPE: blend pair frequency with a co-occurrence "attention" signal.
//!
//! `hybrid = alpha * freq / max_freq + (1 - alpha) * min(freq / min(count(l), count(r)), 1)`
//!
//! The attention term approximates how strongly two tokens bond: it reaches
//! 1 when the rarer of the two never appears without the other.

use crate::training::{AppliedMerge, MergePolicy, RoundStats, Trainer, TrainingConfig};
use bpelab_core::{MergeDetail, Pair, Result, Score, TokenizerError};

/// Default weight of the frequency term.
pub const DEFAULT_ALPHA: f64 = 0.6;

/// Resolution at which hybrid scores are ranked. Scores closer than this
/// tie and fall through to raw frequency.
const SCORE_SCALE: f64 = 1e9;

/// The two components of a hybrid score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HybridScore {
    pub frequency: f64,
    pub attention: f64,
    pub hybrid: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct AttentionPolicy {
    alpha: f64,
}

impl AttentionPolicy {
    /// Create a policy. `alpha` must lie in `[0, 1]`.
    pub fn new(alpha: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&alpha) {
            return Err(TokenizerError::InvalidConfig(format!(
                "alpha must be within [0, 1], got {alpha}"
            )));
        }
        Ok(Self { alpha })
    }

    #[inline]
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Score a pair against the statistics of its round.
    pub fn hybrid(&self, pair: &Pair, count: u64, stats: &RoundStats) -> HybridScore {
        let frequency = if stats.max_pair_count == 0 {
            0.0
        } else {
            count as f64 / stats.max_pair_count as f64
        };

        let left = stats.token_count(&pair.left).max(1);
        let right = stats.token_count(&pair.right).max(1);
        let attention = (count as f64 / left.min(right) as f64).min(1.0);

        HybridScore {
            frequency,
            attention,
            hybrid: self.alpha * frequency + (1.0 - self.alpha) * attention,
        }
    }
}

impl Default for AttentionPolicy {
    fn default() -> Self {
        Self {
            alpha: DEFAULT_ALPHA,
        }
    }
}

impl MergePolicy for AttentionPolicy {
    fn score(&self, pair: &Pair, count: u64, stats: &RoundStats) -> Score {
        let hybrid = self.hybrid(pair, count, stats).hybrid;
        Score::Real((hybrid * SCORE_SCALE).round() / SCORE_SCALE)
    }

    fn on_merge_applied(&mut self, merge: &AppliedMerge<'_>) -> MergeDetail {
        let candidate = merge.candidate;
        let score = self.hybrid(&candidate.pair, candidate.count, merge.stats);
        MergeDetail::AttentionGuided {
            alpha: self.alpha,
            hybrid_score: score.hybrid,
            frequency_score: score.frequency,
            attention_score: score.attention,
        }
    }
}

/// Attention-guided BPE.
pub type AgBpe = Trainer<AttentionPolicy>;

impl Trainer<AttentionPolicy> {
    /// Train with the given frequency weight.
    ///
    /// Fails with [`TokenizerError::InvalidConfig`] when `alpha` is outside
    /// `[0, 1]` or NaN.
    pub fn new(text: &str, max_merges: usize, alpha: f64) -> Result<Self> {
        Self::with_config(text, TrainingConfig::with_max_merges(max_merges), alpha)
    }

    pub fn with_config(text: &str, config: TrainingConfig, alpha: f64) -> Result<Self> {
        Ok(Self::with_policy(text, config, AttentionPolicy::new(alpha)?))
    }

    #[inline]
    pub fn alpha(&self) -> f64 {
        self.policy().alpha()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variants::Bpe;
    use ahash::AHashMap;
    use bpelab_core::MergeCandidate;
    use compact_str::CompactString;

    #[test]
    fn test_alpha_validation() {
        assert!(AgBpe::new("abc", 1, 0.0).is_ok());
        assert!(AgBpe::new("abc", 1, 1.0).is_ok());
        assert!(matches!(
            AgBpe::new("abc", 1, 1.5),
            Err(TokenizerError::InvalidConfig(_))
        ));
        assert!(AgBpe::new("abc", 1, -0.1).is_err());
        assert!(AgBpe::new("abc", 1, f64::NAN).is_err());
    }

    #[test]
    fn test_pure_frequency_matches_bpe() {
        let text = "low low low lower lowest";
        let ag = AgBpe::new(text, 10, 1.0).unwrap();
        let bpe = Bpe::new(text, 10);
        let ag_merges: Vec<&str> = ag.merges().iter().map(|m| m.merged.as_str()).collect();
        let bpe_merges: Vec<&str> = bpe.merges().iter().map(|m| m.merged.as_str()).collect();
        assert_eq!(ag_merges, bpe_merges);
    }

    #[test]
    fn test_pure_attention() {
        let ag = AgBpe::new("qu qu qu the the", 10, 0.0).unwrap();
        let first = &ag.merges()[0];
        assert_eq!(first.merged, "qu");
        match first.detail {
            MergeDetail::AttentionGuided {
                alpha,
                attention_score,
                frequency_score,
                hybrid_score,
            } => {
                assert_eq!(alpha, 0.0);
                assert_eq!(attention_score, 1.0);
                assert_eq!(frequency_score, 1.0);
                assert_eq!(hybrid_score, 1.0);
            }
            ref other => panic!("unexpected detail {other:?}"),
        }
    }

    #[test]
    fn test_equal_hybrid_scores_tie_on_frequency() {
        let a = Pair::new("a", "b");
        let b = Pair::new("c", "d");
        let stats = RoundStats {
            pair_counts: AHashMap::from_iter([
                (a.clone(), 4),
                (b.clone(), 3),
                (Pair::new("e", "f"), 6),
            ]),
            token_counts: [("a", 8), ("b", 10), ("c", 4), ("d", 5)]
                .into_iter()
                .map(|(t, c)| (CompactString::new(t), c))
                .collect(),
            max_pair_count: 6,
        };

        // 0.6 * 4/6 + 0.4 * 4/8 and 0.6 * 3/6 + 0.4 * 3/4 are both 0.6
        let policy = AttentionPolicy::new(0.6).unwrap();
        let score_a = policy.score(&a, 4, &stats);
        let score_b = policy.score(&b, 3, &stats);
        assert_eq!(score_a, score_b);

        let winner = MergeCandidate::with_score(a, 4, score_a);
        let loser = MergeCandidate::with_score(b, 3, score_b);
        assert!(winner > loser);
    }

    #[test]
    fn test_default_alpha() {
        assert_eq!(AttentionPolicy::default().alpha(), DEFAULT_ALPHA);
    }
}
