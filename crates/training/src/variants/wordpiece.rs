//! WordPiece: merge the pair with the highest likelihood gain.
//!
//! A pair is scored `freq(pair) / (freq(left) * freq(right))`. Scores are
//! kept as exact rationals so equal ratios tie and fall through to the
//! frequency, length and key tie-breaks.

use crate::training::{AppliedMerge, MergePolicy, RoundStats, Trainer, TrainingConfig};
use bpelab_core::{MergeDetail, Pair, Score};

#[derive(Debug, Clone, Copy, Default)]
pub struct WordPiecePolicy;

impl WordPiecePolicy {
    fn ratio(pair: &Pair, count: u64, stats: &RoundStats) -> Score {
        // Tokens missing from the round count as 1
        let left = stats.token_count(&pair.left).max(1);
        let right = stats.token_count(&pair.right).max(1);
        Score::Ratio {
            num: count,
            den: left.saturating_mul(right),
        }
    }
}

impl MergePolicy for WordPiecePolicy {
    fn score(&self, pair: &Pair, count: u64, stats: &RoundStats) -> Score {
        Self::ratio(pair, count, stats)
    }

    fn on_merge_applied(&mut self, merge: &AppliedMerge<'_>) -> MergeDetail {
        MergeDetail::WordPiece {
            score: merge.candidate.score.as_f64(),
        }
    }
}

/// WordPiece-style likelihood merging.
pub type WordPiece = Trainer<WordPiecePolicy>;

impl Trainer<WordPiecePolicy> {
    pub fn new(text: &str, max_merges: usize) -> Self {
        Self::with_config(text, TrainingConfig::with_max_merges(max_merges))
    }

    pub fn with_config(text: &str, config: TrainingConfig) -> Self {
        Self::with_policy(text, config, WordPiecePolicy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rare_pair_wins_and_stops() {
        // "s|t" scores 1/(1*1) but occurs once
        let wp = WordPiece::new("low low low lower lowest", 10);
        assert_eq!(wp.merge_count(), 0);
    }

    #[test]
    fn test_merge_order() {
        let wp = WordPiece::new("qu qu qu the the", 10);
        let merged: Vec<&str> = wp.merges().iter().map(|m| m.merged.as_str()).collect();
        assert_eq!(merged, vec!["th", "the", "qu", " the", " qu"]);

        let counts: Vec<u64> = wp.merges().iter().map(|m| m.count).collect();
        assert_eq!(counts, vec![2, 2, 3, 2, 2]);
    }

    #[test]
    fn test_score_detail() {
        let wp = WordPiece::new("qu qu qu the the", 1);
        let first = &wp.merges()[0];
        assert_eq!(first.score, Score::Ratio { num: 2, den: 4 });
        assert_eq!(first.detail, MergeDetail::WordPiece { score: 0.5 });
    }
}
