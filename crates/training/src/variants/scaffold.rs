//! Scaffold-BPE: flag intermediate tokens that stop being useful.
//!
//! After each merge, a merged component whose remaining standalone frequency
//! drops below the runner-up candidate's frequency becomes a scaffold. It
//! stays in the vocabulary for training but is demolished into its parts
//! when the final segmentation is shown.

use crate::training::{AppliedMerge, MergePolicy, Segment, Segmentation, Trainer, TrainingConfig};
use ahash::AHashMap;
use bpelab_core::{MergeDetail, Pair, Result, ScaffoldMark};
use compact_str::CompactString;

/// Scaffold state of one token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScaffoldStatus {
    /// The two tokens it was merged from
    pub components: Pair,
    /// First step at which it counts as a scaffold
    pub since: usize,
}

#[derive(Debug, Clone, Default)]
pub struct ScaffoldPolicy {
    /// Merged token -> its components, for every merge
    components: AHashMap<CompactString, Pair>,
    /// Scaffold tokens
    scaffolds: AHashMap<CompactString, ScaffoldStatus>,
}

impl ScaffoldPolicy {
    /// Scaffold state of a token, if it was ever marked.
    pub fn status(&self, token: &str) -> Option<&ScaffoldStatus> {
        self.scaffolds.get(token)
    }

    /// Expand scaffolds in `token` recursively, as of `step`.
    pub fn demolish(&self, token: &str, step: usize) -> Vec<CompactString> {
        let mut out = Vec::new();
        self.demolish_into(token, step, &mut out);
        out
    }

    fn demolish_into(&self, token: &str, step: usize, out: &mut Vec<CompactString>) {
        match self.scaffolds.get(token) {
            Some(status) if status.since <= step => {
                self.demolish_into(&status.components.left, step, out);
                self.demolish_into(&status.components.right, step, out);
            }
            _ => out.push(CompactString::new(token)),
        }
    }
}

impl MergePolicy for ScaffoldPolicy {
    fn on_merge_applied(&mut self, merge: &AppliedMerge<'_>) -> MergeDetail {
        let pair = &merge.candidate.pair;
        self.components.insert(merge.merged(), pair.clone());

        let threshold = merge.runner_up.map_or(0, |r| r.count);
        let mut marked = Vec::new();

        let mut parts = vec![&pair.left];
        if pair.right != pair.left {
            parts.push(&pair.right);
        }

        for token in parts {
            // Base tokens have no components and are never scaffolds
            let Some(components) = self.components.get(token) else {
                continue;
            };
            let remaining = merge.corpus.token_frequency(token);
            if remaining >= threshold {
                continue;
            }

            if !self.scaffolds.contains_key(token) {
                tracing::debug!(
                    step = merge.step,
                    %token,
                    remaining,
                    threshold,
                    "Marked scaffold"
                );
                self.scaffolds.insert(
                    token.clone(),
                    ScaffoldStatus {
                        components: components.clone(),
                        since: merge.step,
                    },
                );
                marked.push(ScaffoldMark {
                    token: token.clone(),
                    remaining,
                    threshold,
                    runner_up: merge.runner_up.map(|r| r.pair.clone()),
                });
            }
        }

        MergeDetail::Scaffold { threshold, marked }
    }

    fn is_suppressed(&self, token: &str, step: usize) -> bool {
        self.scaffolds
            .get(token)
            .is_some_and(|status| status.since <= step)
    }
}

/// BPE with scaffold-token demolition.
pub type ScaffoldBpe = Trainer<ScaffoldPolicy>;

impl Trainer<ScaffoldPolicy> {
    pub fn new(text: &str, max_merges: usize) -> Self {
        Self::with_config(text, TrainingConfig::with_max_merges(max_merges))
    }

    pub fn with_config(text: &str, config: TrainingConfig) -> Self {
        Self::with_policy(text, config, ScaffoldPolicy::default())
    }

    /// Tokens that are scaffolds after `step` merges, in marking order.
    pub fn scaffolds_at_step(&self, step: usize) -> Vec<CompactString> {
        let mut scaffolds: Vec<(usize, &CompactString)> = self
            .policy()
            .scaffolds
            .iter()
            .filter(|(_, status)| status.since <= step)
            .map(|(token, status)| (status.since, token))
            .collect();
        scaffolds.sort();
        scaffolds.into_iter().map(|(_, t)| t.clone()).collect()
    }

    /// Expand a token into non-scaffold parts, as of `step`.
    pub fn demolish(&self, token: &str, step: usize) -> Vec<CompactString> {
        self.policy().demolish(token, step)
    }

    /// Segmentation after `step` merges with every scaffold demolished.
    pub fn demolished_tokens_at_step(&self, step: usize) -> Result<Segmentation> {
        let segmentation = self.tokens_at_step(step)?;
        Ok(segmentation
            .into_iter()
            .map(|segment| Segment {
                tokens: segment
                    .tokens
                    .iter()
                    .flat_map(|t| self.demolish(t, step))
                    .collect(),
                ..segment
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEXT: &str = "low low low lower lowest";

    #[test]
    fn test_scaffold_marking() {
        let sc = ScaffoldBpe::new(TEXT, 3);
        assert_eq!(sc.merge_count(), 3);

        let status = sc.policy().status("ow").unwrap();
        assert_eq!(status.since, 2);
        assert_eq!(status.components, Pair::new("o", "w"));
        assert_eq!(sc.policy().status("low").map(|s| s.since), Some(3));

        assert!(sc.scaffolds_at_step(1).is_empty());
        assert_eq!(sc.scaffolds_at_step(2), vec!["ow"]);
        assert_eq!(sc.scaffolds_at_step(3), vec!["ow", "low"]);
    }

    #[test]
    fn test_threshold_detail() {
        let sc = ScaffoldBpe::new(TEXT, 3);
        match &sc.merges()[1].detail {
            MergeDetail::Scaffold { threshold, marked } => {
                assert_eq!(*threshold, 4);
                assert_eq!(marked.len(), 1);
                assert_eq!(marked[0].token, "ow");
                assert_eq!(marked[0].remaining, 0);
                assert_eq!(marked[0].runner_up, Some(Pair::new(" ", "l")));
            }
            other => panic!("unexpected detail {other:?}"),
        }
    }

    #[test]
    fn test_each_scaffold_marked_once() {
        let text = "the cat sat on the mat. the cat ate the rat, low lower lowest lowly";
        let sc = ScaffoldBpe::new(text, 40);
        let mut total = 0;
        for (index, record) in sc.merges().iter().enumerate() {
            let MergeDetail::Scaffold { marked, .. } = &record.detail else {
                panic!("unexpected detail {:?}", record.detail);
            };
            for mark in marked {
                let status = sc.policy().status(&mark.token).unwrap();
                assert_eq!(status.since, index + 1, "{} marked again", mark.token);
            }
            total += marked.len();
        }
        assert_eq!(total, sc.scaffolds_at_step(sc.merge_count()).len());
    }

    #[test]
    fn test_demolish() {
        let sc = ScaffoldBpe::new(TEXT, 3);
        assert_eq!(sc.demolish("ow", 2), vec!["o", "w"]);
        assert_eq!(sc.demolish("ow", 1), vec!["ow"]);
        assert_eq!(sc.demolish("low", 2), vec!["low"]);
        assert_eq!(sc.demolish("low", 3), vec!["l", "o", "w"]);
        assert_eq!(sc.demolish(" low", 3), vec![" low"]);
        assert_eq!(sc.demolish("w", 3), vec!["w"]);
    }

    #[test]
    fn test_demolished_tokens() {
        let sc = ScaffoldBpe::new(TEXT, 3);
        let demolished = sc.demolished_tokens_at_step(3).unwrap();
        let first = &demolished[0];
        assert_eq!(first.pre_token, "low");
        assert_eq!(first.tokens, vec!["l", "o", "w"]);
        let second = &demolished[1];
        assert_eq!(second.tokens, vec![" low"]);
    }

    #[test]
    fn test_vocab_flags() {
        let sc = ScaffoldBpe::new(TEXT, 3);
        let vocab = sc.vocab_at_step(3).unwrap();
        let flagged: Vec<&str> = vocab
            .iter()
            .filter(|e| e.scaffold)
            .map(|e| e.token.as_str())
            .collect();
        assert_eq!(flagged, vec!["ow", "low"]);

        let vocab = sc.vocab_at_step(1).unwrap();
        assert!(vocab.iter().all(|e| !e.scaffold));
    }
}
