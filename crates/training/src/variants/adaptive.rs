//! Adaptive-BPE: keep domain terms whole from the start.
//!
//! Pre-tokens are seeded by greedy longest-prefix matching against a domain
//! vocabulary, falling back to a single character. Matched terms enter the
//! vocabulary as seeds, so merges can only build around them.

use crate::training::{char_token, MergePolicy, Trainer, TrainingConfig};
use ahash::AHashMap;
use bpelab_core::VocabSource;
use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// A domain term found in a pre-token. Offsets are in chars.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubstringMatch {
    pub term: CompactString,
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone, Default)]
pub struct AdaptivePolicy {
    /// Domain terms, sorted and deduplicated
    domain: Vec<CompactString>,
    /// Pre-token -> matches found while seeding
    matches: AHashMap<CompactString, Vec<SubstringMatch>>,
}

impl AdaptivePolicy {
    pub fn new<I, S>(domain_vocab: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut domain: Vec<CompactString> = domain_vocab
            .into_iter()
            .map(|t| CompactString::new(t.as_ref()))
            .filter(|t| !t.is_empty())
            .collect();
        domain.sort();
        domain.dedup();
        Self {
            domain,
            matches: AHashMap::new(),
        }
    }

    #[inline]
    pub fn domain(&self) -> &[CompactString] {
        &self.domain
    }

    /// Matches recorded for a pre-token.
    pub fn matches(&self, pre_token: &str) -> &[SubstringMatch] {
        self.matches.get(pre_token).map_or(&[], Vec::as_slice)
    }

    fn longest_prefix(&self, rest: &str) -> Option<&CompactString> {
        self.domain
            .iter()
            .filter(|term| rest.starts_with(term.as_str()))
            .max_by_key(|term| term.len())
    }
}

impl MergePolicy for AdaptivePolicy {
    fn seed(&mut self, pre_token: &str) -> Vec<CompactString> {
        let mut tokens = Vec::new();
        let mut found = Vec::new();
        let mut rest = pre_token;
        let mut position = 0;

        while let Some(c) = rest.chars().next() {
            if let Some(term) = self.longest_prefix(rest) {
                let width = term.chars().count();
                found.push(SubstringMatch {
                    term: term.clone(),
                    start: position,
                    end: position + width,
                });
                tokens.push(term.clone());
                rest = &rest[term.len()..];
                position += width;
            } else {
                tokens.push(char_token(c));
                rest = &rest[c.len_utf8()..];
                position += 1;
            }
        }

        if !found.is_empty() {
            self.matches.insert(CompactString::new(pre_token), found);
        }
        tokens
    }

    fn classify(&self, token: &str) -> VocabSource {
        if self.domain.binary_search_by(|t| t.as_str().cmp(token)).is_ok() {
            VocabSource::Domain
        } else {
            VocabSource::Base
        }
    }
}

/// BPE seeded with domain vocabulary.
pub type AdaptiveBpe = Trainer<AdaptivePolicy>;

impl Trainer<AdaptivePolicy> {
    pub fn new<I, S>(text: &str, max_merges: usize, domain_vocab: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::with_config(text, TrainingConfig::with_max_merges(max_merges), domain_vocab)
    }

    pub fn with_config<I, S>(text: &str, config: TrainingConfig, domain_vocab: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::with_policy(text, config, AdaptivePolicy::new(domain_vocab))
    }

    /// The domain vocabulary in use.
    pub fn domain_vocab(&self) -> &[CompactString] {
        self.policy().domain()
    }

    /// Matches per pre-token, in first-occurrence order.
    pub fn substring_matches(&self) -> Vec<(CompactString, Vec<SubstringMatch>)> {
        self.initial()
            .segments()
            .iter()
            .filter_map(|segment| {
                let found = self.policy().matches(&segment.pre_token);
                (!found.is_empty()).then(|| (segment.pre_token.clone(), found.to_vec()))
            })
            .collect()
    }

    /// Replace the domain vocabulary and retrain.
    pub fn set_domain_vocab<I, S>(&mut self, domain_vocab: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let text = self.text().to_string();
        *self = Self::with_config(&text, *self.config(), domain_vocab);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_term_seeding() {
        let ad = AdaptiveBpe::new("myocardialinfarction", 10, ["myocardial"]);
        let segmentation = ad.tokens_at_step(0).unwrap();
        assert_eq!(
            segmentation[0].tokens,
            vec!["myocardial", "i", "n", "f", "a", "r", "c", "t", "i", "o", "n"]
        );
        assert_eq!(ad.merge_count(), 0);

        let matches = ad.substring_matches();
        assert_eq!(matches.len(), 1);
        assert_eq!(
            matches[0].1,
            vec![SubstringMatch {
                term: "myocardial".into(),
                start: 0,
                end: 10,
            }]
        );
    }

    #[test]
    fn test_longest_match_wins() {
        let ad = AdaptiveBpe::new("cardiology", 0, ["cardio", "cardiology", "card"]);
        assert_eq!(ad.tokens_at_step(0).unwrap()[0].tokens, vec!["cardiology"]);
    }

    #[test]
    fn test_vocab_lists_matched_terms() {
        let ad = AdaptiveBpe::new(" heart heart", 0, ["heart", "lung"]);
        let vocab = ad.vocab_at_step(0).unwrap();
        let listed: Vec<(&str, String)> = vocab
            .iter()
            .map(|e| (e.token.as_str(), e.source.to_string()))
            .collect();
        assert_eq!(
            listed,
            vec![(" ", "base".to_string()), ("heart", "domain".to_string())]
        );
    }

    #[test]
    fn test_domain_terms_never_split() {
        let ad = AdaptiveBpe::new("heart hearts heart", 10, ["heart"]);
        for step in 0..=ad.merge_count() {
            for segment in ad.tokens_at_step(step).unwrap() {
                let joined: String = segment.tokens.concat();
                assert_eq!(joined, segment.pre_token.as_str());
                if segment.pre_token.contains("heart") {
                    assert!(segment.tokens.iter().any(|t| t.contains("heart")));
                }
            }
        }
    }

    #[test]
    fn test_set_domain_vocab_rebuilds() {
        let mut ad = AdaptiveBpe::new("myocardialinfarction", 10, Vec::<String>::new());
        assert_eq!(ad.initial_token_count(), 20);
        ad.set_domain_vocab(["infarction"]);
        assert_eq!(ad.initial_token_count(), 11);
        assert_eq!(ad.domain_vocab(), &["infarction"]);
    }
}
