//! Morph-BPE: morphology-aware merging.
//!
//! Two modes:
//!
//! - `Seeding` splits into characters as usual but registers common English
//!   suffixes up front. Merges producing a seeded suffix are skipped.
//! - `Pretokenize` first splits each pre-token into prefix, root and suffix
//!   using small fixed lexicons, then refuses merges joining tokens of
//!   different morpheme kinds.

use crate::training::{char_tokens, AppliedMerge, MergePolicy, Trainer, TrainingConfig};
use ahash::AHashMap;
use bpelab_core::{apply_merge, MergeDetail, Pair, TokenizerError, VocabSource, Vocabulary};
use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Prefixes recognised at the start of a word. The longest match wins.
pub const PREFIXES: &[&str] = &[
    "un", "pre", "re", "dis", "mis", "over", "under", "out", "sub", "super", "anti", "auto", "co",
    "de", "ex", "inter", "non", "post", "trans",
];

/// Suffixes recognised at the end of a word. The longest match wins.
pub const SUFFIXES: &[&str] = &[
    "ing", "ed", "er", "est", "ly", "tion", "sion", "ness", "ment", "able", "ible", "ful", "less",
    "ous", "ive", "al", "ity", "ty", "ry", "ery", "ary", "ory", "s", "es",
];

/// Position of a morpheme within a word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MorphemeKind {
    Prefix,
    Root,
    Suffix,
}

impl fmt::Display for MorphemeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MorphemeKind::Prefix => "prefix",
            MorphemeKind::Root => "root",
            MorphemeKind::Suffix => "suffix",
        };
        f.write_str(name)
    }
}

/// One morpheme of a segmented word.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MorphemeSegment {
    pub kind: MorphemeKind,
    pub text: CompactString,
}

/// How morphology influences training.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MorphMode {
    /// Register suffixes as seed tokens
    Seeding,
    /// Pre-segment words and block cross-morpheme merges
    #[default]
    Pretokenize,
}

impl FromStr for MorphMode {
    type Err = TokenizerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "seeding" => Ok(MorphMode::Seeding),
            "pretokenize" => Ok(MorphMode::Pretokenize),
            other => Err(TokenizerError::InvalidConfig(format!(
                "unknown morph mode: {other}"
            ))),
        }
    }
}

impl fmt::Display for MorphMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MorphMode::Seeding => f.write_str("seeding"),
            MorphMode::Pretokenize => f.write_str("pretokenize"),
        }
    }
}

/// Split a word into prefix, root and suffix.
///
/// Takes the longest matching prefix, then the longest matching suffix of
/// what remains. Matching is ASCII case-insensitive and keeps the original
/// casing. At least one character must remain beside an affix. Returns an empty vector
/// when no affix is found.
pub fn segment_word(word: &str) -> Vec<MorphemeSegment> {
    let lower = word.to_ascii_lowercase();
    let mut rest = word;
    let mut rest_lower = lower.as_str();
    let mut segments = Vec::with_capacity(3);

    let longer_than = |s: &str, affix: &str| s.chars().count() > affix.len();

    if let Some(prefix) = PREFIXES
        .iter()
        .filter(|p| rest_lower.starts_with(**p) && longer_than(rest_lower, **p))
        .max_by_key(|p| p.len())
    {
        segments.push(MorphemeSegment {
            kind: MorphemeKind::Prefix,
            text: CompactString::new(&rest[..prefix.len()]),
        });
        rest = &rest[prefix.len()..];
        rest_lower = &rest_lower[prefix.len()..];
    }

    if let Some(suffix) = SUFFIXES
        .iter()
        .filter(|s| rest_lower.ends_with(**s) && longer_than(rest_lower, **s))
        .max_by_key(|s| s.len())
    {
        let root_end = rest.len() - suffix.len();
        segments.push(MorphemeSegment {
            kind: MorphemeKind::Root,
            text: CompactString::new(&rest[..root_end]),
        });
        segments.push(MorphemeSegment {
            kind: MorphemeKind::Suffix,
            text: CompactString::new(&rest[root_end..]),
        });
    } else if !rest.is_empty() {
        segments.push(MorphemeSegment {
            kind: MorphemeKind::Root,
            text: CompactString::new(rest),
        });
    }

    // A lone root means no structure was found
    if segments.len() < 2 {
        segments.clear();
    }
    segments
}

/// Tokens of one pre-token with their morpheme labels.
#[derive(Debug, Clone)]
struct Labelled {
    tokens: Vec<CompactString>,
    labels: Vec<Option<MorphemeKind>>,
}

impl Labelled {
    fn crosses_boundary(&self, pair: &Pair) -> bool {
        (0..self.tokens.len().saturating_sub(1)).any(|i| {
            self.tokens[i] == pair.left
                && self.tokens[i + 1] == pair.right
                && matches!(
                    (self.labels[i], self.labels[i + 1]),
                    (Some(a), Some(b)) if a != b
                )
        })
    }

    fn apply(&mut self, pair: &Pair, merged: &str) {
        let mut labels = Vec::with_capacity(self.labels.len());
        let mut i = 0;
        while i < self.tokens.len() {
            if i + 1 < self.tokens.len()
                && self.tokens[i] == pair.left
                && self.tokens[i + 1] == pair.right
            {
                let (a, b) = (self.labels[i], self.labels[i + 1]);
                labels.push(if a == b { a } else { None });
                i += 2;
            } else {
                labels.push(self.labels[i]);
                i += 1;
            }
        }
        self.tokens = apply_merge(&self.tokens, &pair.left, &pair.right, merged);
        self.labels = labels;
    }
}

#[derive(Debug, Clone, Default)]
pub struct MorphPolicy {
    mode: MorphMode,
    /// Pre-token -> morphemes, for pre-tokens with structure
    segments: AHashMap<CompactString, Vec<MorphemeSegment>>,
    /// Labelled segmentation mirror, pretokenize mode only
    labelled: Vec<Labelled>,
}

impl MorphPolicy {
    pub fn new(mode: MorphMode) -> Self {
        Self {
            mode,
            ..Default::default()
        }
    }

    #[inline]
    pub fn mode(&self) -> MorphMode {
        self.mode
    }

    /// Morphemes of a pre-token, empty when it fell back to characters.
    pub fn segments(&self, pre_token: &str) -> &[MorphemeSegment] {
        self.segments.get(pre_token).map_or(&[], Vec::as_slice)
    }
}

impl MergePolicy for MorphPolicy {
    fn seed(&mut self, pre_token: &str) -> Vec<CompactString> {
        if self.mode == MorphMode::Seeding {
            return char_tokens(pre_token);
        }

        let segments = segment_word(pre_token);
        let (tokens, labels) = if segments.is_empty() {
            let tokens = char_tokens(pre_token);
            let labels = vec![None; tokens.len()];
            (tokens, labels)
        } else {
            let tokens: Vec<CompactString> = segments.iter().map(|s| s.text.clone()).collect();
            let labels: Vec<Option<MorphemeKind>> = segments.iter().map(|s| Some(s.kind)).collect();
            self.segments.insert(CompactString::new(pre_token), segments);
            (tokens, labels)
        };

        self.labelled.push(Labelled {
            tokens: tokens.clone(),
            labels,
        });
        tokens
    }

    fn classify(&self, token: &str) -> VocabSource {
        if self.mode == MorphMode::Pretokenize && token.chars().nth(1).is_some() {
            VocabSource::Morpheme
        } else {
            VocabSource::Base
        }
    }

    fn extra_seeds(&self, vocab: &Vocabulary) -> Vec<(CompactString, VocabSource)> {
        if self.mode != MorphMode::Seeding {
            return Vec::new();
        }
        SUFFIXES
            .iter()
            .filter(|s| !vocab.contains(s))
            .map(|s| (CompactString::new(s), VocabSource::MorphemeSeed))
            .collect()
    }

    fn is_eligible(&self, pair: &Pair, _merged: &str) -> bool {
        !self.labelled.iter().any(|l| l.crosses_boundary(pair))
    }

    fn on_merge_applied(&mut self, merge: &AppliedMerge<'_>) -> MergeDetail {
        let pair = &merge.candidate.pair;
        let merged = merge.merged();
        for labelled in &mut self.labelled {
            labelled.apply(pair, &merged);
        }

        let morpheme_preserving = match self.mode {
            MorphMode::Pretokenize => true,
            MorphMode::Seeding => {
                SUFFIXES.contains(&merged.as_str()) || PREFIXES.contains(&merged.as_str())
            }
        };
        MergeDetail::Morph {
            morpheme_preserving,
        }
    }
}

/// BPE guided by prefix/root/suffix structure.
pub type MorphBpe = Trainer<MorphPolicy>;

impl Trainer<MorphPolicy> {
    pub fn new(text: &str, max_merges: usize, mode: MorphMode) -> Self {
        Self::with_config(text, TrainingConfig::with_max_merges(max_merges), mode)
    }

    pub fn with_config(text: &str, config: TrainingConfig, mode: MorphMode) -> Self {
        Self::with_policy(text, config, MorphPolicy::new(mode))
    }

    #[inline]
    pub fn mode(&self) -> MorphMode {
        self.policy().mode()
    }

    /// Morphemes per pre-token, in first-occurrence order.
    pub fn morpheme_segments(&self) -> Vec<(CompactString, Vec<MorphemeSegment>)> {
        self.initial()
            .segments()
            .iter()
            .filter_map(|segment| {
                let found = self.policy().segments(&segment.pre_token);
                (!found.is_empty()).then(|| (segment.pre_token.clone(), found.to_vec()))
            })
            .collect()
    }

    /// Suffixes registered as seeds, in lexicon order.
    pub fn seeded_morphemes(&self) -> Vec<CompactString> {
        self.seeds()
            .iter()
            .filter(|(_, source)| *source == VocabSource::MorphemeSeed)
            .map(|(token, _)| token.clone())
            .collect()
    }
}
