//! Vocabulary storage and lookup.
//!
//! Tokens receive consecutive ids in insertion order and are never removed,
//! so an id doubles as the position of the token in the vocabulary listing.

use crate::error::{Result, TokenizerError};
use ahash::AHashMap;
use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Forward mapping: token string -> ID
pub type Vocab = AHashMap<CompactString, u32>;

/// Reverse mapping: ID -> token string
pub type VocabR = AHashMap<u32, CompactString>;

/// Vocabulary with forward and reverse mappings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Vocabulary {
    /// Forward mapping: token string -> ID
    pub vocab: Vocab,
    /// Reverse mapping: ID -> token string
    pub vocab_r: VocabR,
}

impl Vocabulary {
    /// Create a new empty vocabulary.
    pub fn new() -> Self {
        Self {
            vocab: Vocab::new(),
            vocab_r: VocabR::new(),
        }
    }

    /// Create a new vocabulary with capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            vocab: Vocab::with_capacity(capacity),
            vocab_r: VocabR::with_capacity(capacity),
        }
    }

    /// Add a token to the vocabulary.
    ///
    /// Returns the ID assigned to the token, or its existing ID.
    pub fn add_token(&mut self, token: &str) -> u32 {
        if let Some(&id) = self.vocab.get(token) {
            return id;
        }

        let token = CompactString::new(token);
        let id = self.vocab.len() as u32;
        self.vocab_r.insert(id, token.clone());
        self.vocab.insert(token, id);
        id
    }

    /// Add a token only if it is new.
    ///
    /// Returns `None` when the token was already present.
    pub fn insert_new(&mut self, token: &str) -> Option<u32> {
        if self.contains(token) {
            None
        } else {
            Some(self.add_token(token))
        }
    }

    /// Get the ID for a token string.
    #[inline]
    pub fn get_id(&self, token: &str) -> Option<u32> {
        self.vocab.get(token).copied()
    }

    /// Get the ID for a token string, failing for unknown tokens.
    pub fn id_of(&self, token: &str) -> Result<u32> {
        self.get_id(token)
            .ok_or_else(|| TokenizerError::UnknownToken(token.to_string()))
    }

    /// Get the token string for an ID.
    #[inline]
    pub fn get_token(&self, id: u32) -> Option<&str> {
        self.vocab_r.get(&id).map(|s| s.as_str())
    }

    /// Check if a token is present.
    #[inline]
    pub fn contains(&self, token: &str) -> bool {
        self.vocab.contains_key(token)
    }

    /// Get the size of the vocabulary.
    #[inline]
    pub fn len(&self) -> usize {
        self.vocab.len()
    }

    /// Check if the vocabulary is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vocab.is_empty()
    }

    /// Tokens in ID order.
    pub fn tokens(&self) -> impl Iterator<Item = &str> + '_ {
        (0..self.len() as u32).filter_map(move |id| self.get_token(id))
    }
}

/// Where a vocabulary entry came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum VocabSource {
    /// A single character of the training text
    Base,
    /// A domain term matched in the training text
    Domain,
    /// A morpheme produced by morphological pre-segmentation
    Morpheme,
    /// A suffix from the fixed lexicon, registered up front
    MorphemeSeed,
    /// The result of a pair merge
    Merge {
        left: CompactString,
        right: CompactString,
    },
    /// The composite pre-token of a supermerge
    Supermerge {
        left: CompactString,
        right: CompactString,
    },
}

impl VocabSource {
    /// Whether the entry existed before the first merge.
    #[inline]
    pub fn is_seed(&self) -> bool {
        !matches!(
            self,
            VocabSource::Merge { .. } | VocabSource::Supermerge { .. }
        )
    }
}

impl fmt::Display for VocabSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VocabSource::Base => f.write_str("base"),
            VocabSource::Domain => f.write_str("domain"),
            VocabSource::Morpheme => f.write_str("morpheme"),
            VocabSource::MorphemeSeed => f.write_str("morpheme seed"),
            VocabSource::Merge { left, right } => write!(f, "{left} + {right}"),
            VocabSource::Supermerge { left, right } => write!(f, "{left} ⊕ {right}"),
        }
    }
}

/// One row of the vocabulary listing at some step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VocabEntry {
    /// The token string
    pub token: CompactString,
    /// Insertion-order index
    pub index: u32,
    /// Step that introduced the token (0 for seeds)
    pub step: usize,
    /// Provenance
    pub source: VocabSource,
    /// Pair frequency for merged tokens
    pub count: Option<u64>,
    /// Whether the token is a scaffold at the queried step
    pub scaffold: bool,
}
