//! bpelab-core - shared building blocks for step-replayable BPE
//!
//! This crate provides the pieces every training variant is assembled from:
//!
//! - Regex pre-tokenization and optional Unicode normalization
//! - Insertion-ordered vocabulary with provenance entries
//! - Pairs, the single-pass merge, and the merge log record
//! - Deterministic candidate ranking on an 8-ary heap
//!
//! # Example
//!
//! ```rust
//! use bpelab_core::{apply_merge, pre_tokenize};
//!
//! let chunks = pre_tokenize("low lower");
//! assert_eq!(chunks, vec!["low", " lower"]);
//!
//! let tokens: Vec<String> = chunks[0].chars().map(String::from).collect();
//! assert_eq!(apply_merge(&tokens, "o", "w", "ow"), vec!["l", "ow"]);
//! ```

pub mod error;
pub use error::{Result, TokenizerError};

pub mod core;
pub use core::{
    apply_merge, sort_pairs, MergeCandidate, MergeDetail, MergeKind, MergeRecord, Pair,
    PairPriorityQueue, ScaffoldMark, Score, Vocab, VocabEntry, VocabR, VocabSource, Vocabulary,
};

pub mod pre_tokenizer;
pub use pre_tokenizer::{
    count_pre_tokens, distinct_in_order, pre_tokenize, NormalizationForm, Normalizer,
};
