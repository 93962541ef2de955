//! Core merge primitives.
//!
//! Vocabulary storage, pairs and merge records, and candidate ranking shared
//! by every training variant.

pub mod merges;
pub mod priority;
pub mod vocab;

pub use merges::{apply_merge, MergeDetail, MergeKind, MergeRecord, Pair, ScaffoldMark};
pub use priority::{sort_pairs, MergeCandidate, PairPriorityQueue, Score};
pub use vocab::{Vocab, VocabEntry, VocabR, VocabSource, Vocabulary};
