//! The shared merge loop.
//!
//! [`Corpus`] holds the weighted segmentation, [`MergePolicy`] is the seam
//! each variant plugs into, and [`Trainer`] drives the rounds and answers
//! step queries by replay.

pub mod corpus;
pub mod policy;
pub mod round;
pub mod trainer;

pub use corpus::{total_tokens, Corpus, Segment, Segmentation};
pub use policy::{char_token, char_tokens, MergePolicy};
pub use round::{AppliedMerge, RoundStats};
pub use trainer::{Trainer, TrainingConfig, DEFAULT_MAX_MERGES, MIN_MERGE_FREQUENCY};
