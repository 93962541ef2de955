//! bpelab-training - step-replayable BPE merge engines
//!
//! Every engine computes its whole merge log when it is built, then answers
//! "what did the corpus look like after `k` merges?" by replaying the log.
//!
//! # Engines
//!
//! - [`Bpe`]: most frequent pair wins
//! - [`WordPiece`]: pair frequency normalised by component frequencies
//! - [`ScaffoldBpe`]: flags intermediate tokens that fall out of use
//! - [`AdaptiveBpe`]: keeps domain terms whole from the start
//! - [`AgBpe`]: blends frequency with a co-occurrence signal
//! - [`BoundlessBpe`]: can join whole pre-tokens into superwords
//! - [`MorphBpe`]: respects prefix, root and suffix boundaries
//!
//! # Example
//!
//! ```rust
//! use bpelab_training::Bpe;
//!
//! let bpe = Bpe::new("low low low lower lowest", 3);
//! assert_eq!(bpe.merges()[0].merged, "ow");
//! assert_eq!(bpe.initial_token_count(), 24);
//! assert_eq!(bpe.token_count(3)?, 10);
//! # Ok::<(), bpelab_training::TokenizerError>(())
//! ```

pub use bpelab_core::{Result, TokenizerError};

pub mod training;
pub use training::{
    total_tokens, Corpus, MergePolicy, Segment, Segmentation, Trainer, TrainingConfig,
    DEFAULT_MAX_MERGES, MIN_MERGE_FREQUENCY,
};

pub mod variants;
pub use variants::{
    AdaptiveBpe, AgBpe, BoundlessBpe, Bpe, MorphBpe, MorphMode, ScaffoldBpe, WordPiece,
};
