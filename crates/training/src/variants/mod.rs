//! The seven merge engines.
//!
//! Each variant is a [`MergePolicy`](crate::training::MergePolicy) plugged
//! into [`Trainer`](crate::training::Trainer), plus a type alias and the
//! queries only that variant answers.

pub mod adaptive;
pub mod attention;
pub mod boundless;
pub mod bpe;
pub mod morph;
pub mod scaffold;
pub mod wordpiece;

pub use adaptive::{AdaptiveBpe, AdaptivePolicy, SubstringMatch};
pub use attention::{AgBpe, AttentionPolicy, HybridScore, DEFAULT_ALPHA};
pub use boundless::{BoundlessBpe, BoundlessPolicy, Superword};
pub use bpe::{Bpe, BpePolicy};
pub use morph::{
    segment_word, MorphBpe, MorphMode, MorphPolicy, MorphemeKind, MorphemeSegment, PREFIXES,
    SUFFIXES,
};
pub use scaffold::{ScaffoldBpe, ScaffoldPolicy, ScaffoldStatus};
pub use wordpiece::{WordPiece, WordPiecePolicy};
