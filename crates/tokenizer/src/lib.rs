//! bpelab-tokenizer - one entry point for every merge engine
//!
//! This crate puts the seven engines of `bpelab-training` behind a single
//! builder and a single [`Engine`] type, plus helpers for showing tokens.
//!
//! # Example
//!
//! ```rust
//! use bpelab_tokenizer::{to_display, Algorithm, Engine};
//!
//! let engine = Engine::builder("scaffold".parse::<Algorithm>()?)
//!     .max_merges(3)
//!     .build("low low low lower lowest")?;
//!
//! assert_eq!(engine.token_count(3)?, 10);
//! let last = &engine.merges()[2];
//! assert_eq!(to_display(&last.merged), "␣low");
//! # Ok::<(), bpelab_tokenizer::TokenizerError>(())
//! ```

pub use bpelab_core::{NormalizationForm, Result, TokenizerError};
pub use bpelab_training::variants::DEFAULT_ALPHA;
pub use bpelab_training::{MorphMode, Segment, Segmentation, DEFAULT_MAX_MERGES};

pub mod tokenizer;
pub use tokenizer::{Algorithm, Engine, EngineBuilder};

pub mod utils;
pub use utils::{join_display, to_display};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
