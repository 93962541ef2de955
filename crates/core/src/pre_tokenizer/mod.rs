//! Pre-tokenization pipeline.
//!
//! Optional Unicode normalization, then regex splitting into pre-tokens.

pub mod normalize;
pub mod split;

pub use normalize::{NormalizationForm, Normalizer};
pub use split::{count_pre_tokens, distinct_in_order, pre_tokenize, GPT2_PATTERN};
