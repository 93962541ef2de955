//! Algorithm selection and the engine facade.
//!
//! [`EngineBuilder`] collects every parameter any variant needs and builds
//! the chosen one; [`Engine`] exposes the query surface they share.

use bpelab_core::{MergeRecord, NormalizationForm, Pair, Result, TokenizerError, VocabEntry};
use bpelab_training::variants::{AttentionPolicy, DEFAULT_ALPHA};
use bpelab_training::{
    AdaptiveBpe, AgBpe, BoundlessBpe, Bpe, MorphBpe, MorphMode, ScaffoldBpe, Segmentation,
    TrainingConfig, WordPiece,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The seven merge engines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Algorithm {
    Bpe,
    WordPiece,
    Scaffold,
    Adaptive,
    Ag,
    Boundless,
    Morph,
}

impl Algorithm {
    /// Every algorithm, in presentation order.
    pub const ALL: [Algorithm; 7] = [
        Algorithm::Bpe,
        Algorithm::WordPiece,
        Algorithm::Scaffold,
        Algorithm::Adaptive,
        Algorithm::Ag,
        Algorithm::Boundless,
        Algorithm::Morph,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Algorithm::Bpe => "bpe",
            Algorithm::WordPiece => "wordpiece",
            Algorithm::Scaffold => "scaffold",
            Algorithm::Adaptive => "adaptive",
            Algorithm::Ag => "ag",
            Algorithm::Boundless => "boundless",
            Algorithm::Morph => "morph",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Algorithm {
    type Err = TokenizerError;

    fn from_str(s: &str) -> Result<Self> {
        Algorithm::ALL
            .into_iter()
            .find(|a| a.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| TokenizerError::UnknownAlgorithm(s.to_string()))
    }
}

/// Builder for creating an engine.
#[derive(Debug, Clone)]
pub struct EngineBuilder {
    algorithm: Algorithm,
    config: TrainingConfig,
    domain_vocab: Vec<String>,
    alpha: f64,
    morph_mode: MorphMode,
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new(Algorithm::Bpe)
    }
}

impl EngineBuilder {
    /// Create a builder with default parameters.
    pub fn new(algorithm: Algorithm) -> Self {
        Self {
            algorithm,
            config: TrainingConfig::default(),
            domain_vocab: Vec::new(),
            alpha: DEFAULT_ALPHA,
            morph_mode: MorphMode::default(),
        }
    }

    /// Select the algorithm.
    pub fn algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Set the merge budget (default [`bpelab_training::DEFAULT_MAX_MERGES`]).
    pub fn max_merges(mut self, max_merges: usize) -> Self {
        self.config.max_merges = max_merges;
        self
    }

    /// Set the domain vocabulary. Only Adaptive-BPE reads it.
    pub fn domain_vocab<I, S>(mut self, terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.domain_vocab = terms.into_iter().map(Into::into).collect();
        self
    }

    /// Set the frequency weight. Only AG-BPE reads it.
    pub fn alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    /// Set the morpheme mode. Only Morph-BPE reads it.
    pub fn morph_mode(mut self, mode: MorphMode) -> Self {
        self.morph_mode = mode;
        self
    }

    /// Set the Unicode normalization applied before pre-tokenization.
    pub fn normalization(mut self, form: NormalizationForm) -> Self {
        self.config.normalization = form;
        self
    }

    /// Validate the parameters and train on `text`.
    pub fn build(&self, text: &str) -> Result<Engine> {
        // Checked for every algorithm, not only AG
        AttentionPolicy::new(self.alpha)?;

        tracing::debug!(
            algorithm = %self.algorithm,
            max_merges = self.config.max_merges,
            "Building engine"
        );

        let config = self.config;
        Ok(match self.algorithm {
            Algorithm::Bpe => Engine::Bpe(Bpe::with_config(text, config)),
            Algorithm::WordPiece => Engine::WordPiece(WordPiece::with_config(text, config)),
            Algorithm::Scaffold => Engine::Scaffold(ScaffoldBpe::with_config(text, config)),
            Algorithm::Adaptive => Engine::Adaptive(AdaptiveBpe::with_config(
                text,
                config,
                &self.domain_vocab,
            )),
            Algorithm::Ag => Engine::Ag(AgBpe::with_config(text, config, self.alpha)?),
            Algorithm::Boundless => Engine::Boundless(BoundlessBpe::with_config(text, config)),
            Algorithm::Morph => {
                Engine::Morph(MorphBpe::with_config(text, config, self.morph_mode))
            }
        })
    }
}

/// A trained engine of any variant.
#[derive(Debug, Clone)]
pub enum Engine {
    Bpe(Bpe),
    WordPiece(WordPiece),
    Scaffold(ScaffoldBpe),
    Adaptive(AdaptiveBpe),
    Ag(AgBpe),
    Boundless(BoundlessBpe),
    Morph(MorphBpe),
}

macro_rules! dispatch {
    ($engine:expr, $inner:ident => $body:expr) => {
        match $engine {
            Engine::Bpe($inner) => $body,
            Engine::WordPiece($inner) => $body,
            Engine::Scaffold($inner) => $body,
            Engine::Adaptive($inner) => $body,
            Engine::Ag($inner) => $body,
            Engine::Boundless($inner) => $body,
            Engine::Morph($inner) => $body,
        }
    };
}

impl Engine {
    /// Create a builder for the given algorithm.
    pub fn builder(algorithm: Algorithm) -> EngineBuilder {
        EngineBuilder::new(algorithm)
    }

    pub fn algorithm(&self) -> Algorithm {
        match self {
            Engine::Bpe(_) => Algorithm::Bpe,
            Engine::WordPiece(_) => Algorithm::WordPiece,
            Engine::Scaffold(_) => Algorithm::Scaffold,
            Engine::Adaptive(_) => Algorithm::Adaptive,
            Engine::Ag(_) => Algorithm::Ag,
            Engine::Boundless(_) => Algorithm::Boundless,
            Engine::Morph(_) => Algorithm::Morph,
        }
    }

    pub fn merges(&self) -> &[MergeRecord] {
        dispatch!(self, e => e.merges())
    }

    pub fn merge_count(&self) -> usize {
        dispatch!(self, e => e.merge_count())
    }

    pub fn config(&self) -> &TrainingConfig {
        dispatch!(self, e => e.config())
    }

    pub fn tokens_at_step(&self, step: usize) -> Result<Segmentation> {
        dispatch!(self, e => e.tokens_at_step(step))
    }

    pub fn snapshot_before(&self, step: usize) -> Result<Segmentation> {
        dispatch!(self, e => e.snapshot_before(step))
    }

    pub fn token_count(&self, step: usize) -> Result<u64> {
        dispatch!(self, e => e.token_count(step))
    }

    pub fn initial_token_count(&self) -> u64 {
        dispatch!(self, e => e.initial_token_count())
    }

    pub fn compression_ratio(&self, step: usize) -> Result<f64> {
        dispatch!(self, e => e.compression_ratio(step))
    }

    pub fn pair_counts_at_step(&self, step: usize) -> Result<Vec<(Pair, u64)>> {
        dispatch!(self, e => e.pair_counts_at_step(step))
    }

    pub fn vocab_at_step(&self, step: usize) -> Result<Vec<VocabEntry>> {
        dispatch!(self, e => e.vocab_at_step(step))
    }

    /// Segmentation after `step` merges, with scaffolds demolished when
    /// `demolish` is set. Only Scaffold-BPE has anything to demolish.
    pub fn display_tokens_at_step(&self, step: usize, demolish: bool) -> Result<Segmentation> {
        match self {
            Engine::Scaffold(e) if demolish => e.demolished_tokens_at_step(step),
            _ => self.tokens_at_step(step),
        }
    }

    pub fn as_scaffold(&self) -> Option<&ScaffoldBpe> {
        match self {
            Engine::Scaffold(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_adaptive(&self) -> Option<&AdaptiveBpe> {
        match self {
            Engine::Adaptive(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_boundless(&self) -> Option<&BoundlessBpe> {
        match self {
            Engine::Boundless(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_morph(&self) -> Option<&MorphBpe> {
        match self {
            Engine::Morph(e) => Some(e),
            _ => None,
        }
    }
}
