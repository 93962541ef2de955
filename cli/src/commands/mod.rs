//! CLI commands for the bpelab merge engines.

pub mod compare;
pub mod step;
pub mod train;
pub mod vocab;

pub use compare::CompareCommand;
pub use step::StepCommand;
pub use train::TrainCommand;
pub use vocab::VocabCommand;

use anyhow::{bail, Context, Result as AnyhowResult};
use bpelab_tokenizer::{
    Algorithm, Engine, EngineBuilder, MorphMode, NormalizationForm, DEFAULT_ALPHA,
    DEFAULT_MAX_MERGES,
};
use clap::{Args, ValueEnum};
use serde::Serialize;
use std::io::Read;
use std::path::PathBuf;

/// How results are printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Where the training text comes from. Exactly one source is required.
#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
pub struct InputArgs {
    /// Training text given inline
    #[arg(long)]
    pub text: Option<String>,

    /// Read the training text from a file
    #[arg(long)]
    pub file: Option<PathBuf>,

    /// Read the training text from stdin
    #[arg(long)]
    pub stdin: bool,
}

impl InputArgs {
    pub fn read(&self) -> AnyhowResult<String> {
        if let Some(text) = &self.text {
            return Ok(text.clone());
        }

        if let Some(path) = &self.file {
            return std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read file '{}'", path.display()));
        }

        if self.stdin {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read stdin")?;
            return Ok(buf);
        }

        bail!("No input provided. Use --text, --file, or --stdin")
    }
}

/// Engine parameters shared by every command.
#[derive(Args, Debug)]
pub struct EngineArgs {
    /// Maximum number of merges
    #[arg(short, long, default_value_t = DEFAULT_MAX_MERGES)]
    pub max_merges: usize,

    /// Domain terms for the adaptive engine (comma separated)
    #[arg(short, long, value_delimiter = ',')]
    pub domain: Vec<String>,

    /// Frequency weight for the ag engine, in [0, 1]
    #[arg(long, default_value_t = DEFAULT_ALPHA)]
    pub alpha: f64,

    /// Morph engine mode: seeding or pretokenize
    #[arg(long, default_value = "pretokenize")]
    pub morph_mode: MorphMode,

    /// Unicode normalization: none, nfc, nfd, nfkc or nfkd
    #[arg(long, default_value = "none")]
    pub normalization: NormalizationForm,
}

impl EngineArgs {
    pub fn builder(&self, algorithm: Algorithm) -> EngineBuilder {
        Engine::builder(algorithm)
            .max_merges(self.max_merges)
            .domain_vocab(self.domain.iter().cloned())
            .alpha(self.alpha)
            .morph_mode(self.morph_mode)
            .normalization(self.normalization)
    }
}

/// Resolve an optional step, defaulting to the last merge.
pub fn resolve_step(engine: &Engine, step: Option<usize>) -> usize {
    step.unwrap_or_else(|| engine.merge_count())
}

/// Print a value as pretty JSON on stdout.
pub fn print_json<T: Serialize>(value: &T) -> AnyhowResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
