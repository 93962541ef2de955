//! Compare command implementation.

use super::{print_json, EngineArgs, InputArgs, OutputFormat};
use anyhow::{Context, Result as AnyhowResult};
use bpelab_tokenizer::{to_display, Algorithm};
use clap::Parser;
use serde::Serialize;

/// Compare command arguments.
#[derive(Parser, Debug)]
pub struct CompareCommand {
    #[command(flatten)]
    pub input: InputArgs,

    #[command(flatten)]
    pub engine: EngineArgs,

    /// Algorithms to run (comma separated, defaults to all)
    #[arg(short, long, value_delimiter = ',')]
    pub algorithms: Vec<Algorithm>,
}

#[derive(Serialize)]
struct CompareRow {
    algorithm: Algorithm,
    merges: usize,
    initial_tokens: u64,
    final_tokens: u64,
    compression_ratio: f64,
    vocab_size: usize,
    last_merge: Option<String>,
}

pub fn run(cmd: CompareCommand, format: OutputFormat) -> AnyhowResult<()> {
    let text = cmd.input.read()?;
    let algorithms = if cmd.algorithms.is_empty() {
        Algorithm::ALL.to_vec()
    } else {
        cmd.algorithms.clone()
    };

    let mut rows = Vec::with_capacity(algorithms.len());
    for algorithm in algorithms {
        let engine = cmd
            .engine
            .builder(algorithm)
            .build(&text)
            .with_context(|| format!("Failed to build {algorithm}"))?;
        let last = engine.merge_count();

        rows.push(CompareRow {
            algorithm,
            merges: last,
            initial_tokens: engine.initial_token_count(),
            final_tokens: engine.token_count(last)?,
            compression_ratio: engine.compression_ratio(last)?,
            vocab_size: engine.vocab_at_step(last)?.len(),
            last_merge: engine.merges().last().map(|m| m.merged.to_string()),
        });
    }

    match format {
        OutputFormat::Json => print_json(&rows)?,
        OutputFormat::Text => {
            println!(
                "{:<10} {:>6} {:>8} {:>8} {:>6} {:>6}  last merge",
                "algorithm", "merges", "initial", "final", "ratio", "vocab"
            );
            for row in &rows {
                println!(
                    "{:<10} {:>6} {:>8} {:>8} {:>6.2} {:>6}  {}",
                    row.algorithm.name(),
                    row.merges,
                    row.initial_tokens,
                    row.final_tokens,
                    row.compression_ratio,
                    row.vocab_size,
                    row.last_merge.as_deref().map_or_else(|| "-".into(), to_display)
                );
            }
        }
    }

    Ok(())
}
