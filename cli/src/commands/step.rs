//! Step command implementation.

use super::{print_json, resolve_step, EngineArgs, InputArgs, OutputFormat};
use super::train::format_merge;
use anyhow::Result as AnyhowResult;
use bpelab_core::{MergeRecord, Pair};
use bpelab_tokenizer::{join_display, to_display, Algorithm, Engine, Segment};
use clap::Parser;
use serde::Serialize;

/// Step command arguments.
#[derive(Parser, Debug)]
pub struct StepCommand {
    #[command(flatten)]
    pub input: InputArgs,

    /// Algorithm: bpe, wordpiece, scaffold, adaptive, ag, boundless or morph
    #[arg(short, long, default_value = "bpe")]
    pub algorithm: Algorithm,

    #[command(flatten)]
    pub engine: EngineArgs,

    /// Number of merges to replay (defaults to all of them)
    #[arg(short, long)]
    pub step: Option<usize>,

    /// Expand scaffold tokens into their parts (scaffold only)
    #[arg(long)]
    pub demolish: bool,

    /// Also print the ranked pair counts of the next round
    #[arg(long)]
    pub pairs: bool,
}

#[derive(Serialize)]
struct StepReport<'a> {
    algorithm: Algorithm,
    step: usize,
    merge: Option<&'a MergeRecord>,
    token_count: u64,
    compression_ratio: f64,
    segments: Vec<Segment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sequence: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pair_counts: Option<Vec<(Pair, u64)>>,
}

pub fn run(cmd: StepCommand, format: OutputFormat) -> AnyhowResult<()> {
    let text = cmd.input.read()?;
    let engine = cmd.engine.builder(cmd.algorithm).build(&text)?;
    let step = resolve_step(&engine, cmd.step);

    if cmd.demolish && engine.as_scaffold().is_none() {
        tracing::warn!(algorithm = %engine.algorithm(), "--demolish only applies to scaffold");
    }

    let report = StepReport {
        algorithm: engine.algorithm(),
        step,
        merge: step.checked_sub(1).and_then(|i| engine.merges().get(i)),
        token_count: engine.token_count(step)?,
        compression_ratio: engine.compression_ratio(step)?,
        segments: engine.display_tokens_at_step(step, cmd.demolish)?,
        sequence: engine
            .as_boundless()
            .map(|b| b.sequence_at_step(step))
            .transpose()?
            .map(|seq| seq.into_iter().map(String::from).collect()),
        pair_counts: cmd
            .pairs
            .then(|| engine.pair_counts_at_step(step))
            .transpose()?,
    };

    match format {
        OutputFormat::Json => print_json(&report)?,
        OutputFormat::Text => print_text(&engine, &report),
    }

    Ok(())
}

fn print_text(engine: &Engine, report: &StepReport<'_>) {
    println!(
        "{} after {} of {} merges",
        report.algorithm,
        report.step,
        engine.merge_count()
    );
    if let Some(record) = report.merge {
        println!("  Last merge: {}", format_merge(record));
    }
    println!(
        "  Tokens: {} (compression {:.2}x)",
        report.token_count, report.compression_ratio
    );
    println!();

    for segment in &report.segments {
        println!(
            "{:>4} x {} {}",
            segment.count,
            to_display(&segment.pre_token),
            join_display(&segment.tokens)
        );
    }

    if let Some(sequence) = &report.sequence {
        println!();
        println!("Sequence: {}", join_display(sequence));
    }

    if let Some(pairs) = &report.pair_counts {
        println!();
        println!("Next round pair counts:");
        for (pair, count) in pairs {
            println!(
                "{:>4} {} + {}",
                count,
                to_display(&pair.left),
                to_display(&pair.right)
            );
        }
    }
}
