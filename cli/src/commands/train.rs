//! Train command implementation.

use super::{print_json, EngineArgs, InputArgs, OutputFormat};
use anyhow::Result as AnyhowResult;
use bpelab_core::{MergeDetail, MergeRecord};
use bpelab_tokenizer::{to_display, Algorithm, Engine};
use clap::Parser;
use serde::Serialize;

/// Train command arguments.
#[derive(Parser, Debug)]
pub struct TrainCommand {
    #[command(flatten)]
    pub input: InputArgs,

    /// Algorithm: bpe, wordpiece, scaffold, adaptive, ag, boundless or morph
    #[arg(short, long, default_value = "bpe")]
    pub algorithm: Algorithm,

    #[command(flatten)]
    pub engine: EngineArgs,
}

#[derive(Serialize)]
struct TrainReport<'a> {
    algorithm: Algorithm,
    initial_tokens: u64,
    final_tokens: u64,
    compression_ratio: f64,
    merges: &'a [MergeRecord],
}

pub fn run(cmd: TrainCommand, format: OutputFormat) -> AnyhowResult<()> {
    let text = cmd.input.read()?;
    let engine = cmd.engine.builder(cmd.algorithm).build(&text)?;
    let last = engine.merge_count();

    let report = TrainReport {
        algorithm: engine.algorithm(),
        initial_tokens: engine.initial_token_count(),
        final_tokens: engine.token_count(last)?,
        compression_ratio: engine.compression_ratio(last)?,
        merges: engine.merges(),
    };

    match format {
        OutputFormat::Json => print_json(&report)?,
        OutputFormat::Text => print_text(&engine, &report),
    }

    Ok(())
}

fn print_text(engine: &Engine, report: &TrainReport<'_>) {
    println!("Algorithm: {}", report.algorithm);
    println!("  Initial tokens: {}", report.initial_tokens);
    println!("  Merges: {} of {}", report.merges.len(), engine.config().max_merges);
    println!();

    for record in report.merges {
        println!("{}", format_merge(record));
        if let Some(detail) = format_detail(&record.detail) {
            println!("    {detail}");
        }
    }

    if report.merges.is_empty() {
        println!("No merges.");
    }

    println!();
    println!(
        "Final tokens: {} (compression {:.2}x)",
        report.final_tokens, report.compression_ratio
    );
}

/// One merge as `#k left + right -> merged (count)` with visible whitespace.
pub(crate) fn format_merge(record: &MergeRecord) -> String {
    let op = if record.is_supermerge() { '⊕' } else { '+' };
    format!(
        "#{} {} {} {} -> {} ({})",
        record.step,
        to_display(&record.pair.left),
        op,
        to_display(&record.pair.right),
        to_display(&record.merged),
        record.count
    )
}

fn format_detail(detail: &MergeDetail) -> Option<String> {
    match detail {
        MergeDetail::Plain => None,
        MergeDetail::WordPiece { score } => Some(format!("score {score:.4}")),
        MergeDetail::Scaffold { threshold, marked } => {
            if marked.is_empty() {
                return None;
            }
            let tokens: Vec<String> = marked
                .iter()
                .map(|m| format!("{} ({})", to_display(&m.token), m.remaining))
                .collect();
            Some(format!(
                "scaffolds below {threshold}: {}",
                tokens.join(", ")
            ))
        }
        MergeDetail::AttentionGuided {
            alpha,
            hybrid_score,
            frequency_score,
            attention_score,
        } => Some(format!(
            "hybrid {hybrid_score:.4} = {alpha} * {frequency_score:.4} + {:.1} * {attention_score:.4}",
            1.0 - alpha
        )),
        MergeDetail::Morph {
            morpheme_preserving,
        } => morpheme_preserving.then(|| "morpheme preserving".to_string()),
    }
}
