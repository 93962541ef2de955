//! Vocab command implementation.

use super::{print_json, resolve_step, EngineArgs, InputArgs, OutputFormat};
use anyhow::Result as AnyhowResult;
use bpelab_core::{VocabEntry, VocabSource};
use bpelab_tokenizer::{to_display, Algorithm};
use clap::Parser;
use serde::Serialize;

/// Vocab command arguments.
#[derive(Parser, Debug)]
pub struct VocabCommand {
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

    /// Only list tokens added by merges
    #[arg(long)]
    pub merged_only: bool,
}

#[derive(Serialize)]
struct VocabReport {
    algorithm: Algorithm,
    step: usize,
    size: usize,
    entries: Vec<VocabEntry>,
}

pub fn run(cmd: VocabCommand, format: OutputFormat) -> AnyhowResult<()> {
    let text = cmd.input.read()?;
    let engine = cmd.engine.builder(cmd.algorithm).build(&text)?;
    let step = resolve_step(&engine, cmd.step);

    let entries = engine.vocab_at_step(step)?;
    let size = entries.len();
    let entries = if cmd.merged_only {
        entries.into_iter().filter(|e| !e.source.is_seed()).collect()
    } else {
        entries
    };

    let report = VocabReport {
        algorithm: engine.algorithm(),
        step,
        size,
        entries,
    };

    match format {
        OutputFormat::Json => print_json(&report)?,
        OutputFormat::Text => {
            println!(
                "{} vocabulary after {} merges: {} tokens",
                report.algorithm, report.step, report.size
            );
            println!();
            for entry in &report.entries {
                println!("{}", format_entry(entry));
            }
        }
    }

    Ok(())
}

fn format_entry(entry: &VocabEntry) -> String {
    let source = match &entry.source {
        VocabSource::Merge { left, right } => {
            format!("{} + {}", to_display(left), to_display(right))
        }
        VocabSource::Supermerge { left, right } => {
            format!("{} ⊕ {}", to_display(left), to_display(right))
        }
        other => other.to_string(),
    };

    let mut line = format!("{:>5} {:<12} {}", entry.index, to_display(&entry.token), source);
    if entry.step > 0 {
        line.push_str(&format!(" @{}", entry.step));
    }
    if let Some(count) = entry.count {
        line.push_str(&format!(" ({count})"));
    }
    if entry.scaffold {
        line.push_str(" [scaffold]");
    }
    line
}
