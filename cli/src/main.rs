//! bpelab CLI - step through BPE-family merge engines from the terminal.
//!
//! This is the main entry point for the `bpelab` command-line tool.

mod commands;

use clap::{Parser, Subcommand};
use commands::{CompareCommand, OutputFormat, StepCommand, TrainCommand, VocabCommand};

#[derive(Parser)]
#[command(name = "bpelab")]
#[command(about = "Explore BPE-family tokenizer training step by step", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Disable logging
    #[arg(long, global = true)]
    log_disable: bool,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    output_format: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Train an engine and print its merge log
    Train(TrainCommand),
    /// Print the segmentation after a given number of merges
    Step(StepCommand),
    /// Print the vocabulary after a given number of merges
    Vocab(VocabCommand),
    /// Run every algorithm on the same text and compare the results
    Compare(CompareCommand),
}

/// Install the stderr subscriber. `RUST_LOG` overrides the `warn` default.
fn init_logging(disable: bool) {
    use tracing_subscriber::EnvFilter;

    if disable {
        return;
    }

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_disable);

    let format = cli.output_format;
    match cli.command {
        Commands::Train(cmd) => commands::train::run(cmd, format)?,
        Commands::Step(cmd) => commands::step::run(cmd, format)?,
        Commands::Vocab(cmd) => commands::vocab::run(cmd, format)?,
        Commands::Compare(cmd) => commands::compare::run(cmd, format)?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_train() {
        let cli = Cli::try_parse_from([
            "bpelab",
            "train",
            "--text",
            "low low low",
            "--algorithm",
            "scaffold",
            "--max-merges",
            "3",
            "--output-format",
            "json",
        ])
        .unwrap();
        assert_eq!(cli.output_format, OutputFormat::Json);
        assert!(!cli.log_disable);
        match cli.command {
            Commands::Train(cmd) => {
                assert_eq!(cmd.engine.max_merges, 3);
                assert_eq!(cmd.input.text.as_deref(), Some("low low low"));
            }
            _ => panic!("expected train"),
        }
    }

    #[test]
    fn test_parse_rejects_bad_values() {
        assert!(Cli::try_parse_from(["bpelab", "train", "--text", "a", "-m", "-1"]).is_err());
        assert!(Cli::try_parse_from(["bpelab", "train", "--text", "a", "-a", "gpt"]).is_err());
        assert!(Cli::try_parse_from(["bpelab", "vocab", "--text", "a", "--file", "x"]).is_err());
    }
}
