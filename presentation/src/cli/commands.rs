//! CLI command definitions

use clap::{Args, Parser, Subcommand, ValueEnum};
use conformity_domain::OutputFormat;
use std::path::PathBuf;

/// Metrics output format
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum FormatArg {
    /// One row per protocol
    Table,
    /// Pretty-printed summary JSON
    Json,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Table => OutputFormat::Table,
            FormatArg::Json => OutputFormat::Json,
        }
    }
}

/// CLI arguments for conformity-bench
#[derive(Parser, Debug)]
#[command(name = "conformity-bench")]
#[command(author, version, about = "Measure how often LLMs conform to a fabricated peer majority")]
#[command(long_about = r#"
conformity-bench asks a model multiple-choice questions after showing it the
(fabricated) answers of a panel of peers, and measures how often it gives in.

Protocols:
  Raw               no peers, the baseline
  Correct_Guidance  every peer gives the correct answer
  Wrong_Guidance    every peer gives the same wrong answer
  Trust             peers are right for several rounds, then wrong
  Doubt             peers are wrong for several rounds, then right

Configuration files are loaded from (in priority order):
1. CONFORMITY_<SECTION>__<KEY>   Environment variables
2. --config <path>               Explicit config file
3. ./conformity.toml             Project-level config
4. ~/.config/conformity-bench/config.toml   Global config

Example:
  conformity-bench run -m Qwen2-7B-Instruct -p Raw -p Trust -p Doubt
  conformity-bench run --method self-consistency --votes 5
  conformity-bench metrics -m Qwen2-7B-Instruct --format json
  conformity-bench backfill
"#)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress progress indicators
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long, global = true)]
    pub no_config: bool,

    /// Also write operation logs to this file
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run protocols against models and store the results
    Run(RunArgs),
    /// Compute metrics from stored results
    Metrics(MetricsArgs),
    /// Fill empty predictions in stored results with loose extraction
    Backfill(BackfillArgs),
    /// Show the effective configuration and any issues
    Config(ConfigArgs),
}

#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Models to evaluate (can be specified multiple times)
    #[arg(short, long, value_name = "MODEL")]
    pub model: Vec<String>,

    /// Protocols to run, in order (can be specified multiple times)
    #[arg(short, long, value_name = "PROTOCOL")]
    pub protocol: Vec<String>,

    /// Mitigation method: baseline, role, reflection or self-consistency
    #[arg(long, value_name = "METHOD")]
    pub method: Option<String>,

    /// Dataset JSON file
    #[arg(short, long, value_name = "PATH")]
    pub dataset: Option<PathBuf>,

    /// Items kept after subsampling
    #[arg(long, value_name = "N")]
    pub data_length: Option<usize>,

    /// Items in flight at once
    #[arg(short = 'j', long, value_name = "N")]
    pub concurrency: Option<usize>,

    /// Completions per item under self-consistency
    #[arg(long, value_name = "N")]
    pub votes: Option<usize>,

    /// Seed for subsampling and prompt composition
    #[arg(long, value_name = "SEED")]
    pub seed: Option<u64>,

    /// Append a JSONL transcript of every item to this file
    #[arg(long, value_name = "PATH")]
    pub transcript: Option<PathBuf>,
}

#[derive(Args, Debug, Default)]
pub struct MetricsArgs {
    /// Models to summarize (default: every model with stored results)
    #[arg(short, long, value_name = "MODEL")]
    pub model: Vec<String>,

    /// Mitigation method the results were produced with
    #[arg(long, value_name = "METHOD")]
    pub method: Option<String>,

    /// Output format (default: `output.format` from configuration)
    #[arg(short, long, value_enum)]
    pub format: Option<FormatArg>,

    /// Do not write summary files
    #[arg(long)]
    pub no_save: bool,
}

#[derive(Args, Debug, Default)]
pub struct BackfillArgs {
    /// Models to backfill (default: every model with stored results)
    #[arg(short, long, value_name = "MODEL")]
    pub model: Vec<String>,

    /// Only this mitigation method (default: all of them)
    #[arg(long, value_name = "METHOD")]
    pub method: Option<String>,
}

#[derive(Args, Debug, Default)]
pub struct ConfigArgs {
    /// Only list configuration file locations
    #[arg(long)]
    pub sources: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_run_arguments() {
        let cli = Cli::parse_from([
            "conformity-bench",
            "-vv",
            "run",
            "-m",
            "glm-4-9b-chat",
            "-p",
            "Raw",
            "-p",
            "Trust",
            "--method",
            "role",
            "-j",
            "8",
            "--quiet",
        ]);
        assert_eq!(cli.verbose, 2);
        assert!(cli.quiet);
        let Command::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.model, vec!["glm-4-9b-chat"]);
        assert_eq!(args.protocol, vec!["Raw", "Trust"]);
        assert_eq!(args.method.as_deref(), Some("role"));
        assert_eq!(args.concurrency, Some(8));
    }

    #[test]
    fn test_metrics_output_format() {
        let cli = Cli::parse_from(["conformity-bench", "metrics", "--format", "json", "--no-save"]);
        let Command::Metrics(args) = cli.command else {
            panic!("expected metrics");
        };
        assert!(args.no_save);
        assert_eq!(args.format.map(OutputFormat::from), Some(OutputFormat::Json));
    }

    #[test]
    fn test_subcommand_required() {
        assert!(Cli::try_parse_from(["conformity-bench"]).is_err());
    }
}
