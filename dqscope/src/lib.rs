//! Library module for the dqscope command-line tool.
//!
//! Argument definitions and command execution live here so they can be
//! tested without spawning the binary. Every command reads JSON inputs and
//! renders a pretty-printed JSON document.

pub mod commands;
pub mod output;

use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// CLI argument structure
#[derive(Debug, Parser)]
#[command(name = "dqscope")]
#[command(about = "Offline data quality checks and rule suggestions")]
#[command(version)]
#[command(long_about = "
dqscope - Rule-based data quality analysis

Loads a tabular dataset (a JSON array of objects, or {\"headers\", \"rows\"}),
evaluates per-column quality rules against every row and proposes new rules
from column profiles.

EXAMPLES:
  dqscope check --data orders.json --rules orders.rules.json
  dqscope suggest --data orders.json --rules orders.rules.json
  dqscope profile --data orders.json --column amount --bins 20
  dqscope validate-rules orders.rules.json --data orders.json
")]
pub struct Cli {
    /// Options shared by every command
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Evaluate rules and report failing rows and scores
    Check(CheckArgs),
    /// Propose new rules from column profiles
    Suggest(SuggestArgs),
    /// Profile columns for charting
    Profile(ProfileArgs),
    /// Validate a rule-set document
    ValidateRules(ValidateRulesArgs),
}

/// Options shared by every command.
#[derive(Debug, Args)]
pub struct GlobalArgs {
    /// Increase verbosity
    #[arg(
        short,
        long,
        global = true,
        action = clap::ArgAction::Count,
        help = "Increase verbosity (-v, -vv, -vvv)"
    )]
    pub verbose: u8,

    /// Suppress output
    #[arg(short, long, global = true, help = "Suppress all log output except errors")]
    pub quiet: bool,

    /// Output file path
    #[arg(
        short,
        long,
        global = true,
        env = "DQSCOPE_OUTPUT",
        help = "Write the JSON report to a file instead of stdout"
    )]
    pub output: Option<PathBuf>,
}

/// Arguments for `check`.
#[derive(Debug, Args)]
pub struct CheckArgs {
    /// Dataset file
    #[arg(short, long, value_name = "FILE")]
    pub data: PathBuf,

    /// Rule-set document or bare rule array
    #[arg(short, long, value_name = "FILE")]
    pub rules: PathBuf,

    /// Reference instant for freshness rules
    #[arg(long, value_name = "RFC3339", help = "Evaluate as of this instant (defaults to now)")]
    pub now: Option<DateTime<Utc>>,
}

/// Arguments for `suggest`.
#[derive(Debug, Args)]
pub struct SuggestArgs {
    /// Dataset file
    #[arg(short, long, value_name = "FILE")]
    pub data: PathBuf,

    /// Active rules; coverage estimates are zero without them
    #[arg(short, long, value_name = "FILE")]
    pub rules: Option<PathBuf>,

    /// Suggestion thresholds as JSON
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Reference instant for freshness rules
    #[arg(long, value_name = "RFC3339")]
    pub now: Option<DateTime<Utc>>,

    /// Suggestion ids already applied
    #[arg(long, value_delimiter = ',')]
    pub applied: Vec<String>,

    /// Suggestion ids dismissed
    #[arg(long, value_delimiter = ',')]
    pub dismissed: Vec<String>,
}

/// Arguments for `profile`.
#[derive(Debug, Args)]
pub struct ProfileArgs {
    /// Dataset file
    #[arg(short, long, value_name = "FILE")]
    pub data: PathBuf,

    /// Profile a single column
    #[arg(short, long)]
    pub column: Option<String>,

    /// Histogram bin count (clamped to 3..=60)
    #[arg(long)]
    pub bins: Option<usize>,
}

/// Arguments for `validate-rules`.
#[derive(Debug, Args)]
pub struct ValidateRulesArgs {
    /// Rule-set document or bare rule array
    #[arg(value_name = "FILE")]
    pub rules: PathBuf,

    /// Also check that every rule targets a column of this dataset
    #[arg(short, long, value_name = "FILE")]
    pub data: Option<PathBuf>,
}

/// Executes a parsed command and returns the rendered report.
///
/// # Errors
/// Returns an error if an input file cannot be read or parsed, or if the
/// command's inputs are invalid.
pub fn execute(command: &Command) -> anyhow::Result<String> {
    let value = match command {
        Command::Check(args) => commands::check(args)?,
        Command::Suggest(args) => commands::suggest(args)?,
        Command::Profile(args) => commands::profile(args)?,
        Command::ValidateRules(args) => commands::validate_rules(args)?,
    };
    output::render(&value)
}
