//! Data quality analysis tool.
//!
//! Evaluates per-column rules over a JSON dataset, proposes new rules from
//! column profiles and profiles columns for charting.
//!
//! # Guarantees
//! - Offline operation, all analysis happens in memory
//! - Logs go to stderr, reports to stdout or `--output`
//! - Inputs are never modified

use clap::Parser;
use dqscope::{Cli, execute, output::write_report};
use dqscope_core::logging::init_logging;
use tracing::error;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(cli.global.verbose, cli.global.quiet)?;
    dqscope_core::rules::initialize_rules_validator().map_err(|e| {
        dqscope_core::DqError::configuration(format!(
            "Failed to initialize rule validator: {}",
            e
        ))
    })?;

    let report = execute(&cli.command).inspect_err(|e| error!("{:#}", e))?;
    write_report(&report, cli.global.output.as_deref())
}
