//! Log routing for the dqscope command line.
//!
//! Evaluation and heuristic passes log under the `dqscope_core` target and
//! command handling under `dqscope`. Verbosity flags raise those two targets
//! only; dependencies stay at `warn`. Setting `DQSCOPE_LOG` to a filter
//! directive (e.g. `dqscope_core::suggest=trace`) replaces the flag-derived
//! filter entirely.

use tracing::Level;
use tracing_subscriber::EnvFilter;

use crate::Result;
use crate::error::DqError;

/// Environment variable holding an explicit filter directive.
pub const LOG_ENV: &str = "DQSCOPE_LOG";

/// Maps CLI verbosity flags to a tracing level.
///
/// `quiet` wins over any verbosity count.
pub const fn level_for(verbose: u8, quiet: bool) -> Level {
    match (quiet, verbose) {
        (true, _) => Level::ERROR,
        (false, 0) => Level::INFO,
        (false, 1) => Level::DEBUG,
        (false, _) => Level::TRACE,
    }
}

/// Filter directive raising the dqscope targets to `level`.
pub fn directives(level: Level) -> String {
    let level = level.as_str().to_lowercase();
    format!("warn,dqscope={level},dqscope_core={level}")
}

fn build_filter(level: Level) -> Result<EnvFilter> {
    match EnvFilter::try_from_env(LOG_ENV) {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(directives(level))
            .map_err(|e| DqError::configuration(format!("Invalid log filter: {}", e))),
    }
}

/// Initializes logging on stderr.
///
/// Reports on stdout stay machine readable. Fails if a global subscriber is
/// already installed.
///
/// # Example
/// ```rust,no_run
/// use dqscope_core::logging::init_logging;
///
/// init_logging(1, false).expect("Failed to initialize logging");
/// ```
pub fn init_logging(verbose: u8, quiet: bool) -> Result<()> {
    let level = level_for(verbose, quiet);
    tracing_subscriber::fmt()
        .with_env_filter(build_filter(level)?)
        .with_writer(std::io::stderr)
        .with_target(level >= Level::DEBUG)
        .try_init()
        .map_err(|e| DqError::configuration(format!("Failed to initialize logging: {}", e)))
}
