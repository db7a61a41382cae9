//! Report output.

use std::path::Path;

use anyhow::Context;
use serde_json::Value;

/// Renders a report as pretty-printed JSON.
///
/// # Errors
/// Returns an error if the value cannot be serialized.
pub fn render(value: &Value) -> anyhow::Result<String> {
    serde_json::to_string_pretty(value).context("JSON serialization failed")
}

/// Writes a rendered report to `path`, or to stdout when no path is given.
///
/// # Errors
/// Returns an error if the file cannot be written.
pub fn write_report(report: &str, path: Option<&Path>) -> anyhow::Result<()> {
    match path {
        Some(path) => {
            std::fs::write(path, report)
                .with_context(|| format!("Failed to write to {}", path.display()))?;
            tracing::info!("Report saved to {}", path.display());
        }
        None => println!("{}", report),
    }
    Ok(())
}
