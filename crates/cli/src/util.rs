// Shared output helpers

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::CliError;

/// RFC 3339 UTC timestamp stamped on every report.
pub fn now() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Write `{stem}.json`, plus `{stem}.md` when `markdown` is set.
pub fn write_report<T: Serialize>(
    dir: &Path,
    stem: &str,
    value: &T,
    markdown: Option<String>,
) -> Result<Vec<PathBuf>, CliError> {
    Ok(cohortgrid_io::write_report(dir, stem, value, markdown.as_deref())?)
}

/// Pretty JSON on stdout, nothing else. Used by `--json`.
pub fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    let text = serde_json::to_string_pretty(value).map_err(|e| CliError::general(format!("failed to serialize output: {e}")))?;
    println!("{text}");
    Ok(())
}
