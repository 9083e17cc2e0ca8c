use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ContractError {
    /// No contract file for the year in the contracts directory.
    #[error("no contract for year {year} at '{}'; export the contracts first", path.display())]
    Missing { year: u16, path: PathBuf },
    #[error("cannot read contract '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot parse contract '{}': {message}", path.display())]
    Parse { path: PathBuf, message: String },
    #[error("cannot write contract '{}': {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Contract was built for another year than the frame it is applied to.
    #[error("contract is for year {contract}, frame is year {frame}")]
    YearMismatch { contract: u16, frame: u16 },
    #[error("column '{column}': invalid domain regex '{pattern}': {message}")]
    InvalidRegex { column: String, pattern: String, message: String },
    /// Strict mode and at least one error-severity finding.
    #[error("strict validation failed: {errors} error finding(s) in year(s) {years:?}")]
    StrictFailure { years: Vec<u16>, errors: usize },
}
