use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IoError {
    #[error("no dataset configured")]
    DatasetNotConfigured,
    #[error("dataset not found: {}", path.display())]
    DatasetMissing { path: PathBuf },
    #[error("failed to open workbook {}: {message}", path.display())]
    Open { path: PathBuf, message: String },
    #[error("sheet '{sheet}' not found; available sheets: {}", available.join(", "))]
    SheetMissing { sheet: String, available: Vec<String> },
    #[error("failed to read sheet '{sheet}': {message}")]
    ReadSheet { sheet: String, message: String },
    #[error("failed to read {}: {source}", path.display())]
    Read { path: PathBuf, #[source] source: std::io::Error },
    #[error("failed to write {}: {source}", path.display())]
    Write { path: PathBuf, #[source] source: std::io::Error },
    #[error("failed to serialize {}: {message}", path.display())]
    Serialize { path: PathBuf, message: String },
}

impl IoError {
    /// Short remedy shown next to the error by the CLI.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::DatasetNotConfigured | Self::DatasetMissing { .. } => {
                Some("pass --dataset, set DATASET_PATH or set dataset_path in cgrid.toml")
            }
            Self::SheetMissing { .. } => Some("set the [sheets] table in cgrid.toml to the workbook's sheet names"),
            _ => None,
        }
    }
}
