use thiserror::Error;

use crate::column::Dtype;

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("duplicate column '{0}'")]
    DuplicateColumn(String),
    #[error("unknown column '{0}'")]
    UnknownColumn(String),
    #[error("column '{column}': expected {expected} rows, found {found}")]
    LengthMismatch { column: String, expected: usize, found: usize },
    #[error("column '{column}': expected dtype {expected}, found {found}")]
    DtypeMismatch { column: String, expected: Dtype, found: Dtype },
    #[error("cannot coalesce '{0}' from zero candidate columns")]
    EmptyCoalesce(String),
}
