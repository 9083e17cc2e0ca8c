use thiserror::Error;

#[derive(Debug, Error)]
pub enum PairError {
    /// Required column absent from a year-frame.
    #[error("year {year}: missing required column '{column}'")]
    MissingColumn { year: u16, column: String },
    #[error("year {year} not loaded; available years: {available:?}")]
    UnknownYear { year: u16, available: Vec<u16> },
    /// Pair years must be strictly increasing.
    #[error("invalid pair {year_t}->{year_t1}: year t must precede year t+1")]
    InvalidPair { year_t: u16, year_t1: u16 },
    /// Future-year information reached the feature set. Always fatal.
    #[error("leakage detected {year_t}->{year_t1}: {} suspect column(s): {}", columns.len(), columns.join(", "))]
    Leakage { year_t: u16, year_t1: u16, columns: Vec<String> },
    #[error("label invariant violated {year_t}->{year_t1}: {message}")]
    LabelInvariant { year_t: u16, year_t1: u16, message: String },
    #[error("invalid leakage pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },
}
