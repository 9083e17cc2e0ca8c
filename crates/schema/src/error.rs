use cohortgrid_core::FrameError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchemaError {
    /// TOML parse / deserialization error.
    #[error("harmonization parse error: {0}")]
    DocumentParse(String),
    /// Harmonization document validation error (bad year key, duplicate rule, etc.).
    #[error("harmonization validation error: {0}")]
    DocumentValidation(String),
    #[error("year {0} is not covered by the harmonization document")]
    UnsupportedYear(u16),
    /// A required canonical column has no matching alias in the year's sheet.
    #[error(
        "year {year}: required column '{canonical}' not found under any alias {aliases:?}; \
         available columns: {available:?}"
    )]
    UnresolvedCanonical {
        year: u16,
        canonical: String,
        aliases: Vec<String>,
        available: Vec<String>,
    },
    #[error("year {year}: {source}")]
    Frame {
        year: u16,
        #[source]
        source: FrameError,
    },
}

impl SchemaError {
    pub(crate) fn frame(year: u16) -> impl FnOnce(FrameError) -> SchemaError {
        move |source| SchemaError::Frame { year, source }
    }
}
