//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract; pipelines rely on them.
//!
//! # Exit Code Ranges
//!
//! | Code | Domain     | Description                                      |
//! |------|------------|--------------------------------------------------|
//! | 0    | Universal  | Success                                          |
//! | 1    | Universal  | General error (unspecified)                      |
//! | 2    | Universal  | CLI usage error (bad args, invalid settings)     |
//! | 3    | validate   | Strict mode and at least one error finding       |
//! | 4    | pairs      | Leakage detected in a feature set                |
//! | 5    | input      | Dataset or sheet missing, workbook unreadable     |
//! | 6    | schema     | Harmonization document or required column error  |
//! | 7    | contract   | Contract file unreadable or unwritable           |
//! | 8    | output     | Report artifact could not be written             |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into the relevant `From<…> for CliError`

use cohortgrid_config::ConfigError;
use cohortgrid_contract::ContractError;
use cohortgrid_io::IoError;
use cohortgrid_pairing::PairError;
use cohortgrid_schema::SchemaError;

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments or settings that fail validation.
pub const EXIT_USAGE: u8 = 2;

/// `validate --strict` found at least one `error` finding.
pub const EXIT_STRICT_FAILURE: u8 = 3;

/// A pair's features carried future-year information. Raised regardless of strict mode.
pub const EXIT_LEAKAGE: u8 = 4;

/// Dataset path unresolved, file missing, sheet missing, or workbook unreadable.
pub const EXIT_INPUT: u8 = 5;

/// Harmonization document invalid, or a required canonical column unresolved.
pub const EXIT_SCHEMA: u8 = 6;

/// Contract file could not be read, parsed or written.
pub const EXIT_CONTRACT: u8 = 7;

/// Report artifact could not be written.
pub const EXIT_OUTPUT: u8 = 8;

pub fn io_exit_code(err: &IoError) -> u8 {
    match err {
        IoError::Write { .. } | IoError::Serialize { .. } => EXIT_OUTPUT,
        _ => EXIT_INPUT,
    }
}

pub fn contract_exit_code(err: &ContractError) -> u8 {
    match err {
        ContractError::StrictFailure { .. } => EXIT_STRICT_FAILURE,
        _ => EXIT_CONTRACT,
    }
}

pub fn pair_exit_code(err: &PairError) -> u8 {
    match err {
        PairError::Leakage { .. } => EXIT_LEAKAGE,
        PairError::UnknownYear { .. } | PairError::InvalidPair { .. } | PairError::InvalidPattern { .. } => EXIT_USAGE,
        PairError::MissingColumn { .. } => EXIT_SCHEMA,
        PairError::LabelInvariant { .. } => EXIT_ERROR,
    }
}

pub fn schema_exit_code(_err: &SchemaError) -> u8 {
    EXIT_SCHEMA
}

pub fn config_exit_code(err: &ConfigError) -> u8 {
    match err {
        ConfigError::Invalid { .. } | ConfigError::Parse { .. } | ConfigError::NotFound { .. } => EXIT_USAGE,
        ConfigError::Read { .. } => EXIT_INPUT,
    }
}
