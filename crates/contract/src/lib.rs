//! `cohortgrid-contract`: versioned per-year data contracts.
//!
//! [`builder`] derives a contract from an aligned year-frame, [`store`]
//! persists it as `data_contract_{year}.json`, and [`validate`] checks a frame
//! against it. Finding severities are always the ones the contract declares.

pub mod builder;
pub mod error;
pub mod model;
pub mod policy;
pub mod store;
pub mod validate;

pub use builder::{build_contract, Lineage};
pub use error::ContractError;
pub use model::{DataContract, Domain, Presence, Severity, CONTRACT_VERSION};
pub use store::{load_contract, save_contract};
pub use validate::{validate, Finding, ValidationReport, ValidationRun, Verdict};
