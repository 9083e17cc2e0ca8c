//! `cohortgrid-schema`: turns raw yearly sheets into harmonized, aligned frames.
//!
//! Pipeline per year: [`dedup`] makes headers unique, [`normalize`] types every
//! column (with [`dates`] and [`categories`] for the special cases),
//! [`crosswalk`] maps year aliases onto canonical names, and [`align`] brings
//! all years to one shared schema. Every rule comes from a static
//! [`Harmonization`] document.

pub mod align;
pub mod categories;
pub mod crosswalk;
pub mod dates;
pub mod dedup;
pub mod document;
pub mod error;
pub mod harmonize;
pub mod normalize;

pub use align::{align_years, AlignmentReport};
pub use crosswalk::MappingReport;
pub use dedup::{base_name, dedup_headers, DedupOutcome};
pub use document::{ColumnKind, Harmonization, EMBEDDED_HARMONIZATION};
pub use error::SchemaError;
pub use harmonize::{
    harmonize_all, harmonize_frame, harmonize_year, CategoryReport, ColumnMappingReport, Harmonized, HarmonizedYear,
};
pub use normalize::NormalizationReport;
