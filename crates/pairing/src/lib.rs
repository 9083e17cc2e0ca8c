//! `cohortgrid-pairing`: leakage-safe temporal pairs over aligned year-frames.
//!
//! [`cohort`] measures how many students two years share, [`label`] turns the
//! later year's lag into a binary outcome, and [`engine::build_pair`] joins the
//! two years while the [`leakage`] guard keeps future information out of the
//! features.

pub mod cohort;
pub mod engine;
pub mod error;
pub mod features;
pub mod label;
pub mod leakage;
pub mod model;

pub use cohort::{cohort_report, intersection, CohortIntersectionStat, CohortReport, IdentifierSet};
pub use engine::{build_pair, PairOptions};
pub use error::PairError;
pub use features::FeatureSplit;
pub use label::{label_from, Exclusion, ExclusionCounts, LabelOutcome};
pub use leakage::{LeakageGuard, LeakageReport, DEFAULT_ALLOWLIST};
pub use model::{PairAudit, PairMeta, TemporalPair};
