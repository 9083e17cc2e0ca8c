use cohortgrid_core::Frame;
use serde::Serialize;

use crate::cohort::CohortIntersectionStat;
use crate::features::FeatureSplit;
use crate::label::ExclusionCounts;
use crate::leakage::LeakageReport;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PairMeta {
    pub engine_version: String,
    pub run_at: String,
    pub seed: u64,
}

impl PairMeta {
    pub fn new(seed: u64) -> Self {
        Self {
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
            seed,
        }
    }
}

/// Counts-only description of one pair. Safe to persist: it never holds
/// identifier or cell values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairAudit {
    pub year_t: u16,
    pub year_t1: u16,
    pub meta: PairMeta,
    pub cohort: CohortIntersectionStat,
    /// Distinct identifiers of year t found in year t+1.
    pub total_cohort: usize,
    pub valid: usize,
    pub positives: usize,
    pub prevalence: f64,
    pub exclusions: ExclusionCounts,
    pub n_features: usize,
    pub leakage: LeakageReport,
    pub feature_split: FeatureSplit,
}

/// Features observed in `year_t` with labels derived from `year_t1`.
///
/// Row `i` of `features`, `labels[i]` and `audit_keys[i]` describe the same
/// student. The identifier never appears among the feature columns.
#[derive(Debug, Clone)]
pub struct TemporalPair {
    pub year_t: u16,
    pub year_t1: u16,
    pub features: Frame,
    pub labels: Vec<u8>,
    pub audit_keys: Vec<String>,
    pub audit: PairAudit,
}

impl TemporalPair {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn key(&self) -> String {
        format!("{}_{}", self.year_t, self.year_t1)
    }
}
