//! Temporal pair construction.
//!
//! `build_pair` inner-joins two aligned year-frames on the identifier, derives
//! labels from the later year and hands back year-t features that have passed
//! the leakage guard. Anything that could carry information from t+1 into the
//! features aborts the pair.

use std::collections::{BTreeSet, HashMap, HashSet};

use cohortgrid_core::{Column, Frame};

use crate::cohort::{identifier_at, intersection, safe_ratio, IdentifierSet};
use crate::error::PairError;
use crate::features::FeatureSplit;
use crate::label::{label_from, ExclusionCounts, LabelOutcome};
use crate::leakage::{has_merge_suffix, LeakageGuard, DEFAULT_ALLOWLIST};
use crate::model::{PairAudit, PairMeta, TemporalPair};

#[derive(Debug, Clone)]
pub struct PairOptions {
    pub identifier: String,
    /// Column of year t+1 the label is derived from.
    pub label_column: String,
    /// Columns removed from the features besides the identifier.
    pub pii: Vec<String>,
    pub seed: u64,
    pub allowlist: Vec<String>,
    pub extra_patterns: Vec<String>,
}

impl Default for PairOptions {
    fn default() -> Self {
        Self {
            identifier: "RA".to_string(),
            label_column: "Defasagem".to_string(),
            pii: Vec::new(),
            seed: 42,
            allowlist: DEFAULT_ALLOWLIST.iter().map(|s| s.to_string()).collect(),
            extra_patterns: Vec::new(),
        }
    }
}

fn require<'a>(frame: &'a Frame, column: &str) -> Result<&'a Column, PairError> {
    frame
        .column(column)
        .ok_or_else(|| PairError::MissingColumn { year: frame.year, column: column.to_string() })
}

pub fn build_pair(t: &Frame, t1: &Frame, options: &PairOptions) -> Result<TemporalPair, PairError> {
    let (year_t, year_t1) = (t.year, t1.year);
    if year_t >= year_t1 {
        return Err(PairError::InvalidPair { year_t, year_t1 });
    }
    let ids_t = require(t, &options.identifier)?;
    let ids_t1 = require(t1, &options.identifier)?;
    let label_col = require(t1, &options.label_column)?;

    // First occurrence wins on both sides.
    let mut index_t1: HashMap<String, usize> = HashMap::new();
    for row in 0..ids_t1.len() {
        if let Some(id) = identifier_at(ids_t1.value(row)) {
            index_t1.entry(id).or_insert(row);
        }
    }

    let mut seen = HashSet::new();
    let mut rows = Vec::new();
    let mut labels = Vec::new();
    let mut audit_keys = Vec::new();
    let mut exclusions = ExclusionCounts::default();
    let mut total_cohort = 0;
    for row in 0..ids_t.len() {
        let Some(id) = identifier_at(ids_t.value(row)) else { continue };
        if !seen.insert(id.clone()) {
            continue;
        }
        let Some(&row_t1) = index_t1.get(&id) else { continue };
        total_cohort += 1;
        match label_from(label_col.value(row_t1), label_col.is_invalid(row_t1)) {
            LabelOutcome::Excluded(reason) => exclusions.record(reason),
            outcome => {
                if let Some(label) = outcome.label() {
                    rows.push(row);
                    labels.push(label);
                    audit_keys.push(id);
                }
            }
        }
    }

    let mut features = t.take_rows(&rows);
    features.remove(&options.identifier);
    let mut excluded: Vec<String> = options
        .pii
        .iter()
        .filter(|name| *name != &options.identifier && features.remove(name).is_some())
        .cloned()
        .collect();
    excluded.sort();

    let t1_only: BTreeSet<String> = t1.original_columns().difference(t.original_columns()).cloned().collect();
    let t1_only_dropped = drop_t1_only(&mut features, &t1_only, year_t1)?;

    let guard = LeakageGuard::new(Some(year_t1), &options.extra_patterns, &options.allowlist)?;
    let mut leakage = guard.detect(features.names());
    let mut remaining = Vec::new();
    for name in &leakage.suspect_columns {
        if features.column(name).is_some_and(Column::is_all_null) {
            features.remove(name);
            leakage.dropped_all_missing.push(name.clone());
        } else {
            remaining.push(name.clone());
        }
    }
    if !leakage.dropped_all_missing.is_empty() {
        log::warn!(
            "Dropped all-missing leakage-suspect columns {}->{} | columns={:?}",
            year_t,
            year_t1,
            leakage.dropped_all_missing
        );
    }
    if !remaining.is_empty() {
        return Err(PairError::Leakage { year_t, year_t1, columns: remaining });
    }

    assert_no_leakage(&features, &labels, &options.identifier, &t1_only, year_t1)?;

    let mut split = FeatureSplit::from_features(&features, year_t1, excluded);
    split.leakage_suspect_columns = leakage.suspect_columns.clone();
    split.leakage_dropped_all_missing = leakage.dropped_all_missing.clone();
    split.t1_only_dropped = t1_only_dropped;

    log::info!(
        "Feature split {}->{} | total_features={} selected={} excluded={} numeric={} categorical={} datetime={} all_missing={}",
        year_t,
        year_t1,
        split.n_total_features + split.excluded_cols.len(),
        split.n_total_features,
        split.excluded_cols.len(),
        split.n_numeric,
        split.n_categorical,
        split.n_datetime,
        split.n_all_missing_cols,
    );

    let positives = labels.iter().filter(|&&y| y == 1).count();
    let prevalence = safe_ratio(positives, labels.len());
    log::info!(
        "Temporal pairs {}->{} | total_cohort={} valid={} excluded_missing={} excluded_invalid={} prevalence={:.4}",
        year_t,
        year_t1,
        total_cohort,
        labels.len(),
        exclusions.missing,
        exclusions.invalid_token,
        prevalence,
    );

    let cohort = intersection(
        &IdentifierSet::from_frame(t, &options.identifier)?,
        &IdentifierSet::from_frame(t1, &options.identifier)?,
    );
    let audit = PairAudit {
        year_t,
        year_t1,
        meta: PairMeta::new(options.seed),
        cohort,
        total_cohort,
        valid: labels.len(),
        positives,
        prevalence,
        exclusions,
        n_features: features.n_cols(),
        leakage,
        feature_split: split,
    };

    Ok(TemporalPair { year_t, year_t1, features, labels, audit_keys, audit })
}

/// Remove columns that only year t+1 observed, as long as they hold no data
/// in year t. A populated one means the frames were mixed and is fatal.
fn drop_t1_only(features: &mut Frame, t1_only: &BTreeSet<String>, year_t1: u16) -> Result<Vec<String>, PairError> {
    let present: Vec<&String> = t1_only.iter().filter(|name| features.contains(name)).collect();
    let populated: Vec<String> = present
        .iter()
        .filter(|name| features.column(name).is_some_and(|c| !c.is_all_null()))
        .map(|name| name.to_string())
        .collect();
    if !populated.is_empty() {
        return Err(PairError::Leakage { year_t: features.year, year_t1, columns: populated });
    }
    let dropped: Vec<String> = present.into_iter().cloned().collect();
    for name in &dropped {
        features.remove(name);
    }
    if !dropped.is_empty() {
        log::warn!(
            "Dropped t+1-only columns {}->{} | columns={:?}",
            features.year,
            year_t1,
            dropped
        );
    }
    Ok(dropped)
}

/// Explicit checks on the final feature set, independent of how it was built.
fn assert_no_leakage(
    features: &Frame,
    labels: &[u8],
    identifier: &str,
    t1_only: &BTreeSet<String>,
    year_t1: u16,
) -> Result<(), PairError> {
    let year_t = features.year;
    let mut leaked: Vec<String> = features
        .names()
        .into_iter()
        .filter(|name| *name == identifier || t1_only.contains(*name) || has_merge_suffix(name))
        .map(str::to_string)
        .collect();
    if !leaked.is_empty() {
        leaked.sort();
        return Err(PairError::Leakage { year_t, year_t1, columns: leaked });
    }
    if features.n_rows() != labels.len() {
        return Err(PairError::LabelInvariant {
            year_t,
            year_t1,
            message: format!("{} feature rows for {} labels", features.n_rows(), labels.len()),
        });
    }
    if labels.iter().any(|&y| y > 1) {
        return Err(PairError::LabelInvariant { year_t, year_t1, message: "labels outside {0, 1}".into() });
    }
    Ok(())
}
