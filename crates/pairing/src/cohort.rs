use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;

use cohortgrid_core::{Frame, Value};
use serde::Serialize;

use crate::error::PairError;

/// Valid identifiers of one year. Blank or null identifiers are discarded
/// and only counted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentifierSet {
    pub year: u16,
    pub ids: BTreeSet<String>,
    pub invalid: usize,
}

impl IdentifierSet {
    pub fn from_frame(frame: &Frame, identifier: &str) -> Result<Self, PairError> {
        let column = frame
            .column(identifier)
            .ok_or_else(|| PairError::MissingColumn { year: frame.year, column: identifier.to_string() })?;
        let mut set = Self { year: frame.year, ..Default::default() };
        for row in 0..column.len() {
            match identifier_at(column.value(row)) {
                Some(id) => {
                    set.ids.insert(id);
                }
                None => set.invalid += 1,
            }
        }
        Ok(set)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Trimmed identifier text, or `None` when blank.
pub(crate) fn identifier_at(value: Value<'_>) -> Option<String> {
    let text = match value {
        Value::Null => return None,
        Value::Text(s) => s.trim().to_string(),
        Value::Integer(n) => n.to_string(),
        Value::Float(n) => cohortgrid_core::cell::format_number(n),
        Value::Date(d) => d.to_string(),
    };
    (!text.is_empty()).then_some(text)
}

pub fn safe_ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        return 0.0;
    }
    numerator as f64 / denominator as f64
}

// ---------------------------------------------------------------------------
// Intersection
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CohortIntersectionStat {
    pub year_a: u16,
    pub year_b: u16,
    pub intersection: usize,
    pub pct_of_year_a: f64,
    pub pct_of_year_b: f64,
    pub union: usize,
    pub jaccard: f64,
}

impl CohortIntersectionStat {
    /// From set sizes. `union = |A| + |B| - intersection`.
    pub fn from_counts(year_a: u16, size_a: usize, year_b: u16, size_b: usize, intersection: usize) -> Self {
        let union = size_a + size_b - intersection;
        Self {
            year_a,
            year_b,
            intersection,
            pct_of_year_a: safe_ratio(intersection, size_a),
            pct_of_year_b: safe_ratio(intersection, size_b),
            union,
            jaccard: safe_ratio(intersection, union),
        }
    }

    pub fn key(&self) -> String {
        format!("{}_{}", self.year_a, self.year_b)
    }
}

pub fn intersection(a: &IdentifierSet, b: &IdentifierSet) -> CohortIntersectionStat {
    let shared = a.ids.intersection(&b.ids).count();
    CohortIntersectionStat::from_counts(a.year, a.len(), b.year, b.len(), shared)
}

/// Log the pair and warn when the overlap is below `low_pct` of either year.
/// Diagnostic only.
pub fn log_intersection(stat: &CohortIntersectionStat, low_pct: f64) {
    log::info!(
        "RA pair={} | intersection={} pct_{}={:.4} pct_{}={:.4} union={} jaccard={:.4}",
        stat.key(),
        stat.intersection,
        stat.year_a,
        stat.pct_of_year_a,
        stat.year_b,
        stat.pct_of_year_b,
        stat.union,
        stat.jaccard,
    );
    if stat.pct_of_year_a < low_pct || stat.pct_of_year_b < low_pct {
        log::warn!(
            "Low cohort intersection pair={} | pct_{}={:.4} pct_{}={:.4} threshold={:.2}",
            stat.key(),
            stat.year_a,
            stat.pct_of_year_a,
            stat.year_b,
            stat.pct_of_year_b,
            low_pct,
        );
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct CohortReport {
    pub generated_at: String,
    pub years: Vec<u16>,
    pub counts: BTreeMap<u16, usize>,
    pub ra_invalid_discarded_count: BTreeMap<u16, usize>,
    pub pairs: BTreeMap<String, CohortIntersectionStat>,
}

/// Intersection stats for every requested year pair.
pub fn cohort_report<'a>(
    frames: impl IntoIterator<Item = &'a Frame>,
    identifier: &str,
    pairs: &[(u16, u16)],
    low_pct: f64,
    generated_at: impl Into<String>,
) -> Result<CohortReport, PairError> {
    let mut sets: BTreeMap<u16, IdentifierSet> = BTreeMap::new();
    for frame in frames {
        sets.insert(frame.year, IdentifierSet::from_frame(frame, identifier)?);
    }
    let available: Vec<u16> = sets.keys().copied().collect();
    let lookup = |year: u16| {
        sets.get(&year).ok_or_else(|| PairError::UnknownYear { year, available: available.clone() })
    };

    let mut stats = BTreeMap::new();
    for &(a, b) in pairs {
        let stat = intersection(lookup(a)?, lookup(b)?);
        log_intersection(&stat, low_pct);
        stats.insert(stat.key(), stat);
    }

    Ok(CohortReport {
        generated_at: generated_at.into(),
        years: available.clone(),
        counts: sets.iter().map(|(y, s)| (*y, s.len())).collect(),
        ra_invalid_discarded_count: sets.iter().map(|(y, s)| (*y, s.invalid)).collect(),
        pairs: stats,
    })
}

impl CohortReport {
    pub fn to_markdown(&self) -> String {
        let mut out = String::from("# Estatísticas de Interseção por RA\n\n");
        let _ = writeln!(out, "- Gerado em: `{}`\n", self.generated_at);
        out.push_str("| Par | Interseção | % ano A | % ano B | União | Jaccard |\n");
        out.push_str("|---|---:|---:|---:|---:|---:|\n");
        for (key, s) in &self.pairs {
            let _ = writeln!(
                out,
                "| {} | {} | {:.2}% | {:.2}% | {} | {:.4} |",
                key,
                s.intersection,
                s.pct_of_year_a * 100.0,
                s.pct_of_year_b * 100.0,
                s.union,
                s.jaccard,
            );
        }
        out.push_str("\n| Ano | RAs válidos | RAs inválidos descartados |\n");
        out.push_str("|---|---:|---:|\n");
        for year in &self.years {
            let _ = writeln!(
                out,
                "| {} | {} | {} |",
                year,
                self.counts.get(year).copied().unwrap_or(0),
                self.ra_invalid_discarded_count.get(year).copied().unwrap_or(0),
            );
        }
        out
    }
}
