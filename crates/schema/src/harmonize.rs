//! Per-year harmonization pipeline and the audit reports it produces.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use cohortgrid_core::{Frame, RawFrame};
use serde::Serialize;

use crate::align::{align_years, AlignmentReport};
use crate::categories::CategoryAudit;
use crate::crosswalk::{resolve_crosswalk, resolve_derived, MappingReport};
use crate::dedup::{dedup_headers, DedupOutcome};
use crate::document::Harmonization;
use crate::error::SchemaError;
use crate::normalize::{normalize_frame, NormalizationReport};

#[derive(Debug, Clone)]
pub struct HarmonizedYear {
    pub frame: Frame,
    pub dedup: DedupOutcome,
    pub normalization: NormalizationReport,
    pub mapping: MappingReport,
}

/// All requested years harmonized and aligned to one schema.
#[derive(Debug, Clone)]
pub struct Harmonized {
    pub years: Vec<HarmonizedYear>,
    pub alignment: AlignmentReport,
}

impl Harmonized {
    pub fn frame(&self, year: u16) -> Option<&Frame> {
        self.years.iter().find(|y| y.frame.year == year).map(|y| &y.frame)
    }

    pub fn frames(&self) -> impl Iterator<Item = &Frame> {
        self.years.iter().map(|y| &y.frame)
    }
}

/// Crosswalk then derived chains. Running it on an already harmonized frame
/// changes nothing.
pub fn harmonize_frame(frame: &mut Frame, doc: &Harmonization) -> Result<MappingReport, SchemaError> {
    let mut report = MappingReport { year: frame.year, ..Default::default() };
    resolve_crosswalk(frame, doc, &mut report)?;
    resolve_derived(frame, doc, &mut report)?;
    Ok(report)
}

/// Dedup headers, type every column, then resolve canonical and derived names.
pub fn harmonize_year(mut raw: RawFrame, doc: &Harmonization) -> Result<HarmonizedYear, SchemaError> {
    let year = raw.year;
    if !doc.supports_year(year) {
        return Err(SchemaError::UnsupportedYear(year));
    }

    let dedup = dedup_headers(raw.headers());
    raw.set_headers(dedup.headers.clone()).map_err(SchemaError::frame(year))?;

    let (mut frame, normalization) = normalize_frame(raw, doc)?;
    let mut mapping = harmonize_frame(&mut frame, doc)?;
    mapping.header_duplicates = dedup.renamed.len();

    log::info!(
        "Harmonized year={} | renamed={} merged={} missing={} duplicates_resolved={} columns={}",
        year,
        mapping.renamed.len(),
        mapping.merged.len(),
        mapping.missing_aliases.len(),
        mapping.header_duplicates,
        frame.n_cols(),
    );
    log::info!(
        "Category normalization year={} | columns={} total_changed={}",
        year,
        normalization.categories.len(),
        normalization.total_category_changes(),
    );

    Ok(HarmonizedYear { frame, dedup, normalization, mapping })
}

/// Harmonize every sheet, then align all years to the union schema.
pub fn harmonize_all(raws: Vec<RawFrame>, doc: &Harmonization) -> Result<Harmonized, SchemaError> {
    let mut years = raws
        .into_iter()
        .map(|raw| harmonize_year(raw, doc))
        .collect::<Result<Vec<_>, _>>()?;
    years.sort_by_key(|y| y.frame.year);

    let mut frames: Vec<Frame> = years.iter_mut().map(|y| std::mem::replace(&mut y.frame, Frame::new(0, 0))).collect();
    let alignment = align_years(&mut frames, &doc.identifier)?;
    for (year, frame) in years.iter_mut().zip(frames) {
        year.frame = frame;
    }
    Ok(Harmonized { years, alignment })
}

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize)]
pub struct CategoryYear {
    pub columns: BTreeMap<String, CategoryAudit>,
    pub total_changed: usize,
}

/// Per-year category rewrite counts. Holds no cell values.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CategoryReport {
    pub generated_at: String,
    pub years: BTreeMap<u16, CategoryYear>,
}

impl CategoryReport {
    pub fn from_harmonized(harmonized: &Harmonized, generated_at: impl Into<String>) -> Self {
        let years = harmonized
            .years
            .iter()
            .map(|y| {
                let entry = CategoryYear {
                    columns: y.normalization.categories.clone(),
                    total_changed: y.normalization.total_category_changes(),
                };
                (y.frame.year, entry)
            })
            .collect();
        Self { generated_at: generated_at.into(), years }
    }

    pub fn to_markdown(&self) -> String {
        let mut out = String::from("# Category normalization\n\n");
        let _ = writeln!(out, "Generated at: {}\n", self.generated_at);
        for (year, entry) in &self.years {
            let _ = writeln!(out, "## {year}\n");
            let _ = writeln!(out, "Total changed: {}\n", entry.total_changed);
            out.push_str("| Coluna | Não nulos | Alterados | Tokens inválidos |\n");
            out.push_str("|---|---:|---:|---:|\n");
            for (column, audit) in &entry.columns {
                let _ = writeln!(
                    out,
                    "| {} | {} | {} | {} |",
                    column, audit.n_non_null, audit.n_changed, audit.invalid_tokens
                );
            }
            out.push('\n');
        }
        out
    }
}

/// Column mapping of every year plus the alignment outcome.
#[derive(Debug, Clone, Serialize)]
pub struct ColumnMappingReport {
    pub generated_at: String,
    pub years: BTreeMap<u16, MappingReport>,
    pub alignment: AlignmentReport,
}

impl ColumnMappingReport {
    pub fn from_harmonized(harmonized: &Harmonized, generated_at: impl Into<String>) -> Self {
        Self {
            generated_at: generated_at.into(),
            years: harmonized.years.iter().map(|y| (y.frame.year, y.mapping.clone())).collect(),
            alignment: harmonized.alignment.clone(),
        }
    }
}
