use std::collections::BTreeMap;

use cohortgrid_core::cell::format_number;
use cohortgrid_core::{Column, ColumnData, Frame, RawCell, RawFrame};
use serde::Serialize;

use crate::categories::{coerce_text, CategoryAudit, CategoryNormalizer};
use crate::dates::{coerce_age, coerce_birth_date, AgeAudit, BirthDateAudit};
use crate::dedup::base_name;
use crate::document::{ColumnKind, Harmonization};
use crate::error::SchemaError;

/// Result of coercing one raw cell.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Coerced<T> {
    Value(T),
    Blank,
    InvalidToken,
    Unparseable,
}

impl<T> Coerced<T> {
    /// `(value, invalid)` where `invalid` marks nulls that were not blank.
    fn into_parts(self) -> (Option<T>, bool) {
        match self {
            Self::Value(v) => (Some(v), false),
            Self::Blank => (None, false),
            Self::InvalidToken | Self::Unparseable => (None, true),
        }
    }
}

/// Parse a decimal accepting a comma as the decimal separator.
pub fn parse_decimal(text: &str) -> Option<f64> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    let owned;
    let text = if text.contains(',') && !text.contains('.') {
        owned = text.replace(',', ".");
        owned.as_str()
    } else {
        text
    };
    text.parse::<f64>().ok().filter(|n| n.is_finite())
}

// ---------------------------------------------------------------------------
// Audit
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NumericAudit {
    pub non_null_before: usize,
    pub invalid_tokens: usize,
    pub coerced: usize,
    pub non_null_after: usize,
}

/// Per-column coercion counts for one year. Keyed by the column's canonical
/// name when it is an alias, else by its header. Never holds values.
#[derive(Debug, Clone, Default, Serialize)]
pub struct NormalizationReport {
    pub year: u16,
    pub numeric: BTreeMap<String, NumericAudit>,
    pub birth_date: BTreeMap<String, BirthDateAudit>,
    pub age: BTreeMap<String, AgeAudit>,
    pub categories: BTreeMap<String, CategoryAudit>,
    pub identifier_nulls: usize,
}

impl NormalizationReport {
    pub fn total_invalid_tokens(&self) -> usize {
        self.numeric.values().map(|a| a.invalid_tokens).sum::<usize>()
            + self.birth_date.values().map(|a| a.invalid_tokens).sum::<usize>()
            + self.age.values().map(|a| a.invalid_tokens).sum::<usize>()
            + self.categories.values().map(|a| a.invalid_tokens).sum::<usize>()
    }

    pub fn total_coerced(&self) -> usize {
        self.numeric.values().map(|a| a.coerced).sum::<usize>()
            + self.birth_date.values().map(|a| a.coerced).sum::<usize>()
            + self.age.values().map(|a| a.coerced + a.out_of_range + a.date_artifacts - a.recovered_date_artifacts).sum::<usize>()
    }

    pub fn total_category_changes(&self) -> usize {
        self.categories.values().map(|a| a.n_changed).sum()
    }
}

// ---------------------------------------------------------------------------
// Numeric and identifier cells
// ---------------------------------------------------------------------------

pub(crate) fn coerce_number(
    cell: &RawCell,
    integer: bool,
    is_invalid_token: impl Fn(&str) -> bool,
    audit: &mut NumericAudit,
) -> Coerced<f64> {
    if !cell.is_blank() {
        audit.non_null_before += 1;
    }
    let outcome = match cell {
        RawCell::Empty => Coerced::Blank,
        RawCell::Text(s) if s.trim().is_empty() => Coerced::Blank,
        RawCell::Error(_) => Coerced::InvalidToken,
        RawCell::Text(s) if is_invalid_token(s) => Coerced::InvalidToken,
        RawCell::Text(s) => parse_decimal(s).map_or(Coerced::Unparseable, Coerced::Value),
        RawCell::Number(n) => Coerced::Value(*n),
        RawCell::Bool(_) | RawCell::DateTime(_) => Coerced::Unparseable,
    };
    let outcome = match outcome {
        Coerced::Value(n) if integer && n.fract() != 0.0 => Coerced::Unparseable,
        other => other,
    };
    match outcome {
        Coerced::Value(_) => audit.non_null_after += 1,
        Coerced::InvalidToken => audit.invalid_tokens += 1,
        Coerced::Unparseable => audit.coerced += 1,
        Coerced::Blank => {}
    }
    outcome
}

fn coerce_identifier(cell: &RawCell, is_invalid_token: impl Fn(&str) -> bool) -> Coerced<String> {
    match cell {
        RawCell::Empty => Coerced::Blank,
        RawCell::Error(_) => Coerced::InvalidToken,
        RawCell::Text(s) => {
            let text = s.trim();
            if text.is_empty() {
                Coerced::Blank
            } else if is_invalid_token(text) {
                Coerced::InvalidToken
            } else {
                Coerced::Value(text.to_string())
            }
        }
        RawCell::Number(n) => Coerced::Value(format_number(*n)),
        other => other.render().map_or(Coerced::Blank, Coerced::Value),
    }
}

// ---------------------------------------------------------------------------
// Column / frame normalization
// ---------------------------------------------------------------------------

fn collect<T>(cells: impl Iterator<Item = Coerced<T>>) -> (Vec<Option<T>>, Vec<bool>) {
    cells.map(Coerced::into_parts).unzip()
}

/// Name a raw header is typed and audited under.
pub fn semantic_name(doc: &Harmonization, header: &str, year: u16) -> String {
    match doc.canonical_for(header, year) {
        Some(rule) => rule.name.clone(),
        None => base_name(header).to_string(),
    }
}

/// Coerce one raw column to its semantic type.
pub fn normalize_column(
    doc: &Harmonization,
    year: u16,
    header: &str,
    cells: &[RawCell],
    report: &mut NormalizationReport,
) -> Result<Column, SchemaError> {
    let semantic = semantic_name(doc, header, year);
    let invalid = |text: &str| doc.is_invalid_token(text);

    let (data, mask) = match doc.kind_of(&semantic) {
        ColumnKind::Identifier => {
            let (values, mask) = collect(cells.iter().map(|c| coerce_identifier(c, invalid)));
            report.identifier_nulls += values.iter().filter(|v| v.is_none()).count();
            (ColumnData::Identifier(values), mask)
        }
        kind @ (ColumnKind::Integer | ColumnKind::Float) => {
            let integer = kind == ColumnKind::Integer;
            let audit = report.numeric.entry(semantic).or_default();
            let (values, mask) = collect(cells.iter().map(|c| coerce_number(c, integer, invalid, audit)));
            if integer {
                let ints = values.into_iter().map(|v| v.map(|n| n as i64)).collect();
                (ColumnData::Integer(ints), mask)
            } else {
                (ColumnData::Float(values), mask)
            }
        }
        ColumnKind::DateOfBirth => {
            let audit = report.birth_date.entry(semantic).or_default();
            let (values, mask) = collect(cells.iter().map(|c| coerce_birth_date(c, invalid, audit)));
            (ColumnData::DateTime(values), mask)
        }
        ColumnKind::Age => {
            let audit = report.age.entry(semantic).or_default();
            let (values, mask) = collect(cells.iter().map(|c| coerce_age(c, year, &doc.age, invalid, audit)));
            (ColumnData::Integer(values), mask)
        }
        ColumnKind::Text => {
            let normalizer = CategoryNormalizer::new(doc.category_rule(&semantic))?;
            let audit = report.categories.entry(semantic).or_default();
            let (values, mask) = collect(cells.iter().map(|c| coerce_text(c, &normalizer, invalid, audit)));
            (ColumnData::Categorical(values), mask)
        }
    };
    Ok(Column::with_invalid(header, data, mask))
}

/// Type every column of a header-deduplicated sheet.
pub fn normalize_frame(raw: RawFrame, doc: &Harmonization) -> Result<(Frame, NormalizationReport), SchemaError> {
    let year = raw.year;
    let mut report = NormalizationReport { year, ..Default::default() };
    let mut frame = Frame::new(year, raw.n_rows());
    for (header, cells) in raw.into_columns() {
        let column = normalize_column(doc, year, &header, &cells, &mut report)?;
        frame.push(column).map_err(SchemaError::frame(year))?;
    }
    log::info!(
        "Dtypes normalized year={} | columns={} invalid_tokens={} coerced={} category_changes={}",
        year,
        frame.n_cols(),
        report.total_invalid_tokens(),
        report.total_coerced(),
        report.total_category_changes(),
    );
    Ok((frame, report))
}
