use std::collections::{BTreeMap, BTreeSet};

use cohortgrid_core::{Column, Dtype, Frame};
use serde::Serialize;

use crate::error::SchemaError;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AlignmentReport {
    /// Shared column order after alignment.
    pub columns: Vec<String>,
    /// Empty columns added to each year to reach the shared schema.
    pub added: BTreeMap<u16, Vec<String>>,
    pub identical_before_alignment: bool,
}

/// Give every year the same columns in the same order.
///
/// The shared schema is the union of all column names: the identifier first,
/// then the rest sorted by name. Columns a year lacks are added as typed,
/// all-null, non-original columns. The dtype comes from the first year that
/// has the column.
pub fn align_years(frames: &mut [Frame], identifier: &str) -> Result<AlignmentReport, SchemaError> {
    let mut dtypes: BTreeMap<String, Dtype> = BTreeMap::new();
    for frame in frames.iter() {
        for column in frame.columns() {
            dtypes.entry(column.name.clone()).or_insert_with(|| column.dtype());
        }
    }

    let identical_before_alignment = frames
        .windows(2)
        .all(|w| w[0].names().iter().collect::<BTreeSet<_>>() == w[1].names().iter().collect::<BTreeSet<_>>());

    let mut order: Vec<String> = Vec::with_capacity(dtypes.len());
    if dtypes.contains_key(identifier) {
        order.push(identifier.to_string());
    }
    order.extend(dtypes.keys().filter(|k| k.as_str() != identifier).cloned());

    let mut report = AlignmentReport { columns: order.clone(), added: BTreeMap::new(), identical_before_alignment };
    for frame in frames.iter_mut() {
        let year = frame.year;
        let mut added = Vec::new();
        for (name, dtype) in &dtypes {
            if !frame.contains(name) {
                frame
                    .push_structural(Column::nulls(name.as_str(), *dtype, frame.n_rows()))
                    .map_err(SchemaError::frame(year))?;
                added.push(name.clone());
            }
        }
        frame.reorder(&order).map_err(SchemaError::frame(year))?;
        if !added.is_empty() {
            log::info!("Aligned year={} | added_columns={}", year, added.len());
        }
        report.added.insert(year, added);
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cohortgrid_core::ColumnData;

    fn frame(year: u16, columns: &[(&str, Dtype)]) -> Frame {
        Frame::from_columns(year, columns.iter().map(|(n, d)| Column::nulls(*n, *d, 2)).collect()).unwrap()
    }

    #[test]
    fn union_with_identifier_first() {
        let mut frames = vec![
            frame(2022, &[("Mat", Dtype::Float), ("RA", Dtype::Identifier), ("Cg", Dtype::Float)]),
            frame(2023, &[("RA", Dtype::Identifier), ("Mat", Dtype::Float), ("Fase", Dtype::Categorical)]),
        ];
        let report = align_years(&mut frames, "RA").unwrap();
        let expected = vec!["RA", "Cg", "Fase", "Mat"];
        assert_eq!(frames[0].names(), expected);
        assert_eq!(frames[1].names(), expected);
        assert_eq!(report.added[&2022], vec!["Fase"]);
        assert_eq!(report.added[&2023], vec!["Cg"]);
        assert!(!report.identical_before_alignment);
    }

    #[test]
    fn added_columns_are_typed_and_not_original() {
        let mut frames = vec![
            frame(2022, &[("RA", Dtype::Identifier), ("Cg", Dtype::Float)]),
            frame(2023, &[("RA", Dtype::Identifier)]),
        ];
        align_years(&mut frames, "RA").unwrap();
        let cg = frames[1].column("Cg").unwrap();
        assert_eq!(cg.data, ColumnData::Float(vec![None, None]));
        assert!(!frames[1].is_original("Cg"));
        assert!(frames[0].is_original("Cg"));
    }

    #[test]
    fn aligned_frames_are_left_unchanged() {
        let mut frames = vec![
            frame(2022, &[("RA", Dtype::Identifier), ("Mat", Dtype::Float)]),
            frame(2023, &[("RA", Dtype::Identifier), ("Mat", Dtype::Float)]),
        ];
        let before = frames.clone();
        let report = align_years(&mut frames, "RA").unwrap();
        assert_eq!(frames, before);
        assert!(report.identical_before_alignment);
    }
}
