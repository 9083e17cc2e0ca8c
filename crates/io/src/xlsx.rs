// Workbook import (xlsx, xls, xlsb, ods)

use std::path::Path;

use calamine::{open_workbook_auto, Data, Range, Reader};
use cohortgrid_core::{RawCell, RawFrame};

use crate::error::IoError;

/// One sheet to read and the survey year it holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetSpec {
    pub year: u16,
    pub name: String,
}

impl SheetSpec {
    pub fn new(year: u16, name: impl Into<String>) -> Self {
        Self { year, name: name.into() }
    }
}

/// Read each requested sheet into a [`RawFrame`], in request order.
///
/// The first row is the header row. Cells keep their spreadsheet type;
/// nothing is coerced here.
pub fn load_workbook(path: &Path, sheets: &[SheetSpec]) -> Result<Vec<RawFrame>, IoError> {
    if !path.exists() {
        return Err(IoError::DatasetMissing { path: path.to_path_buf() });
    }
    let mut workbook = open_workbook_auto(path)
        .map_err(|e| IoError::Open { path: path.to_path_buf(), message: e.to_string() })?;
    let available: Vec<String> = workbook.sheet_names().to_vec();

    let mut frames = Vec::with_capacity(sheets.len());
    for spec in sheets {
        if !available.contains(&spec.name) {
            return Err(IoError::SheetMissing { sheet: spec.name.clone(), available: available.clone() });
        }
        let range = workbook
            .worksheet_range(&spec.name)
            .map_err(|e| IoError::ReadSheet { sheet: spec.name.clone(), message: e.to_string() })?;
        let frame = frame_from_range(spec, &range);
        log::info!(
            "Loaded sheet year={} sheet={} rows={} cols={}",
            spec.year,
            spec.name,
            frame.n_rows(),
            frame.n_cols()
        );
        frames.push(frame);
    }
    Ok(frames)
}

fn frame_from_range(spec: &SheetSpec, range: &Range<Data>) -> RawFrame {
    // Data may not begin at A1; leading empty columns still count.
    let (_, start_col) = range.start().unwrap_or((0, 0));
    let lead = start_col as usize;

    let mut rows = range.rows();
    let header_cells: Vec<RawCell> = rows
        .next()
        .map(|row| std::iter::repeat(RawCell::Empty).take(lead).chain(row.iter().map(raw_cell)).collect())
        .unwrap_or_default();
    let headers: Vec<String> = header_cells
        .iter()
        .enumerate()
        .map(|(i, cell)| match cell.render() {
            Some(text) if !text.trim().is_empty() => text,
            _ => format!("Unnamed: {i}"),
        })
        .collect();

    let mut body: Vec<Vec<RawCell>> = rows
        .map(|row| std::iter::repeat(RawCell::Empty).take(lead).chain(row.iter().map(raw_cell)).collect())
        .collect();
    while body.last().is_some_and(|row: &Vec<RawCell>| row.iter().all(RawCell::is_blank)) {
        body.pop();
    }

    RawFrame::from_rows(spec.year, spec.name.clone(), headers, body)
}

fn raw_cell(data: &Data) -> RawCell {
    match data {
        Data::Empty => RawCell::Empty,
        Data::String(s) if s.is_empty() => RawCell::Empty,
        Data::String(s) => RawCell::Text(s.clone()),
        Data::Float(n) => RawCell::Number(*n),
        Data::Int(n) => RawCell::Number(*n as f64),
        Data::Bool(b) => RawCell::Bool(*b),
        Data::Error(e) => RawCell::Error(e.to_string()),
        // 1900 date system assumed; the 1904 flag is not exposed.
        Data::DateTime(dt) => RawCell::DateTime(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => RawCell::Text(s.clone()),
    }
}
