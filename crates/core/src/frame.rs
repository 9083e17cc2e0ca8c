use std::collections::BTreeSet;

use crate::cell::RawCell;
use crate::column::Column;
use crate::error::FrameError;

// ---------------------------------------------------------------------------
// RawFrame
// ---------------------------------------------------------------------------

/// One year's sheet exactly as read: raw headers (possibly repeated) and
/// untyped cells, stored column-major.
#[derive(Debug, Clone)]
pub struct RawFrame {
    pub year: u16,
    pub sheet: String,
    headers: Vec<String>,
    columns: Vec<Vec<RawCell>>,
    n_rows: usize,
}

impl RawFrame {
    /// Build from row-major cells. Short rows are padded with `Empty`, cells
    /// beyond the header width are ignored.
    pub fn from_rows(
        year: u16,
        sheet: impl Into<String>,
        headers: Vec<String>,
        rows: Vec<Vec<RawCell>>,
    ) -> Self {
        let width = headers.len();
        let n_rows = rows.len();
        let mut columns: Vec<Vec<RawCell>> = (0..width).map(|_| Vec::with_capacity(n_rows)).collect();
        for row in rows {
            let mut cells = row.into_iter();
            for column in columns.iter_mut() {
                column.push(cells.next().unwrap_or(RawCell::Empty));
            }
        }
        Self { year, sheet: sheet.into(), headers, columns, n_rows }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_cols(&self) -> usize {
        self.headers.len()
    }

    /// Replace the header row. Width must not change.
    pub fn set_headers(&mut self, headers: Vec<String>) -> Result<(), FrameError> {
        if headers.len() != self.headers.len() {
            return Err(FrameError::LengthMismatch {
                column: "<headers>".into(),
                expected: self.headers.len(),
                found: headers.len(),
            });
        }
        self.headers = headers;
        Ok(())
    }

    /// Consume into `(header, cells)` pairs in sheet order.
    pub fn into_columns(self) -> impl Iterator<Item = (String, Vec<RawCell>)> {
        self.headers.into_iter().zip(self.columns)
    }
}

// ---------------------------------------------------------------------------
// Frame
// ---------------------------------------------------------------------------

/// Typed year-frame with unique column names.
///
/// `original_columns` tracks which columns carry data from the year's own
/// sheet. Columns added by [`Frame::push_structural`] exist only to align
/// schemas across years and are never original.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub year: u16,
    n_rows: usize,
    columns: Vec<Column>,
    original_columns: BTreeSet<String>,
}

impl Frame {
    pub fn new(year: u16, n_rows: usize) -> Self {
        Self { year, n_rows, columns: Vec::new(), original_columns: BTreeSet::new() }
    }

    /// All given columns are treated as original.
    pub fn from_columns(year: u16, columns: Vec<Column>) -> Result<Self, FrameError> {
        let n_rows = columns.first().map_or(0, Column::len);
        let mut frame = Self::new(year, n_rows);
        for column in columns {
            frame.push(column)?;
        }
        Ok(frame)
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn original_columns(&self) -> &BTreeSet<String> {
        &self.original_columns
    }

    pub fn is_original(&self, name: &str) -> bool {
        self.original_columns.contains(name)
    }

    fn check(&self, column: &Column) -> Result<(), FrameError> {
        if self.contains(&column.name) {
            return Err(FrameError::DuplicateColumn(column.name.clone()));
        }
        if column.len() != self.n_rows {
            return Err(FrameError::LengthMismatch {
                column: column.name.clone(),
                expected: self.n_rows,
                found: column.len(),
            });
        }
        Ok(())
    }

    /// Append a column sourced from the year's own data.
    pub fn push(&mut self, column: Column) -> Result<(), FrameError> {
        let at = self.columns.len();
        self.insert_at(at, column)
    }

    /// Insert a column sourced from the year's own data at `index`.
    pub fn insert_at(&mut self, index: usize, column: Column) -> Result<(), FrameError> {
        self.check(&column)?;
        self.original_columns.insert(column.name.clone());
        let index = index.min(self.columns.len());
        self.columns.insert(index, column);
        Ok(())
    }

    /// Append an alignment-only column. It is never marked original.
    pub fn push_structural(&mut self, column: Column) -> Result<(), FrameError> {
        self.check(&column)?;
        self.columns.push(column);
        Ok(())
    }

    /// Replace the column with the same name in place, keeping its provenance,
    /// or append it as original when absent.
    pub fn replace(&mut self, column: Column) -> Result<(), FrameError> {
        match self.position(&column.name) {
            Some(i) => {
                if column.len() != self.n_rows {
                    return Err(FrameError::LengthMismatch {
                        column: column.name.clone(),
                        expected: self.n_rows,
                        found: column.len(),
                    });
                }
                self.columns[i] = column;
                Ok(())
            }
            None => self.push(column),
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<Column> {
        let i = self.position(name)?;
        self.original_columns.remove(name);
        Some(self.columns.remove(i))
    }

    /// Reorder columns to exactly `order`.
    pub fn reorder(&mut self, order: &[String]) -> Result<(), FrameError> {
        if order.len() != self.columns.len() {
            return Err(FrameError::LengthMismatch {
                column: "<columns>".into(),
                expected: self.columns.len(),
                found: order.len(),
            });
        }
        let mut pool: Vec<Option<Column>> = std::mem::take(&mut self.columns).into_iter().map(Some).collect();
        let mut reordered = Vec::with_capacity(order.len());
        for name in order {
            let slot = pool
                .iter_mut()
                .find(|c| c.as_ref().is_some_and(|c| &c.name == name))
                .and_then(Option::take);
            match slot {
                Some(column) => reordered.push(column),
                None => {
                    self.columns = reordered.into_iter().chain(pool.into_iter().flatten()).collect();
                    return Err(FrameError::UnknownColumn(name.clone()));
                }
            }
        }
        self.columns = reordered;
        Ok(())
    }

    /// New frame restricted to `rows`, in that order. Provenance is kept.
    pub fn take_rows(&self, rows: &[usize]) -> Frame {
        Frame {
            year: self.year,
            n_rows: rows.len(),
            columns: self.columns.iter().map(|c| c.take(rows)).collect(),
            original_columns: self.original_columns.clone(),
        }
    }
}
