use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::FrameError;

// ---------------------------------------------------------------------------
// Dtype
// ---------------------------------------------------------------------------

/// Runtime type of a normalized column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dtype {
    Integer,
    Float,
    Categorical,
    DateTime,
    Identifier,
}

impl Dtype {
    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Integer | Self::Float)
    }
}

impl std::fmt::Display for Dtype {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Integer => write!(f, "integer"),
            Self::Float => write!(f, "float"),
            Self::Categorical => write!(f, "categorical"),
            Self::DateTime => write!(f, "datetime"),
            Self::Identifier => write!(f, "identifier"),
        }
    }
}

// ---------------------------------------------------------------------------
// Cell values
// ---------------------------------------------------------------------------

/// Borrowed view of one typed cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value<'a> {
    Null,
    Integer(i64),
    Float(f64),
    Text(&'a str),
    Date(NaiveDate),
}

impl Value<'_> {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Integer(n) => Some(*n as f64),
            Self::Float(n) => Some(*n),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Column storage
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Integer(Vec<Option<i64>>),
    Float(Vec<Option<f64>>),
    Categorical(Vec<Option<String>>),
    DateTime(Vec<Option<NaiveDate>>),
    Identifier(Vec<Option<String>>),
}

impl ColumnData {
    /// All-null column of the given type.
    pub fn nulls(dtype: Dtype, len: usize) -> Self {
        match dtype {
            Dtype::Integer => Self::Integer(vec![None; len]),
            Dtype::Float => Self::Float(vec![None; len]),
            Dtype::Categorical => Self::Categorical(vec![None; len]),
            Dtype::DateTime => Self::DateTime(vec![None; len]),
            Dtype::Identifier => Self::Identifier(vec![None; len]),
        }
    }

    pub fn dtype(&self) -> Dtype {
        match self {
            Self::Integer(_) => Dtype::Integer,
            Self::Float(_) => Dtype::Float,
            Self::Categorical(_) => Dtype::Categorical,
            Self::DateTime(_) => Dtype::DateTime,
            Self::Identifier(_) => Dtype::Identifier,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Integer(v) => v.len(),
            Self::Float(v) => v.len(),
            Self::Categorical(v) | Self::Identifier(v) => v.len(),
            Self::DateTime(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn value(&self, row: usize) -> Value<'_> {
        match self {
            Self::Integer(v) => v.get(row).copied().flatten().map_or(Value::Null, Value::Integer),
            Self::Float(v) => v.get(row).copied().flatten().map_or(Value::Null, Value::Float),
            Self::Categorical(v) | Self::Identifier(v) => v
                .get(row)
                .and_then(|c| c.as_deref())
                .map_or(Value::Null, Value::Text),
            Self::DateTime(v) => v.get(row).copied().flatten().map_or(Value::Null, Value::Date),
        }
    }

    pub fn is_null(&self, row: usize) -> bool {
        self.value(row).is_null()
    }

    pub fn null_count(&self) -> usize {
        (0..self.len()).filter(|&i| self.is_null(i)).count()
    }

    /// New column holding `rows` in the given order.
    pub fn take(&self, rows: &[usize]) -> Self {
        fn pick<T: Clone>(v: &[Option<T>], rows: &[usize]) -> Vec<Option<T>> {
            rows.iter().map(|&i| v.get(i).cloned().flatten()).collect()
        }
        match self {
            Self::Integer(v) => Self::Integer(pick(v, rows)),
            Self::Float(v) => Self::Float(pick(v, rows)),
            Self::Categorical(v) => Self::Categorical(pick(v, rows)),
            Self::DateTime(v) => Self::DateTime(pick(v, rows)),
            Self::Identifier(v) => Self::Identifier(pick(v, rows)),
        }
    }

    /// Copy `row` of `other` into `row` of `self`. Both must share a dtype.
    fn fill_from(&mut self, other: &ColumnData, row: usize) {
        match (self, other) {
            (Self::Integer(a), Self::Integer(b)) => a[row] = b[row],
            (Self::Float(a), Self::Float(b)) => a[row] = b[row],
            (Self::Categorical(a), Self::Categorical(b))
            | (Self::Identifier(a), Self::Identifier(b)) => a[row] = b[row].clone(),
            (Self::DateTime(a), Self::DateTime(b)) => a[row] = b[row],
            _ => {}
        }
    }
}

// ---------------------------------------------------------------------------
// Column
// ---------------------------------------------------------------------------

/// A named, typed column.
///
/// `invalid[i]` is set when cell `i` is null because its raw value was an
/// invalid token or could not be coerced, as opposed to being blank.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub data: ColumnData,
    pub invalid: Vec<bool>,
}

impl Column {
    pub fn new(name: impl Into<String>, data: ColumnData) -> Self {
        let invalid = vec![false; data.len()];
        Self { name: name.into(), data, invalid }
    }

    pub fn with_invalid(name: impl Into<String>, data: ColumnData, invalid: Vec<bool>) -> Self {
        Self { name: name.into(), data, invalid }
    }

    pub fn nulls(name: impl Into<String>, dtype: Dtype, len: usize) -> Self {
        Self::new(name, ColumnData::nulls(dtype, len))
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn dtype(&self) -> Dtype {
        self.data.dtype()
    }

    pub fn value(&self, row: usize) -> Value<'_> {
        self.data.value(row)
    }

    pub fn is_invalid(&self, row: usize) -> bool {
        self.invalid.get(row).copied().unwrap_or(false)
    }

    pub fn null_count(&self) -> usize {
        self.data.null_count()
    }

    pub fn is_all_null(&self) -> bool {
        self.null_count() == self.len()
    }

    pub fn take(&self, rows: &[usize]) -> Self {
        Self {
            name: self.name.clone(),
            data: self.data.take(rows),
            invalid: rows.iter().map(|&i| self.is_invalid(i)).collect(),
        }
    }

    pub fn renamed(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Row-wise coalesce: for each row the first candidate holding a value wins.
    ///
    /// A row that stays null is marked invalid when any candidate was invalid there.
    pub fn coalesce(name: impl Into<String>, candidates: &[Column]) -> Result<Column, FrameError> {
        let name = name.into();
        let Some(first) = candidates.first() else {
            return Err(FrameError::EmptyCoalesce(name));
        };
        let len = first.len();
        let dtype = first.dtype();
        for c in candidates {
            if c.dtype() != dtype {
                return Err(FrameError::DtypeMismatch {
                    column: c.name.clone(),
                    expected: dtype,
                    found: c.dtype(),
                });
            }
            if c.len() != len {
                return Err(FrameError::LengthMismatch {
                    column: c.name.clone(),
                    expected: len,
                    found: c.len(),
                });
            }
        }

        let mut data = ColumnData::nulls(dtype, len);
        let mut invalid = vec![false; len];
        for row in 0..len {
            match candidates.iter().find(|c| !c.data.is_null(row)) {
                Some(winner) => data.fill_from(&winner.data, row),
                None => invalid[row] = candidates.iter().any(|c| c.is_invalid(row)),
            }
        }
        Ok(Column { name, data, invalid })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ints(name: &str, values: &[Option<i64>]) -> Column {
        Column::new(name, ColumnData::Integer(values.to_vec()))
    }

    #[test]
    fn coalesce_first_non_null_wins() {
        let a = ints("a", &[Some(1), None, None]);
        let b = ints("b", &[Some(9), Some(2), None]);
        let out = Column::coalesce("x", &[a, b]).unwrap();
        assert_eq!(out.data, ColumnData::Integer(vec![Some(1), Some(2), None]));
        assert_eq!(out.name, "x");
    }

    #[test]
    fn coalesce_keeps_invalid_marker_when_all_null() {
        let a = Column::with_invalid("a", ColumnData::Integer(vec![None, None]), vec![true, false]);
        let b = ints("b", &[None, None]);
        let out = Column::coalesce("x", &[a, b]).unwrap();
        assert_eq!(out.invalid, vec![true, false]);
    }

    #[test]
    fn coalesce_rejects_mixed_dtypes() {
        let a = ints("a", &[Some(1)]);
        let b = Column::new("b", ColumnData::Float(vec![Some(1.0)]));
        let err = Column::coalesce("x", &[a, b]).unwrap_err();
        assert!(matches!(err, FrameError::DtypeMismatch { .. }));
    }

    #[test]
    fn take_reorders_rows_and_invalid_mask() {
        let c = Column::with_invalid(
            "c",
            ColumnData::Categorical(vec![Some("a".into()), None, Some("c".into())]),
            vec![false, true, false],
        );
        let t = c.take(&[2, 1]);
        assert_eq!(t.value(0), Value::Text("c"));
        assert!(t.value(1).is_null());
        assert_eq!(t.invalid, vec![false, true]);
    }
}
