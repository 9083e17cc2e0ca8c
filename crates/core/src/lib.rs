//! `cohortgrid-core`: tabular model shared by every stage of the pipeline.
//!
//! A [`RawFrame`] holds one sheet exactly as read from the workbook. A [`Frame`]
//! holds typed, named columns after normalization. Every column carries its
//! runtime type as a [`ColumnData`] variant resolved once and never re-inferred.

pub mod cell;
pub mod column;
pub mod error;
pub mod frame;

pub use cell::RawCell;
pub use column::{Column, ColumnData, Dtype, Value};
pub use error::FrameError;
pub use frame::{Frame, RawFrame};
