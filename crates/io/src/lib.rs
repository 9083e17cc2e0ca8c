// File I/O: workbook import, dataset lineage, report artifacts

pub mod artifact;
pub mod error;
pub mod lineage;
pub mod xlsx;

pub use artifact::{write_json, write_report, write_text};
pub use error::IoError;
pub use lineage::{dataset_basename, resolve_dataset_path, sha256_file};
pub use xlsx::{load_workbook, SheetSpec};
