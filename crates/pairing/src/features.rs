use cohortgrid_core::{Dtype, Frame};
use serde::Serialize;

/// Which feature columns are numeric, categorical or datetime for one pair.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FeatureSplit {
    pub year_t: u16,
    pub year_t1: u16,
    pub n_total_features: usize,
    pub n_numeric: usize,
    pub n_categorical: usize,
    pub n_datetime: usize,
    pub numeric_cols: Vec<String>,
    pub categorical_cols: Vec<String>,
    pub datetime_cols: Vec<String>,
    /// Identifier and PII columns removed from the features.
    pub excluded_cols: Vec<String>,
    pub n_all_missing_cols: usize,
    pub all_missing_cols: Vec<String>,
    pub leakage_suspect_columns: Vec<String>,
    pub leakage_dropped_all_missing: Vec<String>,
    /// Columns only the t+1 sheet has, dropped from X(t) because they were empty.
    pub t1_only_dropped: Vec<String>,
}

impl FeatureSplit {
    /// Classify every column of `features` by its dtype.
    pub fn from_features(features: &Frame, year_t1: u16, excluded: Vec<String>) -> Self {
        let mut split = Self { year_t: features.year, year_t1, excluded_cols: excluded, ..Default::default() };
        for column in features.columns() {
            let name = column.name.clone();
            match column.dtype() {
                Dtype::Integer | Dtype::Float => split.numeric_cols.push(name.clone()),
                Dtype::DateTime => split.datetime_cols.push(name.clone()),
                Dtype::Categorical | Dtype::Identifier => split.categorical_cols.push(name.clone()),
            }
            if column.is_all_null() {
                split.all_missing_cols.push(name);
            }
        }
        split.n_total_features = features.n_cols();
        split.n_numeric = split.numeric_cols.len();
        split.n_categorical = split.categorical_cols.len();
        split.n_datetime = split.datetime_cols.len();
        split.n_all_missing_cols = split.all_missing_cols.len();
        split
    }
}
