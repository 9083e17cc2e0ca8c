use cohortgrid_core::Value;
use serde::Serialize;

/// Why a cohort row was left out of the pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Exclusion {
    /// Blank in the source sheet.
    Missing,
    /// Nulled during normalization from an invalid token or an unparseable value.
    InvalidToken,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelOutcome {
    Positive,
    Negative,
    Excluded(Exclusion),
}

impl LabelOutcome {
    pub fn label(&self) -> Option<u8> {
        match self {
            Self::Positive => Some(1),
            Self::Negative => Some(0),
            Self::Excluded(_) => None,
        }
    }
}

/// `Positive` iff the next-year value is strictly negative, `Negative` iff it
/// is a valid non-negative number. Nulls are never imputed.
pub fn label_from(value: Value<'_>, invalid: bool) -> LabelOutcome {
    let number = match value {
        Value::Null if invalid => return LabelOutcome::Excluded(Exclusion::InvalidToken),
        Value::Null => return LabelOutcome::Excluded(Exclusion::Missing),
        Value::Text(s) if s.trim().is_empty() => return LabelOutcome::Excluded(Exclusion::Missing),
        Value::Text(s) => s.trim().parse::<f64>().ok(),
        other => other.as_f64(),
    };
    match number {
        Some(n) if n.is_finite() && n < 0.0 => LabelOutcome::Positive,
        Some(n) if n.is_finite() => LabelOutcome::Negative,
        _ => LabelOutcome::Excluded(Exclusion::InvalidToken),
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ExclusionCounts {
    pub missing: usize,
    pub invalid_token: usize,
}

impl ExclusionCounts {
    pub fn record(&mut self, reason: Exclusion) {
        match reason {
            Exclusion::Missing => self.missing += 1,
            Exclusion::InvalidToken => self.invalid_token += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.missing + self.invalid_token
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_lag_is_the_positive_class() {
        let outcomes: Vec<LabelOutcome> = [Value::Integer(-1), Value::Integer(0), Value::Integer(5), Value::Null]
            .into_iter()
            .map(|v| label_from(v, false))
            .collect();
        assert_eq!(
            outcomes,
            vec![
                LabelOutcome::Positive,
                LabelOutcome::Negative,
                LabelOutcome::Negative,
                LabelOutcome::Excluded(Exclusion::Missing),
            ]
        );
        let labels: Vec<Option<u8>> = outcomes.iter().map(LabelOutcome::label).collect();
        assert_eq!(labels, vec![Some(1), Some(0), Some(0), None]);
    }

    #[test]
    fn invalid_marker_splits_the_exclusion_reason() {
        assert_eq!(label_from(Value::Null, true), LabelOutcome::Excluded(Exclusion::InvalidToken));
        assert_eq!(label_from(Value::Text("abc"), false), LabelOutcome::Excluded(Exclusion::InvalidToken));
        assert_eq!(label_from(Value::Text(" "), false), LabelOutcome::Excluded(Exclusion::Missing));
    }

    #[test]
    fn fractional_values() {
        assert_eq!(label_from(Value::Float(-0.5), false), LabelOutcome::Positive);
        assert_eq!(label_from(Value::Float(0.0), false), LabelOutcome::Negative);
    }

    #[test]
    fn counts() {
        let mut counts = ExclusionCounts::default();
        counts.record(Exclusion::Missing);
        counts.record(Exclusion::InvalidToken);
        counts.record(Exclusion::Missing);
        assert_eq!((counts.missing, counts.invalid_token, counts.total()), (2, 1, 3));
    }
}
