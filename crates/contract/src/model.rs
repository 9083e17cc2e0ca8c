use std::fmt::Write as _;

use chrono::NaiveDate;
use cohortgrid_core::Dtype;
use serde::{Deserialize, Serialize};

pub const CONTRACT_VERSION: &str = "1.0.0";

// ---------------------------------------------------------------------------
// Enforcement
// ---------------------------------------------------------------------------

/// Severity of a finding. Ordered `Info < Warning < Error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Whether a column came from the year's own sheet or was added by alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Presence {
    Original,
    StructuralOptional,
}

impl std::fmt::Display for Presence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Original => write!(f, "original"),
            Self::StructuralOptional => write!(f, "structural_optional"),
        }
    }
}

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissingRule {
    pub enforcement: Severity,
    pub allow_missing: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Domain {
    None,
    Range {
        #[serde(default)]
        min: Option<f64>,
        #[serde(default)]
        max: Option<f64>,
    },
    Set {
        allowed: Vec<String>,
    },
    DateRange {
        #[serde(default)]
        start: Option<NaiveDate>,
        #[serde(default)]
        end: Option<NaiveDate>,
    },
    Regex {
        pattern: String,
    },
}

impl Domain {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Range { .. } => "range",
            Self::Set { .. } => "set",
            Self::DateRange { .. } => "date_range",
            Self::Regex { .. } => "regex",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainRule {
    pub enforcement: Severity,
    #[serde(flatten)]
    pub domain: Domain,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnChecks {
    pub dtype: Severity,
    pub missing: MissingRule,
    pub domain: DomainRule,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnContract {
    pub name: String,
    pub dtype: Dtype,
    pub presence: Presence,
    pub pii: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub checks: ColumnChecks,
}

/// Severities for columns missing from, or not declared in, the contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaRules {
    pub missing_column: Severity,
    pub extra_column: Severity,
}

impl Default for SchemaRules {
    fn default() -> Self {
        Self { missing_column: Severity::Error, extra_column: Severity::Warning }
    }
}

// ---------------------------------------------------------------------------
// Contract
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractMetadata {
    pub contract_version: String,
    pub rows_expected: Option<usize>,
    pub dataset_basename: Option<String>,
    pub dataset_sha256: Option<String>,
    pub generated_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Versioned contract for one year. Column order is significant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataContract {
    pub year: u16,
    pub metadata: ContractMetadata,
    #[serde(default)]
    pub schema: SchemaRules,
    pub columns: Vec<ColumnContract>,
}

impl DataContract {
    pub fn column(&self, name: &str) -> Option<&ColumnContract> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "# Data Contract {}\n", self.year);
        out.push_str("| Coluna | DType | Presence | PII | Regras |\n");
        out.push_str("|---|---|---|---|---|\n");
        for column in &self.columns {
            let checks = &column.checks;
            let _ = writeln!(
                out,
                "| {} | {} | {} | {} | dtype:{}, missing:{}, domain:{}:{} |",
                column.name,
                column.dtype,
                column.presence,
                if column.pii { "yes" } else { "no" },
                checks.dtype,
                checks.missing.enforcement,
                checks.domain.domain.kind(),
                checks.domain.enforcement,
            );
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_is_flattened_with_kind_tag() {
        let rule = DomainRule {
            enforcement: Severity::Error,
            domain: Domain::Range { min: Some(0.0), max: Some(10.5) },
            notes: None,
        };
        let json = serde_json::to_value(&rule).unwrap();
        assert_eq!(json["kind"], "range");
        assert_eq!(json["enforcement"], "error");
        assert_eq!(json["max"], 10.5);

        let back: DomainRule = serde_json::from_value(json).unwrap();
        assert_eq!(back, rule);
    }

    #[test]
    fn none_domain_parses_from_kind_only() {
        let rule: DomainRule = serde_json::from_str(r#"{"enforcement":"info","kind":"none"}"#).unwrap();
        assert_eq!(rule.domain, Domain::None);
    }

    #[test]
    fn date_range_uses_iso_dates() {
        let rule: DomainRule = serde_json::from_str(
            r#"{"enforcement":"warning","kind":"date_range","start":"1990-01-01","end":"2030-12-31"}"#,
        )
        .unwrap();
        assert_eq!(
            rule.domain,
            Domain::DateRange { start: NaiveDate::from_ymd_opt(1990, 1, 1), end: NaiveDate::from_ymd_opt(2030, 12, 31) }
        );
    }

    #[test]
    fn severity_order() {
        assert!(Severity::Info < Severity::Warning);
        assert!(Severity::Warning < Severity::Error);
    }
}
