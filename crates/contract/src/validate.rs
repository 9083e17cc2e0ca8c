use std::collections::BTreeSet;
use std::fmt::Write as _;

use chrono::NaiveDate;
use cohortgrid_core::cell::format_number;
use cohortgrid_core::{Column, Frame, Value};
use regex::Regex;
use serde::Serialize;
use serde_json::json;

use crate::error::ContractError;
use crate::model::{ColumnContract, DataContract, Domain, Presence, Severity};

// ---------------------------------------------------------------------------
// Findings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckKind {
    Schema,
    Dtype,
    Missing,
    Domain,
}

impl std::fmt::Display for CheckKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Schema => write!(f, "schema"),
            Self::Dtype => write!(f, "dtype"),
            Self::Missing => write!(f, "missing"),
            Self::Domain => write!(f, "domain"),
        }
    }
}

/// One rule outcome. Carries column names, counts and rates, never cell values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Finding {
    pub year: u16,
    pub column: String,
    pub rule_type: CheckKind,
    pub kind: String,
    pub enforcement: Severity,
    pub message: String,
    pub metrics: serde_json::Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verdict {
    Pass,
    Fail,
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pass => write!(f, "PASS"),
            Self::Fail => write!(f, "FAIL"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SchemaSummary {
    pub contract_columns_count: usize,
    pub df_columns_count: usize,
    pub missing_columns: Vec<String>,
    pub extra_columns: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationReport {
    pub year: u16,
    pub status: Verdict,
    pub errors_count: usize,
    pub warnings_count: usize,
    pub infos_count: usize,
    pub schema: SchemaSummary,
    pub findings: Vec<Finding>,
}

impl ValidationReport {
    pub fn from_findings(year: u16, schema: SchemaSummary, findings: Vec<Finding>) -> Self {
        let count = |s: Severity| findings.iter().filter(|f| f.enforcement == s).count();
        let errors_count = count(Severity::Error);
        Self {
            year,
            status: if errors_count > 0 { Verdict::Fail } else { Verdict::Pass },
            errors_count,
            warnings_count: count(Severity::Warning),
            infos_count: count(Severity::Info),
            schema,
            findings,
        }
    }
}

// ---------------------------------------------------------------------------
// Metrics
// ---------------------------------------------------------------------------

fn rate(n: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    ((n as f64 / total as f64) * 1e6).round() / 1e6
}

fn values(column: &Column) -> impl Iterator<Item = Value<'_>> {
    (0..column.len()).map(|i| column.value(i)).filter(|v| !v.is_null())
}

fn as_number(value: Value<'_>) -> Option<f64> {
    match value {
        Value::Text(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        other => other.as_f64(),
    }
}

fn as_text(value: Value<'_>) -> String {
    match value {
        Value::Null => String::new(),
        Value::Integer(n) => n.to_string(),
        Value::Float(n) => format_number(n),
        Value::Text(s) => s.to_string(),
        Value::Date(d) => d.format("%Y-%m-%d").to_string(),
    }
}

fn as_date(value: Value<'_>) -> Option<NaiveDate> {
    match value {
        Value::Date(d) => Some(d),
        Value::Text(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok(),
        _ => None,
    }
}

struct DomainOutcome {
    violations: usize,
    metrics: serde_json::Value,
}

fn range_outcome(column: &Column, min: Option<f64>, max: Option<f64>) -> DomainOutcome {
    let (mut non_null, mut cast_invalid, mut out_of_range) = (0, 0, 0);
    for value in values(column) {
        non_null += 1;
        match as_number(value) {
            None => cast_invalid += 1,
            Some(n) if min.is_some_and(|m| n < m) || max.is_some_and(|m| n > m) => out_of_range += 1,
            Some(_) => {}
        }
    }
    let invalid = cast_invalid + out_of_range;
    DomainOutcome {
        violations: invalid,
        metrics: json!({
            "n_non_null": non_null,
            "n_cast_invalid": cast_invalid,
            "n_out_of_range": out_of_range,
            "n_invalid": invalid,
            "invalid_rate": rate(invalid, non_null),
        }),
    }
}

fn set_outcome(column: &Column, allowed: &[String]) -> DomainOutcome {
    let allowed: BTreeSet<&str> = allowed.iter().map(String::as_str).collect();
    let (mut non_null, mut not_allowed) = (0, 0);
    for value in values(column) {
        non_null += 1;
        if !allowed.contains(as_text(value).as_str()) {
            not_allowed += 1;
        }
    }
    DomainOutcome {
        violations: not_allowed,
        metrics: json!({
            "n_non_null": non_null,
            "n_not_allowed": not_allowed,
            "invalid_rate": rate(not_allowed, non_null),
        }),
    }
}

fn regex_outcome(column: &Column, pattern: &str) -> Result<DomainOutcome, ContractError> {
    let re = Regex::new(&format!("^(?:{pattern})$")).map_err(|e| ContractError::InvalidRegex {
        column: column.name.clone(),
        pattern: pattern.to_string(),
        message: e.to_string(),
    })?;
    let (mut non_null, mut not_matching) = (0, 0);
    for value in values(column) {
        non_null += 1;
        if !re.is_match(&as_text(value)) {
            not_matching += 1;
        }
    }
    Ok(DomainOutcome {
        violations: not_matching,
        metrics: json!({
            "n_non_null": non_null,
            "n_not_matching": not_matching,
            "invalid_rate": rate(not_matching, non_null),
        }),
    })
}

fn date_range_outcome(column: &Column, start: Option<NaiveDate>, end: Option<NaiveDate>) -> DomainOutcome {
    let (mut non_null, mut parse_invalid, mut out_of_range) = (0, 0, 0);
    for value in values(column) {
        non_null += 1;
        match as_date(value) {
            None => parse_invalid += 1,
            Some(d) if start.is_some_and(|s| d < s) || end.is_some_and(|e| d > e) => out_of_range += 1,
            Some(_) => {}
        }
    }
    let invalid = parse_invalid + out_of_range;
    DomainOutcome {
        violations: invalid,
        metrics: json!({
            "n_non_null": non_null,
            "n_parse_invalid": parse_invalid,
            "n_out_of_range": out_of_range,
            "n_invalid": invalid,
            "invalid_rate": rate(invalid, non_null),
        }),
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

struct Checker<'a> {
    year: u16,
    n_rows: usize,
    findings: &'a mut Vec<Finding>,
}

impl Checker<'_> {
    fn push(
        &mut self,
        column: &str,
        rule_type: CheckKind,
        kind: &str,
        enforcement: Severity,
        message: String,
        metrics: serde_json::Value,
    ) {
        self.findings.push(Finding {
            year: self.year,
            column: column.to_string(),
            rule_type,
            kind: kind.to_string(),
            enforcement,
            message: format!("[year={}] {message}", self.year),
            metrics,
        });
    }

    fn dtype(&mut self, column: &Column, declared: &ColumnContract) {
        if column.dtype() == declared.dtype {
            return;
        }
        self.push(
            &declared.name,
            CheckKind::Dtype,
            "dtype",
            declared.checks.dtype,
            format!("dtype mismatch in '{}': expected={}, observed={}", declared.name, declared.dtype, column.dtype()),
            json!({ "expected_dtype": declared.dtype, "observed_dtype": column.dtype() }),
        );
    }

    fn missing(&mut self, column: &Column, declared: &ColumnContract) {
        let rule = &declared.checks.missing;
        let missing_count = column.null_count();
        let missing_rate = rate(missing_count, self.n_rows);
        let metrics = json!({
            "allow_missing": rule.allow_missing,
            "missing_count": missing_count,
            "missing_rate": missing_rate,
        });

        if self.n_rows > 0 && missing_count == self.n_rows {
            let (kind, message) = match declared.presence {
                Presence::StructuralOptional => {
                    ("structural_missing", format!("'{}' is absent from this year's sheet", declared.name))
                }
                Presence::Original => ("all_missing", format!("original column '{}' is entirely empty", declared.name)),
            };
            self.push(&declared.name, CheckKind::Missing, kind, rule.enforcement, message, metrics);
        } else if !rule.allow_missing && missing_count > 0 {
            self.push(
                &declared.name,
                CheckKind::Missing,
                "missing",
                rule.enforcement,
                format!("missing values not allowed in '{}' (missing_rate={:.2}%)", declared.name, missing_rate * 100.0),
                metrics,
            );
        }
    }

    fn domain(&mut self, column: &Column, declared: &ColumnContract) -> Result<(), ContractError> {
        let rule = &declared.checks.domain;
        let outcome = match &rule.domain {
            Domain::None => return Ok(()),
            Domain::Range { min, max } => range_outcome(column, *min, *max),
            Domain::Set { allowed } => set_outcome(column, allowed),
            Domain::Regex { pattern } if pattern.is_empty() => return Ok(()),
            Domain::Regex { pattern } => regex_outcome(column, pattern)?,
            Domain::DateRange { start, end } => date_range_outcome(column, *start, *end),
        };
        if outcome.violations > 0 {
            let kind = rule.domain.kind();
            self.push(
                &declared.name,
                CheckKind::Domain,
                kind,
                rule.enforcement,
                format!("{kind} domain violated in '{}' (n_invalid={})", declared.name, outcome.violations),
                outcome.metrics,
            );
        }
        Ok(())
    }
}

/// Check one harmonized year-frame against its contract.
///
/// Every finding carries exactly the severity the contract declares for that
/// column and check.
pub fn validate(frame: &Frame, contract: &DataContract) -> Result<ValidationReport, ContractError> {
    let year = frame.year;
    if contract.year != year {
        return Err(ContractError::YearMismatch { contract: contract.year, frame: year });
    }

    let contract_columns: BTreeSet<&str> = contract.column_names().collect();
    let frame_columns: BTreeSet<&str> = frame.names().into_iter().collect();
    let schema = SchemaSummary {
        contract_columns_count: contract_columns.len(),
        df_columns_count: frame_columns.len(),
        missing_columns: contract_columns.difference(&frame_columns).map(|c| c.to_string()).collect(),
        extra_columns: frame_columns.difference(&contract_columns).map(|c| c.to_string()).collect(),
    };

    let mut findings = Vec::new();
    let mut checker = Checker { year, n_rows: frame.n_rows(), findings: &mut findings };

    for name in &schema.missing_columns {
        checker.push(
            name,
            CheckKind::Schema,
            "missing_column",
            contract.schema.missing_column,
            format!("expected column missing from frame: '{name}'"),
            json!({}),
        );
    }
    for name in &schema.extra_columns {
        checker.push(
            name,
            CheckKind::Schema,
            "extra_column",
            contract.schema.extra_column,
            format!("column not declared in contract: '{name}'"),
            json!({}),
        );
    }

    for declared in &contract.columns {
        let Some(column) = frame.column(&declared.name) else {
            continue;
        };
        checker.dtype(column, declared);
        checker.missing(column, declared);
        checker.domain(column, declared)?;
    }

    let report = ValidationReport::from_findings(year, schema, findings);
    log::info!(
        "Contract validation year={} | status={} errors={} warnings={} infos={} missing_cols={} extra_cols={}",
        year,
        report.status,
        report.errors_count,
        report.warnings_count,
        report.infos_count,
        report.schema.missing_columns.len(),
        report.schema.extra_columns.len(),
    );
    Ok(report)
}

// ---------------------------------------------------------------------------
// Multi-year run
// ---------------------------------------------------------------------------

/// Reports for every validated year plus the overall verdict.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationRun {
    pub generated_at: String,
    pub strict: bool,
    pub status: Verdict,
    pub years: Vec<ValidationReport>,
}

impl ValidationRun {
    pub fn new(generated_at: impl Into<String>, strict: bool) -> Self {
        Self { generated_at: generated_at.into(), strict, status: Verdict::Pass, years: Vec::new() }
    }

    pub fn push(&mut self, report: ValidationReport) {
        self.years.push(report);
        self.status = self.verdict();
    }

    /// Record a year whose contract could not be loaded as an error finding.
    pub fn push_unavailable(&mut self, year: u16, error: &ContractError) {
        log::warn!("Contract unavailable year={} | {}", year, error);
        let finding = Finding {
            year,
            column: String::new(),
            rule_type: CheckKind::Schema,
            kind: "contract_unavailable".into(),
            enforcement: Severity::Error,
            message: format!("[year={year}] {error}"),
            metrics: json!({}),
        };
        self.push(ValidationReport::from_findings(year, SchemaSummary::default(), vec![finding]));
    }

    /// `Fail` iff any year holds an error-severity finding.
    pub fn verdict(&self) -> Verdict {
        if self.error_count() > 0 {
            Verdict::Fail
        } else {
            Verdict::Pass
        }
    }

    pub fn error_count(&self) -> usize {
        self.years.iter().map(|r| r.errors_count).sum()
    }

    /// Fail only in strict mode and only on error-severity findings.
    pub fn enforce(&self) -> Result<(), ContractError> {
        if !self.strict || self.verdict() == Verdict::Pass {
            return Ok(());
        }
        let years = self.years.iter().filter(|r| r.status == Verdict::Fail).map(|r| r.year).collect();
        Err(ContractError::StrictFailure { years, errors: self.error_count() })
    }

    pub fn to_markdown(&self) -> String {
        let mut out = String::from("# Data quality report\n\n");
        let _ = writeln!(out, "Generated at: {}  ", self.generated_at);
        let _ = writeln!(out, "Strict: {}  ", self.strict);
        let _ = writeln!(out, "Status: **{}**\n", self.verdict());
        out.push_str("| Ano | Status | Errors | Warnings | Infos | Missing cols | Extra cols |\n");
        out.push_str("|---|---|---:|---:|---:|---:|---:|\n");
        for r in &self.years {
            let _ = writeln!(
                out,
                "| {} | {} | {} | {} | {} | {} | {} |",
                r.year,
                r.status,
                r.errors_count,
                r.warnings_count,
                r.infos_count,
                r.schema.missing_columns.len(),
                r.schema.extra_columns.len(),
            );
        }
        for r in &self.years {
            if r.findings.is_empty() {
                continue;
            }
            let _ = writeln!(out, "\n## {}\n", r.year);
            out.push_str("| Coluna | Check | Kind | Severity | Message |\n");
            out.push_str("|---|---|---|---|---|\n");
            for f in &r.findings {
                let _ = writeln!(
                    out,
                    "| {} | {} | {} | {} | {} |",
                    f.column,
                    f.rule_type,
                    f.kind,
                    f.enforcement,
                    f.message.replace('|', "\\|"),
                );
            }
        }
        out
    }
}
