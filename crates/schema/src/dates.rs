use chrono::{Duration, NaiveDate, NaiveDateTime};
use cohortgrid_core::RawCell;
use serde::Serialize;

use crate::document::AgeRule;
use crate::normalize::{parse_decimal, Coerced};

/// Day zero of spreadsheet date serials (1900 system, leap-bug adjusted).
fn serial_epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1899, 12, 30).unwrap_or_default()
}

/// Largest serial a spreadsheet can represent (9999-12-31).
const MAX_SERIAL: f64 = 2_958_465.0;

/// Integer values in this range are read as a bare birth year.
const YEAR_RANGE: std::ops::RangeInclusive<i32> = 1900..=2100;

pub fn serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || !(1.0..=MAX_SERIAL).contains(&serial) {
        return None;
    }
    serial_epoch().checked_add_signed(Duration::days(serial.floor() as i64))
}

const YEAR_FIRST: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%Y.%m.%d"];
const YEAR_FIRST_TIME: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S%.f"];
const DAY_FIRST: &[&str] = &["%d/%m/%Y", "%d-%m-%Y", "%d.%m.%Y"];

/// Parse a calendar date, year-first formats before day-first ones.
pub fn parse_date_text(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    YEAR_FIRST
        .iter()
        .find_map(|f| NaiveDate::parse_from_str(text, f).ok())
        .or_else(|| {
            YEAR_FIRST_TIME
                .iter()
                .find_map(|f| NaiveDateTime::parse_from_str(text, f).ok().map(|dt| dt.date()))
        })
        .or_else(|| DAY_FIRST.iter().find_map(|f| NaiveDate::parse_from_str(text, f).ok()))
}

// ---------------------------------------------------------------------------
// Birth date
// ---------------------------------------------------------------------------

/// How each birth-date value was interpreted. Counts only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BirthDateAudit {
    pub from_year: usize,
    pub from_excel_serial: usize,
    pub from_string: usize,
    pub from_datetime: usize,
    pub invalid_tokens: usize,
    pub coerced: usize,
    pub null_after: usize,
}

fn birth_date_from_number(n: f64, audit: &mut BirthDateAudit) -> Coerced<NaiveDate> {
    if n.fract() == 0.0 && YEAR_RANGE.contains(&(n as i32)) && n.abs() < 1e6 {
        if let Some(date) = NaiveDate::from_ymd_opt(n as i32, 1, 1) {
            audit.from_year += 1;
            return Coerced::Value(date);
        }
    }
    match serial_to_date(n) {
        Some(date) => {
            audit.from_excel_serial += 1;
            Coerced::Value(date)
        }
        None => Coerced::Unparseable,
    }
}

pub(crate) fn coerce_birth_date(
    cell: &RawCell,
    is_invalid_token: impl Fn(&str) -> bool,
    audit: &mut BirthDateAudit,
) -> Coerced<NaiveDate> {
    let outcome = match cell {
        RawCell::Empty => Coerced::Blank,
        RawCell::Error(_) => Coerced::InvalidToken,
        RawCell::Bool(_) => Coerced::Unparseable,
        RawCell::Number(n) => birth_date_from_number(*n, audit),
        RawCell::DateTime(serial) => match serial_to_date(*serial) {
            Some(date) => {
                audit.from_datetime += 1;
                Coerced::Value(date)
            }
            None => Coerced::Unparseable,
        },
        RawCell::Text(s) => {
            let text = s.trim();
            if text.is_empty() {
                Coerced::Blank
            } else if is_invalid_token(text) {
                Coerced::InvalidToken
            } else if let Some(n) = parse_decimal(text) {
                birth_date_from_number(n, audit)
            } else if let Some(date) = parse_date_text(text) {
                audit.from_string += 1;
                Coerced::Value(date)
            } else {
                Coerced::Unparseable
            }
        }
    };
    match outcome {
        Coerced::InvalidToken => audit.invalid_tokens += 1,
        Coerced::Unparseable => audit.coerced += 1,
        _ => {}
    }
    if !matches!(outcome, Coerced::Value(_)) {
        audit.null_after += 1;
    }
    outcome
}

// ---------------------------------------------------------------------------
// Age
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AgeAudit {
    pub invalid_tokens: usize,
    pub coerced: usize,
    pub out_of_range: usize,
    /// Values stored as `1900-01-DD` dates by the spreadsheet.
    pub date_artifacts: usize,
    /// Date artifacts whose day was taken as the age.
    pub recovered_date_artifacts: usize,
}

/// Day-of-month of a `1900-01-DD` value, the shape a small integer takes
/// when a cell is formatted as a date.
fn date_artifact_day(cell: &RawCell) -> Option<i64> {
    match cell {
        // Serials below 32 display as January 1900; the serial is the day.
        RawCell::DateTime(serial) => {
            (serial.is_finite() && (1.0..32.0).contains(serial)).then(|| serial.floor() as i64)
        }
        RawCell::Text(s) => {
            let rest = s.trim().strip_prefix("1900-01-")?;
            let digits: String = rest.chars().take_while(char::is_ascii_digit).collect();
            if digits.is_empty() || digits.len() > 2 {
                return None;
            }
            digits.parse().ok()
        }
        _ => None,
    }
}

fn age_from_text(text: &str) -> Option<f64> {
    let lower = text.trim().to_lowercase();
    let number = lower
        .strip_suffix("anos")
        .or_else(|| lower.strip_suffix("ano"))
        .unwrap_or(&lower)
        .trim();
    parse_decimal(number)
}

/// Coerce an age cell.
///
/// Date artifacts are nulled, except in years listed in
/// `rule.recover_date_artifacts` where a day inside the plausible age range
/// is taken as the age. This recovers one known corruption pattern only.
pub(crate) fn coerce_age(
    cell: &RawCell,
    year: u16,
    rule: &AgeRule,
    is_invalid_token: impl Fn(&str) -> bool,
    audit: &mut AgeAudit,
) -> Coerced<i64> {
    if let Some(day) = date_artifact_day(cell) {
        audit.date_artifacts += 1;
        if rule.recover_date_artifacts.contains(&year) && rule.contains(day) {
            audit.recovered_date_artifacts += 1;
            return Coerced::Value(day);
        }
        return Coerced::Unparseable;
    }

    let number = match cell {
        RawCell::Empty => return Coerced::Blank,
        RawCell::Error(_) => {
            audit.invalid_tokens += 1;
            return Coerced::InvalidToken;
        }
        RawCell::Text(s) if s.trim().is_empty() => return Coerced::Blank,
        RawCell::Text(s) if is_invalid_token(s) => {
            audit.invalid_tokens += 1;
            return Coerced::InvalidToken;
        }
        RawCell::Text(s) => age_from_text(s),
        RawCell::Number(n) => Some(*n),
        RawCell::Bool(_) | RawCell::DateTime(_) => None,
    };

    let Some(n) = number.filter(|n| n.fract() == 0.0) else {
        audit.coerced += 1;
        return Coerced::Unparseable;
    };
    let age = n as i64;
    if !rule.contains(age) {
        audit.out_of_range += 1;
        return Coerced::Unparseable;
    }
    Coerced::Value(age)
}
