use std::collections::BTreeMap;

use cohortgrid_core::{Column, Frame};
use serde::Serialize;

use crate::dedup::matches_alias;
use crate::document::{CanonicalRule, DerivedRule, Harmonization};
use crate::error::SchemaError;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MergeRecord {
    /// Source columns in priority order.
    pub sources_used: Vec<String>,
    pub n_sources_found: usize,
}

/// Which columns each canonical name was sourced from in one year.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MappingReport {
    pub year: u16,
    pub header_duplicates: usize,
    /// Source header → canonical name, for single-alias matches.
    pub renamed: BTreeMap<String, String>,
    /// Canonical name → coalesced sources, for multi-alias matches.
    pub merged: BTreeMap<String, MergeRecord>,
    /// Optional canonical names with no alias present; added as empty columns.
    pub missing_aliases: Vec<String>,
    /// Columns matched by aliases of more than one canonical; the first rule takes them.
    pub collisions: Vec<String>,
    /// Derived name → the source column it was taken from.
    pub derived_sources: BTreeMap<String, Option<String>>,
}

fn matched_columns(frame: &Frame, aliases: &[&str]) -> Vec<String> {
    let mut matched: Vec<String> = Vec::new();
    for alias in aliases {
        for name in frame.names() {
            if matches_alias(alias, name) && !matched.iter().any(|m| m == name) {
                matched.push(name.to_string());
            }
        }
    }
    matched
}

fn resolve_rule(
    frame: &mut Frame,
    doc: &Harmonization,
    rule: &CanonicalRule,
    report: &mut MappingReport,
) -> Result<(), SchemaError> {
    let year = frame.year;
    let aliases = doc.aliases_for(rule, year);
    let matched = matched_columns(frame, &aliases);
    let wrap = SchemaError::frame(year);

    match matched.as_slice() {
        [] if rule.required => Err(SchemaError::UnresolvedCanonical {
            year,
            canonical: rule.name.clone(),
            aliases: aliases.iter().map(|a| a.to_string()).collect(),
            available: frame.names().iter().map(|n| n.to_string()).collect(),
        }),
        [] => {
            let dtype = doc.kind_of(&rule.name).dtype();
            frame
                .push_structural(Column::nulls(rule.name.as_str(), dtype, frame.n_rows()))
                .map_err(wrap)?;
            report.missing_aliases.push(rule.name.clone());
            Ok(())
        }
        [only] if *only == rule.name => Ok(()),
        [only] => {
            let at = frame.position(only).unwrap_or(frame.n_cols());
            if let Some(column) = frame.remove(only) {
                frame.insert_at(at, column.renamed(rule.name.as_str())).map_err(wrap)?;
            }
            report.renamed.insert(only.clone(), rule.name.clone());
            Ok(())
        }
        many => {
            let at = many.iter().filter_map(|n| frame.position(n)).min().unwrap_or(frame.n_cols());
            let sources: Vec<Column> = many.iter().filter_map(|n| frame.remove(n)).collect();
            let merged = Column::coalesce(rule.name.as_str(), &sources).map_err(SchemaError::frame(year))?;
            frame.insert_at(at, merged).map_err(wrap)?;
            report.merged.insert(
                rule.name.clone(),
                MergeRecord { sources_used: many.to_vec(), n_sources_found: many.len() },
            );
            Ok(())
        }
    }
}

/// Map every year alias onto its canonical name.
///
/// For each canonical rule the matching columns are taken in alias priority
/// order and coalesced row by row, first non-null wins. Sources are dropped so
/// exactly one column per canonical name remains. A frame whose columns are
/// already canonical is left untouched.
pub fn resolve_crosswalk(frame: &mut Frame, doc: &Harmonization, report: &mut MappingReport) -> Result<(), SchemaError> {
    for name in frame.names() {
        let claims = doc
            .canonical
            .iter()
            .filter(|rule| doc.aliases_for(rule, frame.year).iter().any(|a| matches_alias(a, name)))
            .count();
        if claims > 1 {
            log::warn!("Alias collision year={} | column={} claimed_by={}", frame.year, name, claims);
            report.collisions.push(name.to_string());
        }
    }
    for rule in &doc.canonical {
        resolve_rule(frame, doc, rule, report)?;
    }
    Ok(())
}

fn resolve_derived_rule(
    frame: &mut Frame,
    doc: &Harmonization,
    rule: &DerivedRule,
    report: &mut MappingReport,
) -> Result<(), SchemaError> {
    let year = frame.year;
    let chain = doc.sources_for(rule, year);
    let source = chain.iter().find(|s| frame.contains(s)).map(|s| s.to_string());

    match source.as_deref() {
        Some(s) if s == rule.name => {}
        Some(s) => {
            if let Some(column) = frame.column(s) {
                let copy = column.clone().renamed(rule.name.as_str());
                frame.replace(copy).map_err(SchemaError::frame(year))?;
            }
        }
        None => {
            log::warn!("{} source missing year={} | chain={:?}", rule.name, year, chain);
            let dtype = doc.kind_of(&rule.name).dtype();
            frame
                .push_structural(Column::nulls(rule.name.as_str(), dtype, frame.n_rows()))
                .map_err(SchemaError::frame(year))?;
        }
    }
    log::info!("{}_source={} year={}", rule.name, source.as_deref().unwrap_or("<none>"), year);
    report.derived_sources.insert(rule.name.clone(), source);
    Ok(())
}

/// Fill each derived column from the first source present in its year chain.
/// Source columns are kept.
pub fn resolve_derived(frame: &mut Frame, doc: &Harmonization, report: &mut MappingReport) -> Result<(), SchemaError> {
    for rule in &doc.derived {
        resolve_derived_rule(frame, doc, rule, report)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cohortgrid_core::{ColumnData, Value};

    const DOC: &str = r#"
identifier = "RA"
years = [2022, 2023]

[[canonical]]
name = "RA"
required = true
aliases = { "2022" = ["RA"], "2023" = ["RA"] }

[[canonical]]
name = "Defasagem"
required = true
aliases = { "2022" = ["Defasagem", "Defas"], "2023" = ["Defasagem", "Defas"] }

[[canonical]]
name = "Mat"
aliases = { "2022" = ["Matem", "Mat"] }

[[derived]]
name = "INDE"
sources = { "2023" = ["INDE 2023", "INDE 22"] }

[types]
integer = ["Defasagem"]
float = ["Mat", "INDE", "INDE 2023", "INDE 22"]
"#;

    fn doc() -> Harmonization {
        Harmonization::from_toml(DOC).unwrap()
    }

    fn ids(n: usize) -> Column {
        Column::new("RA", ColumnData::Identifier((0..n).map(|i| Some(format!("r{i}"))).collect()))
    }

    fn ints(name: &str, v: &[Option<i64>]) -> Column {
        Column::new(name, ColumnData::Integer(v.to_vec()))
    }

    fn floats(name: &str, v: &[Option<f64>]) -> Column {
        Column::new(name, ColumnData::Float(v.to_vec()))
    }

    #[test]
    fn priority_coalesce_falls_through_to_second_alias() {
        let mut frame = Frame::from_columns(
            2022,
            vec![ids(2), ints("Defasagem", &[None, Some(1)]), ints("Defas", &[Some(-2), Some(5)])],
        )
        .unwrap();
        let mut report = MappingReport::default();
        resolve_crosswalk(&mut frame, &doc(), &mut report).unwrap();

        let column = frame.column("Defasagem").unwrap();
        assert_eq!(column.value(0), Value::Integer(-2));
        assert_eq!(column.value(1), Value::Integer(1));
        assert!(!frame.contains("Defas"));
        assert_eq!(report.merged["Defasagem"].sources_used, vec!["Defasagem", "Defas"]);
    }

    #[test]
    fn duplicate_suffixed_copy_is_merged() {
        let mut frame = Frame::from_columns(
            2023,
            vec![ids(2), ints("Defasagem", &[Some(0), None]), ints("Defasagem__dup1", &[Some(9), Some(-1)])],
        )
        .unwrap();
        let mut report = MappingReport::default();
        resolve_crosswalk(&mut frame, &doc(), &mut report).unwrap();
        assert_eq!(
            frame.column("Defasagem").unwrap().data,
            ColumnData::Integer(vec![Some(0), Some(-1)])
        );
        assert_eq!(frame.names(), vec!["RA", "Defasagem"]);
    }

    #[test]
    fn single_alias_is_renamed_in_place() {
        let mut frame = Frame::from_columns(
            2022,
            vec![ids(1), floats("Matem", &[Some(7.0)]), ints("Defasagem", &[Some(0)])],
        )
        .unwrap();
        let mut report = MappingReport::default();
        resolve_crosswalk(&mut frame, &doc(), &mut report).unwrap();
        assert_eq!(frame.names(), vec!["RA", "Mat", "Defasagem"]);
        assert_eq!(report.renamed["Matem"], "Mat");
        assert!(frame.is_original("Mat"));
    }

    #[test]
    fn missing_required_canonical_is_fatal() {
        let mut frame = Frame::from_columns(2022, vec![ids(1)]).unwrap();
        let err = resolve_crosswalk(&mut frame, &doc(), &mut MappingReport::default()).unwrap_err();
        match err {
            SchemaError::UnresolvedCanonical { year, canonical, .. } => {
                assert_eq!(year, 2022);
                assert_eq!(canonical, "Defasagem");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn missing_optional_canonical_becomes_structural() {
        let mut frame = Frame::from_columns(2023, vec![ids(1), ints("Defasagem", &[Some(0)])]).unwrap();
        let mut report = MappingReport::default();
        resolve_crosswalk(&mut frame, &doc(), &mut report).unwrap();
        assert!(frame.column("Mat").unwrap().is_all_null());
        assert!(!frame.is_original("Mat"));
        assert_eq!(report.missing_aliases, vec!["Mat"]);
    }

    #[test]
    fn derived_takes_first_present_source() {
        let mut frame = Frame::from_columns(
            2023,
            vec![ids(1), floats("INDE 22", &[Some(6.0)]), floats("INDE 2023", &[Some(7.5)])],
        )
        .unwrap();
        let mut report = MappingReport::default();
        resolve_derived(&mut frame, &doc(), &mut report).unwrap();
        assert_eq!(frame.column("INDE").unwrap().value(0), Value::Float(7.5));
        assert!(frame.contains("INDE 2023"));
        assert_eq!(report.derived_sources["INDE"].as_deref(), Some("INDE 2023"));
    }

    #[test]
    fn derived_without_source_is_null() {
        let mut frame = Frame::from_columns(2022, vec![ids(2)]).unwrap();
        let mut report = MappingReport::default();
        resolve_derived(&mut frame, &doc(), &mut report).unwrap();
        assert!(frame.column("INDE").unwrap().is_all_null());
        assert_eq!(report.derived_sources["INDE"], None);
    }
}
