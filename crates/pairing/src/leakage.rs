//! Name-based detection of future-year information in a feature set.

use std::collections::BTreeSet;

use regex::{Regex, RegexBuilder};
use serde::Serialize;

use crate::error::PairError;

/// Historic columns whose names look year-specific but are known features.
pub const DEFAULT_ALLOWLIST: &[&str] = &["INDE 22", "INDE 23", "Pedra 20", "Pedra 21", "Pedra 22", "Pedra 23"];

/// Suffixes a join adds to right-hand-side duplicates.
pub const MERGE_SUFFIXES: &[&str] = &["_x", "_y", "_t1"];

const BASE_PATTERNS: &[&str] = &[
    r"(_x$|_y$|_t1$|_t\+1$)",
    r"(t\+1|next[_ ]?year|ano[_ ]?seguinte)",
    r"(^y$|^target$|label|target_)",
    r"defasagem.*(t\+1|_t1|_y$)",
];

/// Base patterns plus the `INDE <t+1>` / `Pedra <t+1>` names, sorted and deduplicated.
pub fn blacklist_patterns(year_t1: Option<u16>) -> Vec<String> {
    let mut patterns: BTreeSet<String> = BASE_PATTERNS.iter().map(|p| p.to_string()).collect();
    if let Some(year) = year_t1 {
        patterns.insert(format!(r"^INDE\s*{year}$"));
        patterns.insert(format!(r"^Pedra\s*{year}$"));
        patterns.insert(format!(r"^INDE[_\s]*{year}$"));
        patterns.insert(format!(r"^Pedra[_\s]*{year}$"));
    }
    patterns.into_iter().collect()
}

pub fn has_merge_suffix(column: &str) -> bool {
    MERGE_SUFFIXES.iter().any(|s| column.ends_with(s))
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LeakageReport {
    pub n_columns: usize,
    pub n_suspect: usize,
    pub suspect_columns: Vec<String>,
    pub patterns_used: Vec<String>,
    /// Suspects removed because they held no data at all.
    pub dropped_all_missing: Vec<String>,
}

/// Compiled blacklist with a case-insensitive allowlist.
#[derive(Debug, Clone)]
pub struct LeakageGuard {
    patterns: Vec<String>,
    compiled: Vec<Regex>,
    allowlist: BTreeSet<String>,
}

impl LeakageGuard {
    pub fn new(year_t1: Option<u16>, extra_patterns: &[String], allowlist: &[String]) -> Result<Self, PairError> {
        let mut patterns: BTreeSet<String> = blacklist_patterns(year_t1).into_iter().collect();
        patterns.extend(extra_patterns.iter().cloned());
        let patterns: Vec<String> = patterns.into_iter().collect();

        let compiled = patterns
            .iter()
            .map(|p| {
                RegexBuilder::new(p)
                    .case_insensitive(true)
                    .build()
                    .map_err(|e| PairError::InvalidPattern { pattern: p.clone(), message: e.to_string() })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let allowlist = allowlist
            .iter()
            .map(|a| a.trim().to_lowercase())
            .filter(|a| !a.is_empty())
            .collect();
        Ok(Self { patterns, compiled, allowlist })
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    pub fn is_suspect(&self, column: &str) -> bool {
        let name = column.trim();
        if name.is_empty() || self.allowlist.contains(&name.to_lowercase()) {
            return false;
        }
        self.compiled.iter().any(|re| re.is_match(name))
    }

    pub fn detect<'a>(&self, columns: impl IntoIterator<Item = &'a str>) -> LeakageReport {
        let mut n_columns = 0;
        let mut suspects = BTreeSet::new();
        for column in columns {
            n_columns += 1;
            if self.is_suspect(column) {
                suspects.insert(column.to_string());
            }
        }
        LeakageReport {
            n_columns,
            n_suspect: suspects.len(),
            suspect_columns: suspects.into_iter().collect(),
            patterns_used: self.patterns.clone(),
            dropped_all_missing: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn guard(year_t1: u16) -> LeakageGuard {
        let allow: Vec<String> = DEFAULT_ALLOWLIST.iter().map(|s| s.to_string()).collect();
        LeakageGuard::new(Some(year_t1), &[], &allow).unwrap()
    }

    #[test]
    fn merge_suffixes_and_target_names_are_suspect() {
        let g = guard(2023);
        for name in ["Defasagem_y", "IAA_x", "Mat_t1", "y", "target", "label_next", "Defasagem_t+1", "ano seguinte"] {
            assert!(g.is_suspect(name), "{name}");
        }
        for name in ["Defasagem", "IAA", "Idade", "Fase_Ideal", "Pedra_Ano"] {
            assert!(!g.is_suspect(name), "{name}");
        }
    }

    #[test]
    fn next_year_columns_are_suspect_but_history_is_allowed() {
        let g = guard(2023);
        assert!(g.is_suspect("INDE 2023"));
        assert!(g.is_suspect("pedra_2023"));
        assert!(!g.is_suspect("INDE 22"));
        assert!(!g.is_suspect("Pedra 22"));
        assert!(!g.is_suspect("INDE 2024"));
    }

    #[test]
    fn allowlist_wins_over_patterns() {
        let g = LeakageGuard::new(Some(2023), &[], &["IAA_x".to_string()]).unwrap();
        assert!(!g.is_suspect("iaa_x"));
    }

    #[test]
    fn report_is_sorted() {
        let report = guard(2024).detect(["Pedra 2024", "Mat", "INDE 2024"]);
        assert_eq!(report.n_columns, 3);
        assert_eq!(report.suspect_columns, vec!["INDE 2024", "Pedra 2024"]);
        assert!(report.patterns_used.contains(&r"^INDE\s*2024$".to_string()));
    }

    #[test]
    fn bad_extra_pattern_is_rejected() {
        let err = LeakageGuard::new(None, &["(".to_string()], &[]).unwrap_err();
        assert!(matches!(err, PairError::InvalidPattern { .. }));
    }
}
