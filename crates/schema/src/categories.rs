use cohortgrid_core::RawCell;
use regex::{Regex, RegexBuilder};
use serde::Serialize;

use crate::document::CategoryRule;
use crate::error::SchemaError;
use crate::normalize::Coerced;

/// Rewrite counts for one categorical column. Never holds values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CategoryAudit {
    pub n_non_null: usize,
    pub n_changed: usize,
    pub invalid_tokens: usize,
}

pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Compiled form of a [`CategoryRule`]. Without a rule only whitespace is
/// collapsed and blanks become null.
pub struct CategoryNormalizer<'a> {
    rule: Option<&'a CategoryRule>,
    patterns: Vec<(Regex, &'a str)>,
}

impl<'a> CategoryNormalizer<'a> {
    pub fn new(rule: Option<&'a CategoryRule>) -> Result<Self, SchemaError> {
        let mut patterns = Vec::new();
        for p in rule.map(|r| r.patterns.as_slice()).unwrap_or_default() {
            let re = RegexBuilder::new(&p.regex)
                .case_insensitive(true)
                .build()
                .map_err(|e| SchemaError::DocumentValidation(format!("category pattern '{}': {e}", p.regex)))?;
            patterns.push((re, p.replace.as_str()));
        }
        Ok(Self { rule, patterns })
    }

    pub fn apply(&self, text: &str) -> Option<String> {
        let collapsed = collapse_whitespace(text);
        if collapsed.is_empty() {
            return None;
        }
        let Some(rule) = self.rule else {
            return Some(collapsed);
        };

        let folded = collapsed.to_lowercase();
        if rule.null_tokens.iter().any(|t| t.to_lowercase() == folded) {
            return None;
        }
        if let Some(label) = rule.synonyms.get(&folded) {
            return Some(label.clone());
        }
        if let Some((re, replacement)) = self.patterns.iter().find(|(re, _)| re.is_match(&collapsed)) {
            return Some(re.replace(&collapsed, *replacement).into_owned());
        }

        let mut out = collapsed;
        if !rule.replace.is_empty() {
            for (from, to) in &rule.replace {
                out = out.replace(from.as_str(), to);
            }
            out = collapse_whitespace(&out);
        }
        if rule.upper {
            out = out.to_uppercase();
        }
        (!out.is_empty()).then_some(out)
    }
}

pub(crate) fn coerce_text(
    cell: &RawCell,
    normalizer: &CategoryNormalizer<'_>,
    is_invalid_token: impl Fn(&str) -> bool,
    audit: &mut CategoryAudit,
) -> Coerced<String> {
    let before = cell.render();
    let outcome = match cell {
        RawCell::Empty => Coerced::Blank,
        RawCell::Error(_) => Coerced::InvalidToken,
        RawCell::Text(s) if !s.trim().is_empty() && is_invalid_token(s) => Coerced::InvalidToken,
        _ => match before.as_deref().and_then(|text| normalizer.apply(text)) {
            Some(text) => Coerced::Value(text),
            None => Coerced::Blank,
        },
    };

    if matches!(outcome, Coerced::InvalidToken) {
        audit.invalid_tokens += 1;
    }
    let after = match &outcome {
        Coerced::Value(text) => Some(text.as_str()),
        _ => None,
    };
    if after.is_some() {
        audit.n_non_null += 1;
    }
    if before.as_deref() != after {
        audit.n_changed += 1;
    }
    outcome
}
