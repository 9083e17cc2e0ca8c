use std::collections::{BTreeMap, BTreeSet};

use cohortgrid_core::Dtype;
use regex::Regex;
use serde::Deserialize;

use crate::dedup::matches_alias;
use crate::error::SchemaError;

/// Harmonization rules shipped with the crate.
pub const EMBEDDED_HARMONIZATION: &str = include_str!("../data/harmonization.toml");

// ---------------------------------------------------------------------------
// Serialized form
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct RawDocument {
    identifier: String,
    years: Vec<u16>,
    #[serde(default)]
    invalid_tokens: Vec<String>,
    #[serde(default)]
    pii: Vec<String>,
    #[serde(default)]
    canonical: Vec<RawYearTable>,
    #[serde(default)]
    derived: Vec<RawDerived>,
    #[serde(default)]
    types: TypeRules,
    #[serde(default)]
    age: AgeRule,
    #[serde(default)]
    categories: Vec<CategoryRule>,
}

#[derive(Debug, Deserialize)]
struct RawYearTable {
    name: String,
    #[serde(default)]
    required: bool,
    #[serde(default)]
    aliases: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct RawDerived {
    name: String,
    sources: BTreeMap<String, Vec<String>>,
}

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

/// `{canonical_name, ordered aliases per year}`.
#[derive(Debug, Clone)]
pub struct CanonicalRule {
    pub name: String,
    pub required: bool,
    pub aliases: BTreeMap<u16, Vec<String>>,
}

/// Per-year fallback chain over year-suffixed source columns.
#[derive(Debug, Clone)]
pub struct DerivedRule {
    pub name: String,
    pub sources: BTreeMap<u16, Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TypeRules {
    #[serde(default)]
    pub integer: Vec<String>,
    #[serde(default)]
    pub float: Vec<String>,
    #[serde(default)]
    pub date_of_birth: Vec<String>,
    #[serde(default)]
    pub age: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AgeRule {
    #[serde(default = "default_age_min")]
    pub min: i64,
    #[serde(default = "default_age_max")]
    pub max: i64,
    #[serde(default)]
    pub recover_date_artifacts: Vec<u16>,
}

fn default_age_min() -> i64 {
    3
}

fn default_age_max() -> i64 {
    30
}

impl Default for AgeRule {
    fn default() -> Self {
        Self { min: default_age_min(), max: default_age_max(), recover_date_artifacts: Vec::new() }
    }
}

impl AgeRule {
    pub fn contains(&self, age: i64) -> bool {
        (self.min..=self.max).contains(&age)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CategoryRule {
    pub columns: Vec<String>,
    /// Lower-cased value → canonical label.
    #[serde(default)]
    pub synonyms: BTreeMap<String, String>,
    /// Lower-cased values that become null.
    #[serde(default)]
    pub null_tokens: Vec<String>,
    #[serde(default)]
    pub upper: bool,
    #[serde(default)]
    pub patterns: Vec<PatternRule>,
    /// Literal substring replacements.
    #[serde(default)]
    pub replace: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PatternRule {
    pub regex: String,
    pub replace: String,
}

/// Semantic type a raw column is coerced to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Identifier,
    Integer,
    Float,
    DateOfBirth,
    Age,
    Text,
}

impl ColumnKind {
    pub fn dtype(&self) -> Dtype {
        match self {
            Self::Identifier => Dtype::Identifier,
            Self::Integer | Self::Age => Dtype::Integer,
            Self::Float => Dtype::Float,
            Self::DateOfBirth => Dtype::DateTime,
            Self::Text => Dtype::Categorical,
        }
    }
}

// ---------------------------------------------------------------------------
// Document
// ---------------------------------------------------------------------------

/// The static crosswalk / typing / category document, loaded once per run.
#[derive(Debug, Clone)]
pub struct Harmonization {
    pub identifier: String,
    pub years: Vec<u16>,
    pub invalid_tokens: Vec<String>,
    pub pii: BTreeSet<String>,
    pub canonical: Vec<CanonicalRule>,
    pub derived: Vec<DerivedRule>,
    pub types: TypeRules,
    pub age: AgeRule,
    pub categories: Vec<CategoryRule>,
}

fn year_table(
    owner: &str,
    table: BTreeMap<String, Vec<String>>,
) -> Result<BTreeMap<u16, Vec<String>>, SchemaError> {
    let mut out = BTreeMap::new();
    for (key, values) in table {
        let year: u16 = key.trim().parse().map_err(|_| {
            SchemaError::DocumentValidation(format!("'{owner}': year key '{key}' is not a year"))
        })?;
        out.insert(year, values);
    }
    Ok(out)
}

impl Harmonization {
    pub fn from_toml(input: &str) -> Result<Self, SchemaError> {
        let raw: RawDocument =
            toml::from_str(input).map_err(|e| SchemaError::DocumentParse(e.to_string()))?;

        let mut canonical = Vec::with_capacity(raw.canonical.len());
        for rule in raw.canonical {
            let aliases = year_table(&rule.name, rule.aliases)?;
            canonical.push(CanonicalRule { name: rule.name, required: rule.required, aliases });
        }
        let mut derived = Vec::with_capacity(raw.derived.len());
        for rule in raw.derived {
            let sources = year_table(&rule.name, rule.sources)?;
            derived.push(DerivedRule { name: rule.name, sources });
        }

        let doc = Self {
            identifier: raw.identifier,
            years: raw.years,
            invalid_tokens: raw.invalid_tokens,
            pii: raw.pii.into_iter().collect(),
            canonical,
            derived,
            types: raw.types,
            age: raw.age,
            categories: raw.categories,
        };
        doc.validate()?;
        Ok(doc)
    }

    /// The document compiled into the crate.
    pub fn embedded() -> Result<Self, SchemaError> {
        Self::from_toml(EMBEDDED_HARMONIZATION)
    }

    pub fn validate(&self) -> Result<(), SchemaError> {
        let invalid = |msg: String| Err(SchemaError::DocumentValidation(msg));

        if self.identifier.trim().is_empty() {
            return invalid("identifier must not be empty".into());
        }
        if self.years.is_empty() {
            return invalid("at least one year is required".into());
        }
        let years: BTreeSet<u16> = self.years.iter().copied().collect();
        if years.len() != self.years.len() {
            return invalid("years must be unique".into());
        }

        let mut names = BTreeSet::new();
        for rule in &self.canonical {
            if !names.insert(rule.name.as_str()) {
                return invalid(format!("duplicate canonical column '{}'", rule.name));
            }
            for (year, aliases) in &rule.aliases {
                if !years.contains(year) {
                    return invalid(format!("'{}': year {year} is not listed in years", rule.name));
                }
                if aliases.is_empty() {
                    return invalid(format!("'{}': empty alias list for {year}", rule.name));
                }
            }
        }
        for rule in &self.derived {
            if !names.insert(rule.name.as_str()) {
                return invalid(format!("derived column '{}' is already defined", rule.name));
            }
            for year in rule.sources.keys() {
                if !years.contains(year) {
                    return invalid(format!("'{}': year {year} is not listed in years", rule.name));
                }
            }
        }

        let mut typed = BTreeSet::new();
        for column in self
            .types
            .integer
            .iter()
            .chain(&self.types.float)
            .chain(&self.types.date_of_birth)
            .chain(&self.types.age)
        {
            if !typed.insert(column.as_str()) || *column == self.identifier {
                return invalid(format!("column '{column}' has more than one semantic type"));
            }
        }

        if self.age.min > self.age.max {
            return invalid(format!("age range {}..={} is empty", self.age.min, self.age.max));
        }

        for rule in &self.categories {
            for pattern in &rule.patterns {
                if let Err(e) = Regex::new(&pattern.regex) {
                    return invalid(format!("category pattern '{}': {e}", pattern.regex));
                }
            }
        }

        Ok(())
    }

    pub fn supports_year(&self, year: u16) -> bool {
        self.years.contains(&year)
    }

    /// Aliases in priority order, with the canonical name appended when absent.
    pub fn aliases_for<'a>(&'a self, rule: &'a CanonicalRule, year: u16) -> Vec<&'a str> {
        let mut out: Vec<&str> = Vec::new();
        for alias in rule.aliases.get(&year).into_iter().flatten() {
            if !out.contains(&alias.as_str()) {
                out.push(alias.as_str());
            }
        }
        if !out.contains(&rule.name.as_str()) {
            out.push(rule.name.as_str());
        }
        out
    }

    /// Derived source chain for the year, with the derived name itself last.
    pub fn sources_for<'a>(&'a self, rule: &'a DerivedRule, year: u16) -> Vec<&'a str> {
        let mut out: Vec<&str> = rule
            .sources
            .get(&year)
            .into_iter()
            .flatten()
            .map(String::as_str)
            .collect();
        if !out.contains(&rule.name.as_str()) {
            out.push(rule.name.as_str());
        }
        out
    }

    /// The canonical name a raw (deduplicated) column resolves to in `year`.
    pub fn canonical_for(&self, column: &str, year: u16) -> Option<&CanonicalRule> {
        self.canonical
            .iter()
            .find(|rule| self.aliases_for(rule, year).iter().any(|alias| matches_alias(alias, column)))
    }

    /// Semantic type of a column by name. Unlisted columns are text.
    pub fn kind_of(&self, name: &str) -> ColumnKind {
        let listed = |list: &[String]| list.iter().any(|c| c == name);
        if name == self.identifier {
            ColumnKind::Identifier
        } else if listed(&self.types.integer) {
            ColumnKind::Integer
        } else if listed(&self.types.float) {
            ColumnKind::Float
        } else if listed(&self.types.date_of_birth) {
            ColumnKind::DateOfBirth
        } else if listed(&self.types.age) {
            ColumnKind::Age
        } else {
            ColumnKind::Text
        }
    }

    pub fn category_rule(&self, name: &str) -> Option<&CategoryRule> {
        self.categories.iter().find(|rule| rule.columns.iter().any(|c| c == name))
    }

    pub fn is_invalid_token(&self, text: &str) -> bool {
        let text = text.trim();
        self.invalid_tokens.iter().any(|t| t.eq_ignore_ascii_case(text))
    }

    pub fn is_pii(&self, name: &str) -> bool {
        self.pii.contains(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r##"
identifier = "RA"
years = [2022, 2023]
invalid_tokens = ["#N/A", "INCLUIR"]

[[canonical]]
name = "Mat"
aliases = { "2022" = ["Matem", "Mat"] }
"##;

    #[test]
    fn embedded_document_is_valid() {
        let doc = Harmonization::embedded().unwrap();
        assert_eq!(doc.identifier, "RA");
        assert_eq!(doc.years, vec![2022, 2023, 2024]);
        assert!(doc.canonical.iter().any(|r| r.name == "Defasagem" && r.required));
        assert_eq!(doc.kind_of("Idade"), ColumnKind::Age);
        assert_eq!(doc.kind_of("Turma"), ColumnKind::Text);
        assert!(doc.is_pii("Avaliador6"));
    }

    #[test]
    fn canonical_name_is_appended_last() {
        let doc = Harmonization::from_toml(MINIMAL).unwrap();
        let rule = &doc.canonical[0];
        assert_eq!(doc.aliases_for(rule, 2022), vec!["Matem", "Mat"]);
        assert_eq!(doc.aliases_for(rule, 2023), vec!["Mat"]);
    }

    #[test]
    fn canonical_for_matches_suffixed_aliases() {
        let doc = Harmonization::from_toml(MINIMAL).unwrap();
        assert_eq!(doc.canonical_for("Matem__dup1", 2022).map(|r| r.name.as_str()), Some("Mat"));
        assert!(doc.canonical_for("Matem", 2023).is_none());
    }

    #[test]
    fn invalid_tokens_match_case_insensitively() {
        let doc = Harmonization::from_toml(MINIMAL).unwrap();
        assert!(doc.is_invalid_token(" incluir "));
        assert!(doc.is_invalid_token("#n/a"));
        assert!(!doc.is_invalid_token("10"));
    }

    #[test]
    fn reject_bad_year_key() {
        let input = MINIMAL.replace("\"2022\" =", "\"twenty\" =");
        let err = Harmonization::from_toml(&input).unwrap_err();
        assert!(matches!(err, SchemaError::DocumentValidation(_)));
    }

    #[test]
    fn reject_alias_year_outside_years() {
        let input = MINIMAL.replace("\"2022\" =", "\"2030\" =");
        let err = Harmonization::from_toml(&input).unwrap_err();
        assert!(err.to_string().contains("2030"));
    }

    #[test]
    fn reject_column_with_two_types() {
        let input = format!("{MINIMAL}\n[types]\ninteger = [\"Idade\"]\nage = [\"Idade\"]\n");
        assert!(Harmonization::from_toml(&input).is_err());
    }

    #[test]
    fn reject_bad_toml() {
        let err = Harmonization::from_toml("identifier = ").unwrap_err();
        assert!(matches!(err, SchemaError::DocumentParse(_)));
    }
}
