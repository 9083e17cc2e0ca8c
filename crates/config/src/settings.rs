// Run settings
// Loaded from --config, ./cgrid.toml or ~/.config/cohortgrid/cgrid.toml

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

pub const CONFIG_FILE_NAME: &str = "cgrid.toml";

/// Overrides `dataset_path` when set and non-empty.
pub const DATASET_PATH_ENV: &str = "DATASET_PATH";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    // Input
    pub dataset_path: Option<PathBuf>,
    /// Sheet name per year, keyed by the year as text. Missing years use `PEDE<year>`.
    pub sheets: BTreeMap<String, String>,
    pub years: Vec<u16>,
    pub harmonization: Option<PathBuf>,

    // Pairing
    pub pairs: Vec<(u16, u16)>,
    pub seed: u64,
    /// Below this share of either year, a cohort intersection is logged as low.
    pub low_intersection_pct: f64,

    // Output
    pub contracts_dir: PathBuf,
    pub artifacts_dir: PathBuf,
    pub write_markdown: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            // Input
            dataset_path: None,
            sheets: BTreeMap::new(),
            years: vec![2022, 2023, 2024],
            harmonization: None, // None = embedded document
            // Pairing
            pairs: vec![(2022, 2023), (2023, 2024), (2022, 2024)],
            seed: 42,
            low_intersection_pct: 0.5,
            // Output
            contracts_dir: PathBuf::from("docs/contracts"),
            artifacts_dir: PathBuf::from("artifacts"),
            write_markdown: true,
        }
    }
}

impl Settings {
    /// User-level settings file path
    pub fn config_path() -> PathBuf {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("cohortgrid");
        config_dir.join(CONFIG_FILE_NAME)
    }

    pub fn from_toml(input: &str, origin: &Path) -> Result<Self, ConfigError> {
        toml::from_str(input).map_err(|e| ConfigError::Parse { path: origin.to_path_buf(), message: e.to_string() })
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound { path: path.to_path_buf() }
            } else {
                ConfigError::Read { path: path.to_path_buf(), source }
            }
        })?;
        Self::from_toml(&contents, path)
    }

    /// Load, apply environment overrides and validate.
    ///
    /// An explicit path must exist. Otherwise `./cgrid.toml`, then the user
    /// config file, then defaults. Returns the file actually used.
    pub fn load(explicit: Option<&Path>) -> Result<(Self, Option<PathBuf>), ConfigError> {
        let candidates: Vec<PathBuf> = match explicit {
            Some(path) => vec![path.to_path_buf()],
            None => vec![PathBuf::from(CONFIG_FILE_NAME), Self::config_path()],
        };

        let mut loaded = None;
        for path in candidates {
            if explicit.is_some() || path.is_file() {
                loaded = Some((Self::from_file(&path)?, path));
                break;
            }
        }

        let (mut settings, source) = match loaded {
            Some((settings, path)) => {
                log::debug!("Loaded settings from {}", path.display());
                (settings, Some(path))
            }
            None => (Self::default(), None),
        };
        settings.apply_env(|key| std::env::var(key).ok());
        settings.validate()?;
        Ok((settings, source))
    }

    /// Apply overrides from `lookup` (the process environment in practice).
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(path) = lookup(DATASET_PATH_ENV).filter(|v| !v.trim().is_empty()) {
            self.dataset_path = Some(PathBuf::from(path));
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.years.is_empty() {
            return Err(ConfigError::Invalid { field: "years", message: "at least one year is required".into() });
        }
        for &(a, b) in &self.pairs {
            for year in [a, b] {
                if !self.years.contains(&year) {
                    return Err(ConfigError::Invalid {
                        field: "pairs",
                        message: format!("pair {a}->{b} references year {year} not in years {:?}", self.years),
                    });
                }
            }
            if a >= b {
                return Err(ConfigError::Invalid {
                    field: "pairs",
                    message: format!("pair {a}->{b} must go forward in time"),
                });
            }
        }
        if !(0.0..=1.0).contains(&self.low_intersection_pct) {
            return Err(ConfigError::Invalid {
                field: "low_intersection_pct",
                message: format!("{} is outside [0, 1]", self.low_intersection_pct),
            });
        }
        Ok(())
    }

    pub fn sheet_for(&self, year: u16) -> String {
        self.sheets.get(&year.to_string()).cloned().unwrap_or_else(|| format!("PEDE{year}"))
    }

    /// `(year, sheet)` for every configured year, in order.
    pub fn sheet_plan(&self) -> Vec<(u16, String)> {
        self.years.iter().map(|&y| (y, self.sheet_for(y))).collect()
    }
}
