// Per-invocation state: settings, harmonization rules, dataset access

use std::path::{Path, PathBuf};

use cohortgrid_config::Settings;
use cohortgrid_contract::Lineage;
use cohortgrid_io::{dataset_basename, load_workbook, resolve_dataset_path, sha256_file, SheetSpec};
use cohortgrid_pairing::PairOptions;
use cohortgrid_schema::{harmonize_all, Harmonization, Harmonized};

use crate::exit_codes::EXIT_INPUT;
use crate::{util, CliError, GlobalArgs, RunArgs};

pub struct RunContext {
    pub settings: Settings,
    pub doc: Harmonization,
    pub json: bool,
}

impl RunContext {
    pub fn load(global: &GlobalArgs) -> Result<Self, CliError> {
        let (settings, source) = Settings::load(global.config.as_deref())?;
        if let Some(path) = &source {
            log::debug!("Using settings file {}", path.display());
        }
        let doc = match &settings.harmonization {
            Some(path) => {
                let text = std::fs::read_to_string(path).map_err(|e| {
                    CliError::new(EXIT_INPUT, format!("failed to read harmonization document {}: {e}", path.display()))
                })?;
                Harmonization::from_toml(&text)?
            }
            None => Harmonization::embedded()?,
        };
        Ok(Self { settings, doc, json: global.json })
    }

    pub fn dataset(&self, run: &RunArgs) -> Result<PathBuf, CliError> {
        Ok(resolve_dataset_path(run.dataset.as_deref(), self.settings.dataset_path.as_deref())?)
    }

    pub fn output_dir(&self, run: &RunArgs) -> PathBuf {
        run.output_dir.clone().unwrap_or_else(|| self.settings.artifacts_dir.clone())
    }

    pub fn markdown(&self, run: &RunArgs) -> bool {
        self.settings.write_markdown && !run.no_markdown
    }

    /// Load the configured sheets and harmonize them into aligned frames.
    pub fn harmonize(&self, dataset: &Path) -> Result<Harmonized, CliError> {
        let sheets: Vec<SheetSpec> = self
            .settings
            .sheet_plan()
            .into_iter()
            .map(|(year, name)| SheetSpec::new(year, name))
            .collect();
        let raws = load_workbook(dataset, &sheets)?;
        Ok(harmonize_all(raws, &self.doc)?)
    }

    pub fn lineage(&self, dataset: &Path) -> Result<Lineage, CliError> {
        Ok(Lineage {
            dataset_basename: dataset_basename(dataset),
            dataset_sha256: Some(sha256_file(dataset)?),
            generated_at: Some(util::now()),
        })
    }

    pub fn pair_options(&self) -> PairOptions {
        PairOptions {
            identifier: self.doc.identifier.clone(),
            pii: self.doc.pii.iter().cloned().collect(),
            seed: self.settings.seed,
            ..PairOptions::default()
        }
    }
}
