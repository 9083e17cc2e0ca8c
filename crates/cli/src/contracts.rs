// cgrid contracts export

use cohortgrid_contract::{build_contract, save_contract};
use serde::Serialize;

use crate::context::RunContext;
use crate::{util, CliError, RunArgs};

#[derive(Debug, Serialize)]
struct ExportSummary {
    dataset_basename: Option<String>,
    dataset_sha256: Option<String>,
    contracts: Vec<ExportedContract>,
}

#[derive(Debug, Serialize)]
struct ExportedContract {
    year: u16,
    columns: usize,
    rows_expected: Option<usize>,
    files: Vec<String>,
}

/// Contracts go to `--output-dir` when given, else `contracts_dir`.
pub fn cmd_export(ctx: &RunContext, run: &RunArgs) -> Result<(), CliError> {
    let dataset = ctx.dataset(run)?;
    let harmonized = ctx.harmonize(&dataset)?;
    let lineage = ctx.lineage(&dataset)?;
    let dir = run.output_dir.clone().unwrap_or_else(|| ctx.settings.contracts_dir.clone());

    let mut summary = ExportSummary {
        dataset_basename: lineage.dataset_basename.clone(),
        dataset_sha256: lineage.dataset_sha256.clone(),
        contracts: Vec::new(),
    };
    for frame in harmonized.frames() {
        let contract = build_contract(frame, &ctx.doc, &lineage);
        let files = save_contract(&dir, &contract, ctx.markdown(run))?;
        summary.contracts.push(ExportedContract {
            year: contract.year,
            columns: contract.columns.len(),
            rows_expected: contract.metadata.rows_expected,
            files: files.iter().map(|p| p.display().to_string()).collect(),
        });
    }

    if ctx.json {
        util::print_json(&summary)?;
    } else {
        for c in &summary.contracts {
            println!("{}  columns={} rows={}  {}", c.year, c.columns, c.rows_expected.unwrap_or(0), c.files.join(", "));
        }
    }
    Ok(())
}
