// cgrid validate

use std::path::PathBuf;

use cohortgrid_contract::{load_contract, validate, ValidationRun};

use crate::context::RunContext;
use crate::{util, CliError, RunArgs};

pub const REPORT_STEM: &str = "data_quality_report";

pub fn cmd_validate(
    ctx: &RunContext,
    run: &RunArgs,
    strict: bool,
    contracts_dir: Option<PathBuf>,
) -> Result<(), CliError> {
    let dataset = ctx.dataset(run)?;
    let harmonized = ctx.harmonize(&dataset)?;
    let contracts_dir = contracts_dir.unwrap_or_else(|| ctx.settings.contracts_dir.clone());

    let mut report = ValidationRun::new(util::now(), strict);
    for frame in harmonized.frames() {
        match load_contract(&contracts_dir, frame.year) {
            Ok(contract) => report.push(validate(frame, &contract)?),
            Err(err) => report.push_unavailable(frame.year, &err),
        }
    }
    log::info!(
        "Data quality status={} | years={} errors={} strict={}",
        report.verdict(),
        report.years.len(),
        report.error_count(),
        strict
    );

    let markdown = ctx.markdown(run).then(|| report.to_markdown());
    let written = util::write_report(&ctx.output_dir(run), REPORT_STEM, &report, markdown)?;

    if ctx.json {
        util::print_json(&report)?;
    } else {
        for r in &report.years {
            println!(
                "{}  {}  errors={} warnings={} infos={}",
                r.year, r.status, r.errors_count, r.warnings_count, r.infos_count
            );
        }
        println!("status: {}", report.verdict());
        println!("report: {}", written[0].display());
    }

    Ok(report.enforce()?)
}
