// cgrid cohort

use cohortgrid_pairing::cohort_report;

use crate::context::RunContext;
use crate::{util, CliError, RunArgs};

pub const REPORT_STEM: &str = "ra_intersections";

pub fn cmd_cohort(ctx: &RunContext, run: &RunArgs) -> Result<(), CliError> {
    let dataset = ctx.dataset(run)?;
    let harmonized = ctx.harmonize(&dataset)?;
    let report = cohort_report(
        harmonized.frames(),
        &ctx.doc.identifier,
        &ctx.settings.pairs,
        ctx.settings.low_intersection_pct,
        util::now(),
    )?;

    let markdown = ctx.markdown(run).then(|| report.to_markdown());
    let written = util::write_report(&ctx.output_dir(run), REPORT_STEM, &report, markdown)?;

    if ctx.json {
        util::print_json(&report)?;
    } else {
        for stat in report.pairs.values() {
            println!(
                "{}->{}  intersection={} pct_{}={:.4} pct_{}={:.4} jaccard={:.4}",
                stat.year_a,
                stat.year_b,
                stat.intersection,
                stat.year_a,
                stat.pct_of_year_a,
                stat.year_b,
                stat.pct_of_year_b,
                stat.jaccard
            );
        }
        println!("report: {}", written[0].display());
    }
    Ok(())
}
