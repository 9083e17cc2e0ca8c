// cgrid harmonize

use cohortgrid_schema::{CategoryReport, ColumnMappingReport};

use crate::context::RunContext;
use crate::{util, CliError, RunArgs};

pub fn cmd_harmonize(ctx: &RunContext, run: &RunArgs) -> Result<(), CliError> {
    let dataset = ctx.dataset(run)?;
    let harmonized = ctx.harmonize(&dataset)?;
    let generated_at = util::now();
    let out_dir = ctx.output_dir(run);

    let categories = CategoryReport::from_harmonized(&harmonized, generated_at.clone());
    let mapping = ColumnMappingReport::from_harmonized(&harmonized, generated_at);
    let markdown = ctx.markdown(run).then(|| categories.to_markdown());
    util::write_report(&out_dir, "category_normalization_report", &categories, markdown)?;
    util::write_report(&out_dir, "column_mapping_report", &mapping, None)?;

    if ctx.json {
        util::print_json(&mapping)?;
    } else {
        for year in &harmonized.years {
            println!(
                "{}  rows={} columns={} renamed={} merged={} missing={} category_changes={}",
                year.frame.year,
                year.frame.n_rows(),
                year.frame.n_cols(),
                year.mapping.renamed.len(),
                year.mapping.merged.len(),
                year.mapping.missing_aliases.len(),
                year.normalization.total_category_changes()
            );
        }
        println!(
            "schema identical before alignment: {}",
            harmonized.alignment.identical_before_alignment
        );
    }
    Ok(())
}
