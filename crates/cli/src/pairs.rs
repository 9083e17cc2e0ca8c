// cgrid pairs

use cohortgrid_pairing::{build_pair, PairAudit, PairError};

use crate::context::RunContext;
use crate::{util, CliError, RunArgs};

/// Parse `T:T1` (also `T-T1`) into a year pair.
pub fn parse_pair(s: &str) -> Result<(u16, u16), String> {
    let (a, b) = s
        .split_once(':')
        .or_else(|| s.split_once('-'))
        .ok_or_else(|| format!("expected T:T1, got '{s}'"))?;
    let parse = |y: &str| y.trim().parse::<u16>().map_err(|_| format!("invalid year '{}' in '{s}'", y.trim()));
    let (a, b) = (parse(a)?, parse(b)?);
    if a >= b {
        return Err(format!("pair {a}:{b} must go forward in time"));
    }
    Ok((a, b))
}

pub fn cmd_pairs(ctx: &RunContext, run: &RunArgs, pairs: Vec<(u16, u16)>) -> Result<(), CliError> {
    let pairs = if pairs.is_empty() { ctx.settings.pairs.clone() } else { pairs };
    let dataset = ctx.dataset(run)?;
    let harmonized = ctx.harmonize(&dataset)?;
    let options = ctx.pair_options();
    let out_dir = ctx.output_dir(run);
    let available: Vec<u16> = harmonized.frames().map(|f| f.year).collect();
    let frame = |year: u16| {
        harmonized.frame(year).ok_or_else(|| PairError::UnknownYear { year, available: available.clone() })
    };

    let mut audits: Vec<PairAudit> = Vec::with_capacity(pairs.len());
    for (t, t1) in pairs {
        let pair = build_pair(frame(t)?, frame(t1)?, &options)?;
        util::write_report(&out_dir, &format!("feature_split_report_{t}_{t1}"), &pair.audit.feature_split, None)?;
        util::write_report(&out_dir, &format!("temporal_pair_audit_{t}_{t1}"), &pair.audit, None)?;
        audits.push(pair.audit);
    }

    if ctx.json {
        util::print_json(&audits)?;
    } else {
        for a in &audits {
            println!(
                "{}->{}  cohort={} valid={} excluded_missing={} excluded_invalid={} prevalence={:.4} features={}",
                a.year_t,
                a.year_t1,
                a.total_cohort,
                a.valid,
                a.exclusions.missing,
                a.exclusions.invalid_token,
                a.prevalence,
                a.n_features
            );
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pair_syntax() {
        assert_eq!(parse_pair("2022:2023"), Ok((2022, 2023)));
        assert_eq!(parse_pair("2022-2024"), Ok((2022, 2024)));
        assert!(parse_pair("2023:2022").is_err());
        assert!(parse_pair("2023").is_err());
        assert!(parse_pair("abc:2023").is_err());
    }
}
