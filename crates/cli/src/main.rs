// cohortgrid CLI - PEDE harmonization, data contracts and temporal pairs

mod cohort;
mod context;
mod contracts;
mod exit_codes;
mod harmonize;
mod pairs;
mod util;
mod validate;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Args, Parser, Subcommand};

use exit_codes::{EXIT_ERROR, EXIT_SUCCESS};

#[derive(Parser)]
#[command(name = "cgrid")]
#[command(about = "Harmonize PEDE yearly sheets, validate data contracts and build leakage-safe temporal pairs")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Settings file (default: ./cgrid.toml, then the user config directory)
    #[arg(long, global = true, value_name = "PATH", env = "CGRID_CONFIG")]
    pub config: Option<PathBuf>,

    /// More log output (-v debug, -vv trace). CGRID_LOG overrides.
    #[arg(long, short = 'v', global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors
    #[arg(long, short = 'q', global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Print the primary report as JSON on stdout
    #[arg(long, global = true)]
    pub json: bool,
}

/// Options shared by every command that reads the workbook and writes reports.
#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Workbook path (overrides DATASET_PATH and dataset_path)
    #[arg(long, value_name = "PATH")]
    pub dataset: Option<PathBuf>,

    /// Directory for report artifacts (default: artifacts_dir)
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Skip the Markdown companions of JSON reports
    #[arg(long)]
    pub no_markdown: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate every year against its data contract
    #[command(after_help = "\
Examples:
  cgrid validate
  cgrid validate --strict --contracts-dir docs/contracts
  cgrid validate --dataset data/PEDE.xlsx --json")]
    Validate {
        /// Exit non-zero when any error-severity finding exists
        #[arg(long)]
        strict: bool,

        /// Directory holding data_contract_{year}.json (default: contracts_dir)
        #[arg(long, value_name = "DIR")]
        contracts_dir: Option<PathBuf>,

        #[command(flatten)]
        run: RunArgs,
    },

    /// Cohort intersection statistics by RA for the configured year pairs
    Cohort {
        #[command(flatten)]
        run: RunArgs,
    },

    /// Data contract management
    #[command(subcommand)]
    Contracts(ContractsCommands),

    /// Build temporal pairs and write their feature-split and audit reports
    #[command(after_help = "\
Examples:
  cgrid pairs
  cgrid pairs --pair 2022:2023 --pair 2023:2024")]
    Pairs {
        /// Year pair as T:T1 (repeatable; default: the configured pairs)
        #[arg(long = "pair", value_name = "T:T1", value_parser = pairs::parse_pair)]
        pairs: Vec<(u16, u16)>,

        #[command(flatten)]
        run: RunArgs,
    },

    /// Harmonize all years and write the category and column-mapping audits
    Harmonize {
        #[command(flatten)]
        run: RunArgs,
    },
}

#[derive(Subcommand)]
enum ContractsCommands {
    /// Derive and write one contract per year from the current dataset
    Export {
        #[command(flatten)]
        run: RunArgs,
    },
}

fn long_version() -> &'static str {
    if cfg!(debug_assertions) {
        concat!(
            env!("CARGO_PKG_VERSION"),
            " (", env!("GIT_COMMIT_HASH"), ")",
            "\nbuild:   debug",
            "\ntarget:  ", env!("TARGET"),
        )
    } else {
        concat!(
            env!("CARGO_PKG_VERSION"),
            " (", env!("GIT_COMMIT_HASH"), ")",
            "\nbuild:   release",
            "\ntarget:  ", env!("TARGET"),
        )
    }
}

fn init_logging(global: &GlobalArgs) -> Result<(), String> {
    let level = if global.quiet {
        "error"
    } else {
        match global.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_env("CGRID_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| format!("failed to initialize logging: {e}"))
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(e) = init_logging(&cli.global) {
        eprintln!("warning: {e}");
    }

    let global = cli.global;
    let result = context::RunContext::load(&global).and_then(|ctx| match cli.command {
        Commands::Validate { strict, contracts_dir, run } => validate::cmd_validate(&ctx, &run, strict, contracts_dir),
        Commands::Cohort { run } => cohort::cmd_cohort(&ctx, &run),
        Commands::Contracts(ContractsCommands::Export { run }) => contracts::cmd_export(&ctx, &run),
        Commands::Pairs { pairs, run } => pairs::cmd_pairs(&ctx, &run, pairs),
        Commands::Harmonize { run } => harmonize::cmd_harmonize(&ctx, &run),
    });

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn new(code: u8, msg: impl Into<String>) -> Self {
        Self { code, message: msg.into(), hint: None }
    }

    pub fn general(msg: impl Into<String>) -> Self {
        Self::new(EXIT_ERROR, msg)
    }
}

impl From<cohortgrid_io::IoError> for CliError {
    fn from(err: cohortgrid_io::IoError) -> Self {
        let hint = err.hint().map(str::to_string);
        Self { code: exit_codes::io_exit_code(&err), message: err.to_string(), hint }
    }
}

impl From<cohortgrid_schema::SchemaError> for CliError {
    fn from(err: cohortgrid_schema::SchemaError) -> Self {
        Self::new(exit_codes::schema_exit_code(&err), err.to_string())
    }
}

impl From<cohortgrid_contract::ContractError> for CliError {
    fn from(err: cohortgrid_contract::ContractError) -> Self {
        let hint = match &err {
            cohortgrid_contract::ContractError::Missing { .. } => Some("run `cgrid contracts export` first".to_string()),
            _ => None,
        };
        Self { code: exit_codes::contract_exit_code(&err), message: err.to_string(), hint }
    }
}

impl From<cohortgrid_pairing::PairError> for CliError {
    fn from(err: cohortgrid_pairing::PairError) -> Self {
        let hint = match &err {
            cohortgrid_pairing::PairError::Leakage { .. } => {
                Some("remove or rename the listed columns in the year-t sheet, or allowlist known historic columns".to_string())
            }
            _ => None,
        };
        Self { code: exit_codes::pair_exit_code(&err), message: err.to_string(), hint }
    }
}

impl From<cohortgrid_config::ConfigError> for CliError {
    fn from(err: cohortgrid_config::ConfigError) -> Self {
        Self::new(exit_codes::config_exit_code(&err), err.to_string())
    }
}
