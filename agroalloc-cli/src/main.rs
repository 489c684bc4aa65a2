//! agroalloc command-line runner
//!
//! Loads a scenario file, runs the planning pipeline and prints the report
//! as JSON on stdout. Diagnostics go to stderr through `tracing`.
//!
//! # Usage
//!
//! ```bash
//! cargo run -p agroalloc-cli -- scenarios/reference.toml --horizon 5 --pretty
//! cargo run -p agroalloc-cli -- --practice "Cover Crops"
//! RUST_LOG=agroalloc_core=debug cargo run -p agroalloc-cli -- scenarios/reference.toml
//! ```

use agroalloc_core::planner::plan_single_practice;
use agroalloc_core::{PlanResult, PracticeCatalog, Scenario};
use clap::Parser;
use serde::Serialize;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Plan the adoption of carbon-farming practices under a budget
#[derive(Parser, Debug)]
#[command(name = "agroalloc")]
#[command(about = "Rank practices and allocate land and budget to meet an abatement target")]
struct Args {
    /// Scenario TOML file. The reference scenario is used when omitted
    scenario: Option<PathBuf>,

    /// Size a plan that relies on this practice alone
    #[arg(long)]
    practice: Option<String>,

    /// Project the allocation over this many years
    #[arg(long)]
    horizon: Option<u32>,

    /// Override the scenario's incentive budget
    #[arg(long)]
    budget: Option<f64>,

    /// Print the practice catalog and exit
    #[arg(long)]
    list_practices: bool,

    /// Pretty-print the JSON output
    #[arg(long)]
    pretty: bool,

    /// Increase log verbosity (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_scenario(args: &Args) -> PlanResult<Scenario> {
    let mut scenario = match &args.scenario {
        Some(path) => Scenario::from_path(path)?,
        None => Scenario::default(),
    };
    if let Some(budget) = args.budget {
        scenario.strategy.budget = budget;
    }
    if let Some(horizon_years) = args.horizon {
        scenario.projection.get_or_insert_with(Default::default).horizon_years = horizon_years;
    }
    scenario.validate()?;
    Ok(scenario)
}

fn emit<T: Serialize>(value: &T, pretty: bool) {
    let rendered = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    };
    match rendered {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Failed to serialise output: {}", e);
            std::process::exit(1);
        }
    }
}

fn run(args: &Args) -> PlanResult<()> {
    let scenario = load_scenario(args)?;
    let catalog: PracticeCatalog = scenario.catalog()?;

    if args.list_practices {
        emit(&catalog, args.pretty);
    } else if let Some(name) = &args.practice {
        let plan = plan_single_practice(&catalog, &scenario.strategy, name)?;
        emit(&plan, args.pretty);
    } else {
        let report = scenario.run()?;
        emit(&report, args.pretty);
    }
    Ok(())
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose);

    if let Err(e) = run(&args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
