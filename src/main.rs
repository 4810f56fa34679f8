use std::fs::{self, File};
use std::io::{self, Read};
use std::process::ExitCode;

use clap::Parser;
use tracing::error;

use plate_planner_rs::cli::{Cli, Command, PlanArgs};
use plate_planner_rs::config::PlannerConfig;
use plate_planner_rs::error::{PlanError, PlannerError, Result};
use plate_planner_rs::interface::{write_error, write_feasible_csv, write_json, SectionsResponse};
use plate_planner_rs::models::PlanRequest;
use plate_planner_rs::service::PlanService;
use plate_planner_rs::telemetry;

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(e) => {
            error!(error = %e, "plate_planner failed");
            eprintln!("Error: {}", e);
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();

    let mut config = PlannerConfig::load(cli.config.as_deref())?;
    cli.apply_to(&mut config);
    telemetry::init(&config.logging.level, cli.verbose)?;

    let outcome = match &cli.command {
        Command::Plan(args) => cmd_plan(&mut config, args),
        Command::Sections { hall, meal } => cmd_sections(&config, hall, meal),
        Command::Explore { plan, output } => cmd_explore(&mut config, plan, output.as_deref()),
    };

    match outcome {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(PlannerError::Plan(e)) => {
            write_error(&mut io::stdout().lock(), &e)?;
            Ok(exit_code(&e))
        }
        Err(e) => Err(e),
    }
}

/// 4xx → 4, 5xx → 5.
fn exit_code(err: &PlanError) -> ExitCode {
    ExitCode::from((err.status() / 100) as u8)
}

fn read_request(source: &str) -> Result<PlanRequest> {
    let body = if source == "-" {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        fs::read_to_string(source)?
    };
    Ok(PlanRequest::from_json(&body)?)
}

fn cmd_plan(config: &mut PlannerConfig, args: &PlanArgs) -> Result<()> {
    args.apply_to(config);
    let request = read_request(&args.request)?;
    let service = PlanService::from_config(config)?;

    let outcome = service.plan(&request)?;
    write_json(&mut io::stdout().lock(), &outcome.response)
}

fn cmd_sections(config: &PlannerConfig, hall: &str, meal: &str) -> Result<()> {
    let service = PlanService::from_config(config)?;
    let sections = service.sections(hall, meal)?;
    write_json(&mut io::stdout().lock(), &SectionsResponse { sections: &sections })
}

fn cmd_explore(config: &mut PlannerConfig, args: &PlanArgs, output: Option<&std::path::Path>) -> Result<()> {
    args.apply_to(config);
    let request = read_request(&args.request)?;
    let service = PlanService::from_config(config)?;

    let exploration = service.explore(&request)?;
    match output {
        Some(path) => write_feasible_csv(File::create(path)?, &exploration),
        None => write_feasible_csv(io::stdout().lock(), &exploration),
    }
}
