pub mod commands;
pub mod logging;

use clap::{Parser, Subcommand};
use rebate_core::config::{AppConfig, LoadOptions};
use std::process::ExitCode;

use crate::commands::calculate::CalculateArgs;

#[derive(Debug, Parser)]
#[command(
    name = "rebate",
    about = "Rebate calculation CLI",
    long_about = "Calculate rebates against the configured catalog, manage its database, and inspect configuration.",
    after_help = "Examples:\n  rebate seed\n  rebate calculate --rebate rebate-rate-50 --product prod-standard --volume 10\n  rebate history --rebate rebate-rate-50"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(
        about = "Calculate one rebate and record the result; prompts for any value not given"
    )]
    Calculate(CalculateArgs),
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(about = "Load the deterministic demo catalog (safe to repeat)")]
    Seed,
    #[command(about = "List recorded calculations for a rebate")]
    History {
        #[arg(long, help = "Rebate identifier")]
        rebate: String,
    },
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    // Commands report their own configuration errors; logging falls back to defaults.
    let logging_config = AppConfig::load(LoadOptions::default()).unwrap_or_default().logging;
    logging::init(&logging_config);

    let result = match cli.command {
        Command::Calculate(args) => commands::calculate::run(args),
        Command::Migrate => commands::migrate::run(),
        Command::Seed => commands::seed::run(),
        Command::History { rebate } => commands::history::run(&rebate),
        Command::Config => commands::config::run(),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
