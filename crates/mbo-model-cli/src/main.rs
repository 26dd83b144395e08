mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::debt::DebtArgs;
use commands::irr::IrrArgs;
use commands::model::RunArgs;
use commands::scenarios::{ScenariosArgs, SensitivityArgs};

/// Five-year MBO financial model
#[derive(Parser)]
#[command(
    name = "mbo",
    version,
    about = "Five-year management buyout financial model",
    long_about = "Runs the integrated MBO model (revenue, costs, P&L, cash flow, debt \
                  schedule, balance sheet and equity IRR) with decimal precision. \
                  Inputs are JSON or YAML snapshots, from a file or piped on stdin."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full model for one scenario
    Run(RunArgs),
    /// Build a debt schedule without cash flow coverage
    Debt(DebtArgs),
    /// Solve the IRR of a cash flow series by bisection
    Irr(IrrArgs),
    /// Compare the base, best and worst revenue scenarios
    Scenarios(ScenariosArgs),
    /// IRR grid over exit multiple and interest rate
    Sensitivity(SensitivityArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Run(args) => commands::model::run_model(args),
        Commands::Debt(args) => commands::debt::run_debt(args),
        Commands::Irr(args) => commands::irr::run_irr(args),
        Commands::Scenarios(args) => commands::scenarios::run_scenarios(args),
        Commands::Sensitivity(args) => commands::scenarios::run_sensitivity(args),
        Commands::Version => {
            println!("mbo {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
