mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::EnvFilter;

use commands::analytics::{EfficiencyArgs, TrendArgs};
use commands::forecast::ForecastArgs;
use commands::ledger::CashFlowsArgs;
use commands::liquidity::{AvailableCreditArgs, RunwayArgs};
use commands::report::ReportArgs;
use commands::working_capital::CccArgs;

/// Multi-entity cash-flow liquidity metrics
#[derive(Parser)]
#[command(
    name = "cfm",
    version,
    about = "Multi-entity cash-flow liquidity metrics",
    long_about = "A CLI for treasury liquidity reporting with decimal precision. \
                  Consolidates bank ledgers across entities and computes available \
                  credit, cash runway, the cash conversion cycle, forecast outlook, \
                  forecast efficiency and cash-flow trend."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Log computation details to stderr
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Full liquidity report for a reporting window
    Report(ReportArgs),
    /// Available credit across configured entities
    AvailableCredit(AvailableCreditArgs),
    /// Days until forecast outflows exhaust the available balance
    Runway(RunwayArgs),
    /// Cash conversion cycle (DSO + DIO - DPO)
    Ccc(CccArgs),
    /// Consolidated inflow, outflow and activity totals
    CashFlows(CashFlowsArgs),
    /// Forecast buckets for today and the forward horizon
    Forecast(ForecastArgs),
    /// 7-day moving-average trend and volatility
    Trend(TrendArgs),
    /// Forecast efficiency (actual vs forecast net flow)
    Efficiency(EfficiencyArgs),
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

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    // stdout carries the formatted result
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Report(args) => commands::report::run_report(args),
        Commands::AvailableCredit(args) => commands::liquidity::run_available_credit(args),
        Commands::Runway(args) => commands::liquidity::run_runway(args),
        Commands::Ccc(args) => commands::working_capital::run_ccc(args),
        Commands::CashFlows(args) => commands::ledger::run_cash_flows(args),
        Commands::Forecast(args) => commands::forecast::run_forecast(args),
        Commands::Trend(args) => commands::analytics::run_trend(args),
        Commands::Efficiency(args) => commands::analytics::run_efficiency(args),
        Commands::Version => {
            println!("cfm {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            tracing::debug!(error = %e, "Command failed");
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
