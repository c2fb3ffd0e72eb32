use clap::Args;
use serde_json::Value;

use cash_metrics_core::liquidity::credit_limits::{self, AvailableCreditInput};
use cash_metrics_core::liquidity::runway::{self, RunwayInput};

use crate::input;

/// Arguments for available credit
#[derive(Args)]
pub struct AvailableCreditArgs {
    /// Path to JSON input file
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for cash runway
#[derive(Args)]
pub struct RunwayArgs {
    /// Path to JSON input file
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_available_credit(args: AvailableCreditArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let credit_input: AvailableCreditInput =
        input::read_request(args.input.as_deref(), "available credit")?;
    let result = credit_limits::analyze_available_credit(&credit_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_runway(args: RunwayArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let runway_input: RunwayInput = input::read_request(args.input.as_deref(), "cash runway")?;
    let result = runway::analyze_runway(&runway_input)?;
    Ok(serde_json::to_value(result)?)
}
