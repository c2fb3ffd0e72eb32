use clap::Args;
use serde_json::Value;

use cash_metrics_core::ledger::consolidation::{self, CashFlowInput};

use crate::input;

/// Arguments for consolidated cash flows
#[derive(Args)]
pub struct CashFlowsArgs {
    /// Path to JSON input file
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_cash_flows(args: CashFlowsArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let flow_input: CashFlowInput = input::read_request(args.input.as_deref(), "cash flows")?;
    let result = consolidation::analyze_cash_flows(&flow_input)?;
    Ok(serde_json::to_value(result)?)
}
