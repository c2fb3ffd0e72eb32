use clap::Args;
use serde_json::Value;

use cash_metrics_core::working_capital::ccc::{self, SnapshotCells};

use crate::input;

/// Arguments for the cash conversion cycle
#[derive(Args)]
pub struct CccArgs {
    /// Path to JSON balance sheet snapshot
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_ccc(args: CccArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let cells: SnapshotCells =
        input::read_request(args.input.as_deref(), "the cash conversion cycle")?;
    let result = ccc::analyze_ccc(&cells)?;
    Ok(serde_json::to_value(result)?)
}
