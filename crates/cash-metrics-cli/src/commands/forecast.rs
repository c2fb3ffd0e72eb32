use clap::Args;
use serde_json::Value;

use cash_metrics_core::forecast::aggregation::{self, ForecastOutlookInput};

use crate::input;

/// Arguments for the forecast outlook
#[derive(Args)]
pub struct ForecastArgs {
    /// Path to JSON input file
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_forecast(args: ForecastArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let outlook_input: ForecastOutlookInput =
        input::read_request(args.input.as_deref(), "the forecast outlook")?;
    let result = aggregation::analyze_forecast_outlook(&outlook_input)?;
    Ok(serde_json::to_value(result)?)
}
