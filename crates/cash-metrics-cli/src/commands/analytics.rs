use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use cash_metrics_core::analytics::efficiency::{self, EfficiencyInput};
use cash_metrics_core::analytics::trend::{self, TrendInput};

use crate::input;

/// Arguments for cash-flow trend analysis
#[derive(Args)]
pub struct TrendArgs {
    /// Path to JSON input file
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for forecast efficiency
#[derive(Args)]
pub struct EfficiencyArgs {
    /// Path to JSON input file
    #[arg(long)]
    pub input: Option<String>,

    /// Actual net flow for the period
    #[arg(long, allow_hyphen_values = true, requires = "forecast")]
    pub actual: Option<Decimal>,

    /// Forecast net flow for the period
    #[arg(long, allow_hyphen_values = true, requires = "actual")]
    pub forecast: Option<Decimal>,
}

pub fn run_trend(args: TrendArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let trend_input: TrendInput = input::read_request(args.input.as_deref(), "trend analysis")?;
    let result = trend::analyze_trend(&trend_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_efficiency(args: EfficiencyArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let eff_input = match (args.actual, args.forecast) {
        (Some(actual), Some(forecast)) => EfficiencyInput {
            actual_net_flow: actual,
            forecast_net_flow: forecast,
        },
        _ => input::read_request(args.input.as_deref(), "forecast efficiency")?,
    };
    let result = efficiency::analyze_forecast_efficiency(&eff_input)?;
    Ok(serde_json::to_value(result)?)
}
