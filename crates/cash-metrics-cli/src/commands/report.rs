use clap::Args;
use serde_json::Value;

use cash_metrics_core::report::dashboard::{compute_liquidity_report, LiquidityReportInput};
use cash_metrics_core::MetricsConfig;

use crate::input;

/// Arguments for the full liquidity report
#[derive(Args)]
pub struct ReportArgs {
    /// Path to JSON input file (ledgers, forecasts, billing, snapshot)
    #[arg(long)]
    pub input: Option<String>,

    /// Path to JSON entity configuration; replaces the input's `config`
    #[arg(long)]
    pub config: Option<String>,
}

pub fn run_report(args: ReportArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut request: Value = input::read_request(args.input.as_deref(), "the liquidity report")?;

    if let Some(ref path) = args.config {
        let config: MetricsConfig = input::file::read_json(path)?;
        config.validate()?;
        match request.as_object_mut() {
            Some(map) => {
                map.insert("config".into(), serde_json::to_value(&config)?);
            }
            None => return Err("Report input must be a JSON object".into()),
        }
    }

    let report_input: LiquidityReportInput = serde_json::from_value(request)?;
    let result = compute_liquidity_report(&report_input)?;
    Ok(serde_json::to_value(result)?)
}
