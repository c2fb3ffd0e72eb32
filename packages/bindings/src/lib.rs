use napi::Result as NapiResult;
use napi_derive::napi;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

#[napi]
pub fn liquidity_report(input_json: String) -> NapiResult<String> {
    let input: cash_metrics_core::report::dashboard::LiquidityReportInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = cash_metrics_core::report::dashboard::compute_liquidity_report(&input)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Liquidity
// ---------------------------------------------------------------------------

#[napi]
pub fn available_credit(input_json: String) -> NapiResult<String> {
    let input: cash_metrics_core::liquidity::credit_limits::AvailableCreditInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = cash_metrics_core::liquidity::credit_limits::analyze_available_credit(&input)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn cash_runway(input_json: String) -> NapiResult<String> {
    let input: cash_metrics_core::liquidity::runway::RunwayInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output =
        cash_metrics_core::liquidity::runway::analyze_runway(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

#[napi]
pub fn cash_flows(input_json: String) -> NapiResult<String> {
    let input: cash_metrics_core::ledger::consolidation::CashFlowInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = cash_metrics_core::ledger::consolidation::analyze_cash_flows(&input)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Working capital
// ---------------------------------------------------------------------------

#[napi]
pub fn cash_conversion_cycle(input_json: String) -> NapiResult<String> {
    let input: cash_metrics_core::working_capital::ccc::SnapshotCells =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output =
        cash_metrics_core::working_capital::ccc::analyze_ccc(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Forecast
// ---------------------------------------------------------------------------

#[napi]
pub fn forecast_outlook(input_json: String) -> NapiResult<String> {
    let input: cash_metrics_core::forecast::aggregation::ForecastOutlookInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = cash_metrics_core::forecast::aggregation::analyze_forecast_outlook(&input)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Analytics
// ---------------------------------------------------------------------------

#[napi]
pub fn cash_flow_trend(input_json: String) -> NapiResult<String> {
    let input: cash_metrics_core::analytics::trend::TrendInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output =
        cash_metrics_core::analytics::trend::analyze_trend(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn forecast_efficiency(input_json: String) -> NapiResult<String> {
    let input: cash_metrics_core::analytics::efficiency::EfficiencyInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = cash_metrics_core::analytics::efficiency::analyze_forecast_efficiency(&input)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}
