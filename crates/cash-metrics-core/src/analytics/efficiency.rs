use std::time::Instant;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::types::{with_metadata, ComputationOutput, Money, Rate, SENTINEL};
use crate::CashMetricsResult;

/// Variance below this magnitude counts as "on forecast" when actual flow is zero.
pub const ZERO_ACTUAL_TOLERANCE: Decimal = dec!(0.01);

/// Forecast-vs-actual comparison for one window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastEfficiency {
    pub actual_net_flow: Money,
    pub forecast_net_flow: Money,
    /// actual - forecast, saturated at the decimal range
    pub variance: Money,
    /// variance / |actual| * 100, or the sentinel
    pub efficiency_pct: Decimal,
    /// Set when `efficiency_pct` holds the sentinel rather than a measured 999%.
    #[serde(default)]
    pub sentinel: bool,
}

impl ForecastEfficiency {
    pub fn is_sentinel(&self) -> bool {
        self.sentinel
    }
}

pub fn forecast_efficiency(actual_net_flow: Money, forecast_net_flow: Money) -> ForecastEfficiency {
    let exact_variance = actual_net_flow.checked_sub(forecast_net_flow);
    let variance = exact_variance.unwrap_or(if actual_net_flow > forecast_net_flow {
        Decimal::MAX
    } else {
        Decimal::MIN
    });

    let ratio = if actual_net_flow.is_zero() {
        if variance.abs() > ZERO_ACTUAL_TOLERANCE {
            None
        } else {
            Some(Decimal::ZERO)
        }
    } else {
        exact_variance
            .and_then(|v| v.checked_div(actual_net_flow.abs()))
            .and_then(|r| r.checked_mul(dec!(100)))
    };

    ForecastEfficiency {
        actual_net_flow,
        forecast_net_flow,
        variance,
        efficiency_pct: ratio.unwrap_or(Decimal::from(SENTINEL)),
        sentinel: ratio.is_none(),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EfficiencyInput {
    pub actual_net_flow: Money,
    pub forecast_net_flow: Money,
}

pub fn analyze_forecast_efficiency(
    input: &EfficiencyInput,
) -> CashMetricsResult<ComputationOutput<ForecastEfficiency>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let result = forecast_efficiency(input.actual_net_flow, input.forecast_net_flow);
    if result.is_sentinel() {
        if input.actual_net_flow.is_zero() {
            warnings.push(format!(
                "Actual net flow is zero against a forecast of {}; efficiency reported as {SENTINEL}.",
                input.forecast_net_flow
            ));
        } else {
            warnings.push(format!(
                "Variance is outside the representable range for an actual of {}; efficiency reported as {SENTINEL}.",
                input.actual_net_flow
            ));
        }
    }

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Forecast efficiency: (actual - forecast) / |actual| * 100",
        &serde_json::json!({
            "zero_actual_tolerance": ZERO_ACTUAL_TOLERANCE,
            "sentinel": SENTINEL,
        }),
        warnings,
        elapsed,
        result,
    ))
}

/// Operating cash flow as a fraction of revenue; zero without revenue.
///
/// Saturates at the decimal range when revenue is vanishingly small.
pub fn ocf_to_sales(operating_flow: Money, revenue: Money) -> Rate {
    if revenue.is_zero() {
        return Decimal::ZERO;
    }
    operating_flow.checked_div(revenue).unwrap_or(
        if operating_flow.is_sign_negative() == revenue.is_sign_negative() {
            Decimal::MAX
        } else {
            Decimal::MIN
        },
    )
}
