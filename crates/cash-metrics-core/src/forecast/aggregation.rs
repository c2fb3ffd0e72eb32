//! Window totals over outflow and inflow forecasts.
//!
//! - Outflows split into fixed / contingency buckets plus a grand total
//!   that also carries untagged records
//! - Inflows reduce to a single total
//! - The outlook bundles "due today" with a forward horizon
//!
//! Empty inputs always produce zeros.

use std::time::Instant;

use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::records::{Certainty, ForecastRecord, InflowForecastRecord};
use crate::config::{default_unit_scale, scale_amount, validate_unit_scale, ForecastHorizon};
use crate::types::{with_metadata, ComputationOutput, DateWindow, Money};
use crate::CashMetricsResult;

/// Outflow forecast totals for one window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct OutflowSummary {
    pub fixed_total: Money,
    pub contingency_total: Money,
    /// Every record in the window, including unknown certainty
    pub grand_total: Money,
}

/// Inflow forecast total for one window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct InflowSummary {
    pub grand_total: Money,
}

/// Forward-looking forecast buckets as of a reporting date.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastOutlook {
    pub horizon: ForecastHorizon,
    pub horizon_window: DateWindow,
    /// Outflows falling due on the as-of date itself
    pub due_today: OutflowSummary,
    pub outflow: OutflowSummary,
    pub inflow: InflowSummary,
    /// inflow - outflow over the horizon
    pub net_forecast: Money,
}

impl OutflowSummary {
    /// Portion of the grand total with neither fixed nor contingency tag.
    pub fn other_total(&self) -> Money {
        self.grand_total - self.fixed_total - self.contingency_total
    }

    pub fn scaled(&self, scale: impl Fn(Money) -> Money) -> Self {
        Self {
            fixed_total: scale(self.fixed_total),
            contingency_total: scale(self.contingency_total),
            grand_total: scale(self.grand_total),
        }
    }
}

impl ForecastOutlook {
    pub fn scaled(&self, scale: impl Fn(Money) -> Money) -> Self {
        Self {
            horizon: self.horizon,
            horizon_window: self.horizon_window,
            due_today: self.due_today.scaled(&scale),
            outflow: self.outflow.scaled(&scale),
            inflow: InflowSummary {
                grand_total: scale(self.inflow.grand_total),
            },
            net_forecast: scale(self.net_forecast),
        }
    }
}

pub fn aggregate_outflow(records: &[ForecastRecord], window: DateWindow) -> OutflowSummary {
    records
        .iter()
        .filter(|r| window.contains(r.forecast_date))
        .fold(OutflowSummary::default(), |mut acc, r| {
            match r.certainty {
                Certainty::Fixed => acc.fixed_total += r.net_payable,
                Certainty::Contingency => acc.contingency_total += r.net_payable,
                Certainty::Unknown => {}
            }
            acc.grand_total += r.net_payable;
            acc
        })
}

pub fn aggregate_inflow(records: &[InflowForecastRecord], window: DateWindow) -> InflowSummary {
    InflowSummary {
        grand_total: records
            .iter()
            .filter(|r| window.contains(r.forecast_date))
            .map(|r| r.amount_received)
            .sum(),
    }
}

/// `[as_of + 1, as_of + N]` for an N-day horizon.
pub fn horizon_window(as_of: NaiveDate, horizon: ForecastHorizon) -> DateWindow {
    DateWindow {
        start: as_of + Duration::days(1),
        end: as_of + Duration::days(horizon.days()),
    }
}

pub fn forecast_outlook(
    outflows: &[ForecastRecord],
    inflows: &[InflowForecastRecord],
    as_of: NaiveDate,
    horizon: ForecastHorizon,
) -> ForecastOutlook {
    let window = horizon_window(as_of, horizon);
    let due_today = aggregate_outflow(outflows, DateWindow::day(as_of));
    let outflow = aggregate_outflow(outflows, window);
    let inflow = aggregate_inflow(inflows, window);

    ForecastOutlook {
        horizon,
        horizon_window: window,
        due_today,
        outflow,
        inflow,
        net_forecast: inflow.grand_total - outflow.grand_total,
    }
}

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastOutlookInput {
    #[serde(default)]
    pub outflow_forecasts: Vec<ForecastRecord>,
    #[serde(default)]
    pub inflow_forecasts: Vec<InflowForecastRecord>,
    pub as_of: NaiveDate,
    #[serde(default)]
    pub horizon: ForecastHorizon,
    #[serde(default = "default_unit_scale")]
    pub unit_scale: Decimal,
}

pub fn analyze_forecast_outlook(
    input: &ForecastOutlookInput,
) -> CashMetricsResult<ComputationOutput<ForecastOutlook>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate_unit_scale(input.unit_scale)?;
    if input.outflow_forecasts.is_empty() && input.inflow_forecasts.is_empty() {
        warnings.push("No forecast records loaded; every bucket is zero.".into());
    }

    let outlook = forecast_outlook(
        &input.outflow_forecasts,
        &input.inflow_forecasts,
        input.as_of,
        input.horizon,
    );
    if outlook.outflow.other_total() != Money::ZERO {
        warnings.push(format!(
            "{} of horizon outflow carries no fixed/contingency tag.",
            outlook.outflow.other_total()
        ));
    }

    let result = outlook.scaled(|m| scale_amount(m, input.unit_scale));
    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Forecast outlook: due today plus forward horizon buckets by certainty",
        &serde_json::json!({
            "as_of": input.as_of,
            "horizon": input.horizon,
            "unit_scale": input.unit_scale,
        }),
        warnings,
        elapsed,
        result,
    ))
}
