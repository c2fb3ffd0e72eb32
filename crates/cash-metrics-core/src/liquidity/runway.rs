//! Cash runway: days until cumulative forecast outflows exceed the
//! available balance.
//!
//! Only forecasts dated strictly after the as-of date count; the as-of day
//! is assumed to be reflected in the balance already. Outflows are summed
//! per date and accumulated in date order.
//!
//! Return values:
//! - `0` when the balance is not positive, or no qualifying forecast exists
//!   (indistinguishable from "nothing loaded", so no runway is claimed)
//! - whole days from as-of to the first date the cumulative sum strictly
//!   exceeds the balance
//! - [`SENTINEL`] when the known forecasts never exhaust the balance

use std::collections::BTreeMap;
use std::time::Instant;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::CashMetricsError;
use crate::forecast::records::{Certainty, ForecastRecord};
use crate::types::{with_metadata, ComputationOutput, Money, SENTINEL};
use crate::CashMetricsResult;

/// Fixed-only filter.
pub const FIXED_ONLY: &[Certainty] = &[Certainty::Fixed];

/// Fixed plus contingency filter.
pub const FIXED_AND_CONTINGENCY: &[Certainty] = &[Certainty::Fixed, Certainty::Contingency];

/// Runway under both certainty filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunwayProjection {
    pub as_of: NaiveDate,
    /// Runway against committed outflows only
    pub fixed_days: i64,
    /// Runway against committed plus contingent outflows
    pub total_days: i64,
}

impl RunwayProjection {
    pub fn fixed_beyond_horizon(&self) -> bool {
        self.fixed_days >= SENTINEL
    }

    pub fn total_beyond_horizon(&self) -> bool {
        self.total_days >= SENTINEL
    }
}

pub fn days_until_breach(
    available_balance: Money,
    forecasts: &[ForecastRecord],
    as_of: NaiveDate,
    certainty_filter: &[Certainty],
) -> i64 {
    if available_balance <= Money::ZERO {
        return 0;
    }

    let mut daily: BTreeMap<NaiveDate, Money> = BTreeMap::new();
    for r in forecasts
        .iter()
        .filter(|r| qualifies(r, as_of, certainty_filter))
    {
        let total = daily.entry(r.forecast_date).or_insert(Money::ZERO);
        *total = total.saturating_add(r.net_payable);
    }

    if daily.is_empty() {
        return 0;
    }

    let mut cumulative = Money::ZERO;
    for (date, outflow) in &daily {
        cumulative = cumulative.saturating_add(*outflow);
        if cumulative > available_balance {
            let days = (*date - as_of).num_days().max(0);
            tracing::debug!(
                breach_date = %date,
                days,
                cumulative = %cumulative,
                "Runway breach found"
            );
            return days;
        }
    }

    SENTINEL
}

fn qualifies(record: &ForecastRecord, as_of: NaiveDate, certainty_filter: &[Certainty]) -> bool {
    record.forecast_date > as_of && certainty_filter.contains(&record.certainty)
}

/// Runway for fixed-only and fixed-plus-contingency outflows.
pub fn project_runway(
    available_balance: Money,
    forecasts: &[ForecastRecord],
    as_of: NaiveDate,
) -> RunwayProjection {
    RunwayProjection {
        as_of,
        fixed_days: days_until_breach(available_balance, forecasts, as_of, FIXED_ONLY),
        total_days: days_until_breach(available_balance, forecasts, as_of, FIXED_AND_CONTINGENCY),
    }
}

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunwayInput {
    pub available_balance: Money,
    pub forecasts: Vec<ForecastRecord>,
    pub as_of: NaiveDate,
    /// Extra runway figure for a caller-chosen set of certainty tags
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certainty_filter: Option<Vec<Certainty>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunwayAnalysis {
    pub available_balance: Money,
    pub projection: RunwayProjection,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filtered_days: Option<i64>,
}

pub fn analyze_runway(input: &RunwayInput) -> CashMetricsResult<ComputationOutput<RunwayAnalysis>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if let Some(filter) = &input.certainty_filter {
        if filter.is_empty() {
            return Err(CashMetricsError::InvalidInput {
                field: "certainty_filter".into(),
                reason: "Certainty filter must name at least one tag.".into(),
            });
        }
    }

    if input.available_balance <= Money::ZERO {
        warnings.push("Available balance is not positive; runway is 0 days.".into());
    } else {
        let mut filters: Vec<(&str, &[Certainty])> =
            vec![("fixed", FIXED_ONLY), ("fixed + contingency", FIXED_AND_CONTINGENCY)];
        if let Some(filter) = input.certainty_filter.as_deref() {
            filters.push(("requested", filter));
        }
        for (label, filter) in filters {
            if !input.forecasts.iter().any(|r| qualifies(r, input.as_of, filter)) {
                warnings.push(format!(
                    "No {label} forecast outflows after {}; {label} runway reported as 0 days.",
                    input.as_of
                ));
            }
        }
    }

    let projection = project_runway(input.available_balance, &input.forecasts, input.as_of);
    let filtered_days = input
        .certainty_filter
        .as_deref()
        .map(|f| days_until_breach(input.available_balance, &input.forecasts, input.as_of, f));

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Cash runway: days until cumulative forecast outflows exceed the available balance",
        &serde_json::json!({
            "as_of": input.as_of,
            "beyond_horizon_sentinel": SENTINEL,
            "certainty_filter": input.certainty_filter,
        }),
        warnings,
        elapsed,
        RunwayAnalysis {
            available_balance: input.available_balance,
            projection,
            filtered_days,
        },
    ))
}
