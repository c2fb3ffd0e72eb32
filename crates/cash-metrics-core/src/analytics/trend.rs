//! Short-term cash-flow trend over a consolidated ledger.
//!
//! Daily net flow is smoothed with a 7-period trailing moving average. The
//! first six points average whatever history exists so far. The trend value
//! compares the latest average with the one six points earlier.

use std::time::Instant;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use serde::{Deserialize, Serialize};

use crate::config::{default_unit_scale, scale_amount, validate_unit_scale};
use crate::error::CashMetricsError;
use crate::ledger::consolidation::{
    all_ledgers_empty, consolidate, resolve_window, ConsolidatedLedger, EntityLedgers,
};
use crate::types::{with_metadata, ComputationOutput, DateWindow, Money};
use crate::CashMetricsResult;

/// Trailing window length and minimum number of distinct days required.
pub const TREND_WINDOW: usize = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrendDirection {
    Increasing,
    /// Also used when the trend value is exactly zero
    Decreasing,
}

impl TrendDirection {
    pub fn from_value(trend_value: Decimal) -> Self {
        if trend_value > Decimal::ZERO {
            TrendDirection::Increasing
        } else {
            TrendDirection::Decreasing
        }
    }
}

/// One calendar day of the smoothed series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyFlowPoint {
    pub date: NaiveDate,
    pub net_flow: Money,
    pub moving_average: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendReport {
    pub direction: TrendDirection,
    /// MA[last] - MA[last - 6]
    pub trend_value: Money,
    /// Mean of the positive daily net flows
    pub avg_inflow: Money,
    /// Mean magnitude of the negative daily net flows
    pub avg_outflow: Money,
    /// Sample standard deviation of daily net flow
    pub volatility: Money,
    pub days_observed: usize,
    pub daily: Vec<DailyFlowPoint>,
}

impl TrendReport {
    pub fn scaled(&self, scale: impl Fn(Money) -> Money) -> Self {
        Self {
            direction: self.direction,
            trend_value: scale(self.trend_value),
            avg_inflow: scale(self.avg_inflow),
            avg_outflow: scale(self.avg_outflow),
            volatility: scale(self.volatility),
            days_observed: self.days_observed,
            daily: self
                .daily
                .iter()
                .map(|p| DailyFlowPoint {
                    date: p.date,
                    net_flow: scale(p.net_flow),
                    moving_average: scale(p.moving_average),
                })
                .collect(),
        }
    }
}

/// Trend report, or `None` when fewer than seven distinct days have data.
pub fn trend_analysis(ledger: &ConsolidatedLedger) -> Option<TrendReport> {
    let daily = ledger.daily_net_flow();
    if daily.len() < TREND_WINDOW {
        tracing::debug!(days = daily.len(), "Insufficient history for trend analysis");
        return None;
    }

    let flows: Vec<Money> = daily.values().copied().collect();
    let moving = trailing_moving_average(&flows, TREND_WINDOW);

    let trend_value = if moving.len() >= TREND_WINDOW {
        moving[moving.len() - 1] - moving[moving.len() - TREND_WINDOW]
    } else {
        Decimal::ZERO
    };

    let positives: Vec<Money> = flows.iter().copied().filter(|f| *f > Decimal::ZERO).collect();
    let negatives: Vec<Money> = flows.iter().copied().filter(|f| *f < Decimal::ZERO).collect();

    let points = daily
        .iter()
        .zip(moving.iter())
        .map(|((date, flow), ma)| DailyFlowPoint {
            date: *date,
            net_flow: *flow,
            moving_average: *ma,
        })
        .collect();

    Some(TrendReport {
        direction: TrendDirection::from_value(trend_value),
        trend_value,
        avg_inflow: mean(&positives),
        avg_outflow: mean(&negatives).abs(),
        volatility: std_dev(&flows),
        days_observed: flows.len(),
        daily: points,
    })
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendInput {
    pub ledgers: EntityLedgers,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window: Option<DateWindow>,
    #[serde(default = "default_unit_scale")]
    pub unit_scale: Decimal,
}

/// Trend over the consolidated window; too little history is an error here.
pub fn analyze_trend(input: &TrendInput) -> CashMetricsResult<ComputationOutput<TrendReport>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate_unit_scale(input.unit_scale)?;
    if all_ledgers_empty(&input.ledgers) {
        return Err(CashMetricsError::NoLedgerData);
    }
    let window = resolve_window(&input.ledgers, input.window)?;
    let ledger = consolidate(&input.ledgers, window);

    let report = trend_analysis(&ledger).ok_or_else(|| {
        CashMetricsError::InsufficientData(format!(
            "Trend analysis needs at least {TREND_WINDOW} days of transactions."
        ))
    })?;
    if report.days_observed < TREND_WINDOW * 2 {
        warnings.push(format!(
            "Only {} days observed; early moving averages use partial windows.",
            report.days_observed
        ));
    }

    let result = report.scaled(|m| scale_amount(m, input.unit_scale));
    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Cash flow trend: 7-day trailing moving average of daily net flow",
        &serde_json::json!({
            "window": window,
            "moving_average_window": TREND_WINDOW,
            "volatility": "sample standard deviation of daily net flow",
            "unit_scale": input.unit_scale,
        }),
        warnings,
        elapsed,
        result,
    ))
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// Trailing mean over up to `window` points ending at each index.
fn trailing_moving_average(values: &[Decimal], window: usize) -> Vec<Decimal> {
    (0..values.len())
        .map(|i| {
            let from = (i + 1).saturating_sub(window);
            mean(&values[from..=i])
        })
        .collect()
}

fn mean(values: &[Decimal]) -> Decimal {
    if values.is_empty() {
        return Decimal::ZERO;
    }
    let n = Decimal::from(values.len() as u64);
    match checked_sum(values.iter().copied()) {
        Some(total) => total / n,
        None => values.iter().map(|v| *v / n).sum(),
    }
}

fn checked_sum(mut values: impl Iterator<Item = Decimal>) -> Option<Decimal> {
    values.try_fold(Decimal::ZERO, |acc, v| acc.checked_add(v))
}

/// Sample standard deviation; zero for fewer than two values.
///
/// Flows near the decimal range are normalised by the largest deviation
/// before squaring, and the result saturates at `Decimal::MAX`.
fn std_dev(values: &[Decimal]) -> Decimal {
    if values.len() < 2 {
        return Decimal::ZERO;
    }
    let m = mean(values);
    let dof = Decimal::from(values.len() as u64 - 1);

    let deviations: Option<Vec<Decimal>> = values.iter().map(|v| v.checked_sub(m)).collect();
    let Some(deviations) = deviations else {
        // A deviation itself overflowed; halve everything and scale back.
        let two = Decimal::from(2);
        let halves: Vec<Decimal> = values.iter().map(|v| *v / two).collect();
        return std_dev(&halves).checked_mul(two).unwrap_or(Decimal::MAX);
    };

    let sum_sq = deviations
        .iter()
        .try_fold(Decimal::ZERO, |acc, d| d.checked_mul(*d).and_then(|sq| acc.checked_add(sq)));
    if let Some(sum_sq) = sum_sq {
        return sqrt_decimal(sum_sq / dof);
    }

    let k = deviations
        .iter()
        .map(|d| d.abs())
        .max()
        .unwrap_or(Decimal::ZERO);
    if k.is_zero() {
        return Decimal::ZERO;
    }
    let normalised: Decimal = deviations
        .iter()
        .map(|d| {
            let r = *d / k;
            r * r
        })
        .sum();
    sqrt_decimal(normalised / dof)
        .checked_mul(k)
        .unwrap_or(Decimal::MAX)
}

fn sqrt_decimal(value: Decimal) -> Decimal {
    if value <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    value.sqrt().unwrap_or(Decimal::ZERO)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::consolidation::ConsolidatedEntry;
    use rust_decimal_macros::dec;

    fn ledger_from_daily(start: NaiveDate, flows: &[Decimal]) -> ConsolidatedLedger {
        let entries = flows
            .iter()
            .enumerate()
            .map(|(i, f)| ConsolidatedEntry {
                entity_id: "SBI".into(),
                value_date: start + chrono::Duration::days(i as i64),
                net_flow: *f,
                running_balance: Decimal::ZERO,
                withdrawal: if *f < Decimal::ZERO { -*f } else { Decimal::ZERO },
                deposit: if *f > Decimal::ZERO { *f } else { Decimal::ZERO },
            })
            .collect();
        ConsolidatedLedger {
            window: None,
            entries,
        }
    }

    fn jan1() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }

    #[test]
    fn test_fewer_than_seven_days_is_unavailable() {
        let ledger = ledger_from_daily(jan1(), &[dec!(1); 6]);
        assert!(trend_analysis(&ledger).is_none());
    }

    #[test]
    fn test_many_rows_on_few_days_is_unavailable() {
        let mut ledger = ledger_from_daily(jan1(), &[dec!(1); 3]);
        let extra = ledger.entries.clone();
        ledger.entries.extend(extra.iter().cloned());
        ledger.entries.extend(extra);
        assert_eq!(ledger.len(), 9);
        assert!(trend_analysis(&ledger).is_none());
    }

    #[test]
    fn test_zero_trend_is_decreasing() {
        let ledger = ledger_from_daily(jan1(), &[dec!(100); 7]);
        let r = trend_analysis(&ledger).unwrap();
        assert_eq!(r.trend_value, Decimal::ZERO);
        assert_eq!(r.direction, TrendDirection::Decreasing);
    }

    #[test]
    fn test_direction_boundary() {
        assert_eq!(TrendDirection::from_value(dec!(0)), TrendDirection::Decreasing);
        assert_eq!(TrendDirection::from_value(dec!(0.0001)), TrendDirection::Increasing);
        assert_eq!(TrendDirection::from_value(dec!(-5)), TrendDirection::Decreasing);
    }

    #[test]
    fn test_increasing_trend_with_partial_windows() {
        let flows = [dec!(0), dec!(0), dec!(0), dec!(0), dec!(0), dec!(0), dec!(70)];
        let r = trend_analysis(&ledger_from_daily(jan1(), &flows)).unwrap();
        // MA = [0, 0, 0, 0, 0, 0, 10]; compare last with first
        assert_eq!(r.trend_value, dec!(10));
        assert_eq!(r.direction, TrendDirection::Increasing);
        assert_eq!(r.daily.len(), 7);
        assert_eq!(r.daily[6].moving_average, dec!(10));
    }

    #[test]
    fn test_decreasing_trend_uses_point_six_back() {
        let flows = [
            dec!(70),
            dec!(0),
            dec!(0),
            dec!(0),
            dec!(0),
            dec!(0),
            dec!(0),
            dec!(0),
        ];
        let r = trend_analysis(&ledger_from_daily(jan1(), &flows)).unwrap();
        // MA[1] = 35, MA[7] = 0
        assert_eq!(r.trend_value, dec!(-35));
        assert_eq!(r.direction, TrendDirection::Decreasing);
    }

    #[test]
    fn test_avg_inflow_outflow_and_volatility() {
        let flows = [
            dec!(2),
            dec!(-2),
            dec!(2),
            dec!(-2),
            dec!(2),
            dec!(-2),
            dec!(0),
        ];
        let r = trend_analysis(&ledger_from_daily(jan1(), &flows)).unwrap();
        assert_eq!(r.avg_inflow, dec!(2));
        assert_eq!(r.avg_outflow, dec!(2));
        // Sample variance = 24 / 6 = 4
        assert!((r.volatility - dec!(2)).abs() < dec!(0.0000001));
        assert_eq!(r.days_observed, 7);
    }

    #[test]
    fn test_constant_flow_has_zero_volatility() {
        let r = trend_analysis(&ledger_from_daily(jan1(), &[dec!(-5); 10])).unwrap();
        assert_eq!(r.volatility, Decimal::ZERO);
        assert_eq!(r.avg_inflow, Decimal::ZERO);
        assert_eq!(r.avg_outflow, dec!(5));
    }

    #[test]
    fn test_std_dev_needs_two_points() {
        assert_eq!(std_dev(&[dec!(5)]), Decimal::ZERO);
        assert_eq!(std_dev(&[]), Decimal::ZERO);
    }

    #[test]
    fn test_analyze_trend_insufficient_is_error() {
        let rows = (0..3)
            .map(|i| crate::ledger::transaction::Transaction {
                entity_id: "SBI".into(),
                value_date: jan1() + chrono::Duration::days(i),
                net_flow: dec!(1),
                running_balance: Decimal::ZERO,
                nature: None,
            })
            .collect();
        let mut ledgers = EntityLedgers::new();
        ledgers.insert("SBI".into(), rows);
        let input = TrendInput {
            ledgers,
            window: None,
            unit_scale: Decimal::ONE,
        };
        assert!(matches!(
            analyze_trend(&input),
            Err(CashMetricsError::InsufficientData(_))
        ));
    }

    #[test]
    fn test_std_dev_of_large_flows_does_not_overflow() {
        // squares of 3e14 exceed the decimal range
        let sd = std_dev(&[dec!(300_000_000_000_000), dec!(-300_000_000_000_000)]);
        let expected = dec!(424_264_068_711_928.5146);
        assert!((sd - expected).abs() < dec!(1));
    }

    #[test]
    fn test_std_dev_at_range_limits_saturates_or_stays_finite() {
        let sd = std_dev(&[Decimal::MAX, Decimal::MIN, Decimal::MAX]);
        assert!(sd > Decimal::ZERO);
    }

    #[test]
    fn test_trend_over_large_flows_reports_volatility() {
        let mut flows = vec![dec!(400_000_000_000_000); 4];
        flows.extend(vec![dec!(-400_000_000_000_000); 4]);
        let report = trend_analysis(&ledger_from_daily(jan1(), &flows)).unwrap();
        assert!(report.volatility > dec!(400_000_000_000_000));
    }
}
