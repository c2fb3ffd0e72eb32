//! Liquidity report for one reporting window.
//!
//! Composes every metric group the reporting surface shows:
//! - available credit and the two runway figures, with a funding alert
//! - period inflow / outflow / net and activity totals
//! - revenue, OCF-to-sales and the cash conversion cycle
//! - forecast buckets for today and the forward horizon
//! - forecast efficiency, trend and volatility
//!
//! Degenerate inputs for one metric never abort the report; they surface as
//! `None` fields plus a warning. Only an entirely empty ledger set (or an
//! invalid configuration / window) is an error. Monetary outputs are
//! expressed in `config.unit_scale` units; day counts, ratios and
//! percentages are not scaled.

use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::analytics::efficiency::{forecast_efficiency, ocf_to_sales, ForecastEfficiency};
use crate::analytics::trend::{trend_analysis, TrendReport};
use crate::config::{ForecastHorizon, MetricsConfig};
use crate::error::CashMetricsError;
use crate::forecast::aggregation::{
    aggregate_inflow, aggregate_outflow, forecast_outlook, ForecastOutlook,
};
use crate::forecast::records::{ForecastRecord, InflowForecastRecord};
use crate::ledger::consolidation::{
    all_ledgers_empty, cashflow_by_activity, consolidate, resolve_window, ActivityTotals,
    CashTotals, EntityLedgers,
};
use crate::ledger::revenue::{revenue_for_window, BillingRecord};
use crate::liquidity::credit_limits::{total_available_credit, AvailableCredit};
use crate::liquidity::runway::{project_runway, RunwayProjection};
use crate::types::{with_metadata, ComputationOutput, DateWindow, Money, Rate};
use crate::working_capital::ccc::{ccc_from_cells, CccMetrics, SnapshotCells};
use crate::CashMetricsResult;

// ---------------------------------------------------------------------------
// Input / Output types
// ---------------------------------------------------------------------------

/// Everything the ingestion layer hands over for one reporting request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiquidityReportInput {
    pub config: MetricsConfig,
    pub ledgers: EntityLedgers,
    #[serde(default)]
    pub outflow_forecasts: Vec<ForecastRecord>,
    #[serde(default)]
    pub inflow_forecasts: Vec<InflowForecastRecord>,
    #[serde(default)]
    pub billing: Vec<BillingRecord>,
    /// Raw CCC snapshot cells; absent means CCC is not reported
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<SnapshotCells>,
    /// Reporting window; defaults to the full span of ledger data
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window: Option<DateWindow>,
    /// Forward horizon; defaults to `config.default_horizon`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub horizon: Option<ForecastHorizon>,
}

/// Severity of the funding position implied by the runway figures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "level", rename_all = "snake_case")]
pub enum FundingAlert {
    /// Fixed outflows alone breach within the threshold
    FundingRequired { days: i64 },
    /// Fixed plus contingency outflows breach within the threshold
    ContingencyFunding { days: i64 },
    SufficientFunds,
}

impl FundingAlert {
    pub fn from_runway(runway: &RunwayProjection, threshold_days: i64) -> Self {
        if runway.fixed_days < threshold_days {
            FundingAlert::FundingRequired {
                days: runway.fixed_days,
            }
        } else if runway.total_days < threshold_days {
            FundingAlert::ContingencyFunding {
                days: runway.total_days,
            }
        } else {
            FundingAlert::SufficientFunds
        }
    }
}

/// Full set of metric groups for the reporting surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiquidityReport {
    pub window: DateWindow,
    pub unit_scale: Money,
    pub available_credit: AvailableCredit,
    pub runway: RunwayProjection,
    pub funding_alert: FundingAlert,
    pub cash_totals: CashTotals,
    pub activity: ActivityTotals,
    pub revenue: Money,
    pub ocf_to_sales: Rate,
    /// `None` when the snapshot is missing or unparseable
    pub ccc: Option<CccMetrics>,
    pub forecast: ForecastOutlook,
    pub efficiency: ForecastEfficiency,
    /// `None` with fewer than seven days of ledger history
    pub trend: Option<TrendReport>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

pub fn compute_liquidity_report(
    input: &LiquidityReportInput,
) -> CashMetricsResult<ComputationOutput<LiquidityReport>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    // -- Validation ----------------------------------------------------------
    let config = &input.config;
    config.validate()?;

    if all_ledgers_empty(&input.ledgers) {
        return Err(CashMetricsError::NoLedgerData);
    }

    let window = resolve_window(&input.ledgers, input.window)?;
    let as_of = window.end;
    let horizon = input.horizon.unwrap_or(config.default_horizon);
    let scale = |m: Money| config.scale(m);

    for entity in input.ledgers.keys() {
        if config.limit_for(entity).is_none() {
            warnings.push(format!(
                "Entity '{entity}' has ledger data but no configured limit; excluded from available credit."
            ));
        }
    }

    // -- Liquidity -----------------------------------------------------------
    let credit = total_available_credit(config, as_of, &input.ledgers);
    let runway = project_runway(credit.total, &input.outflow_forecasts, as_of);
    let funding_alert = FundingAlert::from_runway(&runway, config.alert_threshold_days);

    if input.outflow_forecasts.is_empty() {
        warnings.push("No outflow forecasts loaded; runway reported as 0 days.".into());
    }

    // -- Period actuals ------------------------------------------------------
    let ledger = consolidate(&input.ledgers, window);
    if ledger.is_empty() {
        warnings.push(format!(
            "No transactions between {} and {}; period totals are zero.",
            window.start, window.end
        ));
    }
    let cash_totals = ledger.cash_totals().scaled(scale);
    let activity = cashflow_by_activity(&input.ledgers, window).scaled(scale);

    let revenue = scale(revenue_for_window(&input.billing, window));
    let ocf_ratio = ocf_to_sales(activity.operating, revenue);

    // -- Working capital -----------------------------------------------------
    let ccc = match &input.snapshot {
        Some(cells) => {
            let metrics = ccc_from_cells(cells);
            if metrics.is_none() {
                warnings.push("Cash conversion cycle unavailable: snapshot could not be parsed.".into());
            }
            metrics
        }
        None => None,
    };

    // -- Forecasts -----------------------------------------------------------
    let forecast = forecast_outlook(&input.outflow_forecasts, &input.inflow_forecasts, as_of, horizon)
        .scaled(scale);

    // Efficiency compares in reporting units so the zero-actual tolerance is
    // applied to the figures the reader sees.
    let window_outflow = scale(aggregate_outflow(&input.outflow_forecasts, window).grand_total);
    let window_inflow = scale(aggregate_inflow(&input.inflow_forecasts, window).grand_total);
    let efficiency = forecast_efficiency(cash_totals.net_flow, window_inflow - window_outflow);

    // -- Trend ---------------------------------------------------------------
    let trend = trend_analysis(&ledger).map(|t| t.scaled(scale));
    if trend.is_none() {
        warnings.push(
            "Insufficient data for trend analysis: fewer than 7 days of transactions.".into(),
        );
    }

    tracing::debug!(
        start = %window.start,
        end = %window.end,
        rows = ledger.len(),
        fixed_runway = runway.fixed_days,
        total_runway = runway.total_days,
        "Computed liquidity report"
    );

    let report = LiquidityReport {
        window,
        unit_scale: config.unit_scale,
        available_credit: credit.scaled(scale),
        runway,
        funding_alert,
        cash_totals,
        activity,
        revenue,
        ocf_to_sales: ocf_ratio,
        ccc,
        forecast,
        efficiency,
        trend,
    };

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Liquidity report (available credit, runway, CCC, forecast outlook, trend)",
        &ReportAssumptions {
            window,
            horizon,
            unit_scale: config.unit_scale,
            alert_threshold_days: config.alert_threshold_days,
            entities: config.entities.len(),
        },
        warnings,
        elapsed,
        report,
    ))
}

/// Assumptions echoed in the envelope; the raw ledgers are not.
#[derive(Debug, Serialize)]
struct ReportAssumptions {
    window: DateWindow,
    horizon: ForecastHorizon,
    unit_scale: Money,
    alert_threshold_days: i64,
    entities: usize,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CreditLimit, SignConvention};
    use crate::forecast::records::Certainty;
    use crate::ledger::transaction::Transaction;
    use crate::types::SENTINEL;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn txn(entity: &str, date: NaiveDate, flow: Money, balance: Money) -> Transaction {
        Transaction {
            entity_id: entity.to_string(),
            value_date: date,
            net_flow: flow,
            running_balance: balance,
            nature: Some("Operating".into()),
        }
    }

    fn sample_input() -> LiquidityReportInput {
        let config = MetricsConfig::new(vec![
            CreditLimit {
                entity_id: "SBI".into(),
                limit_amount: dec!(1_000),
                sign_convention: SignConvention::AddBalance,
            },
            CreditLimit {
                entity_id: "Axis".into(),
                limit_amount: dec!(500),
                sign_convention: SignConvention::SubtractBalance,
            },
        ]);
        let mut ledgers = EntityLedgers::new();
        ledgers.insert(
            "SBI".into(),
            vec![
                txn("SBI", d(2024, 1, 1), dec!(100), dec!(100)),
                txn("SBI", d(2024, 1, 3), dec!(-40), dec!(60)),
            ],
        );
        LiquidityReportInput {
            config,
            ledgers,
            outflow_forecasts: vec![
                ForecastRecord {
                    forecast_date: d(2024, 1, 4),
                    net_payable: dec!(1_000),
                    certainty: Certainty::Fixed,
                },
                ForecastRecord {
                    forecast_date: d(2024, 1, 10),
                    net_payable: dec!(1_000),
                    certainty: Certainty::Contingency,
                },
            ],
            inflow_forecasts: vec![],
            billing: vec![BillingRecord {
                billing_date: d(2024, 1, 2),
                amount: dec!(240),
            }],
            snapshot: None,
            window: None,
            horizon: None,
        }
    }

    #[test]
    fn test_empty_ledgers_is_hard_failure() {
        let mut input = sample_input();
        input.ledgers.values_mut().for_each(Vec::clear);
        let err = compute_liquidity_report(&input).unwrap_err();
        assert!(matches!(err, CashMetricsError::NoLedgerData));
    }

    #[test]
    fn test_default_window_is_ledger_span() {
        let out = compute_liquidity_report(&sample_input()).unwrap();
        assert_eq!(out.result.window.start, d(2024, 1, 1));
        assert_eq!(out.result.window.end, d(2024, 1, 3));
    }

    #[test]
    fn test_period_totals_and_credit() {
        let r = compute_liquidity_report(&sample_input()).unwrap().result;
        assert_eq!(r.cash_totals.total_inflow, dec!(100));
        assert_eq!(r.cash_totals.total_outflow, dec!(40));
        assert_eq!(r.cash_totals.net_flow, dec!(60));
        // SBI 1000 + 60, Axis 500 - 0
        assert_eq!(r.available_credit.total, dec!(1_560));
        assert_eq!(r.activity.operating, dec!(60));
        assert_eq!(r.revenue, dec!(240));
        assert_eq!(r.ocf_to_sales, dec!(0.25));
    }

    #[test]
    fn test_runway_and_alert() {
        let r = compute_liquidity_report(&sample_input()).unwrap().result;
        // Fixed: 1000 <= 1560 never breaches
        assert_eq!(r.runway.fixed_days, SENTINEL);
        // Total: 2000 > 1560 on Jan 10
        assert_eq!(r.runway.total_days, 7);
        assert_eq!(r.funding_alert, FundingAlert::ContingencyFunding { days: 7 });
    }

    #[test]
    fn test_fixed_alert_takes_priority() {
        let runway = RunwayProjection {
            as_of: d(2024, 1, 1),
            fixed_days: 10,
            total_days: 5,
        };
        assert_eq!(
            FundingAlert::from_runway(&runway, 30),
            FundingAlert::FundingRequired { days: 10 }
        );
        let safe = RunwayProjection {
            as_of: d(2024, 1, 1),
            fixed_days: 45,
            total_days: 30,
        };
        assert_eq!(FundingAlert::from_runway(&safe, 30), FundingAlert::SufficientFunds);
    }

    #[test]
    fn test_degenerate_metrics_become_warnings() {
        let mut input = sample_input();
        input.snapshot = Some(SnapshotCells::default());
        let out = compute_liquidity_report(&input).unwrap();
        assert!(out.result.ccc.is_none());
        assert!(out.result.trend.is_none());
        assert!(out.warnings.iter().any(|w| w.contains("Cash conversion cycle")));
        assert!(out.warnings.iter().any(|w| w.contains("trend")));
    }

    #[test]
    fn test_unit_scale_applies_to_money_not_days() {
        let mut input = sample_input();
        input.config.unit_scale = dec!(10);
        let r = compute_liquidity_report(&input).unwrap().result;
        assert_eq!(r.cash_totals.net_flow, dec!(6));
        assert_eq!(r.available_credit.total, dec!(156));
        assert_eq!(r.revenue, dec!(24));
        assert_eq!(r.runway.total_days, 7);
        // Ratio is scale-invariant
        assert_eq!(r.ocf_to_sales, dec!(0.25));
    }

    #[test]
    fn test_efficiency_over_window() {
        let mut input = sample_input();
        input.inflow_forecasts = vec![InflowForecastRecord {
            forecast_date: d(2024, 1, 2),
            amount_received: dec!(80),
        }];
        let r = compute_liquidity_report(&input).unwrap().result;
        // actual 60, forecast 80 - 0 => variance -20 => -33.33%
        assert_eq!(r.efficiency.forecast_net_flow, dec!(80));
        assert_eq!(r.efficiency.variance, dec!(-20));
        assert!(r.efficiency.efficiency_pct < Decimal::ZERO);
    }

    #[test]
    fn test_inverted_window_rejected() {
        let mut input = sample_input();
        input.window = Some(DateWindow {
            start: d(2024, 2, 1),
            end: d(2024, 1, 1),
        });
        assert!(matches!(
            compute_liquidity_report(&input).unwrap_err(),
            CashMetricsError::DateError(_)
        ));
    }

    #[test]
    fn test_unconfigured_entity_is_warned() {
        let mut input = sample_input();
        input
            .ledgers
            .insert("Ghost".into(), vec![txn("Ghost", d(2024, 1, 2), dec!(5), dec!(5))]);
        let out = compute_liquidity_report(&input).unwrap();
        assert!(out.warnings.iter().any(|w| w.contains("Ghost")));
        assert_eq!(out.result.available_credit.total, dec!(1_560));
    }
}
