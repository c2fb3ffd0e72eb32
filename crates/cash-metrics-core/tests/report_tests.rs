use cash_metrics_core::analytics::trend::TrendDirection;
use cash_metrics_core::report::dashboard::{
    compute_liquidity_report, FundingAlert, LiquidityReportInput,
};
use cash_metrics_core::CashMetricsError;
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Eight days of SBI activity with forecasts starting the day after.
fn sample_json(unit_scale: &str) -> String {
    let flows = [
        ("2024-01-01", "100", "100"),
        ("2024-01-02", "-50", "50"),
        ("2024-01-03", "30", "80"),
        ("2024-01-04", "-20", "60"),
        ("2024-01-05", "10", "70"),
        ("2024-01-06", "40", "110"),
        ("2024-01-07", "-10", "100"),
        ("2024-01-08", "70", "170"),
    ];
    let rows: Vec<String> = flows
        .iter()
        .map(|(date, flow, balance)| {
            format!(
                r#"{{"entity_id": "SBI", "value_date": "{date}", "net_flow": "{flow}",
                    "running_balance": "{balance}", "nature": "Operating Receipts"}}"#
            )
        })
        .collect();

    format!(
        r#"{{
            "config": {{
                "entities": [
                    {{"entity_id": "SBI", "limit_amount": "1000", "sign_convention": "ADD_BALANCE"}}
                ],
                "unit_scale": "{unit_scale}"
            }},
            "ledgers": {{ "SBI": [{rows}] }},
            "outflow_forecasts": [
                {{"forecast_date": "2024-01-09", "net_payable": "600", "certainty": "FIXED"}},
                {{"forecast_date": "2024-01-10", "net_payable": "700", "certainty": "contingency"}},
                {{"forecast_date": "2024-01-12", "net_payable": "600", "certainty": "Fixed"}}
            ],
            "inflow_forecasts": [
                {{"forecast_date": "2024-01-11", "amount_received": "500"}}
            ],
            "billing": [
                {{"billing_date": "2024-01-05", "amount": "850"}}
            ],
            "snapshot": {{
                "closing_date": "2024-04-10",
                "opening_payables": "50", "closing_payables": "50",
                "opening_receivables": "100", "closing_receivables": "100",
                "opening_inventory": "200", "closing_inventory": "200",
                "net_sales": "1,000",
                "cogs_component_1": "250", "cogs_component_2": "250"
            }}
        }}"#,
        rows = rows.join(",")
    )
}

fn sample_input(unit_scale: &str) -> LiquidityReportInput {
    serde_json::from_str(&sample_json(unit_scale)).unwrap()
}

#[test]
fn test_full_report_from_json() {
    let out = compute_liquidity_report(&sample_input("1")).unwrap();
    let r = &out.result;

    assert_eq!(r.cash_totals.total_inflow, dec!(250));
    assert_eq!(r.cash_totals.total_outflow, dec!(80));
    assert_eq!(r.cash_totals.net_flow, dec!(170));
    assert_eq!(r.activity.operating, dec!(170));

    // 1000 + 170 as of 2024-01-08
    assert_eq!(r.available_credit.total, dec!(1_170));

    // Fixed: 600, 1200 > 1170 on 01-12; total: 600, 1300 > 1170 on 01-10
    assert_eq!(r.runway.fixed_days, 4);
    assert_eq!(r.runway.total_days, 2);
    assert_eq!(r.funding_alert, FundingAlert::FundingRequired { days: 4 });

    assert_eq!(r.revenue, dec!(850));
    assert_eq!(r.ocf_to_sales, dec!(0.2));

    let ccc = r.ccc.expect("snapshot parses");
    assert_eq!(ccc.day_count, 10);
    assert_eq!(ccc.ccc, dec!(4));

    assert_eq!(r.forecast.outflow.fixed_total, dec!(1_200));
    assert_eq!(r.forecast.outflow.contingency_total, dec!(700));
    assert_eq!(r.forecast.outflow.grand_total, dec!(1_900));
    assert_eq!(r.forecast.inflow.grand_total, dec!(500));
    assert_eq!(r.forecast.net_forecast, dec!(-1_400));
    assert_eq!(r.forecast.due_today.grand_total, Decimal::ZERO);

    // No forecasts inside the reporting window
    assert_eq!(r.efficiency.forecast_net_flow, Decimal::ZERO);
    assert_eq!(r.efficiency.efficiency_pct, dec!(100));

    let trend = r.trend.as_ref().expect("eight days of history");
    // MA[7] = 70 / 7 = 10, MA[1] = 50 / 2 = 25
    assert_eq!(trend.trend_value, dec!(-15));
    assert_eq!(trend.direction, TrendDirection::Decreasing);
    assert_eq!(trend.days_observed, 8);

    assert!(out.warnings.is_empty(), "unexpected warnings: {:?}", out.warnings);
}

#[test]
fn test_unit_scale_applies_to_money_only() {
    let r = compute_liquidity_report(&sample_input("10")).unwrap().result;
    assert_eq!(r.cash_totals.net_flow, dec!(17));
    assert_eq!(r.available_credit.total, dec!(117));
    assert_eq!(r.forecast.net_forecast, dec!(-140));
    assert_eq!(r.trend.as_ref().map(|t| t.trend_value), Some(dec!(-1.5)));

    // Day counts, ratios and percentages are unit-free
    assert_eq!(r.runway.fixed_days, 4);
    assert_eq!(r.ocf_to_sales, dec!(0.2));
    assert_eq!(r.efficiency.efficiency_pct, dec!(100));
    assert_eq!(r.ccc.map(|c| c.ccc), Some(dec!(4)));
}

#[test]
fn test_reversed_window_is_rejected() {
    let mut input = sample_input("1");
    input.window = Some(cash_metrics_core::DateWindow {
        start: chrono::NaiveDate::from_ymd_opt(2024, 1, 8).unwrap(),
        end: chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
    });
    let err = compute_liquidity_report(&input).unwrap_err();
    assert!(matches!(err, CashMetricsError::DateError(_)));
}

#[test]
fn test_report_serializes_with_tagged_alert() {
    let out = compute_liquidity_report(&sample_input("1")).unwrap();
    let value = serde_json::to_value(&out).unwrap();
    assert_eq!(value["result"]["funding_alert"]["level"], "funding_required");
    assert_eq!(value["result"]["funding_alert"]["days"], 4);
}
