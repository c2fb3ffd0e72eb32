use std::str::FromStr;
use std::time::Instant;

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::CashMetricsError;
use crate::types::{with_metadata, ComputationOutput, Money};
use crate::CashMetricsResult;

/// Month in which the fiscal year opens (April).
const FISCAL_YEAR_START_MONTH: u32 = 4;

// ---------------------------------------------------------------------------
// Input / Output types
// ---------------------------------------------------------------------------

/// Single-period balance sheet figures for the cash conversion cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceSheetSnapshot {
    /// Period closing date; the fiscal year-to-date day count runs to here
    pub closing_date: NaiveDate,
    pub opening_payables: Money,
    pub closing_payables: Money,
    pub opening_receivables: Money,
    pub closing_receivables: Money,
    pub opening_inventory: Money,
    pub closing_inventory: Money,
    pub net_sales: Money,
    /// COGS is reported in two lines that are summed
    pub cogs_component_1: Money,
    pub cogs_component_2: Money,
}

/// The same snapshot as raw, unparsed cells from the ingestion layer.
///
/// Cells may arrive as JSON strings or bare numbers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SnapshotCells {
    #[serde(default, deserialize_with = "cell_text")]
    pub closing_date: Option<String>,
    #[serde(default, deserialize_with = "cell_text")]
    pub opening_payables: Option<String>,
    #[serde(default, deserialize_with = "cell_text")]
    pub closing_payables: Option<String>,
    #[serde(default, deserialize_with = "cell_text")]
    pub opening_receivables: Option<String>,
    #[serde(default, deserialize_with = "cell_text")]
    pub closing_receivables: Option<String>,
    #[serde(default, deserialize_with = "cell_text")]
    pub opening_inventory: Option<String>,
    #[serde(default, deserialize_with = "cell_text")]
    pub closing_inventory: Option<String>,
    #[serde(default, deserialize_with = "cell_text")]
    pub net_sales: Option<String>,
    #[serde(default, deserialize_with = "cell_text")]
    pub cogs_component_1: Option<String>,
    #[serde(default, deserialize_with = "cell_text")]
    pub cogs_component_2: Option<String>,
}

/// Cash conversion cycle and its components, in days.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CccMetrics {
    /// DSO + DIO - DPO
    pub ccc: Decimal,
    /// Days Sales Outstanding = avg receivables / net sales * days
    pub dso: Decimal,
    /// Days Payable Outstanding = avg payables / COGS * days
    pub dpo: Decimal,
    /// Days Inventory Outstanding = avg inventory / COGS * days
    pub dio: Decimal,
    /// Fiscal year-to-date days, inclusive of the closing date
    pub day_count: i64,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// April 1 of the fiscal year that contains `closing_date`.
pub fn fiscal_year_start(closing_date: NaiveDate) -> NaiveDate {
    let year = if closing_date.month() >= FISCAL_YEAR_START_MONTH {
        closing_date.year()
    } else {
        closing_date.year() - 1
    };
    // April 1 exists in every year.
    NaiveDate::from_ymd_opt(year, FISCAL_YEAR_START_MONTH, 1).unwrap_or(closing_date)
}

/// Days from fiscal year start to `closing_date`, counting both ends.
pub fn fiscal_day_count(closing_date: NaiveDate) -> i64 {
    (closing_date - fiscal_year_start(closing_date)).num_days() + 1
}

/// CCC for a parsed snapshot.
///
/// Zero denominators give zero components. A ratio that leaves the decimal
/// range (a near-zero denominator) is an `InvalidSnapshot` naming the field.
pub fn compute_ccc(snapshot: &BalanceSheetSnapshot) -> CashMetricsResult<CccMetrics> {
    let day_count = fiscal_day_count(snapshot.closing_date);
    let days = Decimal::from(day_count);

    let avg_payables = average(
        "closing_payables",
        snapshot.opening_payables,
        snapshot.closing_payables,
    )?;
    let avg_receivables = average(
        "closing_receivables",
        snapshot.opening_receivables,
        snapshot.closing_receivables,
    )?;
    let avg_inventory = average(
        "closing_inventory",
        snapshot.opening_inventory,
        snapshot.closing_inventory,
    )?;
    let cogs = snapshot
        .cogs_component_1
        .checked_add(snapshot.cogs_component_2)
        .ok_or_else(|| out_of_range("cogs_component_2"))?;

    let dso = days_ratio("net_sales", avg_receivables, snapshot.net_sales, days)?;
    let dpo = days_ratio("cogs_component_1", avg_payables, cogs, days)?;
    let dio = days_ratio("cogs_component_1", avg_inventory, cogs, days)?;

    let ccc = dso
        .checked_add(dio)
        .and_then(|v| v.checked_sub(dpo))
        .ok_or_else(|| out_of_range("ccc"))?;

    Ok(CccMetrics {
        ccc,
        dso,
        dpo,
        dio,
        day_count,
    })
}

/// Parse raw cells into a snapshot, naming the first bad field.
pub fn parse_snapshot(cells: &SnapshotCells) -> CashMetricsResult<BalanceSheetSnapshot> {
    Ok(BalanceSheetSnapshot {
        closing_date: parse_date_cell("closing_date", cells.closing_date.as_deref())?,
        opening_payables: parse_amount_cell("opening_payables", cells.opening_payables.as_deref())?,
        closing_payables: parse_amount_cell("closing_payables", cells.closing_payables.as_deref())?,
        opening_receivables: parse_amount_cell(
            "opening_receivables",
            cells.opening_receivables.as_deref(),
        )?,
        closing_receivables: parse_amount_cell(
            "closing_receivables",
            cells.closing_receivables.as_deref(),
        )?,
        opening_inventory: parse_amount_cell(
            "opening_inventory",
            cells.opening_inventory.as_deref(),
        )?,
        closing_inventory: parse_amount_cell(
            "closing_inventory",
            cells.closing_inventory.as_deref(),
        )?,
        net_sales: parse_amount_cell("net_sales", cells.net_sales.as_deref())?,
        cogs_component_1: parse_amount_cell("cogs_component_1", cells.cogs_component_1.as_deref())?,
        cogs_component_2: parse_amount_cell("cogs_component_2", cells.cogs_component_2.as_deref())?,
    })
}

/// CCC from raw cells, or `None` ("CCC unavailable") if any cell is bad.
pub fn ccc_from_cells(cells: &SnapshotCells) -> Option<CccMetrics> {
    match parse_snapshot(cells) {
        Ok(snapshot) => match compute_ccc(&snapshot) {
            Ok(metrics) => Some(metrics),
            Err(e) => {
                tracing::warn!(error = %e, "Cash conversion cycle unavailable");
                None
            }
        },
        Err(e) => {
            tracing::warn!(error = %e, "Cash conversion cycle unavailable");
            None
        }
    }
}

/// CCC for a raw snapshot; unlike [`ccc_from_cells`] a bad cell is an error.
pub fn analyze_ccc(cells: &SnapshotCells) -> CashMetricsResult<ComputationOutput<CccMetrics>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let snapshot = parse_snapshot(cells)?;
    if snapshot.net_sales.is_zero() {
        warnings.push("Net sales is zero; DSO reported as 0.".into());
    }
    if snapshot
        .cogs_component_1
        .checked_add(snapshot.cogs_component_2)
        .is_some_and(|cogs| cogs.is_zero())
    {
        warnings.push("COGS is zero; DPO and DIO reported as 0.".into());
    }

    let metrics = compute_ccc(&snapshot)?;
    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Cash conversion cycle: DSO + DIO - DPO over fiscal year-to-date days",
        &serde_json::json!({
            "closing_date": snapshot.closing_date,
            "fiscal_year_start": fiscal_year_start(snapshot.closing_date),
            "averaging": "(opening + closing) / 2",
        }),
        warnings,
        elapsed,
        metrics,
    ))
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn cell_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<serde_json::Value>::deserialize(deserializer)? {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

fn missing(field: &str) -> CashMetricsError {
    CashMetricsError::InvalidSnapshot {
        field: field.into(),
        reason: "Cell is empty.".into(),
    }
}

fn out_of_range(field: &str) -> CashMetricsError {
    CashMetricsError::InvalidSnapshot {
        field: field.into(),
        reason: "Ratio is outside the representable range.".into(),
    }
}

fn average(field: &str, opening: Money, closing: Money) -> CashMetricsResult<Money> {
    opening
        .checked_add(closing)
        .map(|total| total / dec!(2))
        .ok_or_else(|| out_of_range(field))
}

/// `numerator / denominator * days`, zero when the denominator is zero.
fn days_ratio(
    field: &str,
    numerator: Money,
    denominator: Money,
    days: Decimal,
) -> CashMetricsResult<Decimal> {
    if denominator.is_zero() {
        return Ok(Decimal::ZERO);
    }
    numerator
        .checked_div(denominator)
        .and_then(|ratio| ratio.checked_mul(days))
        .ok_or_else(|| out_of_range(field))
}

fn parse_amount_cell(field: &str, cell: Option<&str>) -> CashMetricsResult<Money> {
    let raw = cell.map(str::trim).filter(|s| !s.is_empty()).ok_or_else(|| missing(field))?;
    let cleaned: String = raw.chars().filter(|c| *c != ',').collect();
    Decimal::from_str(&cleaned)
        .or_else(|_| Decimal::from_scientific(&cleaned))
        .map_err(|_| CashMetricsError::InvalidSnapshot {
            field: field.into(),
            reason: format!("'{raw}' is not a number."),
        })
}

fn parse_date_cell(field: &str, cell: Option<&str>) -> CashMetricsResult<NaiveDate> {
    let raw = cell.map(str::trim).filter(|s| !s.is_empty()).ok_or_else(|| missing(field))?;
    // Spreadsheet exports often carry a midnight timestamp.
    let date_part = raw.split(|c: char| c == ' ' || c == 'T').next().unwrap_or(raw);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(date_part, "%d-%m-%Y"))
        .or_else(|_| NaiveDate::parse_from_str(date_part, "%d/%m/%Y"))
        .map_err(|_| CashMetricsError::InvalidSnapshot {
            field: field.into(),
            reason: format!("'{raw}' is not a date."),
        })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn sample_snapshot() -> BalanceSheetSnapshot {
        BalanceSheetSnapshot {
            closing_date: d(2024, 6, 30),
            opening_payables: dec!(80_000),
            closing_payables: dec!(120_000),
            opening_receivables: dec!(140_000),
            closing_receivables: dec!(160_000),
            opening_inventory: dec!(90_000),
            closing_inventory: dec!(110_000),
            net_sales: dec!(1_000_000),
            cogs_component_1: dec!(450_000),
            cogs_component_2: dec!(150_000),
        }
    }

    fn sample_cells() -> SnapshotCells {
        SnapshotCells {
            closing_date: Some("2024-06-30 00:00:00".into()),
            opening_payables: Some("80,000".into()),
            closing_payables: Some("120000".into()),
            opening_receivables: Some("140000".into()),
            closing_receivables: Some("160000".into()),
            opening_inventory: Some("90000".into()),
            closing_inventory: Some("110000".into()),
            net_sales: Some("1000000".into()),
            cogs_component_1: Some("450000".into()),
            cogs_component_2: Some("150000".into()),
        }
    }

    #[test]
    fn test_fiscal_year_start_after_april() {
        assert_eq!(fiscal_year_start(d(2024, 6, 30)), d(2024, 4, 1));
        assert_eq!(fiscal_year_start(d(2024, 4, 1)), d(2024, 4, 1));
    }

    #[test]
    fn test_fiscal_year_start_before_april() {
        assert_eq!(fiscal_year_start(d(2024, 3, 31)), d(2023, 4, 1));
        assert_eq!(fiscal_year_start(d(2024, 1, 15)), d(2023, 4, 1));
    }

    #[test]
    fn test_day_count_inclusive() {
        assert_eq!(fiscal_day_count(d(2024, 4, 1)), 1);
        assert_eq!(fiscal_day_count(d(2024, 6, 30)), 91);
        // FY 2023-24 includes 29 Feb 2024
        assert_eq!(fiscal_day_count(d(2024, 3, 31)), 366);
    }

    #[test]
    fn test_dso_dpo_dio() {
        let m = compute_ccc(&sample_snapshot()).unwrap();
        assert_eq!(m.day_count, 91);
        // avg AR 150k / 1M * 91
        assert_eq!(m.dso, dec!(150_000) / dec!(1_000_000) * dec!(91));
        // avg AP 100k / COGS 600k * 91
        assert_eq!(m.dpo, dec!(100_000) / dec!(600_000) * dec!(91));
        // avg inventory 100k / 600k * 91
        assert_eq!(m.dio, dec!(100_000) / dec!(600_000) * dec!(91));
    }

    #[test]
    fn test_ccc_equals_dso_plus_dio_minus_dpo() {
        let mut s = sample_snapshot();
        for closing in [d(2024, 4, 1), d(2024, 12, 31), d(2025, 3, 31)] {
            s.closing_date = closing;
            s.closing_inventory += dec!(7_777);
            let m = compute_ccc(&s).unwrap();
            assert_eq!(m.ccc, m.dso + m.dio - m.dpo);
        }
    }

    #[test]
    fn test_zero_sales_guards_dso() {
        let mut s = sample_snapshot();
        s.net_sales = Decimal::ZERO;
        let m = compute_ccc(&s).unwrap();
        assert_eq!(m.dso, Decimal::ZERO);
        assert_eq!(m.ccc, m.dio - m.dpo);
    }

    #[test]
    fn test_zero_cogs_guards_dpo_and_dio() {
        let mut s = sample_snapshot();
        s.cogs_component_1 = dec!(100);
        s.cogs_component_2 = dec!(-100);
        let m = compute_ccc(&s).unwrap();
        assert_eq!(m.dpo, Decimal::ZERO);
        assert_eq!(m.dio, Decimal::ZERO);
        assert_eq!(m.ccc, m.dso);
    }

    #[test]
    fn test_parse_snapshot_from_cells() {
        let s = parse_snapshot(&sample_cells()).unwrap();
        assert_eq!(s, sample_snapshot());
    }

    #[test]
    fn test_parse_names_bad_field() {
        let mut cells = sample_cells();
        cells.net_sales = Some("n/a".into());
        match parse_snapshot(&cells).unwrap_err() {
            CashMetricsError::InvalidSnapshot { field, .. } => assert_eq!(field, "net_sales"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_cell_makes_ccc_unavailable() {
        let mut cells = sample_cells();
        cells.closing_date = None;
        assert!(ccc_from_cells(&cells).is_none());

        let mut cells = sample_cells();
        cells.cogs_component_2 = Some("   ".into());
        assert!(ccc_from_cells(&cells).is_none());
    }

    #[test]
    fn test_ccc_from_valid_cells() {
        let m = ccc_from_cells(&sample_cells()).unwrap();
        assert_eq!(m, compute_ccc(&sample_snapshot()).unwrap());
    }

    #[test]
    fn test_alternate_date_formats() {
        let mut cells = sample_cells();
        cells.closing_date = Some("30/06/2024".into());
        assert_eq!(parse_snapshot(&cells).unwrap().closing_date, d(2024, 6, 30));
        cells.closing_date = Some("2024-06-30T00:00:00".into());
        assert_eq!(parse_snapshot(&cells).unwrap().closing_date, d(2024, 6, 30));
    }

    #[test]
    fn test_cells_accept_bare_numbers() {
        let json = r#"{
            "closing_date": "2024-06-30",
            "opening_payables": 80000,
            "closing_payables": "120,000",
            "opening_receivables": 140000,
            "closing_receivables": 160000,
            "opening_inventory": 90000,
            "closing_inventory": 110000,
            "net_sales": 1000000,
            "cogs_component_1": 450000.0,
            "cogs_component_2": null
        }"#;
        let cells: SnapshotCells = serde_json::from_str(json).unwrap();
        assert_eq!(cells.opening_payables.as_deref(), Some("80000"));
        assert_eq!(cells.cogs_component_2, None);
    }

    #[test]
    fn test_analyze_ccc_propagates_bad_cell() {
        let mut cells = sample_cells();
        cells.net_sales = Some("n/a".into());
        let err = analyze_ccc(&cells).unwrap_err();
        assert!(matches!(err, CashMetricsError::InvalidSnapshot { ref field, .. } if field == "net_sales"));
    }

    #[test]
    fn test_analyze_ccc_matches_compute() {
        let out = analyze_ccc(&sample_cells()).unwrap();
        assert_eq!(out.result, compute_ccc(&sample_snapshot()).unwrap());
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn test_near_zero_net_sales_is_out_of_range() {
        let mut s = sample_snapshot();
        s.opening_receivables = dec!(500_000_000_000);
        s.closing_receivables = dec!(500_000_000_000);
        s.net_sales = Decimal::new(1, 17);
        let err = compute_ccc(&s).unwrap_err();
        assert!(matches!(err, CashMetricsError::InvalidSnapshot { ref field, .. } if field == "net_sales"));
    }

    #[test]
    fn test_near_zero_cogs_is_out_of_range() {
        let mut s = sample_snapshot();
        s.cogs_component_1 = Decimal::new(1, 27);
        s.cogs_component_2 = Decimal::ZERO;
        assert!(compute_ccc(&s).is_err());
    }

    #[test]
    fn test_out_of_range_cells_mean_unavailable() {
        let mut cells = sample_cells();
        cells.opening_receivables = Some("500000000000".into());
        cells.closing_receivables = Some("500000000000".into());
        cells.net_sales = Some("0.00000000000000001".into());
        assert!(ccc_from_cells(&cells).is_none());
        assert!(analyze_ccc(&cells).is_err());
    }
}
