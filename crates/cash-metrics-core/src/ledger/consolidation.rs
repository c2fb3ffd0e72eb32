//! Window-filtered union of per-entity ledgers.
//!
//! Ledgers arrive keyed by entity id. Consolidation never fails: an entity
//! with no rows in the window simply contributes nothing, and an empty
//! consolidated ledger means every period total is zero.

use std::collections::BTreeMap;
use std::time::Instant;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::transaction::{Nature, NatureClass, Transaction};
use crate::config::{default_unit_scale, scale_amount, validate_unit_scale};
use crate::error::CashMetricsError;
use crate::types::{with_metadata, ComputationOutput, DateWindow, EntityId, Money};
use crate::CashMetricsResult;

/// Per-entity transaction ledgers, as delivered by ingestion.
pub type EntityLedgers = BTreeMap<EntityId, Vec<Transaction>>;

/// One row of the consolidated view with its derived flow split.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsolidatedEntry {
    pub entity_id: EntityId,
    pub value_date: NaiveDate,
    pub net_flow: Money,
    pub running_balance: Money,
    /// max(0, -net_flow)
    pub withdrawal: Money,
    /// max(0, net_flow)
    pub deposit: Money,
}

/// Read-only union of all entities' rows inside one window, ordered by
/// value date then entity id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConsolidatedLedger {
    pub window: Option<DateWindow>,
    pub entries: Vec<ConsolidatedEntry>,
}

/// Period totals over a consolidated ledger.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CashTotals {
    pub total_inflow: Money,
    pub total_outflow: Money,
    pub net_flow: Money,
}

/// Net flow per cash-flow statement activity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ActivityTotals {
    pub operating: Money,
    pub investing: Money,
    pub financing: Money,
}

impl ConsolidatedLedger {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn cash_totals(&self) -> CashTotals {
        self.entries
            .iter()
            .fold(CashTotals::default(), |mut acc, e| {
                acc.total_inflow += e.deposit;
                acc.total_outflow += e.withdrawal;
                acc.net_flow += e.net_flow;
                acc
            })
    }

    /// Sum of net flow per calendar day, ascending.
    pub fn daily_net_flow(&self) -> BTreeMap<NaiveDate, Money> {
        let mut daily: BTreeMap<NaiveDate, Money> = BTreeMap::new();
        for e in &self.entries {
            *daily.entry(e.value_date).or_insert(Money::ZERO) += e.net_flow;
        }
        daily
    }
}

impl CashTotals {
    pub fn scaled(&self, scale: impl Fn(Money) -> Money) -> Self {
        Self {
            total_inflow: scale(self.total_inflow),
            total_outflow: scale(self.total_outflow),
            net_flow: scale(self.net_flow),
        }
    }
}

impl ActivityTotals {
    pub fn scaled(&self, scale: impl Fn(Money) -> Money) -> Self {
        Self {
            operating: scale(self.operating),
            investing: scale(self.investing),
            financing: scale(self.financing),
        }
    }

    fn add(&mut self, nature: Nature, amount: Money) {
        match nature {
            Nature::Operating => self.operating += amount,
            Nature::Investing => self.investing += amount,
            Nature::Financing => self.financing += amount,
        }
    }
}

/// Union every entity's rows that fall inside `window`.
pub fn consolidate(ledgers: &EntityLedgers, window: DateWindow) -> ConsolidatedLedger {
    let mut entries: Vec<ConsolidatedEntry> = ledgers
        .values()
        .flat_map(|rows| rows.iter())
        .filter(|t| window.contains(t.value_date))
        .map(|t| ConsolidatedEntry {
            entity_id: t.entity_id.clone(),
            value_date: t.value_date,
            net_flow: t.net_flow,
            running_balance: t.running_balance,
            withdrawal: t.withdrawal(),
            deposit: t.deposit(),
        })
        .collect();

    // Stable sort keeps each entity's input order within a day.
    entries.sort_by(|a, b| {
        a.value_date
            .cmp(&b.value_date)
            .then_with(|| a.entity_id.cmp(&b.entity_id))
    });

    tracing::debug!(
        entities = ledgers.len(),
        rows = entries.len(),
        start = %window.start,
        end = %window.end,
        "Consolidated ledgers"
    );

    ConsolidatedLedger {
        window: Some(window),
        entries,
    }
}

/// Net flow per activity over the raw per-entity ledgers.
///
/// Rows without a recognisable nature label count towards no bucket. A label
/// naming several activities counts towards each of them.
pub fn cashflow_by_activity(ledgers: &EntityLedgers, window: DateWindow) -> ActivityTotals {
    let mut totals = ActivityTotals::default();
    for t in ledgers
        .values()
        .flat_map(|rows| rows.iter())
        .filter(|t| window.contains(t.value_date))
    {
        let class = t.classify();
        for nature in Nature::ALL {
            if class.includes(nature) {
                totals.add(nature, t.net_flow);
            }
        }
    }
    totals
}

/// Earliest and latest value date across every entity, or `None` when all
/// ledgers are empty.
pub fn ledger_span(ledgers: &EntityLedgers) -> Option<DateWindow> {
    let mut dates = ledgers.values().flat_map(|rows| rows.iter().map(|t| t.value_date));
    let first = dates.next()?;
    let (min, max) = dates.fold((first, first), |(lo, hi), d| (lo.min(d), hi.max(d)));
    Some(DateWindow { start: min, end: max })
}

/// True when no entity has a single row.
pub fn all_ledgers_empty(ledgers: &EntityLedgers) -> bool {
    ledgers.values().all(|rows| rows.is_empty())
}

/// Explicit window after validation, else the full span of ledger data.
pub fn resolve_window(
    ledgers: &EntityLedgers,
    window: Option<DateWindow>,
) -> CashMetricsResult<DateWindow> {
    match window {
        Some(w) => DateWindow::new(w.start, w.end),
        None => ledger_span(ledgers).ok_or(CashMetricsError::NoLedgerData),
    }
}

// ---------------------------------------------------------------------------
// Period actuals
// ---------------------------------------------------------------------------

/// Request for period actuals over a set of entity ledgers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CashFlowInput {
    pub ledgers: EntityLedgers,
    /// Defaults to the full span of ledger data
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window: Option<DateWindow>,
    #[serde(default = "default_unit_scale")]
    pub unit_scale: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CashFlowSummary {
    pub window: DateWindow,
    pub rows: usize,
    pub totals: CashTotals,
    pub activity: ActivityTotals,
}

pub fn analyze_cash_flows(
    input: &CashFlowInput,
) -> CashMetricsResult<ComputationOutput<CashFlowSummary>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate_unit_scale(input.unit_scale)?;
    if all_ledgers_empty(&input.ledgers) {
        return Err(CashMetricsError::NoLedgerData);
    }
    let window = resolve_window(&input.ledgers, input.window)?;
    let scale = |m: Money| scale_amount(m, input.unit_scale);

    let ledger = consolidate(&input.ledgers, window);
    if ledger.is_empty() {
        warnings.push(format!(
            "No transactions between {} and {}; totals are zero.",
            window.start, window.end
        ));
    }

    let unclassified = input
        .ledgers
        .values()
        .flat_map(|rows| rows.iter())
        .filter(|t| window.contains(t.value_date) && t.classify() == NatureClass::Unclassified)
        .count();
    if unclassified > 0 {
        warnings.push(format!(
            "{unclassified} transaction(s) carry no recognisable nature and are excluded from activity totals."
        ));
    }

    let summary = CashFlowSummary {
        window,
        rows: ledger.len(),
        totals: ledger.cash_totals().scaled(scale),
        activity: cashflow_by_activity(&input.ledgers, window).scaled(scale),
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Consolidated cash flow (inflow, outflow, net, by activity)",
        &serde_json::json!({
            "window": window,
            "unit_scale": input.unit_scale,
            "entities": input.ledgers.len(),
        }),
        warnings,
        elapsed,
        summary,
    ))
}
