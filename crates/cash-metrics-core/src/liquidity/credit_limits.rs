use std::time::Instant;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::config::{CreditLimit, MetricsConfig, SignConvention};
use crate::ledger::consolidation::EntityLedgers;
use crate::ledger::transaction::Transaction;
use crate::types::{with_metadata, ComputationOutput, EntityId, Money};
use crate::CashMetricsResult;

/// Available credit for one configured entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityCredit {
    pub entity_id: EntityId,
    pub limit_amount: Money,
    pub balance_on_date: Money,
    pub available: Money,
    /// False when the entity had no row on or before the as-of date
    pub has_balance: bool,
}

/// Total liquidity buffer across every configured entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvailableCredit {
    pub as_of: NaiveDate,
    pub total: Money,
    pub per_entity: Vec<EntityCredit>,
}

impl AvailableCredit {
    pub fn scaled(&self, scale: impl Fn(Money) -> Money) -> Self {
        Self {
            as_of: self.as_of,
            total: scale(self.total),
            per_entity: self
                .per_entity
                .iter()
                .map(|e| EntityCredit {
                    entity_id: e.entity_id.clone(),
                    limit_amount: scale(e.limit_amount),
                    balance_on_date: scale(e.balance_on_date),
                    available: scale(e.available),
                    has_balance: e.has_balance,
                })
                .collect(),
        }
    }
}

/// Running balance of the latest row dated on or before `as_of`.
fn latest_row(ledger: &[Transaction], as_of: NaiveDate) -> Option<&Transaction> {
    // max_by_key returns the last of equal keys, so same-day ties resolve
    // to the row that came last in the ledger.
    ledger
        .iter()
        .filter(|t| t.value_date <= as_of)
        .max_by_key(|t| t.value_date)
}

/// Balance as of a date; zero when the ledger has nothing that early.
pub fn balance_on_date(ledger: &[Transaction], as_of: NaiveDate) -> Money {
    latest_row(ledger, as_of)
        .map(|t| t.running_balance)
        .unwrap_or(Money::ZERO)
}

/// Limit adjusted by the entity's balance under its sign convention.
pub fn available_credit(limit: &CreditLimit, as_of: NaiveDate, ledgers: &EntityLedgers) -> Money {
    let balance = ledgers
        .get(&limit.entity_id)
        .map(|rows| balance_on_date(rows, as_of))
        .unwrap_or(Money::ZERO);
    apply_sign(limit, balance)
}

fn apply_sign(limit: &CreditLimit, balance: Money) -> Money {
    match limit.sign_convention {
        SignConvention::AddBalance => limit.limit_amount + balance,
        SignConvention::SubtractBalance => limit.limit_amount - balance,
    }
}

/// Sum of available credit over every configured entity.
///
/// Entities missing from `ledgers` still contribute their raw limit.
/// Ledgers for entities absent from the configuration are ignored.
pub fn total_available_credit(
    config: &MetricsConfig,
    as_of: NaiveDate,
    ledgers: &EntityLedgers,
) -> AvailableCredit {
    let per_entity: Vec<EntityCredit> = config
        .entities
        .iter()
        .map(|limit| {
            let row = ledgers
                .get(&limit.entity_id)
                .and_then(|rows| latest_row(rows, as_of));
            let balance = row.map(|t| t.running_balance).unwrap_or(Money::ZERO);
            EntityCredit {
                entity_id: limit.entity_id.clone(),
                limit_amount: limit.limit_amount,
                balance_on_date: balance,
                available: apply_sign(limit, balance),
                has_balance: row.is_some(),
            }
        })
        .collect();

    let total = per_entity.iter().map(|e| e.available).sum();

    tracing::debug!(
        as_of = %as_of,
        entities = per_entity.len(),
        total = %total,
        "Computed available credit"
    );

    AvailableCredit {
        as_of,
        total,
        per_entity,
    }
}

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailableCreditInput {
    pub config: MetricsConfig,
    pub ledgers: EntityLedgers,
    pub as_of: NaiveDate,
}

/// Available credit in the configured reporting unit.
pub fn analyze_available_credit(
    input: &AvailableCreditInput,
) -> CashMetricsResult<ComputationOutput<AvailableCredit>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    input.config.validate()?;

    let credit = total_available_credit(&input.config, input.as_of, &input.ledgers);
    for e in credit.per_entity.iter().filter(|e| !e.has_balance) {
        warnings.push(format!(
            "Entity '{}' has no balance on or before {}; raw limit used.",
            e.entity_id, input.as_of
        ));
    }
    for entity in input.ledgers.keys() {
        if input.config.limit_for(entity).is_none() {
            warnings.push(format!(
                "Entity '{entity}' has ledger data but no configured limit; excluded."
            ));
        }
    }

    let result = credit.scaled(|m| input.config.scale(m));
    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Available credit: limit adjusted by latest running balance per entity",
        &serde_json::json!({
            "as_of": input.as_of,
            "unit_scale": input.config.unit_scale,
            "entities": input.config.entities.len(),
        }),
        warnings,
        elapsed,
        result,
    ))
}
