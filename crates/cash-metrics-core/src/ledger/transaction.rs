use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::types::{EntityId, Money};

/// A single bank ledger row for one entity.
///
/// Rows with an unparseable date or amount are dropped by ingestion before
/// they reach this type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub entity_id: EntityId,
    pub value_date: NaiveDate,
    /// Signed flow: positive is a deposit, negative a withdrawal
    pub net_flow: Money,
    /// Entity-local running balance after this row
    pub running_balance: Money,
    /// Free-text activity label, e.g. "Operating - vendor payment"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nature: Option<String>,
}

impl Transaction {
    pub fn withdrawal(&self) -> Money {
        if self.net_flow < Money::ZERO {
            -self.net_flow
        } else {
            Money::ZERO
        }
    }

    pub fn deposit(&self) -> Money {
        if self.net_flow > Money::ZERO {
            self.net_flow
        } else {
            Money::ZERO
        }
    }

    pub fn classify(&self) -> NatureClass {
        match &self.nature {
            Some(label) => classify_nature(label),
            None => NatureClass::Unclassified,
        }
    }
}

/// Cash-flow statement activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Nature {
    Operating,
    Investing,
    Financing,
}

impl Nature {
    pub const ALL: [Nature; 3] = [Nature::Operating, Nature::Investing, Nature::Financing];

    fn keyword(&self) -> &'static str {
        match self {
            Nature::Operating => "operating",
            Nature::Investing => "investing",
            Nature::Financing => "financing",
        }
    }
}

/// Outcome of classifying a free-text nature label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NatureClass {
    Unclassified,
    Single(Nature),
    /// Label names more than one activity; it counts towards each of them.
    Ambiguous(Vec<Nature>),
}

impl NatureClass {
    pub fn includes(&self, nature: Nature) -> bool {
        match self {
            NatureClass::Unclassified => false,
            NatureClass::Single(n) => *n == nature,
            NatureClass::Ambiguous(ns) => ns.contains(&nature),
        }
    }
}

/// Case-insensitive substring match of a label against the three activities.
pub fn classify_nature(label: &str) -> NatureClass {
    let lower = label.to_lowercase();
    let matched: Vec<Nature> = Nature::ALL
        .into_iter()
        .filter(|n| lower.contains(n.keyword()))
        .collect();

    match matched.len() {
        0 => NatureClass::Unclassified,
        1 => NatureClass::Single(matched[0]),
        _ => NatureClass::Ambiguous(matched),
    }
}
