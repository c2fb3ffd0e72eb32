//! Process-wide entity configuration.
//!
//! The credit limit table is supplied once at startup and passed by
//! reference into every computation. Nothing in the crate mutates it.

use std::collections::HashSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::CashMetricsError;
use crate::types::{EntityId, Money};
use crate::CashMetricsResult;

/// How an entity's running balance moves its available credit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignConvention {
    /// A positive balance adds headroom: `limit + balance`.
    AddBalance,
    /// The balance is drawn against the facility: `limit - balance`.
    SubtractBalance,
}

/// Configured credit limit for one entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreditLimit {
    pub entity_id: EntityId,
    pub limit_amount: Money,
    pub sign_convention: SignConvention,
}

/// Look-ahead period for forecast buckets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ForecastHorizon {
    #[default]
    Next7Days,
    Next30Days,
    Next60Days,
}

impl ForecastHorizon {
    pub fn days(&self) -> i64 {
        match self {
            ForecastHorizon::Next7Days => 7,
            ForecastHorizon::Next30Days => 30,
            ForecastHorizon::Next60Days => 60,
        }
    }
}

/// Immutable configuration for a reporting run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Credit limit and sign convention per entity
    pub entities: Vec<CreditLimit>,
    /// Divisor applied to every monetary output (10_000_000 reports in crore)
    #[serde(default = "default_unit_scale")]
    pub unit_scale: Decimal,
    /// Runway below this many days raises a funding alert
    #[serde(default = "default_alert_threshold_days")]
    pub alert_threshold_days: i64,
    /// Forecast horizon used when a request does not name one
    #[serde(default)]
    pub default_horizon: ForecastHorizon,
}

pub fn default_unit_scale() -> Decimal {
    Decimal::ONE
}

pub fn validate_unit_scale(unit_scale: Decimal) -> CashMetricsResult<()> {
    if unit_scale <= Decimal::ZERO {
        return Err(CashMetricsError::InvalidInput {
            field: "unit_scale".into(),
            reason: "Unit scale must be positive.".into(),
        });
    }
    Ok(())
}

/// Express a monetary amount in reporting units.
pub fn scale_amount(amount: Money, unit_scale: Decimal) -> Money {
    if unit_scale.is_zero() {
        return amount;
    }
    amount / unit_scale
}

fn default_alert_threshold_days() -> i64 {
    30
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            entities: Vec::new(),
            unit_scale: default_unit_scale(),
            alert_threshold_days: default_alert_threshold_days(),
            default_horizon: ForecastHorizon::default(),
        }
    }
}

impl MetricsConfig {
    pub fn new(entities: Vec<CreditLimit>) -> Self {
        Self {
            entities,
            ..Self::default()
        }
    }

    pub fn with_unit_scale(mut self, unit_scale: Decimal) -> Self {
        self.unit_scale = unit_scale;
        self
    }

    pub fn validate(&self) -> CashMetricsResult<()> {
        validate_unit_scale(self.unit_scale)?;
        if self.alert_threshold_days < 0 {
            return Err(CashMetricsError::InvalidInput {
                field: "alert_threshold_days".into(),
                reason: "Alert threshold cannot be negative.".into(),
            });
        }
        let mut seen = HashSet::new();
        for limit in &self.entities {
            if limit.entity_id.trim().is_empty() {
                return Err(CashMetricsError::InvalidInput {
                    field: "entities".into(),
                    reason: "Entity id cannot be blank.".into(),
                });
            }
            if !seen.insert(limit.entity_id.as_str()) {
                return Err(CashMetricsError::InvalidInput {
                    field: "entities".into(),
                    reason: format!("Entity '{}' is configured twice.", limit.entity_id),
                });
            }
        }
        Ok(())
    }

    /// Express a monetary amount in the configured reporting unit.
    pub fn scale(&self, amount: Money) -> Money {
        scale_amount(amount, self.unit_scale)
    }

    pub fn limit_for(&self, entity_id: &str) -> Option<&CreditLimit> {
        self.entities.iter().find(|l| l.entity_id == entity_id)
    }
}
