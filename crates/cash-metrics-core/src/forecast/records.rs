use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::types::Money;

/// How committed a forecast outflow is.
///
/// Parsed case-insensitively from the free-text tag on the forecast sheet.
/// Missing or unrecognised tags become `Unknown`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Option<String>")]
pub enum Certainty {
    Fixed,
    Contingency,
    #[default]
    Unknown,
}

impl Certainty {
    /// Case-insensitive exact match; padded or other text is `Unknown`.
    pub fn parse(tag: &str) -> Self {
        match tag.to_lowercase().as_str() {
            "fixed" => Certainty::Fixed,
            "contingency" => Certainty::Contingency,
            _ => Certainty::Unknown,
        }
    }
}

impl From<Option<String>> for Certainty {
    fn from(tag: Option<String>) -> Self {
        tag.as_deref().map(Certainty::parse).unwrap_or_default()
    }
}

/// A forecast payment due on `forecast_date`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastRecord {
    pub forecast_date: NaiveDate,
    /// Outflow amount (positive = cash leaving)
    pub net_payable: Money,
    #[serde(default)]
    pub certainty: Certainty,
}

/// A forecast receipt expected on `forecast_date`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InflowForecastRecord {
    pub forecast_date: NaiveDate,
    pub amount_received: Money,
}
