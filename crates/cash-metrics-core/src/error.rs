use thiserror::Error;

#[derive(Debug, Error)]
pub enum CashMetricsError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("No ledger data: every entity ledger is empty")]
    NoLedgerData,

    #[error("Invalid balance sheet snapshot: {field} — {reason}")]
    InvalidSnapshot { field: String, reason: String },

    #[error("Date error: {0}")]
    DateError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for CashMetricsError {
    fn from(e: serde_json::Error) -> Self {
        CashMetricsError::SerializationError(e.to_string())
    }
}
