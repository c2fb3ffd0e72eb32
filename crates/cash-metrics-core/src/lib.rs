pub mod config;
pub mod error;
pub mod types;

#[cfg(feature = "ledger")]
pub mod ledger;

#[cfg(feature = "forecast")]
pub mod forecast;

#[cfg(feature = "liquidity")]
pub mod liquidity;

#[cfg(feature = "working_capital")]
pub mod working_capital;

#[cfg(feature = "analytics")]
pub mod analytics;

#[cfg(feature = "report")]
pub mod report;

pub use config::MetricsConfig;
pub use error::CashMetricsError;
pub use types::*;

/// Standard result type for all cash-metrics operations
pub type CashMetricsResult<T> = Result<T, CashMetricsError>;
