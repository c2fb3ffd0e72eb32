pub mod analytics;
pub mod forecast;
pub mod ledger;
pub mod liquidity;
pub mod report;
pub mod working_capital;
