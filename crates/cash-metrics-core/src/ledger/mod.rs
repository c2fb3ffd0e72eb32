pub mod consolidation;
pub mod revenue;
pub mod transaction;
