pub mod aggregation;
pub mod records;
