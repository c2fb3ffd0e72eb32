pub mod credit_limits;
pub mod runway;
