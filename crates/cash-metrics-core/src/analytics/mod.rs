pub mod efficiency;
pub mod trend;
