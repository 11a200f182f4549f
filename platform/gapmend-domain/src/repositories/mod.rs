pub mod dataset;
pub mod reports;
