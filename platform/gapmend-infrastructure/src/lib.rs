pub mod datasets;
pub mod reporting;
