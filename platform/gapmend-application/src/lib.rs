pub mod benchmarking;
pub mod config;
pub mod repair;
mod shared;
