pub mod layout;
pub mod stats;
