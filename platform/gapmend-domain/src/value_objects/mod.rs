pub mod period;
pub mod record;
