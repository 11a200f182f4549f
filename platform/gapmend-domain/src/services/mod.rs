pub mod cache;
pub mod detector;
pub mod fill;
pub mod locator;
pub mod time_index;
pub mod value_math;
