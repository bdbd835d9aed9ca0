pub mod exchange;
pub mod facebook;
