pub mod ai;
pub mod clock;
pub mod config;
