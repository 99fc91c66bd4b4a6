pub mod config;
pub mod haptics;
pub mod runner;
