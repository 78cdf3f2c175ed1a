pub mod bake;
pub mod config;
pub mod dataset;
pub mod error;
pub mod estimates;
pub mod samples;
pub mod stats;
