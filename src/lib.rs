//! Ruins Stats - dashboard report builder
//!
//! Reads the game's SQLite store (read-only), aggregates players, runs,
//! seasons and star purchases, and writes one JSON report for the dashboard.

pub mod config;
pub mod report_core;
pub mod server;

pub use config::StatsConfig;
pub use report_core::pipeline::{run_pipeline, PipelineError};
