//! Weapon Balance Analytics: library entry point.
//!
//! Exposes model, metrics, stats, scoring, ranking, anomaly, pipeline and report
//! for use by the CLI and tests.

pub mod anomaly;
pub mod config;
pub mod error;
pub mod metrics;
pub mod model;
pub mod pipeline;
pub mod ranking;
pub mod report;
pub mod scoring;
pub mod stats;
pub mod util;
