//! Broadcast scanning worker.
//!
//! This crate provides:
//! - Environment-driven configuration
//! - The per-broadcast pipeline (search, neighbor log, tracking, result log)
//! - A batch executor bounding concurrent broadcasts
//! - Structured logging and Prometheus metrics

pub mod config;
pub mod error;
pub mod executor;
pub mod logging;
pub mod metrics;
pub mod processor;

pub use config::WorkerConfig;
pub use error::{WorkerError, WorkerResult};
pub use executor::{BatchSummary, ScanExecutor, ScanMode};
pub use logging::ScanLogger;
pub use processor::{process_broadcast, replay_neighbor_log, ScanContext, ScanOutcome};
