//! Lightweight in-process metrics.
//!
//! Counters and histograms are stored as atomics keyed by label sets and
//! rendered in Prometheus text format on demand.

pub mod metrics;

pub use metrics::{InvocationMode, RuntimeMetrics};
