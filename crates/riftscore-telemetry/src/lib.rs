//! Riftscore Telemetry - Prometheus metrics
//!
//! A single [`MetricsRegistry`] is shared (behind `Arc`) by the upstream
//! client and the ingestion/scoring pipelines. The CLI prints the text
//! exposition on demand.

pub mod metrics;

pub use metrics::MetricsRegistry;
