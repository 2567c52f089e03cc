//! Prometheus metrics registry for Riftscore
//!
//! Provides typed, labeled counters and histograms for upstream requests,
//! quota admission waits, retries, bulk ingestion and scoring.

use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};

/// Central metrics registry holding all Prometheus metrics.
pub struct MetricsRegistry {
    registry: Registry,
    /// Counter: upstream requests by (endpoint, status)
    pub riot_requests_total: IntCounterVec,
    /// Counter: retries by reason (throttled, transient)
    pub riot_retries_total: IntCounterVec,
    /// Counter: logical calls that gave up, by error kind
    pub riot_failures_total: IntCounterVec,
    /// Histogram: time spent waiting for a quota slot
    pub quota_wait_seconds: HistogramVec,
    /// Gauge: number of learned quota windows
    pub quota_windows: IntGauge,
    /// Counter: bulk segments by outcome (written, failed)
    pub ingest_segments_total: IntCounterVec,
    /// Counter: scored documents by outcome (scored, skipped)
    pub matches_scored_total: IntCounterVec,
}

impl MetricsRegistry {
    /// Creates a new `MetricsRegistry` with all metrics registered.
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new_custom(Some("riftscore".to_string()), None)?;

        let riot_requests_total = IntCounterVec::new(
            Opts::new("riot_requests_total", "Total upstream API requests"),
            &["endpoint", "status"],
        )?;
        registry.register(Box::new(riot_requests_total.clone()))?;

        let riot_retries_total = IntCounterVec::new(
            Opts::new("riot_retries_total", "Total request retries by reason"),
            &["reason"],
        )?;
        registry.register(Box::new(riot_retries_total.clone()))?;

        let riot_failures_total = IntCounterVec::new(
            Opts::new("riot_failures_total", "Total calls that ended in failure"),
            &["kind"],
        )?;
        registry.register(Box::new(riot_failures_total.clone()))?;

        let quota_wait_seconds = HistogramVec::new(
            HistogramOpts::new(
                "quota_wait_seconds",
                "Time spent waiting for a quota slot in seconds",
            )
            .buckets(vec![0.0, 0.05, 0.25, 1.0, 5.0, 30.0, 120.0, f64::INFINITY]),
            &["waited"],
        )?;
        registry.register(Box::new(quota_wait_seconds.clone()))?;

        let quota_windows = IntGauge::new("quota_windows", "Number of learned quota windows")?;
        registry.register(Box::new(quota_windows.clone()))?;

        let ingest_segments_total = IntCounterVec::new(
            Opts::new("ingest_segments_total", "Total bulk segments by outcome"),
            &["outcome"],
        )?;
        registry.register(Box::new(ingest_segments_total.clone()))?;

        let matches_scored_total = IntCounterVec::new(
            Opts::new("matches_scored_total", "Total match documents scored"),
            &["outcome"],
        )?;
        registry.register(Box::new(matches_scored_total.clone()))?;

        Ok(Self {
            registry,
            riot_requests_total,
            riot_retries_total,
            riot_failures_total,
            quota_wait_seconds,
            quota_windows,
            ingest_segments_total,
            matches_scored_total,
        })
    }

    // ========================================================================
    // Recording helpers
    // ========================================================================

    /// Record one upstream HTTP exchange. `status` is the numeric code or
    /// `"transport"` when no response arrived.
    pub fn record_request(&self, endpoint: &str, status: &str) {
        self.riot_requests_total
            .with_label_values(&[endpoint, status])
            .inc();
    }

    pub fn record_retry(&self, reason: &str) {
        self.riot_retries_total.with_label_values(&[reason]).inc();
    }

    pub fn record_failure(&self, kind: &str) {
        self.riot_failures_total.with_label_values(&[kind]).inc();
    }

    /// Observe an admission wait; zero waits are bucketed separately.
    pub fn observe_quota_wait(&self, seconds: f64) {
        let label = if seconds > 0.0 { "yes" } else { "no" };
        self.quota_wait_seconds
            .with_label_values(&[label])
            .observe(seconds);
    }

    pub fn set_quota_windows(&self, count: usize) {
        self.quota_windows.set(count as i64);
    }

    pub fn record_segment(&self, outcome: &str) {
        self.ingest_segments_total
            .with_label_values(&[outcome])
            .inc();
    }

    pub fn record_scored(&self, outcome: &str, count: u64) {
        self.matches_scored_total
            .with_label_values(&[outcome])
            .inc_by(count);
    }

    // ========================================================================
    // Encoding
    // ========================================================================

    /// Encode all metrics in Prometheus text exposition format.
    pub fn encode(&self) -> anyhow::Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}
