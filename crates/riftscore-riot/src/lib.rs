//! Riftscore Riot - rate-limited client for the Riot Games API
//!
//! Provides:
//! - Sliding-window quota tracking learned from the upstream's rate-limit header
//! - An adaptive client that retries throttled and transient failures
//! - Endpoint URL construction and typed wrappers for the match, account and
//!   league endpoints
//! - Bulk match ingestion into segment storage
//!
//! ## Modules
//!
//! - [`rate_limit`] - Quota parsing and the shared rate tracker
//! - [`retry`] - Retry policy and the backoff state machine
//! - [`client`] - The adaptive HTTP client
//! - [`endpoints`] - URL builders for the upstream endpoint families
//! - [`api`] - Typed endpoint wrappers
//! - [`ingest`] - Paging ingestion workflows

pub mod api;
pub mod client;
pub mod endpoints;
pub mod ingest;
pub mod rate_limit;
pub mod retry;

use thiserror::Error;

/// Terminal failures of an upstream call
///
/// Throttling and transient errors are retried inside the client and only
/// surface here once the retry budget is spent.
#[derive(Debug, Error)]
pub enum RiotError {
    /// Every attempt was answered with 429
    #[error("Rate limited: gave up on {url} after {attempts} attempts")]
    RateLimitedExhausted {
        /// Requested URL
        url: String,
        /// Attempts made
        attempts: u32,
    },

    /// The last attempt failed with a non-429 status or a transport error
    #[error("Upstream unavailable: gave up on {url} after {attempts} attempts ({last_error})")]
    UpstreamUnavailable {
        /// Requested URL
        url: String,
        /// Attempts made
        attempts: u32,
        /// Status of the last response, `None` for transport errors
        status: Option<u16>,
        /// Description of the last failure
        last_error: String,
    },

    /// A success status carried a body that is not the expected JSON
    #[error("Malformed response from {url}: {reason}")]
    MalformedResponse {
        /// Requested URL
        url: String,
        /// Parse failure
        reason: String,
    },

    /// The client's cancellation token fired during a wait
    #[error("Request cancelled")]
    Cancelled,

    /// The request could not be built
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl RiotError {
    /// True for the two retry-budget exhaustion variants.
    pub fn is_exhausted(&self) -> bool {
        matches!(
            self,
            RiotError::RateLimitedExhausted { .. } | RiotError::UpstreamUnavailable { .. }
        )
    }

    /// Short label for metrics and reports.
    pub fn kind(&self) -> &'static str {
        match self {
            RiotError::RateLimitedExhausted { .. } => "rate_limited_exhausted",
            RiotError::UpstreamUnavailable { .. } => "upstream_unavailable",
            RiotError::MalformedResponse { .. } => "malformed_response",
            RiotError::Cancelled => "cancelled",
            RiotError::InvalidRequest(_) => "invalid_request",
        }
    }

    /// Status of the last response, when one arrived.
    pub fn status(&self) -> Option<u16> {
        match self {
            RiotError::RateLimitedExhausted { .. } => Some(429),
            RiotError::UpstreamUnavailable { status, .. } => *status,
            _ => None,
        }
    }
}

pub use api::{LeagueEntry, PlayerRank, RiotApi};
pub use client::{CallOutcome, RiotClient};
pub use endpoints::{MatchIdsQuery, RiotEndpoints};
pub use ingest::{
    IngestReport, IngestStage, MatchIngestor, SegmentFailure, StopReason, TimeWindow,
};
pub use rate_limit::{
    Admission, QuotaLearning, RateLimitParseError, RateLimitSet, RateTracker, RateWindow,
};
pub use retry::{Backoff, RetryPolicy, RetryTrace, SleepReason};
