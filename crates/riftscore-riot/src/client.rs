//! Adaptive rate-limited client for the Riot Games API
//!
//! Every upstream GET goes through [`RiotClient::call`], which:
//!
//! 1. waits for a quota slot on the shared [`RateTracker`]
//! 2. sends the request with the `X-Riot-Token` header
//! 3. on success, offers the `X-App-Rate-Limit` header to the tracker and
//!    returns the decoded JSON body
//! 4. on 429, sleeps for `Retry-After` and tries again
//! 5. on any other failure, sleeps the exponential backoff and tries again
//!
//! Once the attempt budget is spent the call fails with a typed
//! [`RiotError`]; it never returns an empty value in place of a failure.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use riftscore_riot::client::RiotClient;
//!
//! # async fn example() -> Result<(), riftscore_riot::RiotError> {
//! let client = RiotClient::new("RGAPI-...");
//! let ids = client
//!     .get("https://americas.api.riotgames.com/lol/match/v5/matches/by-puuid/abc/ids")
//!     .await?;
//! println!("{ids}");
//! # Ok(())
//! # }
//! ```

use std::{sync::Arc, time::Duration};

use anyhow::Context;
use reqwest::{header::RETRY_AFTER, Client, StatusCode};
use riftscore_core::config::Config;
use riftscore_telemetry::MetricsRegistry;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{
    rate_limit::{parse_retry_after, sleep_or_cancel, Admission, QuotaLearning, RateTracker},
    retry::{AttemptFailure, RetryPolicy, RetryState, RetryTrace, SleepReason},
    RiotError,
};

/// Header carrying the API key
pub const API_KEY_HEADER: &str = "X-Riot-Token";

/// Header describing the application's quota windows
pub const RATE_LIMIT_HEADER: &str = "X-App-Rate-Limit";

/// Result of a traced call
#[derive(Debug)]
pub struct CallOutcome {
    pub result: Result<Value, RiotError>,
    pub trace: RetryTrace,
}

// ============================================================================
// RiotClient
// ============================================================================

/// HTTP client for the Riot Games API with quota admission and retries
///
/// Share one instance (behind `Arc`) between all concurrent workers using the
/// same API key so they share one quota history.
pub struct RiotClient {
    client: Client,
    api_key: String,
    tracker: Arc<RateTracker>,
    policy: RetryPolicy,
    metrics: Option<Arc<MetricsRegistry>>,
    cancel: CancellationToken,
}

impl std::fmt::Debug for RiotClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RiotClient")
            .field("api_key", &"<redacted>")
            .field("tracker", &self.tracker)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl RiotClient {
    /// Creates a client with default retry settings and an unlearned tracker.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            tracker: Arc::new(RateTracker::new()),
            policy: RetryPolicy::default(),
            metrics: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Builds a client from configuration, reading the API key from the
    /// environment variable named by `riot.api_key_env`.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let api_key = config.riot.api_key_from_env()?;
        Self::with_key_and_config(api_key, config)
    }

    /// Builds a client from configuration with an explicit API key.
    pub fn with_key_and_config(
        api_key: impl Into<String>,
        config: &Config,
    ) -> anyhow::Result<Self> {
        let limits = &config.rate_limiting;
        let client = Client::builder()
            .timeout(Duration::from_secs(limits.request_timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        let learning = if limits.relearn_quotas {
            QuotaLearning::Refresh
        } else {
            QuotaLearning::Once
        };
        let tracker = RateTracker::new()
            .with_margin(Duration::from_millis(limits.admission_margin_ms))
            .with_learning(learning);

        Ok(Self {
            client,
            api_key: api_key.into(),
            tracker: Arc::new(tracker),
            policy: RetryPolicy::from_config(limits),
            metrics: None,
            cancel: CancellationToken::new(),
        })
    }

    /// Replaces the rate tracker, e.g. to share one between clients.
    pub fn with_tracker(mut self, tracker: Arc<RateTracker>) -> Self {
        self.tracker = tracker;
        self
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<MetricsRegistry>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Attaches a token that aborts quota waits and retry sleeps.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn tracker(&self) -> &Arc<RateTracker> {
        &self.tracker
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    // ========================================================================
    // Calls
    // ========================================================================

    /// GET `url` with the configured attempt budget.
    pub async fn get(&self, url: &str) -> Result<Value, RiotError> {
        self.call(url, self.policy.max_retries).await
    }

    /// GET `url` and deserialize the body into `T`.
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, RiotError> {
        let value = self.get(url).await?;
        serde_json::from_value(value).map_err(|e| RiotError::MalformedResponse {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }

    /// GET `url` with at most `max_retries` attempts (at least one).
    pub async fn call(&self, url: &str, max_retries: u32) -> Result<Value, RiotError> {
        self.call_with_trace(url, max_retries).await.result
    }

    /// Like [`call`](Self::call), also returning what the retry loop did.
    pub async fn call_with_trace(&self, url: &str, max_retries: u32) -> CallOutcome {
        let mut state = RetryState::new(self.policy.clone().with_max_retries(max_retries));
        let endpoint = endpoint_label(url);
        let mut attempt = 0u32;

        let result = loop {
            attempt += 1;

            match self.tracker.await_slot_cancellable(&self.cancel).await {
                Admission::Cancelled => break Err(RiotError::Cancelled),
                Admission::Admitted { waited } => {
                    if !waited.is_zero() {
                        debug!(
                            url,
                            attempt,
                            wait_ms = waited.as_millis() as u64,
                            "Admitted after quota wait"
                        );
                    }
                    if let Some(metrics) = &self.metrics {
                        metrics.observe_quota_wait(waited.as_secs_f64());
                    }
                }
            }

            let failure = match self.send_once(url, &endpoint, state.policy()).await {
                Ok(Attempt::Success(body)) => {
                    state.on_settled(attempt);
                    match serde_json::from_slice::<Value>(&body) {
                        Ok(value) => {
                            if attempt > 1 {
                                info!(url, attempt, "Request succeeded after retry");
                            }
                            break Ok(value);
                        }
                        Err(e) => {
                            warn!(url, error = %e, "Success response is not valid JSON");
                            break Err(RiotError::MalformedResponse {
                                url: url.to_string(),
                                reason: e.to_string(),
                            });
                        }
                    }
                }
                Ok(Attempt::Failed(failure)) => failure,
                Err(cancelled) => break Err(cancelled),
            };

            match state.on_failure(attempt, &failure) {
                Some(sleep) => {
                    match sleep.reason {
                        SleepReason::Throttled => info!(
                            url,
                            attempt,
                            retry_after_ms = sleep.delay.as_millis() as u64,
                            "Received 429, backing off"
                        ),
                        SleepReason::Transient => warn!(
                            url,
                            attempt,
                            status = ?sleep.status,
                            backoff_ms = sleep.delay.as_millis() as u64,
                            error = %failure.describe(),
                            "Transient upstream failure, retrying"
                        ),
                    }
                    if let Some(metrics) = &self.metrics {
                        metrics.record_retry(sleep.reason.as_str());
                    }
                    if !sleep_or_cancel(sleep.delay, Some(&self.cancel)).await {
                        break Err(RiotError::Cancelled);
                    }
                }
                None => {
                    let err = failure.into_exhausted(url, attempt);
                    warn!(url, attempts = attempt, error = %err, "Retry budget exhausted");
                    break Err(err);
                }
            }
        };

        if let (Err(err), Some(metrics)) = (&result, &self.metrics) {
            metrics.record_failure(err.kind());
        }

        CallOutcome {
            result,
            trace: state.into_trace(),
        }
    }

    /// Sends one request and classifies the response.
    async fn send_once(
        &self,
        url: &str,
        endpoint: &str,
        policy: &RetryPolicy,
    ) -> Result<Attempt, RiotError> {
        let request = self.client.get(url).header(API_KEY_HEADER, &self.api_key);
        let response = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Err(RiotError::Cancelled),
            response = request.send() => response,
        };

        let response = match response {
            Ok(response) => response,
            Err(e) => {
                self.record_request(endpoint, "transport");
                return Ok(Attempt::Failed(AttemptFailure::Transport(e.to_string())));
            }
        };

        let status = response.status();
        self.record_request(endpoint, status.as_str());

        if status.is_success() {
            let quota_header = response
                .headers()
                .get(RATE_LIMIT_HEADER)
                .and_then(|v| v.to_str().ok())
                .map(str::to_owned);

            let body = match response.bytes().await {
                Ok(body) => body,
                Err(e) => {
                    return Ok(Attempt::Failed(AttemptFailure::Transport(e.to_string())));
                }
            };

            if self.tracker.learn(quota_header.as_deref()) {
                if let Some(metrics) = &self.metrics {
                    metrics.set_quota_windows(self.tracker.limits().len());
                }
            }
            return Ok(Attempt::Success(body.to_vec()));
        }

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .map(|v| parse_retry_after(v, policy.default_retry_after))
                .unwrap_or(policy.default_retry_after);
            return Ok(Attempt::Failed(AttemptFailure::Throttled { retry_after }));
        }

        Ok(Attempt::Failed(AttemptFailure::Status(status.as_u16())))
    }

    fn record_request(&self, endpoint: &str, status: &str) {
        if let Some(metrics) = &self.metrics {
            metrics.record_request(endpoint, status);
        }
    }
}

enum Attempt {
    Success(Vec<u8>),
    Failed(AttemptFailure),
}

/// Low-cardinality metrics label: the first three path segments.
fn endpoint_label(url: &str) -> String {
    url::Url::parse(url)
        .ok()
        .and_then(|u| {
            u.path_segments()
                .map(|segments| segments.take(3).collect::<Vec<_>>().join("/"))
        })
        .filter(|label| !label.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}
