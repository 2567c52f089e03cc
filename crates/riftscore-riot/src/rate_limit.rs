//! Quota tracking for the Riot Games API
//!
//! The upstream describes a caller's budget in a response header such as
//! `X-App-Rate-Limit: 20:1,100:120` ("20 requests per second AND 100 requests
//! per two minutes"). Every clause applies at once.
//!
//! ## Architecture
//!
//! - [`RateWindow`] / [`RateLimitSet`]: the parsed quota
//! - [`RateTracker`]: sliding-window admission control shared by every call a
//!   client makes. Each window keeps the timestamps of admitted requests; a
//!   caller whose window is full sleeps until the oldest entry ages out.
//!
//! Admission is serialized: the sleep happens while the tracker's lock is
//! held, so concurrent callers queue behind one another rather than
//! overlapping their waits. Learning a quota does not take that lock: a
//! caller already waiting rechecks against the new limits as soon as they are
//! published.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use riftscore_riot::rate_limit::{RateLimitSet, RateTracker};
//!
//! # async fn example() {
//! let tracker = RateTracker::with_limits("20:1,100:120".parse().unwrap());
//! let waited = tracker.await_slot().await;
//! // ... make API call ...
//! # let _ = waited;
//! # }
//! ```

use std::{
    collections::{HashMap, VecDeque},
    fmt,
    str::FromStr,
    time::Duration,
};

use thiserror::Error;
use tokio::{
    sync::{watch, Mutex},
    time::Instant,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Extra wait added to every computed admission delay
pub const DEFAULT_ADMISSION_MARGIN: Duration = Duration::from_millis(10);

/// Upper bound accepted from a `Retry-After` header
const MAX_RETRY_AFTER: Duration = Duration::from_secs(3600);

// ============================================================================
// Quota model
// ============================================================================

/// One quota clause: at most `limit` requests per `window_seconds`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RateWindow {
    pub limit: u32,
    pub window_seconds: u64,
}

impl RateWindow {
    pub const fn new(limit: u32, window_seconds: u64) -> Self {
        Self {
            limit,
            window_seconds,
        }
    }

    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_seconds)
    }
}

impl fmt::Display for RateWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.limit, self.window_seconds)
    }
}

/// Errors produced while parsing a quota header
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RateLimitParseError {
    #[error("rate limit header is empty")]
    Empty,

    #[error("malformed rate limit clause '{0}', expected <count>:<seconds>")]
    MalformedClause(String),

    #[error("rate limit clause '{0}' has a zero count or window")]
    ZeroValue(String),
}

/// The set of quota windows in force, one entry per window length
///
/// Order follows the header. When a window length repeats, the smaller
/// limit is kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RateLimitSet {
    windows: Vec<RateWindow>,
}

impl RateLimitSet {
    pub fn new(windows: impl IntoIterator<Item = RateWindow>) -> Self {
        let mut set = Self::default();
        for window in windows {
            set.insert(window);
        }
        set
    }

    fn insert(&mut self, window: RateWindow) {
        match self
            .windows
            .iter_mut()
            .find(|w| w.window_seconds == window.window_seconds)
        {
            Some(existing) => existing.limit = existing.limit.min(window.limit),
            None => self.windows.push(window),
        }
    }

    /// Parses a header value like `"20:1,100:120"`.
    pub fn parse(header: &str) -> Result<Self, RateLimitParseError> {
        if header.trim().is_empty() {
            return Err(RateLimitParseError::Empty);
        }

        let mut set = Self::default();
        for clause in header.split(',') {
            let clause = clause.trim();
            let (count, seconds) = clause
                .split_once(':')
                .ok_or_else(|| RateLimitParseError::MalformedClause(clause.to_string()))?;
            let limit: u32 = count
                .trim()
                .parse()
                .map_err(|_| RateLimitParseError::MalformedClause(clause.to_string()))?;
            let window_seconds: u64 = seconds
                .trim()
                .parse()
                .map_err(|_| RateLimitParseError::MalformedClause(clause.to_string()))?;
            if limit == 0 || window_seconds == 0 {
                return Err(RateLimitParseError::ZeroValue(clause.to_string()));
            }
            set.insert(RateWindow::new(limit, window_seconds));
        }
        Ok(set)
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn windows(&self) -> &[RateWindow] {
        &self.windows
    }

    pub fn iter(&self) -> impl Iterator<Item = &RateWindow> {
        self.windows.iter()
    }

    /// The clause for a given window length.
    pub fn get(&self, window_seconds: u64) -> Option<RateWindow> {
        self.windows
            .iter()
            .copied()
            .find(|w| w.window_seconds == window_seconds)
    }
}

impl FromStr for RateLimitSet {
    type Err = RateLimitParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for RateLimitSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, window) in self.windows.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{window}")?;
        }
        Ok(())
    }
}

// ============================================================================
// Request history
// ============================================================================

/// Admission timestamps per window length
#[derive(Debug, Default)]
struct RequestHistory {
    stamps: HashMap<u64, VecDeque<Instant>>,
}

impl RequestHistory {
    /// Drops entries at least one window old and returns what is left.
    fn prune(&mut self, window: &RateWindow, now: Instant) -> &VecDeque<Instant> {
        let span = window.window();
        let queue = self.stamps.entry(window.window_seconds).or_default();
        while let Some(&front) = queue.front() {
            if now.saturating_duration_since(front) >= span {
                queue.pop_front();
            } else {
                break;
            }
        }
        queue
    }

    fn record(&mut self, limits: &RateLimitSet, at: Instant) {
        for window in limits.iter() {
            self.stamps
                .entry(window.window_seconds)
                .or_default()
                .push_back(at);
        }
    }

    fn len(&self, window_seconds: u64) -> usize {
        self.stamps.get(&window_seconds).map_or(0, VecDeque::len)
    }

    fn retain_windows(&mut self, limits: &RateLimitSet) {
        self.stamps.retain(|seconds, _| limits.get(*seconds).is_some());
    }
}

// ============================================================================
// RateTracker
// ============================================================================

/// Whether the quota header is read once or on every success
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QuotaLearning {
    /// First successful response wins for the tracker's lifetime
    #[default]
    Once,
    /// Any success whose header differs replaces the quota
    Refresh,
}

/// Result of a cancellable admission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// A slot was recorded; `waited` is the time from call to admission
    Admitted { waited: Duration },
    /// The token fired before a slot became free; nothing was recorded
    Cancelled,
}

impl Admission {
    pub fn waited(&self) -> Option<Duration> {
        match self {
            Admission::Admitted { waited } => Some(*waited),
            Admission::Cancelled => None,
        }
    }
}

#[derive(Debug, Default)]
struct TrackerState {
    limits: RateLimitSet,
    history: RequestHistory,
    /// Generation of the published quota these limits were taken from
    generation: u64,
}

impl TrackerState {
    /// Adopts the published quota if it changed since the last admission.
    fn sync(&mut self, published: &PublishedQuota) {
        if self.generation == published.generation {
            return;
        }
        self.history.retain_windows(&published.limits);
        self.limits = published.limits.clone();
        self.generation = published.generation;
    }
}

#[derive(Debug, Clone, Default)]
struct PublishedQuota {
    header: Option<String>,
    limits: RateLimitSet,
    generation: u64,
}

enum Pause {
    Elapsed,
    Relearned,
    Cancelled,
}

/// Shared sliding-window admission control
///
/// One tracker belongs to one client and is shared by every concurrent call
/// made through it (wrap it in `Arc`). Until limits are known, admission is
/// free.
#[derive(Debug)]
pub struct RateTracker {
    /// Limits and history, locked for the whole admission decision
    state: Mutex<TrackerState>,
    /// Learned quota; published without touching `state`, picked up by the
    /// next admission check and by any admitter currently waiting
    published: watch::Sender<PublishedQuota>,
    margin: Duration,
    learning: QuotaLearning,
}

impl Default for RateTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl RateTracker {
    /// A tracker with no limits yet; they are learned from the first success.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(TrackerState::default()),
            published: watch::channel(PublishedQuota::default()).0,
            margin: DEFAULT_ADMISSION_MARGIN,
            learning: QuotaLearning::Once,
        }
    }

    /// A tracker preloaded with known limits.
    pub fn with_limits(limits: RateLimitSet) -> Self {
        let published = PublishedQuota {
            header: (!limits.is_empty()).then(|| limits.to_string()),
            limits: limits.clone(),
            generation: 0,
        };
        Self {
            state: Mutex::new(TrackerState {
                limits,
                history: RequestHistory::default(),
                generation: 0,
            }),
            published: watch::channel(published).0,
            margin: DEFAULT_ADMISSION_MARGIN,
            learning: QuotaLearning::Once,
        }
    }

    pub fn with_margin(mut self, margin: Duration) -> Self {
        self.margin = margin;
        self
    }

    pub fn with_learning(mut self, learning: QuotaLearning) -> Self {
        self.learning = learning;
        self
    }

    pub fn learning(&self) -> QuotaLearning {
        self.learning
    }

    /// Currently enforced limits (empty until learned).
    pub fn limits(&self) -> RateLimitSet {
        self.published.borrow().limits.clone()
    }

    /// Number of admissions currently remembered for a window.
    pub async fn history_len(&self, window_seconds: u64) -> usize {
        let mut state = self.state.lock().await;
        state.sync(&self.published.borrow());
        state.history.len(window_seconds)
    }

    /// Blocks until every window has room, then records the request.
    ///
    /// Returns the time spent waiting (zero when admitted immediately).
    pub async fn await_slot(&self) -> Duration {
        self.admit(None).await.waited().unwrap_or_default()
    }

    /// Like [`await_slot`](Self::await_slot) but gives up when `cancel` fires.
    pub async fn await_slot_cancellable(&self, cancel: &CancellationToken) -> Admission {
        self.admit(Some(cancel)).await
    }

    async fn admit(&self, cancel: Option<&CancellationToken>) -> Admission {
        let started = Instant::now();
        let mut guard = match cancel {
            Some(token) => tokio::select! {
                biased;
                _ = token.cancelled() => return Admission::Cancelled,
                guard = self.state.lock() => guard,
            },
            None => self.state.lock().await,
        };
        let mut relearned = self.published.subscribe();

        'admission: loop {
            guard.sync(&relearned.borrow_and_update());
            let TrackerState {
                limits, history, ..
            } = &mut *guard;

            if limits.is_empty() {
                return Admission::Admitted {
                    waited: started.elapsed(),
                };
            }

            for window in limits.iter() {
                let now = Instant::now();
                let queue = history.prune(window, now);
                if queue.len() < window.limit as usize {
                    continue;
                }
                let Some(&oldest) = queue.front() else {
                    continue;
                };
                let in_window = queue.len();
                let wait = window
                    .window()
                    .saturating_sub(now.saturating_duration_since(oldest))
                    + self.margin;

                debug!(
                    limit = window.limit,
                    window_seconds = window.window_seconds,
                    in_window,
                    wait_ms = wait.as_millis() as u64,
                    "Quota window full, waiting for a slot"
                );
                match pause(wait, cancel, &mut relearned).await {
                    Pause::Cancelled => {
                        debug!("Admission wait cancelled");
                        return Admission::Cancelled;
                    }
                    Pause::Relearned => debug!("Quota changed while waiting, rechecking"),
                    Pause::Elapsed => {}
                }
                continue 'admission;
            }

            history.record(limits, Instant::now());
            return Admission::Admitted {
                waited: started.elapsed(),
            };
        }
    }

    /// Offers a quota header seen on a successful response.
    ///
    /// Returns `true` when the enforced limits changed. A missing or
    /// malformed header leaves the limits untouched. Never waits on an
    /// admission in progress.
    pub fn learn(&self, header: Option<&str>) -> bool {
        let Some(raw) = header else {
            debug!("Response carried no rate limit header");
            return false;
        };

        let learning = self.learning;
        self.published.send_if_modified(|current| {
            match (&current.header, learning) {
                (Some(_), QuotaLearning::Once) => return false,
                (Some(seen), QuotaLearning::Refresh) if seen == raw => return false,
                _ => {}
            }

            let limits = match RateLimitSet::parse(raw) {
                Ok(limits) => limits,
                Err(e) => {
                    warn!(header = raw, error = %e, "Ignoring unparseable rate limit header");
                    return false;
                }
            };
            if current.header.is_some() && current.limits == limits {
                return false;
            }

            info!(limits = %limits, "Learned rate limits from response header");
            current.header = Some(raw.to_string());
            current.limits = limits;
            current.generation += 1;
            true
        })
    }
}

/// Sleeps for `wait` unless the quota is republished or `cancel` fires.
async fn pause(
    wait: Duration,
    cancel: Option<&CancellationToken>,
    relearned: &mut watch::Receiver<PublishedQuota>,
) -> Pause {
    tokio::select! {
        biased;
        _ = cancelled(cancel) => Pause::Cancelled,
        changed = relearned.changed() => match changed {
            Ok(()) => Pause::Relearned,
            // The sender lives as long as the tracker; a closed channel
            // only means no further updates can arrive.
            Err(_) => {
                if sleep_or_cancel(wait, cancel).await {
                    Pause::Elapsed
                } else {
                    Pause::Cancelled
                }
            }
        },
        _ = tokio::time::sleep(wait) => Pause::Elapsed,
    }
}

async fn cancelled(cancel: Option<&CancellationToken>) {
    match cancel {
        Some(token) => token.cancelled().await,
        None => std::future::pending().await,
    }
}

/// Sleeps for `duration`; returns `false` if `cancel` fired first.
pub(crate) async fn sleep_or_cancel(
    duration: Duration,
    cancel: Option<&CancellationToken>,
) -> bool {
    match cancel {
        Some(token) => tokio::select! {
            biased;
            _ = token.cancelled() => false,
            _ = tokio::time::sleep(duration) => true,
        },
        None => {
            tokio::time::sleep(duration).await;
            true
        }
    }
}

// ============================================================================
// Retry-After parsing
// ============================================================================

/// Parses a `Retry-After` header value.
///
/// Accepts (possibly fractional) seconds or an HTTP-date. Falls back to
/// `default` when the value is unusable. Values are capped at one hour.
pub fn parse_retry_after(value: &str, default: Duration) -> Duration {
    let trimmed = value.trim();

    if let Ok(seconds) = trimmed.parse::<f64>() {
        if seconds.is_finite() && seconds >= 0.0 {
            return Duration::from_secs_f64(seconds.min(MAX_RETRY_AFTER.as_secs_f64()));
        }
    }

    if let Ok(date) = chrono::DateTime::parse_from_rfc2822(trimmed) {
        let now = chrono::Utc::now();
        let target = date.with_timezone(&chrono::Utc);
        if let Ok(diff) = (target - now).to_std() {
            return diff.min(MAX_RETRY_AFTER);
        }
        return Duration::ZERO;
    }

    warn!(value, "Could not parse Retry-After header, using default");
    default
}

// ============================================================================
// Unit tests
// ============================================================================
