//! Configuration module for Riftscore.
//!
//! Provides typed configuration structs that map to the YAML configuration file,
//! with loading, validation, defaults, and a builder pattern for programmatic use.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Config struct with sub-sections
// ---------------------------------------------------------------------------

/// Top-level configuration for Riftscore.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub riot: RiotConfig,
    pub rate_limiting: RateLimitingConfig,
    pub ingestion: IngestionConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

/// Upstream gaming API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RiotConfig {
    /// Name of the environment variable holding the API key.
    pub api_key_env: String,
    /// Regional routing value for match and account endpoints (e.g. `americas`).
    pub regional_route: String,
    /// Platform routing value for league endpoints (e.g. `na1`).
    pub platform: String,
    /// Optional base URL replacing both hosts (proxies, tests).
    pub base_url: Option<String>,
}

/// Client-side throttling and retry settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitingConfig {
    /// Attempts per logical call before giving up.
    pub max_retries: u32,
    /// First backoff delay for transient failures (milliseconds); doubles per retry.
    pub initial_backoff_ms: u64,
    /// Delay used when a 429 carries no usable `Retry-After` header (seconds).
    pub default_retry_after_secs: f64,
    /// Safety margin added to every admission wait (milliseconds).
    pub admission_margin_ms: u64,
    /// Re-read the quota header on every success instead of only the first one.
    pub relearn_quotas: bool,
    /// Per-request transport timeout (seconds).
    pub request_timeout_secs: u64,
}

/// Bulk match download settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestionConfig {
    /// Match IDs requested per page.
    pub page_size: u32,
    /// Size of the time window to download, counted back from now.
    pub lookback_months: u32,
    /// Hard cap on pages per player.
    pub max_pages: u32,
    /// Match type filter sent to the match-ID endpoint.
    pub queue_type: String,
    /// Prefix under which bulk segments are written.
    pub key_prefix: String,
}

/// Local storage locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Root directory for bulk match segments.
    pub bulk_dir: PathBuf,
    /// SQLite database file for metrics and power levels.
    pub database: PathBuf,
}

/// Logging / tracing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: `trace`, `debug`, `info`, `warn`, or `error`.
    pub level: String,
    /// Emit JSON log lines instead of human-readable ones.
    pub json: bool,
}

// ---------------------------------------------------------------------------
// Config::load()
// ---------------------------------------------------------------------------

impl Config {
    /// Load configuration from a YAML file at `path`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Try to load from `path`; fall back to [`Config::default`] on any error.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// Platform-appropriate default path for the configuration file.
    ///
    /// Typically `$XDG_CONFIG_HOME/riftscore/config.yaml` on Linux.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("riftscore")
            .join("config.yaml")
    }
}

impl RiotConfig {
    /// Reads the API key from the configured environment variable.
    pub fn api_key_from_env(&self) -> anyhow::Result<String> {
        match std::env::var(&self.api_key_env) {
            Ok(key) if !key.trim().is_empty() => Ok(key.trim().to_string()),
            Ok(_) => anyhow::bail!("environment variable {} is empty", self.api_key_env),
            Err(_) => anyhow::bail!("environment variable {} is not set", self.api_key_env),
        }
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

fn data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("~/.local/share"))
        .join("riftscore")
}

impl Default for RiotConfig {
    fn default() -> Self {
        Self {
            api_key_env: "RIOT_API_KEY".to_string(),
            regional_route: "americas".to_string(),
            platform: "na1".to_string(),
            base_url: None,
        }
    }
}

impl Default for RateLimitingConfig {
    fn default() -> Self {
        Self {
            max_retries: 6,
            initial_backoff_ms: 500,
            default_retry_after_secs: 1.0,
            admission_margin_ms: 10,
            relearn_quotas: false,
            request_timeout_secs: 30,
        }
    }
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            page_size: 10,
            lookback_months: 12,
            max_pages: 100,
            queue_type: "ranked".to_string(),
            key_prefix: "rank_match_info".to_string(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        let data_dir = data_dir();
        Self {
            bulk_dir: data_dir.join("bulk"),
            database: data_dir.join("riftscore.db"),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Config::validate()
// ---------------------------------------------------------------------------

/// A single validation error found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path to the offending field, e.g. `"ingestion.page_size"`.
    pub field: String,
    /// Human-readable explanation.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Valid values for `logging.level`.
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Upper bound accepted by the match-ID endpoint for `count`.
const MAX_PAGE_SIZE: u32 = 100;

fn positive(errors: &mut Vec<ValidationError>, field: &str, value: u64) {
    if value == 0 {
        errors.push(ValidationError {
            field: field.into(),
            message: "must be greater than 0".into(),
        });
    }
}

fn routing_value(errors: &mut Vec<ValidationError>, field: &str, value: &str) {
    if value.is_empty() || !value.chars().all(|c| c.is_ascii_alphanumeric()) {
        errors.push(ValidationError {
            field: field.into(),
            message: format!("invalid routing value '{value}'"),
        });
    }
}

impl Config {
    /// Validate the configuration and return all errors found.
    ///
    /// An empty vector means the configuration is valid.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        // --- riot ---
        if self.riot.api_key_env.trim().is_empty() {
            errors.push(ValidationError {
                field: "riot.api_key_env".into(),
                message: "must name an environment variable".into(),
            });
        }
        routing_value(&mut errors, "riot.regional_route", &self.riot.regional_route);
        routing_value(&mut errors, "riot.platform", &self.riot.platform);
        if let Some(ref base) = self.riot.base_url {
            if !(base.starts_with("http://") || base.starts_with("https://")) {
                errors.push(ValidationError {
                    field: "riot.base_url".into(),
                    message: format!("must be an http(s) URL, got '{base}'"),
                });
            }
        }

        // --- rate_limiting ---
        positive(
            &mut errors,
            "rate_limiting.max_retries",
            u64::from(self.rate_limiting.max_retries),
        );
        positive(
            &mut errors,
            "rate_limiting.initial_backoff_ms",
            self.rate_limiting.initial_backoff_ms,
        );
        positive(
            &mut errors,
            "rate_limiting.request_timeout_secs",
            self.rate_limiting.request_timeout_secs,
        );
        let retry_after = self.rate_limiting.default_retry_after_secs;
        if !retry_after.is_finite() || retry_after < 0.0 {
            errors.push(ValidationError {
                field: "rate_limiting.default_retry_after_secs".into(),
                message: "must be a non-negative number of seconds".into(),
            });
        }

        // --- ingestion ---
        positive(
            &mut errors,
            "ingestion.page_size",
            u64::from(self.ingestion.page_size),
        );
        if self.ingestion.page_size > MAX_PAGE_SIZE {
            errors.push(ValidationError {
                field: "ingestion.page_size".into(),
                message: format!("must not exceed {MAX_PAGE_SIZE}"),
            });
        }
        positive(
            &mut errors,
            "ingestion.lookback_months",
            u64::from(self.ingestion.lookback_months),
        );
        positive(
            &mut errors,
            "ingestion.max_pages",
            u64::from(self.ingestion.max_pages),
        );
        if self.ingestion.key_prefix.trim_matches('/').is_empty() {
            errors.push(ValidationError {
                field: "ingestion.key_prefix".into(),
                message: "must not be empty".into(),
            });
        }

        // --- logging ---
        if !VALID_LOG_LEVELS.contains(&self.logging.level.as_str()) {
            errors.push(ValidationError {
                field: "logging.level".into(),
                message: format!(
                    "invalid level '{}'; valid options: {}",
                    self.logging.level,
                    VALID_LOG_LEVELS.join(", ")
                ),
            });
        }

        errors
    }
}

// ---------------------------------------------------------------------------
// ConfigBuilder
// ---------------------------------------------------------------------------

/// Builder for constructing a [`Config`] programmatically.
///
/// Starts from [`Config::default`] and allows selective overrides.
///
/// # Example
///
/// ```rust
/// use riftscore_core::config::ConfigBuilder;
///
/// let config = ConfigBuilder::new()
///     .riot_platform("euw1")
///     .riot_regional_route("europe")
///     .ingestion_page_size(20)
///     .logging_level("debug")
///     .build();
/// assert_eq!(config.ingestion.page_size, 20);
/// ```
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder initialised with [`Config::default`] values.
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    // --- riot ---

    pub fn riot_api_key_env(mut self, name: impl Into<String>) -> Self {
        self.config.riot.api_key_env = name.into();
        self
    }

    pub fn riot_regional_route(mut self, route: impl Into<String>) -> Self {
        self.config.riot.regional_route = route.into();
        self
    }

    pub fn riot_platform(mut self, platform: impl Into<String>) -> Self {
        self.config.riot.platform = platform.into();
        self
    }

    pub fn riot_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config.riot.base_url = Some(base_url.into());
        self
    }

    // --- rate_limiting ---

    pub fn rate_limiting_max_retries(mut self, n: u32) -> Self {
        self.config.rate_limiting.max_retries = n;
        self
    }

    pub fn rate_limiting_initial_backoff_ms(mut self, ms: u64) -> Self {
        self.config.rate_limiting.initial_backoff_ms = ms;
        self
    }

    pub fn rate_limiting_default_retry_after_secs(mut self, secs: f64) -> Self {
        self.config.rate_limiting.default_retry_after_secs = secs;
        self
    }

    pub fn rate_limiting_admission_margin_ms(mut self, ms: u64) -> Self {
        self.config.rate_limiting.admission_margin_ms = ms;
        self
    }

    pub fn rate_limiting_relearn_quotas(mut self, relearn: bool) -> Self {
        self.config.rate_limiting.relearn_quotas = relearn;
        self
    }

    // --- ingestion ---

    pub fn ingestion_page_size(mut self, n: u32) -> Self {
        self.config.ingestion.page_size = n;
        self
    }

    pub fn ingestion_lookback_months(mut self, months: u32) -> Self {
        self.config.ingestion.lookback_months = months;
        self
    }

    pub fn ingestion_max_pages(mut self, n: u32) -> Self {
        self.config.ingestion.max_pages = n;
        self
    }

    pub fn ingestion_queue_type(mut self, queue_type: impl Into<String>) -> Self {
        self.config.ingestion.queue_type = queue_type.into();
        self
    }

    pub fn ingestion_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.ingestion.key_prefix = prefix.into();
        self
    }

    // --- storage ---

    pub fn storage_bulk_dir(mut self, dir: PathBuf) -> Self {
        self.config.storage.bulk_dir = dir;
        self
    }

    pub fn storage_database(mut self, path: PathBuf) -> Self {
        self.config.storage.database = path;
        self
    }

    // --- logging ---

    pub fn logging_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    pub fn logging_json(mut self, json: bool) -> Self {
        self.config.logging.json = json;
        self
    }

    // --- build ---

    /// Consume the builder and return the finished [`Config`].
    pub fn build(self) -> Config {
        self.config
    }

    /// Build and validate in one step. Returns `Err` with the list of
    /// validation errors if the configuration is invalid.
    pub fn build_validated(self) -> Result<Config, Vec<ValidationError>> {
        let config = self.build();
        let errors = config.validate();
        if errors.is_empty() {
            Ok(config)
        } else {
            Err(errors)
        }
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
