//! Shared command context
//!
//! Holds the loaded configuration, the output settings and the metrics
//! registry, and builds the adapters each command needs on demand.

use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use riftscore_core::config::Config;
use riftscore_riot::{MatchIngestor, RiotApi, RiotClient, RiotEndpoints};
use riftscore_store::{DatabasePool, FsBulkStorage, SqlitePowerLevelRepository};
use riftscore_telemetry::MetricsRegistry;
use tracing::{debug, info, warn};

use crate::output::{get_formatter, OutputFormat, OutputFormatter};

pub struct CliContext {
    pub format: OutputFormat,
    pub quiet: bool,
    pub config_path: PathBuf,
    /// Whether `--config` named the file explicitly
    pub explicit_config: bool,
    pub config: Config,
    pub metrics: Arc<MetricsRegistry>,
    print_metrics: bool,
}

impl CliContext {
    /// Loads the configuration.
    ///
    /// An explicit `--config` file must exist and parse; the default file
    /// silently falls back to defaults.
    pub fn load(
        config: Option<&str>,
        format: OutputFormat,
        quiet: bool,
        print_metrics: bool,
    ) -> Result<Self> {
        let (config_path, explicit_config, config) = match config {
            Some(path) => {
                let path = PathBuf::from(path);
                let config = Config::load(&path).with_context(|| {
                    format!("Failed to load configuration from {}", path.display())
                })?;
                (path, true, config)
            }
            None => {
                let path = Config::default_path();
                let config = Config::load_or_default(&path);
                (path, false, config)
            }
        };

        let metrics =
            Arc::new(MetricsRegistry::new().context("Failed to create metrics registry")?);

        Ok(Self {
            format,
            quiet,
            config_path,
            explicit_config,
            config,
            metrics,
            print_metrics,
        })
    }

    pub fn formatter(&self) -> Box<dyn OutputFormatter> {
        get_formatter(self.format, self.quiet)
    }

    pub fn is_json(&self) -> bool {
        matches!(self.format, OutputFormat::Json)
    }

    /// Builds the upstream API client. Ctrl-C cancels in-flight waits.
    pub fn riot_api(&self) -> Result<Arc<RiotApi>> {
        let client = RiotClient::from_config(&self.config)
            .context("Failed to create Riot API client")?
            .with_metrics(Arc::clone(&self.metrics));
        let endpoints = RiotEndpoints::from_config(&self.config.riot)
            .context("Invalid Riot routing configuration")?;

        let token = client.cancellation_token().clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, cancelling pending requests");
                token.cancel();
            }
        });

        debug!(
            regional_route = %self.config.riot.regional_route,
            platform = %endpoints.platform(),
            "Riot API client ready"
        );
        Ok(Arc::new(RiotApi::new(Arc::new(client), endpoints)))
    }

    pub fn bulk_storage(&self) -> Arc<FsBulkStorage> {
        Arc::new(FsBulkStorage::new(self.config.storage.bulk_dir.clone()))
    }

    pub fn ingestor(&self, api: Arc<RiotApi>) -> MatchIngestor {
        MatchIngestor::new(api, self.bulk_storage(), self.config.ingestion.clone())
            .with_metrics(Arc::clone(&self.metrics))
    }

    /// Opens the SQLite database, creating it when missing.
    pub async fn repository(&self) -> Result<Arc<SqlitePowerLevelRepository>> {
        let path = &self.config.storage.database;
        let pool = DatabasePool::new(path)
            .await
            .context("Failed to open database")?;
        info!(path = %path.display(), "Opened database");
        Ok(Arc::new(SqlitePowerLevelRepository::new(pool.pool().clone())))
    }

    /// Prints the Prometheus exposition when `--metrics` was given.
    pub fn print_metrics(&self) -> Result<()> {
        if self.print_metrics {
            let text = self.metrics.encode().context("Failed to encode metrics")?;
            print!("{text}");
        }
        Ok(())
    }
}
