//! Config command - View and manage Riftscore configuration
//!
//! Provides the `riftscore config` CLI command which:
//! 1. Shows the current configuration (YAML or JSON)
//! 2. Sets individual configuration values via dot-notation keys
//! 3. Validates the configuration file and reports errors
//! 4. Prints the configuration file path

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Subcommand;
use riftscore_core::config::Config;
use tracing::info;

use super::context::CliContext;
use crate::output::plural;

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Display current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (e.g., "ingestion.page_size")
        key: String,
        /// New value
        value: String,
    },
    /// Validate configuration file
    Validate,
    /// Print the configuration file path
    Path,
}

impl ConfigCommand {
    pub async fn execute(&self, ctx: &CliContext) -> Result<()> {
        match self {
            ConfigCommand::Show => self.execute_show(ctx),
            ConfigCommand::Set { key, value } => self.execute_set(ctx, key, value),
            ConfigCommand::Validate => self.execute_validate(ctx),
            ConfigCommand::Path => {
                let formatter = ctx.formatter();
                if ctx.is_json() {
                    formatter.print_json(&serde_json::json!({
                        "config_path": ctx.config_path.display().to_string(),
                        "exists": ctx.config_path.exists(),
                    }));
                } else {
                    println!("{}", ctx.config_path.display());
                }
                Ok(())
            }
        }
    }

    fn execute_show(&self, ctx: &CliContext) -> Result<()> {
        let formatter = ctx.formatter();
        info!(config_path = %ctx.config_path.display(), "Showing configuration");

        if ctx.is_json() {
            let json = serde_json::to_value(&ctx.config)
                .context("Failed to serialize configuration to JSON")?;
            formatter.print_json(&json);
        } else {
            formatter.success(&format!("Configuration ({})", ctx.config_path.display()));
            formatter.info("");

            let yaml = serde_yaml::to_string(&ctx.config)
                .context("Failed to serialize configuration to YAML")?;
            for line in yaml.lines() {
                formatter.info(line);
            }
        }

        Ok(())
    }

    fn execute_set(&self, ctx: &CliContext, key: &str, value: &str) -> Result<()> {
        let formatter = ctx.formatter();
        let mut config = ctx.config.clone();

        info!(key = %key, value = %value, "Setting configuration value");

        if let Err(e) = apply_config_value(&mut config, key, value) {
            if ctx.is_json() {
                formatter.print_json(&serde_json::json!({
                    "success": false,
                    "key": key,
                    "value": value,
                    "error": e.to_string(),
                }));
            } else {
                formatter.error(&format!("Failed to set '{}': {}", key, e));
                formatter.info("");
                formatter.info("Supported keys:");
                for key in SUPPORTED_KEYS {
                    formatter.info(&format!("  {}", key));
                }
            }
            bail!("Invalid configuration key or value");
        }

        let errors = config.validate();
        if !errors.is_empty() {
            let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            if ctx.is_json() {
                formatter.print_json(&serde_json::json!({
                    "success": false,
                    "key": key,
                    "value": value,
                    "errors": messages,
                }));
            } else {
                formatter.error(&format!("Invalid value for '{}': {}", key, messages.join("; ")));
            }
            bail!("Configuration would be invalid");
        }

        if let Some(parent) = ctx.config_path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create configuration directory")?;
        }
        let yaml = serde_yaml::to_string(&config).context("Failed to serialize configuration")?;
        std::fs::write(&ctx.config_path, yaml).context("Failed to write configuration file")?;

        if ctx.is_json() {
            formatter.print_json(&serde_json::json!({
                "success": true,
                "key": key,
                "value": value,
                "config_path": ctx.config_path.display().to_string(),
            }));
        } else {
            formatter.success(&format!("Set {} = {}", key, value));
            formatter.info(&format!("Saved to {}", ctx.config_path.display()));
        }
        Ok(())
    }

    fn execute_validate(&self, ctx: &CliContext) -> Result<()> {
        let formatter = ctx.formatter();
        let path = &ctx.config_path;

        // The context falls back to defaults for the implicit path; validate
        // what is actually on disk.
        let config = if ctx.explicit_config {
            ctx.config.clone()
        } else if !path.exists() {
            if ctx.is_json() {
                formatter.print_json(&serde_json::json!({
                    "valid": true,
                    "config_path": path.display().to_string(),
                    "errors": [],
                    "note": "Configuration file not found. Using defaults.",
                }));
            } else {
                formatter.info(&format!("Configuration file not found at {}", path.display()));
                formatter.success("Default configuration is valid");
            }
            return Ok(());
        } else {
            Config::load(path)
                .with_context(|| format!("Failed to parse configuration {}", path.display()))?
        };

        info!(config_path = %path.display(), "Validating configuration");
        let errors = config.validate();

        if ctx.is_json() {
            let error_strings: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            formatter.print_json(&serde_json::json!({
                "valid": errors.is_empty(),
                "config_path": path.display().to_string(),
                "errors": error_strings,
            }));
        } else if errors.is_empty() {
            formatter.success("Configuration is valid");
            formatter.info(&format!("File: {}", path.display()));
        } else {
            formatter.error(&format!(
                "Configuration has {} error{}:",
                errors.len(),
                plural(errors.len())
            ));
            formatter.info(&format!("File: {}", path.display()));
            formatter.info("");
            for error in &errors {
                formatter.info(&format!("  {} - {}", error.field, error.message));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            bail!("Configuration is invalid")
        }
    }
}

const SUPPORTED_KEYS: &[&str] = &[
    "riot.api_key_env                     - Environment variable holding the API key",
    "riot.regional_route                  - americas|europe|asia|sea",
    "riot.platform                        - Platform routing value, e.g. na1",
    "riot.base_url                        - Override host for both routes (empty to clear)",
    "rate_limiting.max_retries            - Total attempts per call",
    "rate_limiting.initial_backoff_ms",
    "rate_limiting.default_retry_after_secs",
    "rate_limiting.admission_margin_ms",
    "rate_limiting.relearn_quotas         - true|false",
    "rate_limiting.request_timeout_secs",
    "ingestion.page_size                  - Match IDs per page (1-100)",
    "ingestion.lookback_months",
    "ingestion.max_pages",
    "ingestion.queue_type                 - ranked|normal|tourney|tutorial",
    "ingestion.key_prefix",
    "storage.bulk_dir",
    "storage.database",
    "logging.level                        - trace|debug|info|warn|error",
    "logging.json                         - true|false",
];

fn parse<T: std::str::FromStr>(key: &str, value: &str) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value
        .parse::<T>()
        .with_context(|| format!("Invalid value '{}' for {}", value, key))
}

/// Apply a dot-notation key/value pair to a Config struct
fn apply_config_value(config: &mut Config, key: &str, value: &str) -> Result<()> {
    match key {
        // --- riot ---
        "riot.api_key_env" => config.riot.api_key_env = value.to_string(),
        "riot.regional_route" => config.riot.regional_route = value.to_string(),
        "riot.platform" => config.riot.platform = value.to_string(),
        "riot.base_url" => {
            config.riot.base_url = (!value.is_empty()).then(|| value.to_string());
        }

        // --- rate_limiting ---
        "rate_limiting.max_retries" => config.rate_limiting.max_retries = parse(key, value)?,
        "rate_limiting.initial_backoff_ms" => {
            config.rate_limiting.initial_backoff_ms = parse(key, value)?
        }
        "rate_limiting.default_retry_after_secs" => {
            config.rate_limiting.default_retry_after_secs = parse(key, value)?
        }
        "rate_limiting.admission_margin_ms" => {
            config.rate_limiting.admission_margin_ms = parse(key, value)?
        }
        "rate_limiting.relearn_quotas" => config.rate_limiting.relearn_quotas = parse(key, value)?,
        "rate_limiting.request_timeout_secs" => {
            config.rate_limiting.request_timeout_secs = parse(key, value)?
        }

        // --- ingestion ---
        "ingestion.page_size" => config.ingestion.page_size = parse(key, value)?,
        "ingestion.lookback_months" => config.ingestion.lookback_months = parse(key, value)?,
        "ingestion.max_pages" => config.ingestion.max_pages = parse(key, value)?,
        "ingestion.queue_type" => config.ingestion.queue_type = value.to_string(),
        "ingestion.key_prefix" => config.ingestion.key_prefix = value.to_string(),

        // --- storage ---
        "storage.bulk_dir" => config.storage.bulk_dir = PathBuf::from(value),
        "storage.database" => config.storage.database = PathBuf::from(value),

        // --- logging ---
        "logging.level" => config.logging.level = value.to_string(),
        "logging.json" => config.logging.json = parse(key, value)?,

        _ => bail!("Unknown configuration key '{}'", key),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_numeric_and_bool_values() {
        let mut config = Config::default();
        apply_config_value(&mut config, "ingestion.page_size", "50").unwrap();
        apply_config_value(&mut config, "rate_limiting.relearn_quotas", "true").unwrap();
        apply_config_value(&mut config, "rate_limiting.default_retry_after_secs", "2.5").unwrap();
        assert_eq!(config.ingestion.page_size, 50);
        assert!(config.rate_limiting.relearn_quotas);
        assert_eq!(config.rate_limiting.default_retry_after_secs, 2.5);
    }

    #[test]
    fn test_empty_base_url_clears_override() {
        let mut config = Config::default();
        apply_config_value(&mut config, "riot.base_url", "http://localhost:8080").unwrap();
        assert_eq!(config.riot.base_url.as_deref(), Some("http://localhost:8080"));
        apply_config_value(&mut config, "riot.base_url", "").unwrap();
        assert!(config.riot.base_url.is_none());
    }

    #[test]
    fn test_rejects_unknown_key_and_bad_value() {
        let mut config = Config::default();
        assert!(apply_config_value(&mut config, "sync.root", "/tmp").is_err());
        let err = apply_config_value(&mut config, "ingestion.max_pages", "lots").unwrap_err();
        assert!(err.to_string().contains("ingestion.max_pages"));
    }
}
