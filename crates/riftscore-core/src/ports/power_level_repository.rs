//! Power level repository port (driven/secondary port)
//!
//! Persistence for the three tables the scoring pipeline writes: players,
//! per-match metrics and per-match power levels.
//!
//! ## Design Notes
//!
//! - Uses `anyhow::Result` because storage errors are adapter-specific
//!   and don't need domain-level classification.
//! - Metrics and power levels are keyed by `(match_id, puuid)`; saving an
//!   existing key replaces the stored row.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{MatchId, MatchMetrics, PowerLevel, Puuid};

use super::player_directory::PlayerAccount;

/// Offset pagination
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub limit: u32,
    pub skip: u32,
}

impl Page {
    pub const fn new(limit: u32, skip: u32) -> Self {
        Self { limit, skip }
    }
}

impl Default for Page {
    fn default() -> Self {
        Self { limit: 10, skip: 0 }
    }
}

/// A player row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub puuid: Puuid,
    pub game_name: String,
    pub tag_line: String,
    /// Mean of all stored power level totals, refreshed after scoring
    pub average_power_level: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A persisted power level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredPowerLevel {
    pub match_id: MatchId,
    pub puuid: Puuid,
    pub power_level: PowerLevel,
    /// Game start (epoch seconds) copied from the metrics row when known
    pub game_start_time: Option<i64>,
    pub updated_at: DateTime<Utc>,
}

/// Port trait for power level persistence
#[async_trait::async_trait]
pub trait IPowerLevelRepository: Send + Sync {
    // --- players ---

    /// Returns true if a player row exists for `puuid`
    async fn user_exists(&self, puuid: &Puuid) -> anyhow::Result<bool>;

    /// Inserts a player row; no-op if the player already exists
    async fn insert_user(&self, account: &PlayerAccount) -> anyhow::Result<()>;

    async fn get_user(&self, puuid: &Puuid) -> anyhow::Result<Option<PlayerRecord>>;

    /// Recomputes the player's average power level from stored rows and
    /// returns it (`None` when the player has no scored matches)
    async fn update_average_power_level(&self, puuid: &Puuid) -> anyhow::Result<Option<f64>>;

    // --- metrics ---

    /// Upserts on `(match_id, puuid)`
    async fn save_metrics(&self, metrics: &MatchMetrics) -> anyhow::Result<()>;

    async fn get_match_metrics(
        &self,
        puuid: &Puuid,
        match_id: &MatchId,
    ) -> anyhow::Result<Option<MatchMetrics>>;

    // --- power levels ---

    /// Upserts on `(match_id, puuid)`
    async fn save_power_level(
        &self,
        match_id: &MatchId,
        puuid: &Puuid,
        power_level: &PowerLevel,
    ) -> anyhow::Result<()>;

    /// Power levels of a player, most recent game first
    async fn get_power_levels(
        &self,
        puuid: &Puuid,
        page: Page,
    ) -> anyhow::Result<Vec<StoredPowerLevel>>;

    async fn get_match_power_level(
        &self,
        puuid: &Puuid,
        match_id: &MatchId,
    ) -> anyhow::Result<Option<StoredPowerLevel>>;

    async fn count_power_levels(&self, puuid: &Puuid) -> anyhow::Result<u64>;

    /// Highest stored total for the player
    async fn best_power_level(&self, puuid: &Puuid) -> anyhow::Result<Option<StoredPowerLevel>>;
}
