//! Player summary use case
//!
//! Read side of the scoring pipeline: a player's average and best power
//! level plus their most recent scored matches.

use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::{
    domain::{PowerTier, Puuid},
    ports::{IPowerLevelRepository, Page, StoredPowerLevel},
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerSummary {
    pub puuid: Puuid,
    /// `gameName#tagLine` when the player row exists
    pub riot_id: Option<String>,
    pub matches_scored: u64,
    pub average_power_level: Option<f64>,
    /// Tier of the rounded-down average
    pub average_tier: Option<PowerTier>,
    pub best: Option<StoredPowerLevel>,
    pub recent: Vec<StoredPowerLevel>,
}

pub struct PlayerSummaryUseCase {
    repository: Arc<dyn IPowerLevelRepository + Send + Sync>,
}

impl PlayerSummaryUseCase {
    pub fn new(repository: Arc<dyn IPowerLevelRepository + Send + Sync>) -> Self {
        Self { repository }
    }

    pub async fn execute(&self, puuid: &Puuid, page: Page) -> Result<PlayerSummary> {
        let user = self
            .repository
            .get_user(puuid)
            .await
            .context("Failed to load player")?;
        let matches_scored = self
            .repository
            .count_power_levels(puuid)
            .await
            .context("Failed to count power levels")?;

        // stored average is only refreshed by scoring runs
        let average_power_level = match user.as_ref().and_then(|u| u.average_power_level) {
            Some(avg) => Some(avg),
            None if matches_scored > 0 => self
                .repository
                .update_average_power_level(puuid)
                .await
                .context("Failed to compute average power level")?,
            None => None,
        };

        let best = self
            .repository
            .best_power_level(puuid)
            .await
            .context("Failed to load best power level")?;
        let recent = self
            .repository
            .get_power_levels(puuid, page)
            .await
            .context("Failed to load power levels")?;

        Ok(PlayerSummary {
            puuid: puuid.clone(),
            riot_id: user.map(|u| format!("{}#{}", u.game_name, u.tag_line)),
            matches_scored,
            average_power_level,
            average_tier: average_power_level.map(|avg| PowerTier::from_score(avg.trunc() as i64)),
            best,
            recent,
        })
    }
}
