//! Segment scoring use case
//!
//! Reads one bulk segment of match documents belonging to a player, extracts
//! the player's metrics from every document, scores them and persists both
//! rows. The player's row is created first (resolving the Riot ID through the
//! player directory) and the player's average is refreshed last.

use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::{
    domain::{MatchDocument, MatchId, MatchMetrics, PowerLevel, Puuid},
    ports::{
        is_match_segment, segment_page, IBulkStorage, IPlayerDirectory, IPowerLevelRepository,
    },
};

/// One scored document
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredMatch {
    pub match_id: MatchId,
    pub power_level: PowerLevel,
}

/// One document that could not be scored
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedDocument {
    /// Position of the document inside the segment
    pub index: usize,
    pub match_id: Option<String>,
    pub reason: String,
}

/// Outcome of scoring one segment
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentScoreReport {
    pub key: String,
    pub puuid: Puuid,
    pub user_created: bool,
    pub scored: Vec<ScoredMatch>,
    pub skipped: Vec<SkippedDocument>,
    pub average_power_level: Option<f64>,
}

/// Derives the owning player from a segment key: the segment's parent
/// directory is the player's PUUID.
pub fn puuid_from_segment_key(key: &str) -> Option<Puuid> {
    let mut parts = key.trim_end_matches('/').rsplit('/');
    parts.next()?;
    let parent = parts.next()?;
    Puuid::new(parent.to_string()).ok()
}

/// Sort key for match segments: directory first, then numeric page.
fn segment_order(key: &str) -> (&str, Option<u32>) {
    let dir = key.rsplit_once('/').map_or("", |(dir, _)| dir);
    (dir, segment_page(key))
}

/// Use case for scoring stored match segments
pub struct ScoreSegmentUseCase {
    bulk_storage: Arc<dyn IBulkStorage + Send + Sync>,
    repository: Arc<dyn IPowerLevelRepository + Send + Sync>,
    directory: Arc<dyn IPlayerDirectory + Send + Sync>,
}

impl ScoreSegmentUseCase {
    pub fn new(
        bulk_storage: Arc<dyn IBulkStorage + Send + Sync>,
        repository: Arc<dyn IPowerLevelRepository + Send + Sync>,
        directory: Arc<dyn IPlayerDirectory + Send + Sync>,
    ) -> Self {
        Self {
            bulk_storage,
            repository,
            directory,
        }
    }

    /// Scores a single segment for `puuid`.
    ///
    /// Documents that do not parse or do not contain the player are recorded
    /// in [`SegmentScoreReport::skipped`]. Storage, repository and directory
    /// failures abort the segment.
    pub async fn execute(&self, key: &str, puuid: &Puuid) -> Result<SegmentScoreReport> {
        let user_created = self.ensure_user(puuid).await?;

        let docs = self
            .bulk_storage
            .get_segment(key)
            .await
            .with_context(|| format!("Failed to read segment {key}"))?;
        debug!(segment = key, documents = docs.len(), "Scoring segment");

        let mut scored = Vec::with_capacity(docs.len());
        let mut skipped = Vec::new();

        for (index, value) in docs.into_iter().enumerate() {
            let raw_id = value
                .pointer("/metadata/matchId")
                .and_then(|v| v.as_str())
                .map(str::to_string);

            let metrics = match MatchDocument::from_value(value)
                .and_then(|doc| MatchMetrics::extract(&doc, puuid))
            {
                Ok(metrics) => metrics,
                Err(e) => {
                    warn!(
                        segment = key,
                        index,
                        match_id = ?raw_id,
                        error = %e,
                        "Skipping document"
                    );
                    skipped.push(SkippedDocument {
                        index,
                        match_id: raw_id,
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            self.repository
                .save_metrics(&metrics)
                .await
                .with_context(|| format!("Failed to save metrics for {}", metrics.match_id))?;

            let power_level = PowerLevel::calculate(&metrics);
            self.repository
                .save_power_level(&metrics.match_id, puuid, &power_level)
                .await
                .with_context(|| format!("Failed to save power level for {}", metrics.match_id))?;

            debug!(
                match_id = %metrics.match_id,
                total = power_level.total,
                tier = %power_level.tier,
                "Scored match"
            );
            scored.push(ScoredMatch {
                match_id: metrics.match_id,
                power_level,
            });
        }

        let average_power_level = self
            .repository
            .update_average_power_level(puuid)
            .await
            .context("Failed to refresh average power level")?;

        info!(
            segment = key,
            %puuid,
            scored = scored.len(),
            skipped = skipped.len(),
            "Segment scored"
        );

        Ok(SegmentScoreReport {
            key: key.to_string(),
            puuid: puuid.clone(),
            user_created,
            scored,
            skipped,
            average_power_level,
        })
    }

    /// Scores a segment whose owner is encoded in its key.
    pub async fn execute_for_key(&self, key: &str) -> Result<SegmentScoreReport> {
        let puuid = puuid_from_segment_key(key)
            .with_context(|| format!("Segment key {key} does not name a player directory"))?;
        self.execute(key, &puuid).await
    }

    /// Scores every match segment of `puuid` stored under `prefix`, in page
    /// order within each rank directory. Timeline segments are ignored.
    ///
    /// The rank directory is part of the key, so `prefix` is usually the
    /// storage root and every player's segments are listed, then filtered
    /// down to `puuid`.
    pub async fn score_player(
        &self,
        prefix: &str,
        puuid: &Puuid,
    ) -> Result<Vec<SegmentScoreReport>> {
        let keys = self
            .bulk_storage
            .list_segments(prefix)
            .await
            .with_context(|| format!("Failed to list segments under {prefix}"))?;

        let mut own: Vec<&String> = keys
            .iter()
            .filter(|k| is_match_segment(k))
            .filter(|k| puuid_from_segment_key(k).as_ref() == Some(puuid))
            .collect();
        own.sort_by(|a, b| segment_order(a).cmp(&segment_order(b)));

        let mut reports = Vec::new();
        for key in own {
            reports.push(self.execute(key, puuid).await?);
        }

        if reports.is_empty() {
            info!(%puuid, prefix, "No stored segments for player");
        }
        Ok(reports)
    }

    async fn ensure_user(&self, puuid: &Puuid) -> Result<bool> {
        if self
            .repository
            .user_exists(puuid)
            .await
            .context("Failed to check player row")?
        {
            return Ok(false);
        }

        let account = self
            .directory
            .get_account(puuid)
            .await
            .with_context(|| format!("Failed to resolve Riot ID for {puuid}"))?;
        self.repository
            .insert_user(&account)
            .await
            .context("Failed to insert player row")?;
        info!(%puuid, riot_id = %account.riot_id(), "Created player");
        Ok(true)
    }
}
