//! Bulk match ingestion
//!
//! [`MatchIngestor`] pages through a player's match history over a time
//! window, downloads every match document and writes one bulk segment per
//! page. A terminal client or storage failure ends the player's batch; the
//! report then lists the segments already written plus the failed one.
//!
//! Segment keys look like
//! `rank_match_info/GOLD_II_match_infos/<puuid>/match_info_bulk_3.json`
//! (`CHALLENGER_match_infos` for apex tiers).

use std::{fmt, sync::Arc};

use chrono::{DateTime, Months, Utc};
use riftscore_core::{
    config::IngestionConfig,
    domain::{LeagueDivision, LeagueQueue, LeagueTier, MatchId, Puuid},
    ports::{IBulkStorage, MATCH_SEGMENT_STEM, TIMELINE_SEGMENT_STEM},
};
use riftscore_telemetry::MetricsRegistry;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    api::{PlayerRank, RiotApi},
    endpoints::MatchIdsQuery,
    RiotError,
};

// ============================================================================
// Report types
// ============================================================================

/// Step at which a batch failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IngestStage {
    /// Region or rank lookup before paging
    Resolve,
    MatchIds,
    Match,
    Timeline,
    Store,
}

impl fmt::Display for IngestStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            IngestStage::Resolve => "resolve",
            IngestStage::MatchIds => "match_ids",
            IngestStage::Match => "match",
            IngestStage::Timeline => "timeline",
            IngestStage::Store => "store",
        };
        f.write_str(s)
    }
}

/// The segment that could not be completed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SegmentFailure {
    pub segment_index: u32,
    pub stage: IngestStage,
    pub error: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The match-ID listing ran dry
    EmptyPage,
    /// A page reached back past the start of the window
    OutsideWindow,
    /// The page cap was reached
    MaxPages,
    /// Every requested document was fetched
    Completed,
    Failed,
}

/// Outcome of one player's ingestion
#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    pub run_id: Uuid,
    pub puuid: String,
    pub key_prefix: String,
    /// Keys of segments written, in order
    pub segments: Vec<String>,
    pub documents: usize,
    pub failure: Option<SegmentFailure>,
    pub stop_reason: StopReason,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl IngestReport {
    fn start(puuid: &Puuid) -> Self {
        let now = Utc::now();
        Self {
            run_id: Uuid::new_v4(),
            puuid: puuid.to_string(),
            key_prefix: String::new(),
            segments: Vec::new(),
            documents: 0,
            failure: None,
            stop_reason: StopReason::Completed,
            started_at: now,
            finished_at: now,
        }
    }

    fn finish(mut self, reason: StopReason) -> Self {
        self.stop_reason = reason;
        self.finished_at = Utc::now();
        self
    }

    fn fail(mut self, segment_index: u32, stage: IngestStage, error: impl fmt::Display) -> Self {
        warn!(
            puuid = %self.puuid,
            segment_index,
            stage = %stage,
            error = %error,
            "Ingestion batch failed"
        );
        self.failure = Some(SegmentFailure {
            segment_index,
            stage,
            error: error.to_string(),
        });
        self.finish(StopReason::Failed)
    }

    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }
}

// ============================================================================
// Time window
// ============================================================================

/// `[start, end]` interval the match history is read from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// The last `months` calendar months up to `now`.
    pub fn last_months(months: u32, now: DateTime<Utc>) -> Self {
        let start = now
            .checked_sub_months(Months::new(months))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        Self { start, end: now }
    }

    pub fn contains_millis(&self, epoch_millis: i64) -> bool {
        epoch_millis >= self.start.timestamp_millis() && epoch_millis <= self.end.timestamp_millis()
    }
}

/// Bulk key prefix for a player's match segments.
pub fn player_key_prefix(key_prefix: &str, rank: Option<PlayerRank>, puuid: &Puuid) -> String {
    let (tier, division) = match rank {
        Some(rank) => (rank.tier, rank.division),
        None => (LeagueTier::Bronze, Some(LeagueDivision::I)),
    };
    match division.filter(|_| !tier.is_apex()) {
        Some(division) => format!("{key_prefix}/{tier}_{division}_match_infos/{puuid}"),
        None => format!("{key_prefix}/{tier}_match_infos/{puuid}"),
    }
}

fn game_creation(document: &Value) -> Option<i64> {
    document.pointer("/info/gameCreation").and_then(Value::as_i64)
}

// ============================================================================
// MatchIngestor
// ============================================================================

pub struct MatchIngestor {
    api: Arc<RiotApi>,
    storage: Arc<dyn IBulkStorage>,
    config: IngestionConfig,
    metrics: Option<Arc<MetricsRegistry>>,
}

impl MatchIngestor {
    pub fn new(api: Arc<RiotApi>, storage: Arc<dyn IBulkStorage>, config: IngestionConfig) -> Self {
        Self {
            api,
            storage,
            config,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<MetricsRegistry>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Downloads the player's matches from the configured lookback window.
    pub async fn ingest_player(&self, puuid: &Puuid) -> IngestReport {
        let window = TimeWindow::last_months(self.config.lookback_months, Utc::now());
        self.ingest_player_in(puuid, window).await
    }

    /// Like [`ingest_player`](Self::ingest_player) with an explicit window.
    pub async fn ingest_player_in(&self, puuid: &Puuid, window: TimeWindow) -> IngestReport {
        let mut report = IngestReport::start(puuid);
        info!(run_id = %report.run_id, puuid = %puuid, "Starting match ingestion");

        let rank = match self.resolve_rank(puuid).await {
            Ok(rank) => rank,
            Err(e) => return report.fail(0, IngestStage::Resolve, e),
        };
        report.key_prefix = player_key_prefix(&self.config.key_prefix, rank, puuid);

        let page_size = self.config.page_size.max(1);
        let mut start = 0u32;

        for page in 0..self.config.max_pages {
            let query = MatchIdsQuery::page(start, page_size)
                .between(window.start.timestamp(), window.end.timestamp())
                .of_type(self.config.queue_type.clone());

            let ids = match self.api.get_match_ids(puuid, &query).await {
                Ok(ids) => ids,
                Err(e) => return self.failed(report, page, IngestStage::MatchIds, e),
            };
            if ids.is_empty() {
                debug!(puuid = %puuid, page, "Empty match page, done");
                return report.finish(StopReason::EmptyPage);
            }

            let mut documents = Vec::with_capacity(ids.len());
            let mut reached_window_start = false;
            for id in &ids {
                let document = match self.api.get_match(id).await {
                    Ok(document) => document,
                    Err(e) => return self.failed(report, page, IngestStage::Match, e),
                };
                match game_creation(&document) {
                    Some(created) if created < window.start.timestamp_millis() => {
                        debug!(match_id = %id, "Match predates the window, dropped");
                        reached_window_start = true;
                    }
                    _ => documents.push(document),
                }
            }

            if !documents.is_empty() {
                let key = format!("{}/{MATCH_SEGMENT_STEM}{page}.json", report.key_prefix);
                if let Err(e) = self.storage.put_segment(&key, &documents).await {
                    return self.failed(report, page, IngestStage::Store, e);
                }
                info!(
                    puuid = %puuid,
                    segment = %key,
                    documents = documents.len(),
                    "Wrote bulk segment"
                );
                self.record_segment("written");
                report.documents += documents.len();
                report.segments.push(key);
            }

            if reached_window_start {
                return report.finish(StopReason::OutsideWindow);
            }
            start += page_size;
        }

        info!(puuid = %puuid, max_pages = self.config.max_pages, "Page cap reached");
        report.finish(StopReason::MaxPages)
    }

    /// Ingests the top `n` players of a ladder, one report per player.
    ///
    /// Fails only when the ladder itself cannot be read.
    pub async fn ingest_top_players(
        &self,
        n: usize,
        queue: LeagueQueue,
        tier: LeagueTier,
        division: Option<LeagueDivision>,
    ) -> Result<Vec<IngestReport>, RiotError> {
        let entries = self.api.get_top_players(n, queue, tier, division).await?;

        let mut reports = Vec::with_capacity(entries.len());
        for entry in entries {
            let Some(raw) = entry.puuid else {
                warn!(summoner_id = ?entry.summoner_id, "Ladder entry without a PUUID, skipped");
                continue;
            };
            match Puuid::new(raw) {
                Ok(puuid) => reports.push(self.ingest_player(&puuid).await),
                Err(e) => warn!(error = %e, "Ladder entry with an invalid PUUID, skipped"),
            }
        }
        Ok(reports)
    }

    /// Stores the timelines of the player's `count` most recent matches as
    /// one segment.
    pub async fn ingest_recent_timelines(&self, puuid: &Puuid, count: u32) -> IngestReport {
        let mut report = IngestReport::start(puuid);
        report.key_prefix = format!("{}/timelines/{puuid}", self.config.key_prefix);

        let query = MatchIdsQuery::page(0, count.max(1)).of_type(self.config.queue_type.clone());
        let ids: Vec<MatchId> = match self.api.get_match_ids(puuid, &query).await {
            Ok(ids) => ids,
            Err(e) => return self.failed(report, 0, IngestStage::MatchIds, e),
        };
        if ids.is_empty() {
            return report.finish(StopReason::EmptyPage);
        }

        let mut timelines = Vec::with_capacity(ids.len());
        for id in &ids {
            match self.api.get_timeline(id).await {
                Ok(timeline) => timelines.push(timeline),
                Err(e) => return self.failed(report, 0, IngestStage::Timeline, e),
            }
        }

        let key = format!("{}/{TIMELINE_SEGMENT_STEM}0.json", report.key_prefix);
        if let Err(e) = self.storage.put_segment(&key, &timelines).await {
            return self.failed(report, 0, IngestStage::Store, e);
        }
        info!(
            puuid = %puuid,
            segment = %key,
            documents = timelines.len(),
            "Wrote timeline segment"
        );
        self.record_segment("written");
        report.documents = timelines.len();
        report.segments.push(key);
        report.finish(StopReason::Completed)
    }

    async fn resolve_rank(&self, puuid: &Puuid) -> Result<Option<PlayerRank>, RiotError> {
        let region = self.api.get_active_region(puuid).await?;
        let rank = self.api.get_player_rank(&region, puuid).await?;
        if rank.is_none() {
            debug!(puuid = %puuid, "Unranked player, filing under BRONZE I");
        }
        Ok(rank)
    }

    fn failed(
        &self,
        report: IngestReport,
        segment_index: u32,
        stage: IngestStage,
        error: impl fmt::Display,
    ) -> IngestReport {
        self.record_segment("failed");
        report.fail(segment_index, stage, error)
    }

    fn record_segment(&self, outcome: &str) {
        if let Some(metrics) = &self.metrics {
            metrics.record_segment(outcome);
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn puuid() -> Puuid {
        Puuid::new("p-1".to_string()).unwrap()
    }

    #[test]
    fn test_key_prefix_with_division() {
        let rank = PlayerRank {
            tier: LeagueTier::Gold,
            division: Some(LeagueDivision::II),
            league_points: 40,
        };
        assert_eq!(
            player_key_prefix("rank_match_info", Some(rank), &puuid()),
            "rank_match_info/GOLD_II_match_infos/p-1"
        );
    }

    #[test]
    fn test_key_prefix_apex_omits_division() {
        let rank = PlayerRank {
            tier: LeagueTier::Challenger,
            division: Some(LeagueDivision::I),
            league_points: 1200,
        };
        assert_eq!(
            player_key_prefix("rank_match_info", Some(rank), &puuid()),
            "rank_match_info/CHALLENGER_match_infos/p-1"
        );
    }

    #[test]
    fn test_key_prefix_unranked_falls_back() {
        assert_eq!(
            player_key_prefix("x", None, &puuid()),
            "x/BRONZE_I_match_infos/p-1"
        );
    }

    #[test]
    fn test_window_last_months() {
        let now = Utc.with_ymd_and_hms(2024, 3, 31, 12, 0, 0).unwrap();
        let window = TimeWindow::last_months(1, now);
        assert_eq!(window.start, Utc.with_ymd_and_hms(2024, 2, 29, 12, 0, 0).unwrap());
        assert!(window.contains_millis(now.timestamp_millis()));
        assert!(!window.contains_millis(window.start.timestamp_millis() - 1));
    }

    #[test]
    fn test_report_failure_marks_stop_reason() {
        let report = IngestReport::start(&puuid()).fail(2, IngestStage::Match, "boom");
        assert!(!report.is_success());
        assert_eq!(report.stop_reason, StopReason::Failed);
        assert_eq!(
            report.failure,
            Some(SegmentFailure {
                segment_index: 2,
                stage: IngestStage::Match,
                error: "boom".into(),
            })
        );
    }
}
