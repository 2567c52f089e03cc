//! Typed wrappers over the Riot Games API endpoints
//!
//! [`RiotApi`] pairs a shared [`RiotClient`] with [`RiotEndpoints`]. Every
//! method is a single logical call through the client, so quota admission
//! and retries apply uniformly.

use std::sync::Arc;

use anyhow::Context;
use riftscore_core::{
    config::Config,
    domain::{DomainError, LeagueDivision, LeagueQueue, LeagueTier, MatchId, Puuid},
    ports::{IPlayerDirectory, PlayerAccount},
};
use riftscore_telemetry::MetricsRegistry;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::{
    client::RiotClient,
    endpoints::{MatchIdsQuery, RiotEndpoints},
    RiotError,
};

/// Upper bound on ladder pages read when collecting top players
const MAX_LADDER_PAGES: u32 = 50;

// ============================================================================
// Response types
// ============================================================================

/// One row of a league ladder or of a player's league entries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeagueEntry {
    #[serde(default)]
    pub puuid: Option<String>,
    #[serde(default)]
    pub summoner_id: Option<String>,
    /// Absent inside apex league objects
    #[serde(default)]
    pub queue_type: Option<String>,
    #[serde(default)]
    pub tier: Option<String>,
    /// Division, e.g. `"II"`
    #[serde(default)]
    pub rank: Option<String>,
    #[serde(default)]
    pub league_points: i64,
    #[serde(default)]
    pub wins: u32,
    #[serde(default)]
    pub losses: u32,
}

#[derive(Debug, Deserialize)]
struct ApexLeague {
    #[serde(default)]
    entries: Vec<LeagueEntry>,
}

#[derive(Debug, Deserialize)]
struct ActiveRegion {
    region: String,
}

/// A player's solo queue standing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerRank {
    pub tier: LeagueTier,
    /// `None` for apex tiers
    pub division: Option<LeagueDivision>,
    pub league_points: i64,
}

// ============================================================================
// RiotApi
// ============================================================================

#[derive(Debug, Clone)]
pub struct RiotApi {
    client: Arc<RiotClient>,
    endpoints: RiotEndpoints,
}

impl RiotApi {
    pub fn new(client: Arc<RiotClient>, endpoints: RiotEndpoints) -> Self {
        Self { client, endpoints }
    }

    /// Builds the client and endpoints from configuration.
    pub fn from_config(
        config: &Config,
        metrics: Option<Arc<MetricsRegistry>>,
    ) -> anyhow::Result<Self> {
        let mut client = RiotClient::from_config(config)?;
        if let Some(metrics) = metrics {
            client = client.with_metrics(metrics);
        }
        let endpoints = RiotEndpoints::from_config(&config.riot)?;
        Ok(Self::new(Arc::new(client), endpoints))
    }

    pub fn client(&self) -> &Arc<RiotClient> {
        &self.client
    }

    pub fn endpoints(&self) -> &RiotEndpoints {
        &self.endpoints
    }

    // ========================================================================
    // Matches
    // ========================================================================

    pub async fn get_match_ids(
        &self,
        puuid: &Puuid,
        query: &MatchIdsQuery,
    ) -> Result<Vec<MatchId>, RiotError> {
        let url = self.endpoints.match_ids(puuid, query);
        let raw: Vec<String> = self.client.get_json(&url).await?;
        raw.into_iter()
            .map(|id| {
                MatchId::new(id).map_err(|e| RiotError::MalformedResponse {
                    url: url.clone(),
                    reason: e.to_string(),
                })
            })
            .collect()
    }

    /// The full match document, unmodified.
    pub async fn get_match(&self, match_id: &MatchId) -> Result<Value, RiotError> {
        self.client.get(&self.endpoints.match_by_id(match_id)).await
    }

    /// The ordered participant PUUIDs from the match metadata.
    pub async fn get_match_participants(
        &self,
        match_id: &MatchId,
    ) -> Result<Vec<Puuid>, RiotError> {
        let url = self.endpoints.match_by_id(match_id);
        let mut document = self.client.get(&url).await?;
        let participants = document
            .pointer_mut("/metadata/participants")
            .map(Value::take)
            .ok_or_else(|| RiotError::MalformedResponse {
                url: url.clone(),
                reason: "missing metadata.participants".to_string(),
            })?;
        serde_json::from_value(participants).map_err(|e| RiotError::MalformedResponse {
            url,
            reason: e.to_string(),
        })
    }

    pub async fn get_timeline(&self, match_id: &MatchId) -> Result<Value, RiotError> {
        self.client.get(&self.endpoints.match_timeline(match_id)).await
    }

    // ========================================================================
    // Accounts
    // ========================================================================

    pub async fn get_account(&self, puuid: &Puuid) -> Result<PlayerAccount, RiotError> {
        self.client
            .get_json(&self.endpoints.account_by_puuid(puuid))
            .await
    }

    pub async fn get_account_by_riot_id(
        &self,
        game_name: &str,
        tag_line: &str,
    ) -> Result<PlayerAccount, RiotError> {
        self.client
            .get_json(&self.endpoints.account_by_riot_id(game_name, tag_line))
            .await
    }

    /// Platform routing value (e.g. `na1`) the player is active on.
    pub async fn get_active_region(&self, puuid: &Puuid) -> Result<String, RiotError> {
        let region: ActiveRegion = self
            .client
            .get_json(&self.endpoints.active_region(puuid))
            .await?;
        Ok(region.region.to_ascii_lowercase())
    }

    // ========================================================================
    // Leagues
    // ========================================================================

    /// The player's solo queue rank, `None` when unranked.
    pub async fn get_player_rank(
        &self,
        platform: &str,
        puuid: &Puuid,
    ) -> Result<Option<PlayerRank>, RiotError> {
        let url = self.endpoints.league_entries_by_puuid(platform, puuid)?;
        let entries: Vec<LeagueEntry> = self.client.get_json(&url).await?;

        let Some(entry) = entries
            .into_iter()
            .find(|e| e.queue_type.as_deref() == Some(LeagueQueue::RankedSolo5x5.as_str()))
        else {
            debug!(puuid = %puuid, "Player has no solo queue entry");
            return Ok(None);
        };

        let malformed = |reason: String| RiotError::MalformedResponse {
            url: url.clone(),
            reason,
        };
        let tier: LeagueTier = entry
            .tier
            .as_deref()
            .unwrap_or_default()
            .parse()
            .map_err(|e: DomainError| malformed(e.to_string()))?;
        let division = if tier.is_apex() {
            None
        } else {
            let division: LeagueDivision = entry
                .rank
                .as_deref()
                .unwrap_or_default()
                .parse()
                .map_err(|e: DomainError| malformed(e.to_string()))?;
            Some(division)
        };

        Ok(Some(PlayerRank {
            tier,
            division,
            league_points: entry.league_points,
        }))
    }

    /// The `n` highest-LP players of a ladder, best first.
    ///
    /// Apex tiers read the single apex league. Other tiers need a division
    /// and read ladder pages until `n` players are collected or a page
    /// comes back empty.
    pub async fn get_top_players(
        &self,
        n: usize,
        queue: LeagueQueue,
        tier: LeagueTier,
        division: Option<LeagueDivision>,
    ) -> Result<Vec<LeagueEntry>, RiotError> {
        let mut entries = if tier.is_apex() {
            let url = self.endpoints.apex_league(queue, tier)?;
            let league: ApexLeague = self.client.get_json(&url).await?;
            league.entries
        } else {
            let division = division.ok_or_else(|| {
                RiotError::InvalidRequest(format!("tier {tier} requires a division"))
            })?;
            let mut collected = Vec::new();
            for page in 1..=MAX_LADDER_PAGES {
                let url = self.endpoints.league_entries(queue, tier, division, page);
                let rows: Vec<LeagueEntry> = self.client.get_json(&url).await?;
                if rows.is_empty() {
                    break;
                }
                collected.extend(rows);
                if collected.len() >= n {
                    break;
                }
            }
            collected
        };

        entries.sort_by(|a, b| b.league_points.cmp(&a.league_points));
        entries.truncate(n);
        info!(
            tier = %tier,
            queue = %queue,
            players = entries.len(),
            "Collected top players"
        );
        Ok(entries)
    }
}

#[async_trait::async_trait]
impl IPlayerDirectory for RiotApi {
    async fn get_account(&self, puuid: &Puuid) -> anyhow::Result<PlayerAccount> {
        RiotApi::get_account(self, puuid)
            .await
            .with_context(|| format!("Failed to resolve Riot ID for {puuid}"))
    }
}
