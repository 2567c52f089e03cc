//! URL construction for the Riot Games API endpoint families
//!
//! Match and account endpoints live on a regional host
//! (`https://americas.api.riotgames.com`), league endpoints on a platform
//! host (`https://na1.api.riotgames.com`). A configured base URL replaces
//! both, which is how tests and proxies point the client elsewhere.
//!
//! Path segments are percent-encoded, so Riot IDs with spaces or unicode
//! are safe to pass through.

use riftscore_core::{
    config::RiotConfig,
    domain::{LeagueDivision, LeagueQueue, LeagueTier, MatchId, Puuid},
};
use url::Url;

use crate::RiotError;

/// Query parameters of the match-ID listing
///
/// Only parameters that are set are sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchIdsQuery {
    pub start: Option<u32>,
    pub count: Option<u32>,
    /// Epoch seconds
    pub start_time: Option<i64>,
    /// Epoch seconds
    pub end_time: Option<i64>,
    /// `ranked`, `normal`, `tourney` or `tutorial`
    pub queue_type: Option<String>,
}

impl MatchIdsQuery {
    pub fn page(start: u32, count: u32) -> Self {
        Self {
            start: Some(start),
            count: Some(count),
            ..Default::default()
        }
    }

    pub fn between(mut self, start_time: i64, end_time: i64) -> Self {
        self.start_time = Some(start_time);
        self.end_time = Some(end_time);
        self
    }

    pub fn of_type(mut self, queue_type: impl Into<String>) -> Self {
        self.queue_type = Some(queue_type.into());
        self
    }

    fn is_empty(&self) -> bool {
        self.start.is_none()
            && self.count.is_none()
            && self.start_time.is_none()
            && self.end_time.is_none()
            && self.queue_type.is_none()
    }

    fn append_to(&self, url: &mut Url) {
        if self.is_empty() {
            return;
        }
        let mut pairs = url.query_pairs_mut();
        if let Some(start) = self.start {
            pairs.append_pair("start", &start.to_string());
        }
        if let Some(count) = self.count {
            pairs.append_pair("count", &count.to_string());
        }
        if let Some(start_time) = self.start_time {
            pairs.append_pair("startTime", &start_time.to_string());
        }
        if let Some(end_time) = self.end_time {
            pairs.append_pair("endTime", &end_time.to_string());
        }
        if let Some(queue_type) = &self.queue_type {
            pairs.append_pair("type", queue_type);
        }
    }
}

/// Endpoint URL builder bound to one regional route and platform
#[derive(Debug, Clone)]
pub struct RiotEndpoints {
    regional: Url,
    platform: Url,
    platform_name: String,
    base_override: Option<Url>,
}

impl RiotEndpoints {
    /// Production hosts for `regional_route` (e.g. `americas`) and
    /// `platform` (e.g. `na1`).
    pub fn new(regional_route: &str, platform: &str) -> Result<Self, RiotError> {
        Ok(Self {
            regional: riot_host(regional_route)?,
            platform: riot_host(platform)?,
            platform_name: platform.to_ascii_lowercase(),
            base_override: None,
        })
    }

    /// Sends every endpoint family to `base`.
    pub fn with_base_url(base: &str, platform: &str) -> Result<Self, RiotError> {
        let base = parse_base(base)?;
        Ok(Self {
            regional: base.clone(),
            platform: base.clone(),
            platform_name: platform.to_ascii_lowercase(),
            base_override: Some(base),
        })
    }

    pub fn from_config(config: &RiotConfig) -> Result<Self, RiotError> {
        match &config.base_url {
            Some(base) => Self::with_base_url(base, &config.platform),
            None => Self::new(&config.regional_route, &config.platform),
        }
    }

    /// Default platform routing value, lower-case.
    pub fn platform(&self) -> &str {
        &self.platform_name
    }

    // ========================================================================
    // match-v5
    // ========================================================================

    pub fn match_ids(&self, puuid: &Puuid, query: &MatchIdsQuery) -> String {
        let mut url = join(
            &self.regional,
            &["lol", "match", "v5", "matches", "by-puuid", puuid.as_str(), "ids"],
        );
        query.append_to(&mut url);
        url.into()
    }

    pub fn match_by_id(&self, match_id: &MatchId) -> String {
        join(
            &self.regional,
            &["lol", "match", "v5", "matches", match_id.as_str()],
        )
        .into()
    }

    pub fn match_timeline(&self, match_id: &MatchId) -> String {
        join(
            &self.regional,
            &["lol", "match", "v5", "matches", match_id.as_str(), "timeline"],
        )
        .into()
    }

    // ========================================================================
    // account-v1
    // ========================================================================

    pub fn account_by_puuid(&self, puuid: &Puuid) -> String {
        join(
            &self.regional,
            &["riot", "account", "v1", "accounts", "by-puuid", puuid.as_str()],
        )
        .into()
    }

    pub fn account_by_riot_id(&self, game_name: &str, tag_line: &str) -> String {
        join(
            &self.regional,
            &["riot", "account", "v1", "accounts", "by-riot-id", game_name, tag_line],
        )
        .into()
    }

    /// Platform a player is currently active on.
    pub fn active_region(&self, puuid: &Puuid) -> String {
        join(
            &self.regional,
            &[
                "riot", "account", "v1", "region", "by-game", "lol", "by-puuid",
                puuid.as_str(),
            ],
        )
        .into()
    }

    // ========================================================================
    // league-v4
    // ========================================================================

    /// League entries of a player on `platform` (as returned by
    /// [`active_region`](Self::active_region)).
    pub fn league_entries_by_puuid(
        &self,
        platform: &str,
        puuid: &Puuid,
    ) -> Result<String, RiotError> {
        let host = self.platform_host(platform)?;
        Ok(join(
            &host,
            &["lol", "league", "v4", "entries", "by-puuid", puuid.as_str()],
        )
        .into())
    }

    /// The single ladder of an apex tier.
    pub fn apex_league(&self, queue: LeagueQueue, tier: LeagueTier) -> Result<String, RiotError> {
        if !tier.is_apex() {
            return Err(RiotError::InvalidRequest(format!(
                "{tier} is not an apex tier"
            )));
        }
        let league = format!("{}leagues", tier.as_str().to_ascii_lowercase());
        Ok(join(
            &self.platform,
            &["lol", "league", "v4", &league, "by-queue", queue.as_str()],
        )
        .into())
    }

    /// One page (1-based) of a tier/division ladder.
    pub fn league_entries(
        &self,
        queue: LeagueQueue,
        tier: LeagueTier,
        division: LeagueDivision,
        page: u32,
    ) -> String {
        let mut url = join(
            &self.platform,
            &[
                "lol",
                "league",
                "v4",
                "entries",
                queue.as_str(),
                tier.as_str(),
                division.as_str(),
            ],
        );
        url.query_pairs_mut()
            .append_pair("page", &page.max(1).to_string());
        url.into()
    }

    fn platform_host(&self, platform: &str) -> Result<Url, RiotError> {
        match &self.base_override {
            Some(base) => Ok(base.clone()),
            None if platform.eq_ignore_ascii_case(&self.platform_name) => Ok(self.platform.clone()),
            None => riot_host(platform),
        }
    }
}

fn riot_host(route: &str) -> Result<Url, RiotError> {
    if route.is_empty() || !route.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(RiotError::InvalidRequest(format!(
            "invalid routing value '{route}'"
        )));
    }
    parse_base(&format!(
        "https://{}.api.riotgames.com",
        route.to_ascii_lowercase()
    ))
}

fn parse_base(base: &str) -> Result<Url, RiotError> {
    let url = Url::parse(base)
        .map_err(|e| RiotError::InvalidRequest(format!("invalid base URL '{base}': {e}")))?;
    if url.cannot_be_a_base() {
        return Err(RiotError::InvalidRequest(format!(
            "base URL '{base}' cannot carry a path"
        )));
    }
    Ok(url)
}

/// Appends percent-encoded segments to a base URL.
fn join(base: &Url, segments: &[&str]) -> Url {
    let mut url = base.clone();
    if let Ok(mut path) = url.path_segments_mut() {
        path.pop_if_empty().extend(segments);
    }
    url
}

#[cfg(test)]
mod tests {
    use super::*;

    fn puuid() -> Puuid {
        Puuid::new("abc-123".to_string()).unwrap()
    }

    fn endpoints() -> RiotEndpoints {
        RiotEndpoints::new("americas", "na1").unwrap()
    }

    #[test]
    fn test_match_ids_emits_only_set_params() {
        let url = endpoints().match_ids(&puuid(), &MatchIdsQuery::default());
        assert_eq!(
            url,
            "https://americas.api.riotgames.com/lol/match/v5/matches/by-puuid/abc-123/ids"
        );

        let query = MatchIdsQuery {
            count: Some(5),
            ..Default::default()
        };
        let url = endpoints().match_ids(&puuid(), &query);
        assert!(url.ends_with("/abc-123/ids?count=5"), "{url}");

        let query = MatchIdsQuery::page(20, 10)
            .between(1_700_000_000, 1_710_000_000)
            .of_type("ranked");
        let url = endpoints().match_ids(&puuid(), &query);
        assert!(url.ends_with(
            "/ids?start=20&count=10&startTime=1700000000&endTime=1710000000&type=ranked"
        ));
    }

    #[test]
    fn test_match_and_timeline() {
        let id = MatchId::new("NA1_5123456789".to_string()).unwrap();
        assert_eq!(
            endpoints().match_by_id(&id),
            "https://americas.api.riotgames.com/lol/match/v5/matches/NA1_5123456789"
        );
        assert!(endpoints()
            .match_timeline(&id)
            .ends_with("/matches/NA1_5123456789/timeline"));
    }

    #[test]
    fn test_riot_id_is_encoded() {
        let url = endpoints().account_by_riot_id("Faker Fan", "KR 1");
        assert_eq!(
            url,
            "https://americas.api.riotgames.com/riot/account/v1/accounts/by-riot-id/Faker%20Fan/KR%201"
        );
    }

    #[test]
    fn test_active_region() {
        assert!(endpoints()
            .active_region(&puuid())
            .ends_with("/riot/account/v1/region/by-game/lol/by-puuid/abc-123"));
    }

    #[test]
    fn test_league_entries_by_puuid_uses_given_platform() {
        let url = endpoints().league_entries_by_puuid("EUW1", &puuid()).unwrap();
        assert_eq!(
            url,
            "https://euw1.api.riotgames.com/lol/league/v4/entries/by-puuid/abc-123"
        );
        assert!(endpoints().league_entries_by_puuid("eu/w", &puuid()).is_err());
    }

    #[test]
    fn test_apex_league() {
        let url = endpoints()
            .apex_league(LeagueQueue::RankedSolo5x5, LeagueTier::Challenger)
            .unwrap();
        assert_eq!(
            url,
            "https://na1.api.riotgames.com/lol/league/v4/challengerleagues/by-queue/RANKED_SOLO_5x5"
        );
        assert!(endpoints()
            .apex_league(LeagueQueue::RankedSolo5x5, LeagueTier::Gold)
            .is_err());
    }

    #[test]
    fn test_league_entries_division_path() {
        let url = endpoints().league_entries(
            LeagueQueue::RankedSolo5x5,
            LeagueTier::Diamond,
            LeagueDivision::II,
            0,
        );
        assert_eq!(
            url,
            "https://na1.api.riotgames.com/lol/league/v4/entries/RANKED_SOLO_5x5/DIAMOND/II?page=1"
        );
    }

    #[test]
    fn test_base_override_applies_to_every_family() {
        let endpoints = RiotEndpoints::with_base_url("http://127.0.0.1:8080", "na1").unwrap();
        assert_eq!(
            endpoints.league_entries_by_puuid("kr", &puuid()).unwrap(),
            "http://127.0.0.1:8080/lol/league/v4/entries/by-puuid/abc-123"
        );
        assert!(endpoints
            .account_by_puuid(&puuid())
            .starts_with("http://127.0.0.1:8080/riot/account/v1/"));
    }

    #[test]
    fn test_rejects_bad_routes() {
        assert!(RiotEndpoints::new("", "na1").is_err());
        assert!(RiotEndpoints::new("americas", "na1.evil.com/").is_err());
        assert!(RiotEndpoints::with_base_url("mailto:x@y", "na1").is_err());
    }
}
