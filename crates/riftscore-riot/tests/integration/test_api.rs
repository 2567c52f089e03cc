//! Integration tests for the typed endpoint wrappers

use riftscore_core::{
    domain::{LeagueDivision, LeagueQueue, LeagueTier, MatchId, Puuid},
    ports::IPlayerDirectory,
};
use riftscore_riot::{MatchIdsQuery, RiotError};
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

use crate::common;

fn puuid() -> Puuid {
    Puuid::new(common::PUUID.to_string()).unwrap()
}

#[tokio::test]
async fn test_get_match_ids_sends_paging_params() {
    let (server, api) = common::setup_riot_mock().await;
    Mock::given(method("GET"))
        .and(path(format!(
            "/lol/match/v5/matches/by-puuid/{}/ids",
            common::PUUID
        )))
        .and(query_param("start", "20"))
        .and(query_param("count", "10"))
        .and(query_param("type", "ranked"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(["NA1_11", "NA1_10"])))
        .expect(1)
        .mount(&server)
        .await;

    let ids = api
        .get_match_ids(&puuid(), &MatchIdsQuery::page(20, 10).of_type("ranked"))
        .await
        .unwrap();
    assert_eq!(ids.iter().map(MatchId::as_str).collect::<Vec<_>>(), ["NA1_11", "NA1_10"]);
}

#[tokio::test]
async fn test_get_match_ids_rejects_invalid_ids() {
    let (server, api) = common::setup_riot_mock().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(["not-a-match"])))
        .mount(&server)
        .await;

    let err = api
        .get_match_ids(&puuid(), &MatchIdsQuery::default())
        .await
        .unwrap_err();
    assert!(matches!(err, RiotError::MalformedResponse { .. }));
}

#[tokio::test]
async fn test_get_match_participants_forwards_metadata() {
    let (server, api) = common::setup_riot_mock().await;
    Mock::given(method("GET"))
        .and(path("/lol/match/v5/matches/NA1_42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::match_doc("NA1_42", 0)))
        .mount(&server)
        .await;

    let id = MatchId::new("NA1_42".to_string()).unwrap();
    let participants = api.get_match_participants(&id).await.unwrap();
    assert_eq!(participants.len(), 3);
    assert_eq!(participants[0].as_str(), common::PUUID);
}

#[tokio::test]
async fn test_get_match_participants_requires_metadata() {
    let (server, api) = common::setup_riot_mock().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"info": {}})))
        .mount(&server)
        .await;

    let id = MatchId::new("NA1_42".to_string()).unwrap();
    let err = api.get_match_participants(&id).await.unwrap_err();
    assert!(matches!(err, RiotError::MalformedResponse { .. }));
}

#[tokio::test]
async fn test_player_directory_resolves_riot_id() {
    let (server, api) = common::setup_riot_mock().await;
    Mock::given(method("GET"))
        .and(path(format!(
            "/riot/account/v1/accounts/by-puuid/{}",
            common::PUUID
        )))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "puuid": common::PUUID,
            "gameName": "Rift Walker",
            "tagLine": "NA1"
        })))
        .mount(&server)
        .await;

    let directory: &dyn IPlayerDirectory = &api;
    let account = directory.get_account(&puuid()).await.unwrap();
    assert_eq!(account.riot_id(), "Rift Walker#NA1");
}

#[tokio::test]
async fn test_get_player_rank_picks_solo_queue() {
    let (server, api) = common::setup_riot_mock().await;
    Mock::given(method("GET"))
        .and(path(format!(
            "/lol/league/v4/entries/by-puuid/{}",
            common::PUUID
        )))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"queueType": "RANKED_FLEX_SR", "tier": "IRON", "rank": "IV", "leaguePoints": 3},
            {"queueType": "RANKED_SOLO_5x5", "tier": "PLATINUM", "rank": "III", "leaguePoints": 57}
        ])))
        .mount(&server)
        .await;

    let rank = api.get_player_rank("na1", &puuid()).await.unwrap().unwrap();
    assert_eq!(rank.tier, LeagueTier::Platinum);
    assert_eq!(rank.division, Some(LeagueDivision::III));
    assert_eq!(rank.league_points, 57);
}

#[tokio::test]
async fn test_get_player_rank_unranked() {
    let (server, api) = common::setup_riot_mock().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    assert_eq!(api.get_player_rank("na1", &puuid()).await.unwrap(), None);
}

#[tokio::test]
async fn test_get_active_region() {
    let (server, api) = common::setup_riot_mock().await;
    Mock::given(method("GET"))
        .and(path(format!(
            "/riot/account/v1/region/by-game/lol/by-puuid/{}",
            common::PUUID
        )))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "puuid": common::PUUID,
            "game": "lol",
            "region": "EUW1"
        })))
        .mount(&server)
        .await;

    assert_eq!(api.get_active_region(&puuid()).await.unwrap(), "euw1");
}

#[tokio::test]
async fn test_top_players_from_apex_league_sorted_by_lp() {
    let (server, api) = common::setup_riot_mock().await;
    Mock::given(method("GET"))
        .and(path("/lol/league/v4/challengerleagues/by-queue/RANKED_SOLO_5x5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "tier": "CHALLENGER",
            "queue": "RANKED_SOLO_5x5",
            "entries": [
                {"puuid": "a", "leaguePoints": 900, "rank": "I"},
                {"puuid": "b", "leaguePoints": 1500, "rank": "I"},
                {"puuid": "c", "leaguePoints": 1200, "rank": "I"}
            ]
        })))
        .mount(&server)
        .await;

    let top = api
        .get_top_players(2, LeagueQueue::RankedSolo5x5, LeagueTier::Challenger, None)
        .await
        .unwrap();
    let order: Vec<_> = top.iter().map(|e| e.puuid.as_deref().unwrap()).collect();
    assert_eq!(order, ["b", "c"]);
}

#[tokio::test]
async fn test_top_players_reads_ladder_pages_until_empty() {
    let (server, api) = common::setup_riot_mock().await;
    let ladder = "/lol/league/v4/entries/RANKED_SOLO_5x5/GOLD/II";
    Mock::given(method("GET"))
        .and(path(ladder))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"puuid": "a", "leaguePoints": 10},
            {"puuid": "b", "leaguePoints": 70}
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(ladder))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"puuid": "c", "leaguePoints": 40}
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(ladder))
        .and(query_param("page", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let top = api
        .get_top_players(
            10,
            LeagueQueue::RankedSolo5x5,
            LeagueTier::Gold,
            Some(LeagueDivision::II),
        )
        .await
        .unwrap();
    let order: Vec<_> = top.iter().map(|e| e.puuid.as_deref().unwrap()).collect();
    assert_eq!(order, ["b", "c", "a"]);
}

#[tokio::test]
async fn test_top_players_needs_division_below_apex() {
    let (_server, api) = common::setup_riot_mock().await;
    let err = api
        .get_top_players(5, LeagueQueue::RankedSolo5x5, LeagueTier::Gold, None)
        .await
        .unwrap_err();
    assert!(matches!(err, RiotError::InvalidRequest(_)));
}
