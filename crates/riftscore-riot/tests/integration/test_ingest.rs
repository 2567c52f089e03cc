//! Integration tests for bulk match ingestion
//!
//! A failed call must end the batch with an explicit failure marker, never
//! look like the end of the match history.

use std::sync::Arc;

use chrono::{Duration as ChronoDuration, Utc};
use riftscore_core::{
    config::IngestionConfig,
    domain::{LeagueDivision, LeagueQueue, LeagueTier, Puuid},
};
use riftscore_riot::{IngestStage, MatchIngestor, StopReason};
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common::{self, MemoryBulkStorage};

const PREFIX: &str = "rank_match_info/GOLD_II_match_infos/puuid-test-001";

fn puuid() -> Puuid {
    Puuid::new(common::PUUID.to_string()).unwrap()
}

fn config(page_size: u32, max_pages: u32) -> IngestionConfig {
    IngestionConfig {
        page_size,
        max_pages,
        ..Default::default()
    }
}

fn recent_ms() -> i64 {
    (Utc::now() - ChronoDuration::days(3)).timestamp_millis()
}

async fn mount_gold_player(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path(format!(
            "/riot/account/v1/region/by-game/lol/by-puuid/{}",
            common::PUUID
        )))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "puuid": common::PUUID, "game": "lol", "region": "na1"
        })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!(
            "/lol/league/v4/entries/by-puuid/{}",
            common::PUUID
        )))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"queueType": "RANKED_SOLO_5x5", "tier": "GOLD", "rank": "II", "leaguePoints": 12}
        ])))
        .mount(server)
        .await;
}

async fn mount_ids_page(server: &MockServer, start: u32, ids: &[&str]) {
    Mock::given(method("GET"))
        .and(path(format!(
            "/lol/match/v5/matches/by-puuid/{}/ids",
            common::PUUID
        )))
        .and(query_param("start", start.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(ids)))
        .mount(server)
        .await;
}

async fn mount_match(server: &MockServer, id: &str, created_ms: i64) {
    Mock::given(method("GET"))
        .and(path(format!("/lol/match/v5/matches/{id}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::match_doc(id, created_ms)))
        .mount(server)
        .await;
}

fn ingestor(
    server: &MockServer,
    storage: Arc<MemoryBulkStorage>,
    config: IngestionConfig,
) -> MatchIngestor {
    let api = common::api_for(server, common::client());
    MatchIngestor::new(Arc::new(api), storage, config)
}

#[tokio::test]
async fn test_pages_linearly_until_empty_page() {
    let server = MockServer::start().await;
    mount_gold_player(&server).await;
    mount_ids_page(&server, 0, &["NA1_4", "NA1_3"]).await;
    mount_ids_page(&server, 2, &["NA1_2"]).await;
    mount_ids_page(&server, 4, &[]).await;
    for id in ["NA1_4", "NA1_3", "NA1_2"] {
        mount_match(&server, id, recent_ms()).await;
    }

    let storage = Arc::new(MemoryBulkStorage::default());
    let report = ingestor(&server, Arc::clone(&storage), config(2, 100))
        .ingest_player(&puuid())
        .await;

    assert!(report.is_success());
    assert_eq!(report.stop_reason, StopReason::EmptyPage);
    assert_eq!(report.key_prefix, PREFIX);
    assert_eq!(report.documents, 3);
    assert_eq!(
        report.segments,
        vec![
            format!("{PREFIX}/match_info_bulk_0.json"),
            format!("{PREFIX}/match_info_bulk_1.json"),
        ]
    );
    let first = storage
        .segment(&format!("{PREFIX}/match_info_bulk_0.json"))
        .unwrap();
    assert_eq!(first[0]["metadata"]["matchId"], "NA1_4");
}

#[tokio::test]
async fn test_failed_call_is_reported_not_treated_as_end() {
    let server = MockServer::start().await;
    mount_gold_player(&server).await;
    mount_ids_page(&server, 0, &["NA1_4", "NA1_3"]).await;
    mount_ids_page(&server, 2, &["NA1_2"]).await;
    mount_match(&server, "NA1_4", recent_ms()).await;
    mount_match(&server, "NA1_3", recent_ms()).await;
    Mock::given(method("GET"))
        .and(path("/lol/match/v5/matches/NA1_2"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let storage = Arc::new(MemoryBulkStorage::default());
    let report = ingestor(&server, Arc::clone(&storage), config(2, 100))
        .ingest_player(&puuid())
        .await;

    assert!(!report.is_success());
    assert_eq!(report.stop_reason, StopReason::Failed);
    assert_eq!(report.segments.len(), 1);
    let failure = report.failure.unwrap();
    assert_eq!(failure.segment_index, 1);
    assert_eq!(failure.stage, IngestStage::Match);
    assert!(failure.error.contains("Upstream unavailable"));
    assert_eq!(storage.keys().len(), 1);
}

#[tokio::test]
async fn test_stops_at_window_start_and_drops_older_documents() {
    let server = MockServer::start().await;
    mount_gold_player(&server).await;
    mount_ids_page(&server, 0, &["NA1_9", "NA1_1"]).await;
    mount_match(&server, "NA1_9", recent_ms()).await;
    let too_old = (Utc::now() - ChronoDuration::days(800)).timestamp_millis();
    mount_match(&server, "NA1_1", too_old).await;

    let storage = Arc::new(MemoryBulkStorage::default());
    let report = ingestor(&server, Arc::clone(&storage), config(2, 100))
        .ingest_player(&puuid())
        .await;

    assert_eq!(report.stop_reason, StopReason::OutsideWindow);
    assert_eq!(report.documents, 1);
    let segment = storage.segment(&report.segments[0]).unwrap();
    assert_eq!(segment.len(), 1);
    assert_eq!(segment[0]["metadata"]["matchId"], "NA1_9");
}

#[tokio::test]
async fn test_page_cap_bounds_the_loop() {
    let server = MockServer::start().await;
    mount_gold_player(&server).await;
    Mock::given(method("GET"))
        .and(path(format!(
            "/lol/match/v5/matches/by-puuid/{}/ids",
            common::PUUID
        )))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(["NA1_5"])))
        .expect(3)
        .mount(&server)
        .await;
    mount_match(&server, "NA1_5", recent_ms()).await;

    let storage = Arc::new(MemoryBulkStorage::default());
    let report = ingestor(&server, storage, config(1, 3))
        .ingest_player(&puuid())
        .await;

    assert_eq!(report.stop_reason, StopReason::MaxPages);
    assert_eq!(report.segments.len(), 3);
}

#[tokio::test]
async fn test_unresolvable_player_fails_before_paging() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let storage = Arc::new(MemoryBulkStorage::default());
    let report = ingestor(&server, storage, config(2, 100))
        .ingest_player(&puuid())
        .await;

    assert_eq!(report.failure.unwrap().stage, IngestStage::Resolve);
    assert!(report.segments.is_empty());
}

#[tokio::test]
async fn test_storage_failure_is_reported() {
    let server = MockServer::start().await;
    mount_gold_player(&server).await;
    mount_ids_page(&server, 0, &["NA1_4"]).await;
    mount_match(&server, "NA1_4", recent_ms()).await;

    let storage = Arc::new(MemoryBulkStorage::failing());
    let report = ingestor(&server, storage, config(2, 100))
        .ingest_player(&puuid())
        .await;

    let failure = report.failure.unwrap();
    assert_eq!(failure.stage, IngestStage::Store);
    assert_eq!(failure.segment_index, 0);
    assert!(failure.error.contains("disk full"));
}

#[tokio::test]
async fn test_ingest_top_players_reports_per_player() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/lol/league/v4/entries/RANKED_SOLO_5x5/GOLD/II"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"puuid": common::PUUID, "leaguePoints": 80},
            {"summonerId": "legacy-only", "leaguePoints": 20}
        ])))
        .mount(&server)
        .await;
    mount_gold_player(&server).await;
    mount_ids_page(&server, 0, &[]).await;

    let storage = Arc::new(MemoryBulkStorage::default());
    let reports = ingestor(&server, storage, config(2, 100))
        .ingest_top_players(
            2,
            LeagueQueue::RankedSolo5x5,
            LeagueTier::Gold,
            Some(LeagueDivision::II),
        )
        .await
        .unwrap();

    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].puuid, common::PUUID);
    assert_eq!(reports[0].stop_reason, StopReason::EmptyPage);
}

#[tokio::test]
async fn test_recent_timelines_stored_as_one_segment() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!(
            "/lol/match/v5/matches/by-puuid/{}/ids",
            common::PUUID
        )))
        .and(query_param("count", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(["NA1_2", "NA1_1"])))
        .mount(&server)
        .await;
    for id in ["NA1_2", "NA1_1"] {
        Mock::given(method("GET"))
            .and(path(format!("/lol/match/v5/matches/{id}/timeline")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "metadata": {"matchId": id},
                "info": {"frames": []}
            })))
            .mount(&server)
            .await;
    }

    let storage = Arc::new(MemoryBulkStorage::default());
    let report = ingestor(&server, Arc::clone(&storage), config(10, 100))
        .ingest_recent_timelines(&puuid(), 2)
        .await;

    assert!(report.is_success());
    assert_eq!(report.stop_reason, StopReason::Completed);
    let key = format!("rank_match_info/timelines/{}/timeline_bulk_0.json", common::PUUID);
    assert_eq!(report.segments, vec![key.clone()]);
    assert_eq!(storage.segment(&key).unwrap().len(), 2);
}
