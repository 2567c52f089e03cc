//! Integration tests for the adaptive client's call loop
//!
//! Verifies quota learning from the first success, the two retry paths
//! (429 with server delay, other failures with exponential backoff) and
//! that an exhausted budget always surfaces as a typed error.

use std::{sync::Arc, time::Duration};

use riftscore_riot::{
    rate_limit::QuotaLearning, RateLimitSet, RateTracker, RiotClient, RiotError, SleepReason,
};
use riftscore_telemetry::MetricsRegistry;
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common;

fn url(server: &MockServer, p: &str) -> String {
    format!("{}{}", server.uri(), p)
}

async fn mount_ok(server: &MockServer, p: &str, body: Value, quota: Option<&str>) {
    let mut response = ResponseTemplate::new(200).set_body_json(body);
    if let Some(quota) = quota {
        response = response.insert_header("X-App-Rate-Limit", quota);
    }
    Mock::given(method("GET"))
        .and(path(p))
        .respond_with(response)
        .mount(server)
        .await;
}

async fn mount_failures(server: &MockServer, p: &str, response: ResponseTemplate, times: u64) {
    Mock::given(method("GET"))
        .and(path(p))
        .respond_with(response)
        .up_to_n_times(times)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_success_returns_body_and_sends_api_key() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/lol/status"))
        .and(header("X-Riot-Token", common::API_KEY))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;

    let client = common::client();
    let body = client.get(&url(&server, "/lol/status")).await.unwrap();
    assert_eq!(body, json!({"ok": true}));
}

#[tokio::test]
async fn test_quota_is_learned_once() {
    let server = MockServer::start().await;
    mount_ok(&server, "/first", json!([]), Some("20:1,100:120")).await;
    mount_ok(&server, "/second", json!([]), Some("5:1")).await;

    let client = common::client();
    assert!(client.tracker().limits().is_empty());

    client.get(&url(&server, "/first")).await.unwrap();
    let expected: RateLimitSet = "20:1,100:120".parse().unwrap();
    assert_eq!(client.tracker().limits(), expected);

    client.get(&url(&server, "/second")).await.unwrap();
    assert_eq!(client.tracker().limits(), expected);
    assert_eq!(client.tracker().history_len(120).await, 1);
}

#[tokio::test]
async fn test_quota_refresh_mode_follows_header_changes() {
    let server = MockServer::start().await;
    mount_ok(&server, "/first", json!([]), Some("20:1,100:120")).await;
    mount_ok(&server, "/second", json!([]), Some("50:10")).await;

    let tracker = Arc::new(RateTracker::new().with_learning(QuotaLearning::Refresh));
    let client = common::client().with_tracker(tracker);

    client.get(&url(&server, "/first")).await.unwrap();
    client.get(&url(&server, "/second")).await.unwrap();
    assert_eq!(client.tracker().limits(), "50:10".parse().unwrap());
}

#[tokio::test]
async fn test_missing_quota_header_leaves_tracker_unlearned() {
    let server = MockServer::start().await;
    mount_ok(&server, "/plain", json!({}), None).await;

    let client = common::client();
    client.get(&url(&server, "/plain")).await.unwrap();
    assert!(client.tracker().limits().is_empty());
}

#[tokio::test]
async fn test_throttled_retries_use_server_delay_not_backoff() {
    let server = MockServer::start().await;
    mount_failures(
        &server,
        "/busy",
        ResponseTemplate::new(429).insert_header("Retry-After", "0"),
        3,
    )
    .await;
    mount_ok(&server, "/busy", json!({"done": 1}), None).await;

    let client = common::client();
    let outcome = client.call_with_trace(&url(&server, "/busy"), 6).await;

    assert_eq!(outcome.result.unwrap(), json!({"done": 1}));
    assert_eq!(outcome.trace.attempts, 4);
    assert_eq!(
        outcome.trace.delays(SleepReason::Throttled),
        vec![Duration::ZERO; 3]
    );
    assert!(outcome.trace.delays(SleepReason::Transient).is_empty());
    assert_eq!(outcome.trace.final_backoff, Duration::from_millis(10));
}

#[tokio::test]
async fn test_throttle_without_retry_after_uses_default() {
    let server = MockServer::start().await;
    mount_failures(&server, "/busy", ResponseTemplate::new(429), 1).await;
    mount_ok(&server, "/busy", json!(1), None).await;

    let outcome = common::client()
        .call_with_trace(&url(&server, "/busy"), 6)
        .await;

    assert!(outcome.result.is_ok());
    assert_eq!(
        outcome.trace.delays(SleepReason::Throttled),
        vec![Duration::from_millis(10)]
    );
}

#[tokio::test]
async fn test_transient_failures_double_the_backoff() {
    let server = MockServer::start().await;
    mount_failures(&server, "/flaky", ResponseTemplate::new(503), 3).await;
    mount_ok(&server, "/flaky", json!("ok"), None).await;

    let outcome = common::client()
        .call_with_trace(&url(&server, "/flaky"), 6)
        .await;

    assert_eq!(outcome.result.unwrap(), json!("ok"));
    assert_eq!(
        outcome.trace.delays(SleepReason::Transient),
        vec![
            Duration::from_millis(10),
            Duration::from_millis(20),
            Duration::from_millis(40),
        ]
    );
    assert_eq!(outcome.trace.final_backoff, Duration::from_millis(80));
}

#[tokio::test]
async fn test_throttle_then_server_error_keeps_backoff_baseline() {
    let server = MockServer::start().await;
    mount_failures(
        &server,
        "/mixed",
        ResponseTemplate::new(429).insert_header("Retry-After", "1"),
        1,
    )
    .await;
    mount_failures(&server, "/mixed", ResponseTemplate::new(500), 1).await;
    mount_ok(&server, "/mixed", json!([]), None).await;

    let started = std::time::Instant::now();
    let outcome = common::client()
        .call_with_trace(&url(&server, "/mixed"), 6)
        .await;

    assert!(outcome.result.is_ok());
    assert!(started.elapsed() >= Duration::from_secs(1));
    let delays: Vec<_> = outcome.trace.sleeps.iter().map(|s| (s.reason, s.delay)).collect();
    assert_eq!(
        delays,
        vec![
            (SleepReason::Throttled, Duration::from_secs(1)),
            (SleepReason::Transient, Duration::from_millis(10)),
        ]
    );
}

#[tokio::test]
async fn test_server_errors_exhaust_into_typed_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/down"))
        .respond_with(ResponseTemplate::new(500))
        .expect(2)
        .mount(&server)
        .await;

    let err = common::client()
        .call(&url(&server, "/down"), 2)
        .await
        .unwrap_err();

    match err {
        RiotError::UpstreamUnavailable {
            attempts, status, ..
        } => {
            assert_eq!(attempts, 2);
            assert_eq!(status, Some(500));
        }
        other => panic!("expected UpstreamUnavailable, got {other:?}"),
    }
}

#[tokio::test]
async fn test_persistent_throttling_exhausts_as_rate_limited() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/throttled"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "0"))
        .expect(3)
        .mount(&server)
        .await;

    let err = common::client()
        .call(&url(&server, "/throttled"), 3)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        RiotError::RateLimitedExhausted { attempts: 3, .. }
    ));
}

#[tokio::test]
async fn test_zero_budget_still_makes_one_attempt() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/once"))
        .respond_with(ResponseTemplate::new(502))
        .expect(1)
        .mount(&server)
        .await;

    let err = common::client()
        .call(&url(&server, "/once"), 0)
        .await
        .unwrap_err();
    assert!(err.is_exhausted());
}

#[tokio::test]
async fn test_json_null_is_a_success_not_a_failure() {
    let server = MockServer::start().await;
    mount_ok(&server, "/null", Value::Null, None).await;

    let body = common::client().get(&url(&server, "/null")).await.unwrap();
    assert_eq!(body, Value::Null);
}

#[tokio::test]
async fn test_malformed_body_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/garbled"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .expect(1)
        .mount(&server)
        .await;

    let err = common::client()
        .get(&url(&server, "/garbled"))
        .await
        .unwrap_err();
    assert!(matches!(err, RiotError::MalformedResponse { .. }));
}

#[tokio::test]
async fn test_transport_errors_are_retried_then_surface() {
    // Nothing listens on port 1
    let outcome = common::client()
        .call_with_trace("http://127.0.0.1:1/lol/status", 2)
        .await;

    assert_eq!(outcome.trace.attempts, 2);
    assert_eq!(outcome.trace.sleeps.len(), 1);
    match outcome.result.unwrap_err() {
        RiotError::UpstreamUnavailable { status, .. } => assert_eq!(status, None),
        other => panic!("expected UpstreamUnavailable, got {other:?}"),
    }
}

#[tokio::test]
async fn test_cancellation_interrupts_retry_sleep() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "60"))
        .mount(&server)
        .await;

    let token = CancellationToken::new();
    let client = common::client().with_cancellation(token.clone());
    let target = url(&server, "/slow");

    let call = tokio::spawn(async move { client.get(&target).await });
    tokio::time::sleep(Duration::from_millis(200)).await;
    token.cancel();

    let result = tokio::time::timeout(Duration::from_secs(5), call)
        .await
        .expect("call did not stop after cancellation")
        .unwrap();
    assert!(matches!(result, Err(RiotError::Cancelled)));
}

#[tokio::test]
async fn test_learned_quota_throttles_following_calls() {
    let server = MockServer::start().await;
    mount_ok(&server, "/limited", json!([]), Some("2:1")).await;

    let client = common::client();
    let target = url(&server, "/limited");
    let started = std::time::Instant::now();
    for _ in 0..4 {
        client.get(&target).await.unwrap();
    }

    // learned after call 1; calls 2-3 fill the window, call 4 waits ~1s
    assert!(started.elapsed() >= Duration::from_millis(900));
    assert!(client.tracker().history_len(1).await <= 2);
}

#[tokio::test]
async fn test_metrics_are_recorded() {
    let server = MockServer::start().await;
    mount_failures(
        &server,
        "/lol/match/v5/matches/NA1_1",
        ResponseTemplate::new(429).insert_header("Retry-After", "0"),
        1,
    )
    .await;
    mount_ok(&server, "/lol/match/v5/matches/NA1_1", json!({}), Some("20:1,100:120")).await;

    let metrics = Arc::new(MetricsRegistry::new().unwrap());
    let client: RiotClient = common::client().with_metrics(Arc::clone(&metrics));
    client
        .get(&url(&server, "/lol/match/v5/matches/NA1_1"))
        .await
        .unwrap();

    let text = metrics.encode().unwrap();
    assert!(text.contains(r#"riftscore_riot_retries_total{reason="throttled"} 1"#));
    assert!(text.contains(
        r#"riftscore_riot_requests_total{endpoint="lol/match/v5",status="429"} 1"#
    ));
    assert!(text.contains("riftscore_quota_windows 2"));
}
