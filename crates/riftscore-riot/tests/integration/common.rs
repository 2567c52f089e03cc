//! Shared test helpers for Riot API integration tests
//!
//! Provides a wiremock server, a client with millisecond-scale retry delays
//! pointed at it, and an in-memory bulk storage.

use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex},
    time::Duration,
};

use riftscore_core::ports::IBulkStorage;
use riftscore_riot::{RetryPolicy, RiotApi, RiotClient, RiotEndpoints};
use serde_json::{json, Value};
use wiremock::MockServer;

pub const API_KEY: &str = "RGAPI-test-key";
pub const PUUID: &str = "puuid-test-001";

/// Retry delays short enough to run the retry loop in real time.
pub fn fast_policy() -> RetryPolicy {
    RetryPolicy::default()
        .with_initial_backoff(Duration::from_millis(10))
        .with_default_retry_after(Duration::from_millis(10))
}

pub fn client() -> RiotClient {
    RiotClient::new(API_KEY).with_policy(fast_policy())
}

pub fn api_for(server: &MockServer, client: RiotClient) -> RiotApi {
    let endpoints = RiotEndpoints::with_base_url(&server.uri(), "na1").expect("endpoints");
    RiotApi::new(Arc::new(client), endpoints)
}

/// Starts a mock server and returns it with an API bound to it.
pub async fn setup_riot_mock() -> (MockServer, RiotApi) {
    let server = MockServer::start().await;
    let api = api_for(&server, client());
    (server, api)
}

/// Minimal match document with a participant list and creation time.
pub fn match_doc(match_id: &str, game_creation_ms: i64) -> Value {
    json!({
        "metadata": {
            "matchId": match_id,
            "participants": [PUUID, "other-1", "other-2"]
        },
        "info": {
            "gameCreation": game_creation_ms,
            "gameDuration": 1800,
            "participants": []
        }
    })
}

// ============================================================================
// In-memory bulk storage
// ============================================================================

#[derive(Default)]
pub struct MemoryBulkStorage {
    segments: Mutex<BTreeMap<String, Vec<Value>>>,
    fail_writes: bool,
}

impl MemoryBulkStorage {
    pub fn failing() -> Self {
        Self {
            fail_writes: true,
            ..Default::default()
        }
    }

    pub fn keys(&self) -> Vec<String> {
        self.segments.lock().unwrap().keys().cloned().collect()
    }

    pub fn segment(&self, key: &str) -> Option<Vec<Value>> {
        self.segments.lock().unwrap().get(key).cloned()
    }
}

#[async_trait::async_trait]
impl IBulkStorage for MemoryBulkStorage {
    async fn put_segment(&self, key: &str, docs: &[Value]) -> anyhow::Result<String> {
        if self.fail_writes {
            anyhow::bail!("disk full");
        }
        self.segments
            .lock()
            .unwrap()
            .insert(key.to_string(), docs.to_vec());
        Ok(format!("memory://{key}"))
    }

    async fn get_segment(&self, key: &str) -> anyhow::Result<Vec<Value>> {
        self.segment(key)
            .ok_or_else(|| anyhow::anyhow!("no segment {key}"))
    }

    async fn list_segments(&self, prefix: &str) -> anyhow::Result<Vec<String>> {
        Ok(self
            .keys()
            .into_iter()
            .filter(|k| k.starts_with(prefix))
            .collect())
    }
}
