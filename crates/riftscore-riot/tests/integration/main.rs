//! Integration tests for riftscore-riot
//!
//! Uses wiremock to simulate the Riot Games API and verifies quota
//! learning, retry behaviour, the typed endpoint wrappers and bulk
//! ingestion end to end.

mod common;

mod test_api;
mod test_call;
mod test_ingest;
