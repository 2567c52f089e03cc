//! Domain entities and business logic
//!
//! This module contains the core domain types for Riftscore:
//! - Newtypes for validated player and match identifiers
//! - Ranked ladder vocabulary (tiers, divisions, queues, lanes)
//! - Typed match documents
//! - Metrics extraction and power level scoring
//! - Domain-specific error types

pub mod errors;
pub mod league;
pub mod match_document;
pub mod metrics;
pub mod newtypes;
pub mod power_level;

// Re-export commonly used types
pub use errors::DomainError;
pub use league::{LanePosition, LeagueDivision, LeagueQueue, LeagueTier};
pub use match_document::{Challenges, MatchDocument, MatchInfo, MatchMetadata, Participant};
pub use metrics::MatchMetrics;
pub use newtypes::{MatchId, Puuid};
pub use power_level::{PowerLevel, PowerTier, MAX_POWER_LEVEL};
