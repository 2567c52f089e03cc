//! Domain error types
//!
//! This module defines error types specific to domain operations,
//! including identifier validation and match document lookups.

use thiserror::Error;

/// Errors that can occur in domain operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Invalid player identifier
    #[error("Invalid PUUID: {0}")]
    InvalidPuuid(String),

    /// Invalid match identifier
    #[error("Invalid match ID: {0}")]
    InvalidMatchId(String),

    /// Unknown league tier, division, queue, or lane name
    #[error("Unknown {kind}: {value}")]
    UnknownVariant {
        /// Which enumeration was being parsed
        kind: &'static str,
        /// The rejected input
        value: String,
    },

    /// The player does not appear in the match document
    #[error("Player {puuid} not found in match {match_id}")]
    PlayerNotInMatch {
        /// Player that was looked up
        puuid: String,
        /// Match that was searched
        match_id: String,
    },

    /// The match document is structurally inconsistent
    #[error("Malformed match document: {0}")]
    MalformedMatch(String),

    /// Generic validation failure
    #[error("Validation failed: {0}")]
    ValidationFailed(String),
}
