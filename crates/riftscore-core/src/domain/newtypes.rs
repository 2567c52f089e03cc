//! Domain newtypes with validation
//!
//! Strongly-typed wrappers for the identifiers the upstream API hands out.
//! Each newtype ensures data validity at construction time, so a value that
//! reaches a URL builder or a storage key is already known to be safe.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::errors::DomainError;

// ============================================================================
// Puuid
// ============================================================================

/// Opaque player identifier used as the primary key for player-scoped data
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Puuid(String);

impl Puuid {
    /// Create a new Puuid
    ///
    /// # Errors
    /// Returns error if the value is empty or contains characters that
    /// would break URL paths or storage keys
    pub fn new(id: String) -> Result<Self, DomainError> {
        if id.is_empty() {
            return Err(DomainError::InvalidPuuid(
                "PUUID cannot be empty".to_string(),
            ));
        }

        if id
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '/' | '\\' | '?' | '#' | '%'))
        {
            return Err(DomainError::InvalidPuuid(format!(
                "PUUID contains invalid characters: {id}"
            )));
        }

        Ok(Self(id))
    }

    /// Get the inner string reference
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Puuid {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Puuid {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.to_string())
    }
}

impl TryFrom<String> for Puuid {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<Puuid> for String {
    fn from(id: Puuid) -> Self {
        id.0
    }
}

// ============================================================================
// MatchId
// ============================================================================

/// Match identifier in `<PLATFORM>_<number>` form, e.g. `NA1_5123456789`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MatchId(String);

impl MatchId {
    /// Create a new MatchId
    ///
    /// # Errors
    /// Returns error if the value is not `<alphanumeric platform>_<digits>`
    pub fn new(id: String) -> Result<Self, DomainError> {
        let Some((platform, number)) = id.split_once('_') else {
            return Err(DomainError::InvalidMatchId(format!(
                "missing platform separator: {id}"
            )));
        };

        if platform.is_empty() || !platform.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(DomainError::InvalidMatchId(format!(
                "invalid platform prefix: {id}"
            )));
        }

        if number.is_empty() || !number.chars().all(|c| c.is_ascii_digit()) {
            return Err(DomainError::InvalidMatchId(format!(
                "invalid match number: {id}"
            )));
        }

        Ok(Self(id))
    }

    /// Get the inner string reference
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Platform prefix, e.g. `NA1`
    #[must_use]
    pub fn platform(&self) -> &str {
        self.0.split_once('_').map_or("", |(p, _)| p)
    }
}

impl Display for MatchId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for MatchId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.to_string())
    }
}

impl TryFrom<String> for MatchId {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<MatchId> for String {
    fn from(id: MatchId) -> Self {
        id.0
    }
}
