//! Ranked ladder vocabulary: tiers, divisions, queues and lane positions.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::errors::DomainError;

/// Ranked tier, lowest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LeagueTier {
    Iron,
    Bronze,
    Silver,
    Gold,
    Platinum,
    Emerald,
    Diamond,
    Master,
    Grandmaster,
    Challenger,
}

impl LeagueTier {
    pub const ALL: [LeagueTier; 10] = [
        LeagueTier::Iron,
        LeagueTier::Bronze,
        LeagueTier::Silver,
        LeagueTier::Gold,
        LeagueTier::Platinum,
        LeagueTier::Emerald,
        LeagueTier::Diamond,
        LeagueTier::Master,
        LeagueTier::Grandmaster,
        LeagueTier::Challenger,
    ];

    /// Upper-case wire name, as returned by the league endpoints
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            LeagueTier::Iron => "IRON",
            LeagueTier::Bronze => "BRONZE",
            LeagueTier::Silver => "SILVER",
            LeagueTier::Gold => "GOLD",
            LeagueTier::Platinum => "PLATINUM",
            LeagueTier::Emerald => "EMERALD",
            LeagueTier::Diamond => "DIAMOND",
            LeagueTier::Master => "MASTER",
            LeagueTier::Grandmaster => "GRANDMASTER",
            LeagueTier::Challenger => "CHALLENGER",
        }
    }

    /// Apex tiers have a single ladder per queue and no divisions.
    #[must_use]
    pub const fn is_apex(&self) -> bool {
        matches!(
            self,
            LeagueTier::Master | LeagueTier::Grandmaster | LeagueTier::Challenger
        )
    }
}

impl Display for LeagueTier {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LeagueTier {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == upper)
            .ok_or_else(|| DomainError::UnknownVariant {
                kind: "tier",
                value: s.to_string(),
            })
    }
}

/// Division inside a non-apex tier, `I` being the highest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LeagueDivision {
    I,
    II,
    III,
    IV,
}

impl LeagueDivision {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            LeagueDivision::I => "I",
            LeagueDivision::II => "II",
            LeagueDivision::III => "III",
            LeagueDivision::IV => "IV",
        }
    }
}

impl Display for LeagueDivision {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LeagueDivision {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "I" | "1" => Ok(LeagueDivision::I),
            "II" | "2" => Ok(LeagueDivision::II),
            "III" | "3" => Ok(LeagueDivision::III),
            "IV" | "4" => Ok(LeagueDivision::IV),
            _ => Err(DomainError::UnknownVariant {
                kind: "division",
                value: s.to_string(),
            }),
        }
    }
}

/// Ranked queue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LeagueQueue {
    #[serde(rename = "RANKED_SOLO_5x5")]
    RankedSolo5x5,
    #[serde(rename = "RANKED_FLEX_SR")]
    RankedFlexSr,
    #[serde(rename = "RANKED_FLEX_TT")]
    RankedFlexTt,
}

impl LeagueQueue {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            LeagueQueue::RankedSolo5x5 => "RANKED_SOLO_5x5",
            LeagueQueue::RankedFlexSr => "RANKED_FLEX_SR",
            LeagueQueue::RankedFlexTt => "RANKED_FLEX_TT",
        }
    }
}

impl Default for LeagueQueue {
    fn default() -> Self {
        LeagueQueue::RankedSolo5x5
    }
}

impl Display for LeagueQueue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LeagueQueue {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [
            LeagueQueue::RankedSolo5x5,
            LeagueQueue::RankedFlexSr,
            LeagueQueue::RankedFlexTt,
        ]
        .into_iter()
        .find(|q| q.as_str().eq_ignore_ascii_case(s.trim()))
        .ok_or_else(|| DomainError::UnknownVariant {
            kind: "queue",
            value: s.to_string(),
        })
    }
}

/// Lane position, in the participant order the match endpoint uses per team
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LanePosition {
    Top,
    Jungle,
    Middle,
    Bottom,
    Utility,
}

impl LanePosition {
    pub const ORDER: [LanePosition; 5] = [
        LanePosition::Top,
        LanePosition::Jungle,
        LanePosition::Middle,
        LanePosition::Bottom,
        LanePosition::Utility,
    ];

    /// Positional fallback: participants are listed five per team in lane order.
    #[must_use]
    pub const fn from_participant_index(index: usize) -> Self {
        Self::ORDER[index % 5]
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            LanePosition::Top => "TOP",
            LanePosition::Jungle => "JUNGLE",
            LanePosition::Middle => "MIDDLE",
            LanePosition::Bottom => "BOTTOM",
            LanePosition::Utility => "UTILITY",
        }
    }
}

impl Display for LanePosition {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LanePosition {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ORDER
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| DomainError::UnknownVariant {
                kind: "lane position",
                value: s.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_parses_case_insensitively() {
        assert_eq!("gold".parse::<LeagueTier>().unwrap(), LeagueTier::Gold);
        assert_eq!(
            "GRANDMASTER".parse::<LeagueTier>().unwrap(),
            LeagueTier::Grandmaster
        );
        assert!("wood".parse::<LeagueTier>().is_err());
    }

    #[test]
    fn only_top_three_tiers_are_apex() {
        let apex: Vec<_> = LeagueTier::ALL.into_iter().filter(|t| t.is_apex()).collect();
        assert_eq!(
            apex,
            vec![
                LeagueTier::Master,
                LeagueTier::Grandmaster,
                LeagueTier::Challenger
            ]
        );
    }

    #[test]
    fn tier_ordering_follows_ladder() {
        assert!(LeagueTier::Iron < LeagueTier::Bronze);
        assert!(LeagueTier::Diamond < LeagueTier::Master);
    }

    #[test]
    fn division_parses_roman_and_digits() {
        assert_eq!("iv".parse::<LeagueDivision>().unwrap(), LeagueDivision::IV);
        assert_eq!("2".parse::<LeagueDivision>().unwrap(), LeagueDivision::II);
        assert!("V".parse::<LeagueDivision>().is_err());
    }

    #[test]
    fn queue_serde_uses_wire_names() {
        let json = serde_json::to_string(&LeagueQueue::RankedSolo5x5).unwrap();
        assert_eq!(json, "\"RANKED_SOLO_5x5\"");
        let q: LeagueQueue = serde_json::from_str("\"RANKED_FLEX_SR\"").unwrap();
        assert_eq!(q, LeagueQueue::RankedFlexSr);
        assert_eq!(
            "ranked_solo_5x5".parse::<LeagueQueue>().unwrap(),
            LeagueQueue::RankedSolo5x5
        );
    }

    #[test]
    fn lane_from_index_wraps_per_team() {
        assert_eq!(LanePosition::from_participant_index(0), LanePosition::Top);
        assert_eq!(LanePosition::from_participant_index(4), LanePosition::Utility);
        assert_eq!(LanePosition::from_participant_index(5), LanePosition::Top);
        assert_eq!(LanePosition::from_participant_index(8), LanePosition::Bottom);
    }

    #[test]
    fn tier_deserializes_from_uppercase() {
        let t: LeagueTier = serde_json::from_str("\"EMERALD\"").unwrap();
        assert_eq!(t, LeagueTier::Emerald);
    }
}
