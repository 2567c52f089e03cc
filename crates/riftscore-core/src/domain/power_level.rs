//! Power level scoring.
//!
//! Five capped sub-scores (combat, objectives, vision, economy, clutch) are
//! summed, boosted by multiplicative bonuses and clamped to `0..=10000`.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::errors::DomainError;
use super::league::LanePosition;
use super::metrics::MatchMetrics;

/// Highest attainable power level
pub const MAX_POWER_LEVEL: i64 = 10_000;

const COMBAT_CAP: f64 = 3000.0;
const OBJECTIVES_CAP: f64 = 2500.0;
const VISION_CAP: f64 = 1500.0;
const ECONOMY_CAP: f64 = 1500.0;
const CLUTCH_CAP: f64 = 1500.0;

const WIN_BONUS: f64 = 1.15;
const PERFECT_GAME_BONUS: f64 = 1.12;
const KILL_PARTICIPATION_BONUS: f64 = 1.05;
const KILL_PARTICIPATION_THRESHOLD: f64 = 0.75;
const SUPPORT_VISION_MULTIPLIER: f64 = 1.6;

/// Tier label derived from the total
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PowerTier {
    Common,
    Uncommon,
    Rare,
    Epic,
    Mythic,
    Legendary,
}

impl PowerTier {
    /// Threshold ladder, highest first.
    const LADDER: [(i64, PowerTier); 5] = [
        (8500, PowerTier::Legendary),
        (7000, PowerTier::Mythic),
        (5500, PowerTier::Epic),
        (4000, PowerTier::Rare),
        (2500, PowerTier::Uncommon),
    ];

    #[must_use]
    pub fn from_score(score: i64) -> Self {
        Self::LADDER
            .iter()
            .find(|(threshold, _)| score >= *threshold)
            .map_or(PowerTier::Common, |(_, tier)| *tier)
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            PowerTier::Common => "COMMON",
            PowerTier::Uncommon => "UNCOMMON",
            PowerTier::Rare => "RARE",
            PowerTier::Epic => "EPIC",
            PowerTier::Mythic => "MYTHIC",
            PowerTier::Legendary => "LEGENDARY",
        }
    }
}

impl Display for PowerTier {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PowerTier {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [
            PowerTier::Common,
            PowerTier::Uncommon,
            PowerTier::Rare,
            PowerTier::Epic,
            PowerTier::Mythic,
            PowerTier::Legendary,
        ]
        .into_iter()
        .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
        .ok_or_else(|| DomainError::UnknownVariant {
            kind: "power tier",
            value: s.to_string(),
        })
    }
}

/// Score for one player in one match, with its per-dimension breakdown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PowerLevel {
    pub total: i64,
    pub tier: PowerTier,
    pub combat: i64,
    pub objectives: i64,
    pub vision: i64,
    pub economy: i64,
    pub clutch: i64,
}

impl PowerLevel {
    /// Score a metrics record.
    #[must_use]
    pub fn calculate(m: &MatchMetrics) -> Self {
        let combat = (m.kda * 250.0).min(1000.0)
            + (m.damage_per_minute * 0.9).min(1000.0)
            + (m.team_damage_percentage * 3000.0).min(1000.0);

        let objectives = ((m.dragons_killed * 250
            + m.barons_killed * 450
            + m.heralds_killed * 180
            + m.turrets_destroyed * 120
            + m.turret_plates_taken * 30) as f64)
            .min(OBJECTIVES_CAP);

        let vision_multiplier = if m.role_position == LanePosition::Utility {
            SUPPORT_VISION_MULTIPLIER
        } else {
            1.0
        };
        let vision = (((m.vision_score * 18 + m.wards_destroyed * 25) as f64) * vision_multiplier)
            .min(VISION_CAP);

        let economy = (m.gold_per_minute * 2.2
            + (m.cs_count as f64 / m.game_minutes.max(1.0)) * 12.0)
            .min(ECONOMY_CAP);

        let multikills = m.double_kills * 100
            + m.triple_kills * 300
            + m.quadra_kills * 600
            + m.penta_kills * 1000;
        let clutch = ((m.solo_kills * 150
            + m.outnumbered_kills * 200
            + m.largest_killing_spree * 80
            + multikills
            + if m.first_blood_taken { 200 } else { 0 }
            + m.flawless_aces * 400) as f64)
            .min(CLUTCH_CAP);

        let mut total = combat + objectives + vision + economy + clutch;
        if m.win {
            total *= WIN_BONUS;
        }
        if m.perfect_game || (m.deaths == 0 && m.kills > 0) {
            total *= PERFECT_GAME_BONUS;
        }
        if m.kill_participation >= KILL_PARTICIPATION_THRESHOLD {
            total *= KILL_PARTICIPATION_BONUS;
        }

        let total = clamp_score(total, MAX_POWER_LEVEL as f64);
        Self {
            total,
            tier: PowerTier::from_score(total),
            combat: clamp_score(combat, COMBAT_CAP),
            objectives: clamp_score(objectives, OBJECTIVES_CAP),
            vision: clamp_score(vision, VISION_CAP),
            economy: clamp_score(economy, ECONOMY_CAP),
            clutch: clamp_score(clutch, CLUTCH_CAP),
        }
    }
}

/// Truncate towards zero after clamping into `0..=cap`.
fn clamp_score(value: f64, cap: f64) -> i64 {
    if value.is_nan() {
        return 0;
    }
    value.clamp(0.0, cap).trunc() as i64
}
