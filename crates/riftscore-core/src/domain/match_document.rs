//! Typed view of a match document as returned by the match endpoint.
//!
//! Only the fields the metrics pipeline reads are modelled; everything else
//! in the upstream JSON is ignored on deserialization. Participant and
//! challenge counters default to zero when absent, since older documents and
//! remakes omit whole blocks.

use serde::{Deserialize, Serialize};

use super::errors::DomainError;
use super::newtypes::Puuid;

/// One match document (`metadata` + `info`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchDocument {
    pub metadata: MatchMetadata,
    pub info: MatchInfo,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchMetadata {
    pub match_id: String,
    /// Participant PUUIDs in the same order as `info.participants`
    #[serde(default)]
    pub participants: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchInfo {
    /// Game length in seconds
    #[serde(default)]
    pub game_duration: i64,
    /// Lobby creation time, epoch milliseconds
    #[serde(default)]
    pub game_creation: i64,
    /// Game start time, epoch milliseconds
    #[serde(default)]
    pub game_start_timestamp: Option<i64>,
    #[serde(default)]
    pub participants: Vec<Participant>,
}

/// Per-player statistics block
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Participant {
    pub puuid: Option<String>,
    pub champion_name: String,
    pub champ_level: i64,
    /// Lane assigned by the matchmaker; empty in remakes and some queues
    pub team_position: Option<String>,
    pub win: bool,

    pub kills: i64,
    pub deaths: i64,
    pub assists: i64,
    pub double_kills: i64,
    pub triple_kills: i64,
    pub quadra_kills: i64,
    pub penta_kills: i64,
    pub killing_sprees: i64,
    pub largest_killing_spree: i64,
    pub first_blood_kill: bool,
    pub first_blood_assist: bool,

    pub total_damage_dealt_to_champions: i64,
    pub total_damage_taken: i64,
    pub gold_earned: i64,
    pub total_minions_killed: i64,
    pub total_ally_jungle_minions_killed: i64,
    pub total_enemy_jungle_minions_killed: i64,

    pub vision_score: i64,
    pub wards_placed: i64,
    pub wards_killed: i64,

    pub longest_time_spent_living: i64,
    pub total_time_spent_dead: i64,
    #[serde(rename = "timeCCingOthers")]
    pub time_ccing_others: i64,

    pub challenges: Challenges,
}

/// The `challenges` sub-object; every field defaults to zero
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Challenges {
    pub rift_herald_takedowns: i64,
    pub baron_takedowns: i64,
    pub dragon_takedowns: i64,
    pub turret_takedowns: i64,
    pub turret_plates_taken: i64,
    pub vision_score_per_minute: f64,

    pub skillshots_hit: i64,
    pub skillshots_dodged: i64,
    pub immobilize_and_kill_with_ally: i64,

    pub solo_kills: i64,
    pub outnumbered_kills: i64,

    pub kill_participation: f64,
    pub full_team_takedown: i64,
    pub save_ally_from_death: i64,
    pub pick_kill_with_ally: i64,
    pub kill_after_hidden_with_ally: i64,

    pub damage_per_minute: f64,
    pub gold_per_minute: f64,
    pub team_damage_percentage: f64,
    pub damage_taken_on_team_percentage: f64,

    pub deaths_by_enemy_champs: i64,
    pub survived_three_immobilizes_in_fight: i64,

    pub legendary_item_used: Option<Vec<i64>>,
    pub max_level_lead_lane_opponent: i64,
    pub takedowns_first_x_minutes: i64,
    pub early_laning_phase_gold_exp_advantage: f64,

    pub enemy_champion_immobilizations: i64,

    pub flawless_aces: i64,
    pub perfect_game: i64,
}

impl MatchDocument {
    /// Parse a raw JSON value into a typed document.
    ///
    /// # Errors
    /// Returns [`DomainError::MalformedMatch`] when required blocks are missing.
    pub fn from_value(value: serde_json::Value) -> Result<Self, DomainError> {
        serde_json::from_value(value).map_err(|e| DomainError::MalformedMatch(e.to_string()))
    }

    #[must_use]
    pub fn match_id(&self) -> &str {
        &self.metadata.match_id
    }

    /// Position of `puuid` in the participant list, if present.
    #[must_use]
    pub fn participant_index(&self, puuid: &Puuid) -> Option<usize> {
        self.metadata
            .participants
            .iter()
            .position(|p| p == puuid.as_str())
    }

    /// Locate a player's statistics block.
    ///
    /// # Errors
    /// - [`DomainError::PlayerNotInMatch`] when the PUUID is not listed
    /// - [`DomainError::MalformedMatch`] when `metadata` and `info` disagree
    pub fn participant(&self, puuid: &Puuid) -> Result<(usize, &Participant), DomainError> {
        let index = self
            .participant_index(puuid)
            .ok_or_else(|| DomainError::PlayerNotInMatch {
                puuid: puuid.to_string(),
                match_id: self.metadata.match_id.clone(),
            })?;

        let participant = self.info.participants.get(index).ok_or_else(|| {
            DomainError::MalformedMatch(format!(
                "{} lists {} participant ids but only {} stat blocks",
                self.metadata.match_id,
                self.metadata.participants.len(),
                self.info.participants.len()
            ))
        })?;

        if let Some(ref id) = participant.puuid {
            if id != puuid.as_str() {
                return Err(DomainError::MalformedMatch(format!(
                    "{}: participant {index} is {id}, expected {puuid}",
                    self.metadata.match_id
                )));
            }
        }

        Ok((index, participant))
    }

    /// Start time in epoch seconds, falling back to the creation time.
    #[must_use]
    pub fn start_time_secs(&self) -> i64 {
        self.info
            .game_start_timestamp
            .unwrap_or(self.info.game_creation)
            / 1000
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use serde_json::{json, Value};

    /// Ten-player document where `target` sits at `index`.
    pub fn match_json(match_id: &str, target: &str, index: usize) -> Value {
        let ids: Vec<String> = (0..10)
            .map(|i| {
                if i == index {
                    target.to_string()
                } else {
                    format!("other-{i}")
                }
            })
            .collect();
        let lanes = ["TOP", "JUNGLE", "MIDDLE", "BOTTOM", "UTILITY"];
        let participants: Vec<Value> = ids
            .iter()
            .enumerate()
            .map(|(i, id)| {
                let challenges = json!({
                    "riftHeraldTakedowns": 1,
                    "baronTakedowns": 1,
                    "dragonTakedowns": 2,
                    "turretTakedowns": 3,
                    "turretPlatesTaken": 2,
                    "visionScorePerMinute": 1.0,
                    "skillshotsHit": 60,
                    "skillshotsDodged": 20,
                    "soloKills": 2,
                    "outnumberedKills": 1,
                    "killParticipation": 0.6,
                    "damagePerMinute": 833.3,
                    "goldPerMinute": 400.0,
                    "teamDamagePercentage": 0.3,
                    "legendaryItemUsed": [3089, 3157, 4645],
                    "flawlessAces": 0,
                    "perfectGame": 0
                });
                json!({
                    "puuid": id,
                    "championName": "Ahri",
                    "champLevel": 16,
                    "teamPosition": lanes[i % 5],
                    "win": i < 5,
                    "kills": 8,
                    "deaths": 2,
                    "assists": 10,
                    "doubleKills": 2,
                    "tripleKills": 1,
                    "quadraKills": 0,
                    "pentaKills": 0,
                    "killingSprees": 2,
                    "largestKillingSpree": 5,
                    "firstBloodKill": true,
                    "firstBloodAssist": false,
                    "totalDamageDealtToChampions": 25000,
                    "totalDamageTaken": 18000,
                    "goldEarned": 12000,
                    "totalMinionsKilled": 180,
                    "totalAllyJungleMinionsKilled": 12,
                    "totalEnemyJungleMinionsKilled": 8,
                    "visionScore": 30,
                    "wardsPlaced": 12,
                    "wardsKilled": 4,
                    "longestTimeSpentLiving": 600,
                    "totalTimeSpentDead": 45,
                    "timeCCingOthers": 20,
                    "challenges": challenges
                })
            })
            .collect();
        json!({
            "metadata": { "matchId": match_id, "participants": ids },
            "info": {
                "gameDuration": 1800,
                "gameCreation": 1_700_000_000_000i64,
                "gameStartTimestamp": 1_700_000_060_000i64,
                "participants": participants
            }
        })
    }
}
