//! Per-match player metrics.
//!
//! [`MatchMetrics::extract`] flattens one participant's statistics block into
//! the record persisted next to every power level and consumed by the
//! scoring function.

use serde::{Deserialize, Serialize};

use super::errors::DomainError;
use super::league::LanePosition;
use super::match_document::MatchDocument;
use super::newtypes::{MatchId, Puuid};

/// Flat metrics record for one player in one match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchMetrics {
    // identity
    pub match_id: MatchId,
    pub puuid: Puuid,
    pub champion_name: String,
    pub role_position: LanePosition,
    pub champ_level: i64,

    // game context
    pub game_duration: i64,
    pub game_minutes: f64,
    pub game_start_time: i64,
    pub win: bool,

    // core
    pub kills: i64,
    pub deaths: i64,
    pub assists: i64,
    pub kda: f64,

    // damage
    pub total_damage_dealt: i64,
    pub total_damage_taken: i64,
    pub damage_per_minute: f64,
    pub team_damage_percentage: f64,
    pub damage_taken_on_team_percentage: f64,

    // economy
    pub total_gold: i64,
    pub gold_per_minute: f64,
    pub cs_count: i64,

    // vision
    pub vision_score: i64,
    pub wards_placed: i64,
    pub wards_destroyed: i64,
    pub vision_score_per_minute: f64,

    // objectives
    pub dragons_killed: i64,
    pub barons_killed: i64,
    pub heralds_killed: i64,
    pub turrets_destroyed: i64,
    pub turret_plates_taken: i64,

    // mechanics
    pub skillshots_hit: i64,
    pub skillshot_accuracy: f64,
    pub skillshots_dodged: i64,
    pub immobilize_and_kill: i64,

    // clutch
    pub solo_kills: i64,
    pub outnumbered_kills: i64,
    pub double_kills: i64,
    pub triple_kills: i64,
    pub quadra_kills: i64,
    pub penta_kills: i64,
    pub killing_sprees: i64,
    pub largest_killing_spree: i64,
    pub first_blood_taken: bool,
    pub first_blood_assist: bool,

    // teamwork
    pub kill_participation: f64,
    pub full_team_takedowns: i64,
    pub save_ally_from_death: i64,
    pub pick_kill_with_ally: i64,
    pub kill_after_hidden: i64,

    // survivability
    pub longest_time_living: i64,
    pub time_spent_dead: i64,
    pub survived_three_immobilizes: i64,
    pub deaths_by_enemy_champs: i64,

    // control
    pub time_ccing_others: i64,
    pub enemy_immobilizations: i64,

    // progression
    pub legendary_items_count: i64,
    pub max_level_lead: i64,
    pub takedowns_first_10min: i64,
    pub early_laning_advantage: f64,

    // special
    pub flawless_aces: i64,
    pub perfect_game: bool,
}

impl MatchMetrics {
    /// Extract the metrics of `puuid` from a match document.
    ///
    /// The role comes from the participant's `teamPosition`; when that is
    /// missing or unrecognised the participant's slot (`index % 5`) is used.
    ///
    /// # Errors
    /// Fails if the match ID is invalid, the player is not in the match, or
    /// the document's participant blocks are inconsistent.
    pub fn extract(doc: &MatchDocument, puuid: &Puuid) -> Result<Self, DomainError> {
        let match_id = MatchId::new(doc.metadata.match_id.clone())?;
        let (index, p) = doc.participant(puuid)?;
        let c = &p.challenges;

        let role_position = p
            .team_position
            .as_deref()
            .and_then(|pos| pos.parse::<LanePosition>().ok())
            .unwrap_or_else(|| LanePosition::from_participant_index(index));

        let game_duration = doc.info.game_duration;
        let skill_total = (c.skillshots_hit + c.skillshots_dodged).max(1);

        Ok(Self {
            match_id,
            puuid: puuid.clone(),
            champion_name: p.champion_name.clone(),
            role_position,
            champ_level: p.champ_level,

            game_duration,
            game_minutes: game_duration as f64 / 60.0,
            game_start_time: doc.start_time_secs(),
            win: p.win,

            kills: p.kills,
            deaths: p.deaths,
            assists: p.assists,
            kda: (p.kills + p.assists) as f64 / p.deaths.max(1) as f64,

            total_damage_dealt: p.total_damage_dealt_to_champions,
            total_damage_taken: p.total_damage_taken,
            damage_per_minute: c.damage_per_minute,
            team_damage_percentage: c.team_damage_percentage,
            damage_taken_on_team_percentage: c.damage_taken_on_team_percentage,

            total_gold: p.gold_earned,
            gold_per_minute: c.gold_per_minute,
            cs_count: p.total_minions_killed
                + p.total_ally_jungle_minions_killed
                + p.total_enemy_jungle_minions_killed,

            vision_score: p.vision_score,
            wards_placed: p.wards_placed,
            wards_destroyed: p.wards_killed,
            vision_score_per_minute: c.vision_score_per_minute,

            dragons_killed: c.dragon_takedowns,
            barons_killed: c.baron_takedowns,
            heralds_killed: c.rift_herald_takedowns,
            turrets_destroyed: c.turret_takedowns,
            turret_plates_taken: c.turret_plates_taken,

            skillshots_hit: c.skillshots_hit,
            skillshot_accuracy: c.skillshots_hit as f64 / skill_total as f64,
            skillshots_dodged: c.skillshots_dodged,
            immobilize_and_kill: c.immobilize_and_kill_with_ally,

            solo_kills: c.solo_kills,
            outnumbered_kills: c.outnumbered_kills,
            double_kills: p.double_kills,
            triple_kills: p.triple_kills,
            quadra_kills: p.quadra_kills,
            penta_kills: p.penta_kills,
            killing_sprees: p.killing_sprees,
            largest_killing_spree: p.largest_killing_spree,
            first_blood_taken: p.first_blood_kill,
            first_blood_assist: p.first_blood_assist,

            kill_participation: c.kill_participation,
            full_team_takedowns: c.full_team_takedown,
            save_ally_from_death: c.save_ally_from_death,
            pick_kill_with_ally: c.pick_kill_with_ally,
            kill_after_hidden: c.kill_after_hidden_with_ally,

            longest_time_living: p.longest_time_spent_living,
            time_spent_dead: p.total_time_spent_dead,
            survived_three_immobilizes: c.survived_three_immobilizes_in_fight,
            deaths_by_enemy_champs: c.deaths_by_enemy_champs,

            time_ccing_others: p.time_ccing_others,
            enemy_immobilizations: c.enemy_champion_immobilizations,

            legendary_items_count: c
                .legendary_item_used
                .as_ref()
                .map_or(0, |items| items.len() as i64),
            max_level_lead: c.max_level_lead_lane_opponent,
            takedowns_first_10min: c.takedowns_first_x_minutes,
            early_laning_advantage: c.early_laning_phase_gold_exp_advantage,

            flawless_aces: c.flawless_aces,
            perfect_game: c.perfect_game != 0,
        })
    }

    #[must_use]
    pub fn total_multikills(&self) -> i64 {
        self.double_kills + self.triple_kills + self.quadra_kills + self.penta_kills
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::domain::match_document::fixtures::match_json;

    fn puuid(s: &str) -> Puuid {
        Puuid::new(s.to_string()).unwrap()
    }

    #[test]
    fn extracts_core_fields_and_derivations() {
        let doc = MatchDocument::from_value(match_json("NA1_42", "me", 2)).unwrap();
        let m = MatchMetrics::extract(&doc, &puuid("me")).unwrap();

        assert_eq!(m.match_id.as_str(), "NA1_42");
        assert_eq!(m.role_position, LanePosition::Middle);
        assert_eq!(m.kills, 8);
        assert!((m.kda - 9.0).abs() < 1e-9);
        assert!((m.skillshot_accuracy - 0.75).abs() < 1e-9);
        assert_eq!(m.cs_count, 200);
        assert!((m.game_minutes - 30.0).abs() < 1e-9);
        assert_eq!(m.game_start_time, 1_700_000_060);
        assert_eq!(m.legendary_items_count, 3);
        assert_eq!(m.dragons_killed, 2);
        assert!(m.first_blood_taken);
        assert!(!m.perfect_game);
        assert_eq!(m.total_multikills(), 3);
    }

    #[test]
    fn zero_deaths_kda_divides_by_one() {
        let mut value = match_json("NA1_1", "me", 0);
        value["info"]["participants"][0]["deaths"] = json!(0);
        let doc = MatchDocument::from_value(value).unwrap();
        let m = MatchMetrics::extract(&doc, &puuid("me")).unwrap();
        assert!((m.kda - 18.0).abs() < 1e-9);
    }

    #[test]
    fn skillshot_accuracy_without_attempts_is_zero() {
        let mut value = match_json("NA1_1", "me", 0);
        value["info"]["participants"][0]["challenges"]["skillshotsHit"] = json!(0);
        value["info"]["participants"][0]["challenges"]["skillshotsDodged"] = json!(0);
        let doc = MatchDocument::from_value(value).unwrap();
        let m = MatchMetrics::extract(&doc, &puuid("me")).unwrap();
        assert_eq!(m.skillshot_accuracy, 0.0);
    }

    #[test]
    fn role_falls_back_to_participant_slot() {
        let mut value = match_json("NA1_1", "me", 9);
        value["info"]["participants"][9]["teamPosition"] = json!("");
        let doc = MatchDocument::from_value(value).unwrap();
        let m = MatchMetrics::extract(&doc, &puuid("me")).unwrap();
        assert_eq!(m.role_position, LanePosition::Utility);
    }

    #[test]
    fn perfect_game_flag_maps_to_bool() {
        let mut value = match_json("NA1_1", "me", 0);
        value["info"]["participants"][0]["challenges"]["perfectGame"] = json!(1);
        let doc = MatchDocument::from_value(value).unwrap();
        assert!(MatchMetrics::extract(&doc, &puuid("me")).unwrap().perfect_game);
    }

    #[test]
    fn invalid_match_id_is_rejected() {
        let doc = MatchDocument::from_value(match_json("garbage", "me", 0)).unwrap();
        let err = MatchMetrics::extract(&doc, &puuid("me")).unwrap_err();
        assert!(matches!(err, DomainError::InvalidMatchId(_)));
    }
}
