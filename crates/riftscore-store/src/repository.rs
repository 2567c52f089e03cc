//! SQLite implementation of IPowerLevelRepository
//!
//! ## Type Mapping
//!
//! | Domain Type      | SQL Type | Strategy                                  |
//! |------------------|----------|-------------------------------------------|
//! | Puuid, MatchId   | TEXT     | `.as_str()` / `new()`                     |
//! | DateTime<Utc>    | TEXT     | ISO 8601 via `to_rfc3339()`               |
//! | PowerTier        | TEXT     | `as_str()` / `FromStr`                    |
//! | LanePosition     | TEXT     | `as_str()`                                |
//! | MatchMetrics     | TEXT     | serde_json, plus a few scalar columns     |

use std::str::FromStr;

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use riftscore_core::domain::{MatchId, MatchMetrics, PowerLevel, PowerTier, Puuid};
use riftscore_core::ports::{
    IPowerLevelRepository, Page, PlayerAccount, PlayerRecord, StoredPowerLevel,
};

use crate::StoreError;

/// SQLite-based implementation of the power level repository port
pub struct SqlitePowerLevelRepository {
    pool: SqlitePool,
}

impl SqlitePowerLevelRepository {
    /// Creates a new repository instance with the given connection pool
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

// ============================================================================
// Row conversion
// ============================================================================

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StoreError::SerializationError(format!("Invalid datetime '{}': {}", s, e)))
}

fn parse_puuid(s: String) -> Result<Puuid, StoreError> {
    Puuid::new(s).map_err(|e| StoreError::SerializationError(e.to_string()))
}

fn parse_match_id(s: String) -> Result<MatchId, StoreError> {
    MatchId::new(s).map_err(|e| StoreError::SerializationError(e.to_string()))
}

fn player_from_row(row: &SqliteRow) -> Result<PlayerRecord, StoreError> {
    let created_at: String = row.try_get("created_at")?;
    let updated_at: String = row.try_get("updated_at")?;
    Ok(PlayerRecord {
        puuid: parse_puuid(row.try_get("puuid")?)?,
        game_name: row.try_get("game_name")?,
        tag_line: row.try_get("tag_line")?,
        average_power_level: row.try_get("average_power_level")?,
        created_at: parse_datetime(&created_at)?,
        updated_at: parse_datetime(&updated_at)?,
    })
}

fn power_level_from_row(row: &SqliteRow) -> Result<StoredPowerLevel, StoreError> {
    let tier: String = row.try_get("tier")?;
    let tier =
        PowerTier::from_str(&tier).map_err(|e| StoreError::SerializationError(e.to_string()))?;
    let updated_at: String = row.try_get("updated_at")?;

    Ok(StoredPowerLevel {
        match_id: parse_match_id(row.try_get("match_id")?)?,
        puuid: parse_puuid(row.try_get("puuid")?)?,
        power_level: PowerLevel {
            total: row.try_get("total")?,
            tier,
            combat: row.try_get("combat")?,
            objectives: row.try_get("objectives")?,
            vision: row.try_get("vision")?,
            economy: row.try_get("economy")?,
            clutch: row.try_get("clutch")?,
        },
        game_start_time: row.try_get("game_start_time")?,
        updated_at: parse_datetime(&updated_at)?,
    })
}

// ============================================================================
// IPowerLevelRepository implementation
// ============================================================================

#[async_trait::async_trait]
impl IPowerLevelRepository for SqlitePowerLevelRepository {
    // --- players ---

    async fn user_exists(&self, puuid: &Puuid) -> anyhow::Result<bool> {
        let found: Option<i64> = sqlx::query_scalar("SELECT 1 FROM users WHERE puuid = ?")
            .bind(puuid.as_str())
            .fetch_optional(&self.pool)
            .await?;
        Ok(found.is_some())
    }

    async fn insert_user(&self, account: &PlayerAccount) -> anyhow::Result<()> {
        let now = Utc::now().to_rfc3339();
        sqlx::query(
            "INSERT INTO users (puuid, game_name, tag_line, average_power_level, created_at, updated_at) \
             VALUES (?, ?, ?, NULL, ?, ?) \
             ON CONFLICT(puuid) DO NOTHING",
        )
        .bind(account.puuid.as_str())
        .bind(&account.game_name)
        .bind(&account.tag_line)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        tracing::trace!(puuid = %account.puuid, "Inserted user");
        Ok(())
    }

    async fn get_user(&self, puuid: &Puuid) -> anyhow::Result<Option<PlayerRecord>> {
        let row = sqlx::query("SELECT * FROM users WHERE puuid = ?")
            .bind(puuid.as_str())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(ref r) => Ok(Some(player_from_row(r)?)),
            None => Ok(None),
        }
    }

    async fn update_average_power_level(&self, puuid: &Puuid) -> anyhow::Result<Option<f64>> {
        let average: Option<f64> =
            sqlx::query_scalar("SELECT AVG(total) FROM power_levels WHERE puuid = ?")
                .bind(puuid.as_str())
                .fetch_one(&self.pool)
                .await?;

        sqlx::query("UPDATE users SET average_power_level = ?, updated_at = ? WHERE puuid = ?")
            .bind(average)
            .bind(Utc::now().to_rfc3339())
            .bind(puuid.as_str())
            .execute(&self.pool)
            .await?;

        tracing::debug!(puuid = %puuid, average = ?average, "Updated average power level");
        Ok(average)
    }

    // --- metrics ---

    async fn save_metrics(&self, metrics: &MatchMetrics) -> anyhow::Result<()> {
        let json = serde_json::to_string(metrics).map_err(|e| {
            StoreError::SerializationError(format!("Failed to serialize metrics: {}", e))
        })?;

        sqlx::query(
            "INSERT INTO power_level_metrics \
             (match_id, puuid, champion_name, role_position, win, kills, deaths, assists, \
              kda, game_start_time, metrics, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?) \
             ON CONFLICT(match_id, puuid) DO UPDATE SET \
              champion_name = excluded.champion_name, \
              role_position = excluded.role_position, \
              win = excluded.win, \
              kills = excluded.kills, \
              deaths = excluded.deaths, \
              assists = excluded.assists, \
              kda = excluded.kda, \
              game_start_time = excluded.game_start_time, \
              metrics = excluded.metrics, \
              updated_at = excluded.updated_at",
        )
        .bind(metrics.match_id.as_str())
        .bind(metrics.puuid.as_str())
        .bind(&metrics.champion_name)
        .bind(metrics.role_position.as_str())
        .bind(metrics.win)
        .bind(metrics.kills)
        .bind(metrics.deaths)
        .bind(metrics.assists)
        .bind(metrics.kda)
        .bind(metrics.game_start_time)
        .bind(&json)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        tracing::trace!(match_id = %metrics.match_id, puuid = %metrics.puuid, "Saved metrics");
        Ok(())
    }

    async fn get_match_metrics(
        &self,
        puuid: &Puuid,
        match_id: &MatchId,
    ) -> anyhow::Result<Option<MatchMetrics>> {
        let json: Option<String> = sqlx::query_scalar(
            "SELECT metrics FROM power_level_metrics WHERE puuid = ? AND match_id = ?",
        )
        .bind(puuid.as_str())
        .bind(match_id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        match json {
            Some(json) => {
                let metrics = serde_json::from_str(&json).map_err(|e| {
                    StoreError::SerializationError(format!("Failed to parse metrics: {}", e))
                })?;
                Ok(Some(metrics))
            }
            None => Ok(None),
        }
    }

    // --- power levels ---

    async fn save_power_level(
        &self,
        match_id: &MatchId,
        puuid: &Puuid,
        power_level: &PowerLevel,
    ) -> anyhow::Result<()> {
        sqlx::query(
            "INSERT INTO power_levels \
             (match_id, puuid, total, tier, combat, objectives, vision, economy, clutch, \
              game_start_time, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, \
              (SELECT game_start_time FROM power_level_metrics WHERE match_id = ? AND puuid = ?), ?) \
             ON CONFLICT(match_id, puuid) DO UPDATE SET \
              total = excluded.total, \
              tier = excluded.tier, \
              combat = excluded.combat, \
              objectives = excluded.objectives, \
              vision = excluded.vision, \
              economy = excluded.economy, \
              clutch = excluded.clutch, \
              game_start_time = excluded.game_start_time, \
              updated_at = excluded.updated_at",
        )
        .bind(match_id.as_str())
        .bind(puuid.as_str())
        .bind(power_level.total)
        .bind(power_level.tier.as_str())
        .bind(power_level.combat)
        .bind(power_level.objectives)
        .bind(power_level.vision)
        .bind(power_level.economy)
        .bind(power_level.clutch)
        .bind(match_id.as_str())
        .bind(puuid.as_str())
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        tracing::trace!(
            match_id = %match_id,
            puuid = %puuid,
            total = power_level.total,
            "Saved power level"
        );
        Ok(())
    }

    async fn get_power_levels(
        &self,
        puuid: &Puuid,
        page: Page,
    ) -> anyhow::Result<Vec<StoredPowerLevel>> {
        let rows = sqlx::query(
            "SELECT * FROM power_levels WHERE puuid = ? \
             ORDER BY game_start_time IS NULL, game_start_time DESC, match_id DESC \
             LIMIT ? OFFSET ?",
        )
        .bind(puuid.as_str())
        .bind(i64::from(page.limit))
        .bind(i64::from(page.skip))
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|r| power_level_from_row(r).map_err(Into::into))
            .collect()
    }

    async fn get_match_power_level(
        &self,
        puuid: &Puuid,
        match_id: &MatchId,
    ) -> anyhow::Result<Option<StoredPowerLevel>> {
        let row = sqlx::query("SELECT * FROM power_levels WHERE puuid = ? AND match_id = ?")
            .bind(puuid.as_str())
            .bind(match_id.as_str())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(ref r) => Ok(Some(power_level_from_row(r)?)),
            None => Ok(None),
        }
    }

    async fn count_power_levels(&self, puuid: &Puuid) -> anyhow::Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM power_levels WHERE puuid = ?")
            .bind(puuid.as_str())
            .fetch_one(&self.pool)
            .await?;
        Ok(count.max(0) as u64)
    }

    async fn best_power_level(&self, puuid: &Puuid) -> anyhow::Result<Option<StoredPowerLevel>> {
        let row = sqlx::query(
            "SELECT * FROM power_levels WHERE puuid = ? \
             ORDER BY total DESC, game_start_time DESC LIMIT 1",
        )
        .bind(puuid.as_str())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(ref r) => Ok(Some(power_level_from_row(r)?)),
            None => Ok(None),
        }
    }
}
