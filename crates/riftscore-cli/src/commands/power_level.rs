//! Power level command - Show a player's stored power levels

use anyhow::{Context, Result};
use clap::Args;
use riftscore_core::{
    domain::{MatchId, Puuid},
    ports::{IPowerLevelRepository, Page, StoredPowerLevel},
    usecases::PlayerSummaryUseCase,
};

use super::context::CliContext;
use crate::output::OutputFormatter;

#[derive(Debug, Args)]
pub struct PowerLevelCommand {
    /// Player to show
    #[arg(long)]
    pub puuid: String,

    /// Show a single match instead of the summary
    #[arg(long)]
    pub match_id: Option<String>,

    /// Number of recent matches to list
    #[arg(long, default_value_t = 10)]
    pub limit: u32,

    /// Number of recent matches to skip
    #[arg(long, default_value_t = 0)]
    pub skip: u32,
}

impl PowerLevelCommand {
    pub async fn execute(&self, ctx: &CliContext) -> Result<()> {
        let puuid = Puuid::new(self.puuid.clone()).context("Invalid PUUID")?;
        let repo = ctx.repository().await?;

        match self.match_id {
            Some(ref id) => {
                let match_id = MatchId::new(id.clone()).context("Invalid match ID")?;
                self.show_match(ctx, repo.as_ref(), &puuid, &match_id).await
            }
            None => {
                let summary = PlayerSummaryUseCase::new(repo)
                    .execute(&puuid, Page::new(self.limit, self.skip))
                    .await?;
                let formatter = ctx.formatter();

                if ctx.is_json() {
                    formatter.print_json(&serde_json::to_value(&summary)?);
                    return Ok(());
                }

                if summary.matches_scored == 0 {
                    formatter.warn(&format!(
                        "No power levels stored for {}. Run 'riftscore score --puuid {}' first.",
                        puuid, puuid
                    ));
                    return Ok(());
                }

                formatter.success(&format!(
                    "{} ({} matches scored)",
                    summary.riot_id.as_deref().unwrap_or(puuid.as_str()),
                    summary.matches_scored
                ));
                if let (Some(avg), Some(tier)) =
                    (summary.average_power_level, summary.average_tier)
                {
                    formatter.info(&format!("Average: {:.0} ({})", avg, tier.as_str()));
                }
                if let Some(ref best) = summary.best {
                    formatter.info(&format!(
                        "Best:    {} ({}) in {}",
                        best.power_level.total,
                        best.power_level.tier.as_str(),
                        best.match_id
                    ));
                }
                formatter.info("");
                for level in &summary.recent {
                    print_level(formatter.as_ref(), level);
                }
                Ok(())
            }
        }
    }

    async fn show_match(
        &self,
        ctx: &CliContext,
        repo: &dyn IPowerLevelRepository,
        puuid: &Puuid,
        match_id: &MatchId,
    ) -> Result<()> {
        let formatter = ctx.formatter();
        let level = repo
            .get_match_power_level(puuid, match_id)
            .await
            .context("Failed to load power level")?;
        let metrics = repo
            .get_match_metrics(puuid, match_id)
            .await
            .context("Failed to load match metrics")?;

        let Some(level) = level else {
            formatter.error(&format!("No power level stored for {} in {}", puuid, match_id));
            return Ok(());
        };

        if ctx.is_json() {
            let json = serde_json::json!({
                "power_level": level,
                "metrics": metrics,
            });
            formatter.print_json(&json);
            return Ok(());
        }

        print_level(formatter.as_ref(), &level);
        let pl = &level.power_level;
        let mut fields = vec![
            ("combat", format!("{:>5}", pl.combat)),
            ("objectives", format!("{:>5}", pl.objectives)),
            ("vision", format!("{:>5}", pl.vision)),
            ("economy", format!("{:>5}", pl.economy)),
            ("clutch", format!("{:>5}", pl.clutch)),
        ];
        if let Some(m) = metrics {
            fields.push((
                "game",
                format!(
                    "{} {} {}/{}/{} ({})",
                    m.champion_name,
                    m.role_position,
                    m.kills,
                    m.deaths,
                    m.assists,
                    if m.win { "win" } else { "loss" }
                ),
            ));
        }
        formatter.fields(&fields);
        Ok(())
    }
}

fn print_level(formatter: &dyn OutputFormatter, level: &StoredPowerLevel) {
    let played = level
        .game_start_time
        .and_then(|secs| chrono::DateTime::from_timestamp(secs, 0))
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "unknown".to_string());
    formatter.info(&format!(
        "{:<16} {}  {:>5} {}",
        level.match_id.as_str(),
        played,
        level.power_level.total,
        level.power_level.tier.as_str()
    ));
}
