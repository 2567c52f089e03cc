//! Score command - Turn stored match segments into power levels
//!
//! Provides the `riftscore score` CLI command which:
//! 1. Opens the bulk storage and the database
//! 2. Scores every stored match segment of the player
//! 3. Prints per-segment counts and the refreshed average

use anyhow::{Context, Result};
use clap::Args;
use riftscore_core::{domain::Puuid, usecases::ScoreSegmentUseCase};
use tracing::info;

use super::context::CliContext;
use crate::output::plural;

#[derive(Debug, Args)]
pub struct ScoreCommand {
    /// Player whose stored segments to score
    #[arg(long)]
    pub puuid: String,
}

impl ScoreCommand {
    pub async fn execute(&self, ctx: &CliContext) -> Result<()> {
        let formatter = ctx.formatter();
        let puuid = Puuid::new(self.puuid.clone()).context("Invalid PUUID")?;

        let usecase = ScoreSegmentUseCase::new(
            ctx.bulk_storage(),
            ctx.repository().await?,
            ctx.riot_api()?,
        );

        let prefix = format!("{}/", ctx.config.ingestion.key_prefix);
        info!(%puuid, prefix = %prefix, "Scoring stored segments");
        let reports = usecase.score_player(&prefix, &puuid).await?;

        let scored: usize = reports.iter().map(|r| r.scored.len()).sum();
        let skipped: usize = reports.iter().map(|r| r.skipped.len()).sum();
        ctx.metrics.record_scored("scored", scored as u64);
        ctx.metrics.record_scored("skipped", skipped as u64);
        let average = reports.last().and_then(|r| r.average_power_level);

        if ctx.is_json() {
            let json = serde_json::json!({
                "puuid": puuid,
                "segments": reports.len(),
                "scored": scored,
                "skipped": skipped,
                "average_power_level": average,
                "reports": reports,
            });
            formatter.print_json(&json);
            return Ok(());
        }

        if reports.is_empty() {
            formatter.warn(&format!(
                "No stored segments for {} under {}. Run 'riftscore download --puuid {}' first.",
                puuid, prefix, puuid
            ));
            return Ok(());
        }

        formatter.success(&format!(
            "Scored {} match{} from {} segment{}",
            scored,
            if scored == 1 { "" } else { "es" },
            reports.len(),
            plural(reports.len())
        ));
        for report in &reports {
            formatter.info(&format!(
                "{}: {} scored, {} skipped",
                report.key,
                report.scored.len(),
                report.skipped.len()
            ));
            for skip in &report.skipped {
                formatter.info(&format!(
                    "  - #{} {}: {}",
                    skip.index,
                    skip.match_id.as_deref().unwrap_or("?"),
                    skip.reason
                ));
            }
        }
        if let Some(avg) = average {
            formatter.info(&format!("Average power level: {:.0}", avg));
        }
        if skipped > 0 {
            formatter.warn(&format!("{} document{} skipped", skipped, plural(skipped)));
        }

        Ok(())
    }
}
