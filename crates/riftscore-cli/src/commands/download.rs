//! Download command - Ingest match history into bulk segments
//!
//! Provides the `riftscore download` CLI command which:
//! 1. Builds the rate-limited Riot API client from configuration
//! 2. Ingests one player (`--puuid`) or the top of a ladder (`--top`)
//! 3. Prints one report per player and fails when any batch failed

use anyhow::{bail, Context, Result};
use clap::{ArgGroup, Args};
use riftscore_core::domain::{LeagueDivision, LeagueQueue, LeagueTier, Puuid};
use riftscore_riot::IngestReport;
use tracing::info;

use super::context::CliContext;
use crate::output::plural;

#[derive(Debug, Args)]
#[command(group(ArgGroup::new("target").required(true).args(["puuid", "top"])))]
pub struct DownloadCommand {
    /// Download the match history of one player
    #[arg(long)]
    pub puuid: Option<String>,

    /// Download the match history of the top N players of a ladder
    #[arg(long, requires = "tier")]
    pub top: Option<usize>,

    /// Ladder tier (IRON ... CHALLENGER)
    #[arg(long, requires = "top")]
    pub tier: Option<LeagueTier>,

    /// Ladder division (I-IV), required below MASTER
    #[arg(long, requires = "top")]
    pub division: Option<LeagueDivision>,

    /// Ranked queue
    #[arg(long, default_value = "RANKED_SOLO_5x5")]
    pub queue: LeagueQueue,
}

impl DownloadCommand {
    pub async fn execute(&self, ctx: &CliContext) -> Result<()> {
        let formatter = ctx.formatter();
        let api = ctx.riot_api()?;
        let ingestor = ctx.ingestor(api);

        let reports = match (&self.puuid, self.top, self.tier) {
            (Some(puuid), _, _) => {
                let puuid = Puuid::new(puuid.clone()).context("Invalid PUUID")?;
                info!(%puuid, "Downloading match history");
                vec![ingestor.ingest_player(&puuid).await]
            }
            (None, Some(n), Some(tier)) => {
                formatter.info(&format!(
                    "Resolving top {} {} player{}...",
                    n,
                    tier,
                    plural(n)
                ));
                ingestor
                    .ingest_top_players(n, self.queue, tier, self.division)
                    .await
                    .context("Failed to read the ladder")?
            }
            _ => bail!("Either --puuid or --top with --tier is required"),
        };

        print_reports(ctx, &reports)
    }
}

/// Prints ingest reports and turns any failed batch into an error.
pub(crate) fn print_reports(ctx: &CliContext, reports: &[IngestReport]) -> Result<()> {
    let formatter = ctx.formatter();
    let failed = reports.iter().filter(|r| !r.is_success()).count();

    if ctx.is_json() {
        let json = serde_json::json!({
            "success": failed == 0,
            "reports": reports,
        });
        formatter.print_json(&json);
    } else {
        for report in reports {
            let elapsed = report.finished_at - report.started_at;
            match report.failure {
                None => formatter.success(&format!(
                    "{}: {} document{} in {} segment{} ({:?}, {:.1}s)",
                    report.puuid,
                    report.documents,
                    plural(report.documents),
                    report.segments.len(),
                    plural(report.segments.len()),
                    report.stop_reason,
                    elapsed.num_milliseconds() as f64 / 1000.0
                )),
                Some(ref failure) => {
                    formatter.error(&format!(
                        "{}: segment {} failed at {}: {}",
                        report.puuid, failure.segment_index, failure.stage, failure.error
                    ));
                    formatter.info(&format!(
                        "{} segment{} written before the failure",
                        report.segments.len(),
                        plural(report.segments.len())
                    ));
                }
            }
            for key in &report.segments {
                formatter.info(&format!("  - {}", key));
            }
        }
    }

    if failed > 0 {
        bail!(
            "{} of {} ingest batch{} failed",
            failed,
            reports.len(),
            if reports.len() == 1 { "" } else { "es" }
        );
    }
    Ok(())
}
