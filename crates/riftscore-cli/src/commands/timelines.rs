//! Timelines command - Store the timelines of a player's recent matches

use anyhow::{Context, Result};
use clap::Args;
use riftscore_core::domain::Puuid;
use tracing::info;

use super::{context::CliContext, download::print_reports};

#[derive(Debug, Args)]
pub struct TimelinesCommand {
    /// Player whose matches to fetch
    #[arg(long)]
    pub puuid: String,

    /// Number of most recent matches
    #[arg(long, default_value_t = 10)]
    pub count: u32,
}

impl TimelinesCommand {
    pub async fn execute(&self, ctx: &CliContext) -> Result<()> {
        let puuid = Puuid::new(self.puuid.clone()).context("Invalid PUUID")?;
        let ingestor = ctx.ingestor(ctx.riot_api()?);

        info!(%puuid, count = self.count, "Downloading recent timelines");
        let report = ingestor.ingest_recent_timelines(&puuid, self.count).await;
        print_reports(ctx, std::slice::from_ref(&report))
    }
}
