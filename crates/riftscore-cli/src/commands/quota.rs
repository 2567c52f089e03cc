//! Quota command - Probe the upstream and show the learned quota windows
//!
//! Makes one call to the challenger ladder of the solo queue (it needs no
//! player) through the normal retry loop, then prints the windows parsed
//! from the rate-limit header together with the retry trace of the call.

use anyhow::{Context, Result};
use clap::Args;
use riftscore_core::domain::{LeagueQueue, LeagueTier};

use super::context::CliContext;

#[derive(Debug, Args)]
pub struct QuotaCommand {}

impl QuotaCommand {
    pub async fn execute(&self, ctx: &CliContext) -> Result<()> {
        let formatter = ctx.formatter();
        let api = ctx.riot_api()?;
        let client = api.client();

        let url = api
            .endpoints()
            .apex_league(LeagueQueue::RankedSolo5x5, LeagueTier::Challenger)
            .context("Failed to build probe URL")?;
        let outcome = client.call_with_trace(&url, client.policy().attempts()).await;
        let limits = client.tracker().limits();

        if ctx.is_json() {
            let windows: Vec<_> = limits
                .iter()
                .map(|w| serde_json::json!({"limit": w.limit, "window_seconds": w.window_seconds}))
                .collect();
            let sleeps: Vec<_> = outcome
                .trace
                .sleeps
                .iter()
                .map(|s| {
                    serde_json::json!({
                        "attempt": s.attempt,
                        "reason": s.reason.as_str(),
                        "delay_ms": s.delay.as_millis() as u64,
                        "status": s.status,
                    })
                })
                .collect();
            let json = serde_json::json!({
                "success": outcome.result.is_ok(),
                "error": outcome.result.as_ref().err().map(|e| e.to_string()),
                "quota": limits.to_string(),
                "windows": windows,
                "attempts": outcome.trace.attempts,
                "sleeps": sleeps,
            });
            formatter.print_json(&json);
        } else {
            match outcome.result {
                Ok(_) => formatter.success(&format!(
                    "Probe succeeded after {} attempt{}",
                    outcome.trace.attempts,
                    if outcome.trace.attempts == 1 { "" } else { "s" }
                )),
                Err(ref e) => formatter.error(&format!("Probe failed: {}", e)),
            }
            if limits.is_empty() {
                formatter.warn("No quota learned (no rate-limit header seen)");
            }
            for window in limits.iter() {
                formatter.info(&format!(
                    "{:>6} requests / {}s",
                    window.limit, window.window_seconds
                ));
            }
            for sleep in &outcome.trace.sleeps {
                formatter.info(&format!(
                    "attempt {} {} ({}), slept {}ms",
                    sleep.attempt,
                    sleep.reason.as_str(),
                    sleep.status.map_or("transport".to_string(), |s| s.to_string()),
                    sleep.delay.as_millis()
                ));
            }
        }

        outcome.result.map(|_| ()).context("Quota probe failed")
    }
}
