use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use cityfeed_common::{CandidateArticle, Config};
use cityfeed_dedup::{ensure_summary, DuplicateResolver, DuplicateSweeper};
use cityfeed_store::PgArticleStore;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("cityfeed=info".parse()?))
        .init();

    info!("CityFeed ingest starting...");

    let config = Config::from_env();
    let store = Arc::new(PgArticleStore::connect(&config.database_url).await?);

    match std::env::args().nth(1).as_deref() {
        Some("--sweep") => {
            let sweeper = DuplicateSweeper::new(store, config.sweep_threshold);
            let report = sweeper.sweep().await?;
            println!(
                "Sweep removed {} stored duplicates in {} groups",
                report.removed, report.groups
            );
        }
        Some(path) => {
            let run_id = Uuid::new_v4();
            let raw = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("reading candidate batch from {path}"))?;
            let mut candidates: Vec<CandidateArticle> =
                serde_json::from_str(&raw).context("parsing candidate batch")?;
            for candidate in &mut candidates {
                ensure_summary(candidate);
            }

            info!(run_id = %run_id, candidates = candidates.len(), "Resolving batch");
            let resolver = DuplicateResolver::new(store, config.dedup_threshold);
            let report = resolver.resolve_and_save(candidates).await?;

            println!(
                "Saved {} unique articles ({} existing duplicates, {} batch duplicates, {} repeats, {} invalid)",
                report.saved,
                report.existing_duplicates,
                report.batch_duplicates,
                report.skipped_repeats,
                report.skipped_invalid
            );
        }
        None => {
            anyhow::bail!("usage: ingest <candidates.json> | ingest --sweep");
        }
    }

    Ok(())
}
