use std::sync::Arc;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use cityfeed_common::Config;
use cityfeed_store::{ArticleStore, DigestBuilder, PgArticleStore};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("cityfeed=info".parse()?))
        .init();

    info!("CityFeed digest starting...");

    let config = Config::from_env();
    let store = Arc::new(PgArticleStore::connect(&config.database_url).await?);

    info!(
        window_hours = config.digest_window_hours,
        target_count = config.digest_target_count,
        "Building digest"
    );

    let builder = DigestBuilder::new(
        store.clone(),
        config.digest_window_hours,
        config.digest_target_count,
    );
    let report = builder.build().await?;

    println!(
        "Digest rebuilt: {} corroborated + {} backfilled articles",
        report.corroborated, report.backfilled
    );
    for article in store.digest_articles().await? {
        println!(
            "  [{}] {} ({})",
            article.duplicate_count, article.title, article.url
        );
    }

    Ok(())
}
