//! The document store behind the dedup engine and the digest builder.
//!
//! [`ArticleStore`] is the generic store contract; everything above it is
//! written against `Arc<dyn ArticleStore>` so the dedup path can be tested
//! deterministically with [`MemoryArticleStore`] — no network, no database,
//! no Docker. [`PgArticleStore`] is the production implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use cityfeed_common::Article;

pub mod digest;
pub mod memory;
pub mod postgres;

pub use digest::{DigestBuilder, DigestReport};
pub use memory::MemoryArticleStore;
pub use postgres::PgArticleStore;

/// Result type alias for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl StoreError {
    /// Connection-level failures abort a batch; anything else is a
    /// single-document failure the batch survives.
    pub fn is_connection_failure(&self) -> bool {
        matches!(
            self,
            StoreError::Database(
                sqlx::Error::PoolClosed
                    | sqlx::Error::PoolTimedOut
                    | sqlx::Error::Io(_)
                    | sqlx::Error::Tls(_)
            )
        )
    }
}

/// Generic document store for the article corpus and the digest collection.
///
/// Writes are keyed by `url`: `upsert` replaces an existing document with
/// the same URL, so re-running a batch is idempotent.
#[async_trait]
pub trait ArticleStore: Send + Sync {
    /// The whole corpus, in stable insertion order. One batch run takes
    /// this snapshot once and never rereads its own writes.
    async fn fetch_all(&self) -> Result<Vec<Article>>;

    /// Insert the article, or replace the stored document with the same URL.
    async fn upsert(&self, article: &Article) -> Result<()>;

    /// Bump `duplicate_count` on the stored article with this URL.
    async fn increment_duplicate_count(&self, url: &str) -> Result<()>;

    /// Articles published at/after `since` with `duplicate_count > 0`,
    /// ordered by `duplicate_count` descending, capped at `limit`.
    async fn in_window_with_duplicates(
        &self,
        since: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<Article>>;

    /// Articles published at/after `since`, most recent first, capped at
    /// `limit`.
    async fn most_recent_in_window(
        &self,
        since: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<Article>>;

    /// Overwrite the digest collection with exactly this set.
    async fn replace_digest(&self, articles: &[Article]) -> Result<()>;

    /// Current digest contents, in stored order.
    async fn digest_articles(&self) -> Result<Vec<Article>>;

    /// Remove a stored article. Housekeeping only — the dedup engine never
    /// deletes.
    async fn delete_by_id(&self, id: &str) -> Result<()>;
}
