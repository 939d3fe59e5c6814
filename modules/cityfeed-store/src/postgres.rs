//! Postgres implementation of [`ArticleStore`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use cityfeed_common::Article;

use crate::{ArticleStore, Result};

pub struct PgArticleStore {
    pool: PgPool,
}

/// A row from the `articles` (or `digest_articles`) table.
#[derive(Debug, Clone, sqlx::FromRow)]
struct ArticleRow {
    id: String,
    source_id: String,
    title: String,
    url: String,
    summary: String,
    text: String,
    publication_date: DateTime<Utc>,
    duplicate_count: i32,
    categories: Vec<String>,
    district: Option<String>,
}

impl From<ArticleRow> for Article {
    fn from(row: ArticleRow) -> Self {
        Article {
            id: row.id,
            source_id: row.source_id,
            title: row.title,
            url: row.url,
            summary: row.summary,
            text: row.text,
            publication_date: row.publication_date,
            duplicate_count: row.duplicate_count.max(0) as u32,
            categories: row.categories,
            district: row.district,
        }
    }
}

impl PgArticleStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect and run the embedded SQL migrations.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPool::connect(database_url).await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self::new(pool))
    }
}

#[async_trait]
impl ArticleStore for PgArticleStore {
    async fn fetch_all(&self) -> Result<Vec<Article>> {
        let rows = sqlx::query_as::<_, ArticleRow>(
            r#"
            SELECT id, source_id, title, url, summary, text,
                   publication_date, duplicate_count, categories, district
            FROM articles
            ORDER BY seq ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Article::from).collect())
    }

    async fn upsert(&self, article: &Article) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO articles
                (id, source_id, title, url, summary, text,
                 publication_date, duplicate_count, categories, district)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (url) DO UPDATE SET
                id = EXCLUDED.id,
                source_id = EXCLUDED.source_id,
                title = EXCLUDED.title,
                summary = EXCLUDED.summary,
                text = EXCLUDED.text,
                publication_date = EXCLUDED.publication_date,
                duplicate_count = EXCLUDED.duplicate_count,
                categories = EXCLUDED.categories,
                district = EXCLUDED.district
            "#,
        )
        .bind(&article.id)
        .bind(&article.source_id)
        .bind(&article.title)
        .bind(&article.url)
        .bind(&article.summary)
        .bind(&article.text)
        .bind(article.publication_date)
        .bind(article.duplicate_count as i32)
        .bind(&article.categories)
        .bind(&article.district)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn increment_duplicate_count(&self, url: &str) -> Result<()> {
        sqlx::query("UPDATE articles SET duplicate_count = duplicate_count + 1 WHERE url = $1")
            .bind(url)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn in_window_with_duplicates(
        &self,
        since: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<Article>> {
        let rows = sqlx::query_as::<_, ArticleRow>(
            r#"
            SELECT id, source_id, title, url, summary, text,
                   publication_date, duplicate_count, categories, district
            FROM articles
            WHERE publication_date >= $1 AND duplicate_count > 0
            ORDER BY duplicate_count DESC, publication_date DESC
            LIMIT $2
            "#,
        )
        .bind(since)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Article::from).collect())
    }

    async fn most_recent_in_window(
        &self,
        since: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<Article>> {
        let rows = sqlx::query_as::<_, ArticleRow>(
            r#"
            SELECT id, source_id, title, url, summary, text,
                   publication_date, duplicate_count, categories, district
            FROM articles
            WHERE publication_date >= $1
            ORDER BY publication_date DESC
            LIMIT $2
            "#,
        )
        .bind(since)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Article::from).collect())
    }

    async fn replace_digest(&self, articles: &[Article]) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM digest_articles").execute(&mut *tx).await?;

        for (position, article) in articles.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO digest_articles
                    (position, id, source_id, title, url, summary, text,
                     publication_date, duplicate_count, categories, district)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
                "#,
            )
            .bind(position as i32)
            .bind(&article.id)
            .bind(&article.source_id)
            .bind(&article.title)
            .bind(&article.url)
            .bind(&article.summary)
            .bind(&article.text)
            .bind(article.publication_date)
            .bind(article.duplicate_count as i32)
            .bind(&article.categories)
            .bind(&article.district)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn digest_articles(&self) -> Result<Vec<Article>> {
        let rows = sqlx::query_as::<_, ArticleRow>(
            r#"
            SELECT id, source_id, title, url, summary, text,
                   publication_date, duplicate_count, categories, district
            FROM digest_articles
            ORDER BY position ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Article::from).collect())
    }

    async fn delete_by_id(&self, id: &str) -> Result<()> {
        sqlx::query("DELETE FROM articles WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
