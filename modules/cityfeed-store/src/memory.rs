//! In-memory implementation of [`ArticleStore`].
//!
//! Backs every behavioral test and doubles as a throwaway local store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use cityfeed_common::Article;

use crate::{ArticleStore, Result};

#[derive(Default)]
pub struct MemoryArticleStore {
    articles: RwLock<Vec<Article>>,
    digest: RwLock<Vec<Article>>,
}

impl MemoryArticleStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ArticleStore for MemoryArticleStore {
    async fn fetch_all(&self) -> Result<Vec<Article>> {
        Ok(self.articles.read().await.clone())
    }

    async fn upsert(&self, article: &Article) -> Result<()> {
        let mut articles = self.articles.write().await;
        if let Some(existing) = articles.iter_mut().find(|a| a.url == article.url) {
            *existing = article.clone();
        } else {
            articles.push(article.clone());
        }
        Ok(())
    }

    async fn increment_duplicate_count(&self, url: &str) -> Result<()> {
        let mut articles = self.articles.write().await;
        if let Some(existing) = articles.iter_mut().find(|a| a.url == url) {
            existing.duplicate_count += 1;
        }
        Ok(())
    }

    async fn in_window_with_duplicates(
        &self,
        since: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<Article>> {
        let mut hits: Vec<Article> = self
            .articles
            .read()
            .await
            .iter()
            .filter(|a| a.publication_date >= since && a.duplicate_count > 0)
            .cloned()
            .collect();
        hits.sort_by(|a, b| {
            b.duplicate_count
                .cmp(&a.duplicate_count)
                .then_with(|| b.publication_date.cmp(&a.publication_date))
        });
        hits.truncate(limit);
        Ok(hits)
    }

    async fn most_recent_in_window(
        &self,
        since: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<Article>> {
        let mut hits: Vec<Article> = self
            .articles
            .read()
            .await
            .iter()
            .filter(|a| a.publication_date >= since)
            .cloned()
            .collect();
        hits.sort_by(|a, b| b.publication_date.cmp(&a.publication_date));
        hits.truncate(limit);
        Ok(hits)
    }

    async fn replace_digest(&self, articles: &[Article]) -> Result<()> {
        *self.digest.write().await = articles.to_vec();
        Ok(())
    }

    async fn digest_articles(&self) -> Result<Vec<Article>> {
        Ok(self.digest.read().await.clone())
    }

    async fn delete_by_id(&self, id: &str) -> Result<()> {
        self.articles.write().await.retain(|a| a.id != id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cityfeed_common::article_id;

    fn article(url: &str, count: u32) -> Article {
        Article {
            id: article_id(url),
            source_id: "src".to_string(),
            title: format!("Article at {url}"),
            url: url.to_string(),
            summary: "summary".to_string(),
            text: String::new(),
            publication_date: Utc::now(),
            duplicate_count: count,
            categories: vec![],
            district: None,
        }
    }

    #[tokio::test]
    async fn upsert_replaces_by_url() {
        let store = MemoryArticleStore::new();
        store.upsert(&article("https://a.example/1", 0)).await.unwrap();

        let mut updated = article("https://a.example/1", 4);
        updated.title = "Updated".to_string();
        store.upsert(&updated).await.unwrap();

        let all = store.fetch_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].title, "Updated");
        assert_eq!(all[0].duplicate_count, 4);
    }

    #[tokio::test]
    async fn increment_bumps_counter() {
        let store = MemoryArticleStore::new();
        store.upsert(&article("https://a.example/1", 0)).await.unwrap();
        store.increment_duplicate_count("https://a.example/1").await.unwrap();
        store.increment_duplicate_count("https://a.example/1").await.unwrap();

        let all = store.fetch_all().await.unwrap();
        assert_eq!(all[0].duplicate_count, 2);
    }

    #[tokio::test]
    async fn window_query_filters_and_orders() {
        let store = MemoryArticleStore::new();
        for (i, count) in [3u32, 0, 1, 0, 5].iter().enumerate() {
            store.upsert(&article(&format!("https://a.example/{i}"), *count)).await.unwrap();
        }

        let since = Utc::now() - chrono::Duration::hours(24);
        let hits = store.in_window_with_duplicates(since, 3).await.unwrap();
        let counts: Vec<u32> = hits.iter().map(|a| a.duplicate_count).collect();
        assert_eq!(counts, vec![5, 3, 1]);
    }

    #[tokio::test]
    async fn replace_digest_overwrites() {
        let store = MemoryArticleStore::new();
        store.replace_digest(&[article("https://a.example/1", 1)]).await.unwrap();
        store.replace_digest(&[article("https://a.example/2", 2)]).await.unwrap();

        let digest = store.digest_articles().await.unwrap();
        assert_eq!(digest.len(), 1);
        assert_eq!(digest[0].url, "https://a.example/2");
    }

    #[tokio::test]
    async fn delete_by_id_removes() {
        let store = MemoryArticleStore::new();
        let a = article("https://a.example/1", 0);
        store.upsert(&a).await.unwrap();
        store.delete_by_id(&a.id).await.unwrap();
        assert!(store.fetch_all().await.unwrap().is_empty());
    }
}
