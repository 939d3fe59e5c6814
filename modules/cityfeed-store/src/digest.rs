//! Periodic digest selection.
//!
//! Picks the most duplicate-corroborated articles published inside a
//! trailing window, backfills with the freshest articles when there are not
//! enough corroborated ones, and overwrites the digest collection with the
//! result.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::info;

use cityfeed_common::Article;

use crate::{ArticleStore, Result};

/// Outcome of one digest build.
#[derive(Debug, Clone)]
pub struct DigestReport {
    /// Articles selected for their duplicate count.
    pub corroborated: usize,
    /// Articles added by the recency backfill.
    pub backfilled: usize,
    /// How many selected articles carry each category label.
    pub category_distribution: HashMap<String, usize>,
}

pub struct DigestBuilder {
    store: Arc<dyn ArticleStore>,
    window_hours: i64,
    target_count: usize,
}

impl DigestBuilder {
    pub fn new(store: Arc<dyn ArticleStore>, window_hours: i64, target_count: usize) -> Self {
        Self { store, window_hours, target_count }
    }

    /// Rebuild the digest collection from the current corpus.
    ///
    /// An empty window produces an empty digest; that is not an error.
    pub async fn build(&self) -> Result<DigestReport> {
        let since = Utc::now() - Duration::hours(self.window_hours);

        let mut selected = self
            .store
            .in_window_with_duplicates(since, self.target_count)
            .await?;
        let corroborated = selected.len();

        if selected.len() < self.target_count {
            // Fetch enough recent articles that the overlap with the already
            // selected set cannot leave the digest short.
            let candidates = self
                .store
                .most_recent_in_window(since, self.target_count + selected.len())
                .await?;
            let taken: HashSet<String> = selected.iter().map(|a| a.url.clone()).collect();
            for article in candidates {
                if selected.len() == self.target_count {
                    break;
                }
                if !taken.contains(&article.url) {
                    selected.push(article);
                }
            }
        }
        let backfilled = selected.len() - corroborated;

        self.store.replace_digest(&selected).await?;

        let category_distribution = category_distribution(&selected);
        info!(
            window_hours = self.window_hours,
            corroborated,
            backfilled,
            categories = ?category_distribution,
            "Digest rebuilt"
        );

        Ok(DigestReport { corroborated, backfilled, category_distribution })
    }
}

fn category_distribution(articles: &[Article]) -> HashMap<String, usize> {
    let mut distribution = HashMap::new();
    for article in articles {
        for category in &article.categories {
            *distribution.entry(category.clone()).or_insert(0) += 1;
        }
    }
    distribution
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryArticleStore;
    use chrono::{DateTime, Utc};
    use cityfeed_common::article_id;

    fn article(url: &str, count: u32, published: DateTime<Utc>) -> Article {
        Article {
            id: article_id(url),
            source_id: "src".to_string(),
            title: format!("Article at {url}"),
            url: url.to_string(),
            summary: "summary".to_string(),
            text: String::new(),
            publication_date: published,
            duplicate_count: count,
            categories: vec!["Новости".to_string()],
            district: None,
        }
    }

    async fn seeded(counts: &[(u32, i64)]) -> Arc<MemoryArticleStore> {
        let store = Arc::new(MemoryArticleStore::new());
        for (i, (count, minutes_ago)) in counts.iter().enumerate() {
            let published = Utc::now() - Duration::minutes(*minutes_ago);
            store
                .upsert(&article(&format!("https://a.example/{i}"), *count, published))
                .await
                .unwrap();
        }
        store
    }

    #[tokio::test]
    async fn corroborated_articles_fill_the_digest() {
        // counts [3,0,1,0,5], all inside the window, target 3
        let store = seeded(&[(3, 10), (0, 20), (1, 30), (0, 40), (5, 50)]).await;
        let builder = DigestBuilder::new(store.clone(), 24, 3);

        let report = builder.build().await.unwrap();
        assert_eq!(report.corroborated, 3);
        assert_eq!(report.backfilled, 0);

        let digest = store.digest_articles().await.unwrap();
        let counts: Vec<u32> = digest.iter().map(|a| a.duplicate_count).collect();
        assert_eq!(counts, vec![5, 3, 1]);
    }

    #[tokio::test]
    async fn backfill_takes_most_recent_unselected() {
        // One corroborated article, ten fresh ones with count 0.
        let mut seedlist = vec![(2u32, 500i64)];
        for i in 0..10 {
            seedlist.push((0, 10 + i));
        }
        let store = seeded(&seedlist).await;
        let builder = DigestBuilder::new(store.clone(), 24, 3);

        let report = builder.build().await.unwrap();
        assert_eq!(report.corroborated, 1);
        assert_eq!(report.backfilled, 2);

        let digest = store.digest_articles().await.unwrap();
        assert_eq!(digest.len(), 3);
        assert_eq!(digest[0].duplicate_count, 2);
        // Backfill is the two freshest count-0 articles.
        assert_eq!(digest[1].url, "https://a.example/1");
        assert_eq!(digest[2].url, "https://a.example/2");
    }

    #[tokio::test]
    async fn empty_window_yields_empty_digest() {
        let store = Arc::new(MemoryArticleStore::new());
        let builder = DigestBuilder::new(store.clone(), 24, 3);

        let report = builder.build().await.unwrap();
        assert_eq!(report.corroborated + report.backfilled, 0);
        assert!(store.digest_articles().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn articles_outside_window_are_ignored() {
        let store = seeded(&[(5, 60 * 48), (1, 10)]).await; // first is 2 days old
        let builder = DigestBuilder::new(store.clone(), 24, 3);

        builder.build().await.unwrap();
        let digest = store.digest_articles().await.unwrap();
        assert_eq!(digest.len(), 1);
        assert_eq!(digest[0].duplicate_count, 1);
    }

    #[tokio::test]
    async fn rebuild_overwrites_previous_digest() {
        let store = seeded(&[(1, 10)]).await;
        let builder = DigestBuilder::new(store.clone(), 24, 3);
        builder.build().await.unwrap();

        store.delete_by_id(&article_id("https://a.example/0")).await.unwrap();
        store
            .upsert(&article("https://b.example/new", 7, Utc::now()))
            .await
            .unwrap();
        builder.build().await.unwrap();

        let digest = store.digest_articles().await.unwrap();
        assert_eq!(digest.len(), 1);
        assert_eq!(digest[0].url, "https://b.example/new");
    }

    #[tokio::test]
    async fn category_distribution_counts_labels() {
        let store = seeded(&[(3, 10), (2, 20)]).await;
        let builder = DigestBuilder::new(store, 24, 3);

        let report = builder.build().await.unwrap();
        assert_eq!(report.category_distribution.get("Новости"), Some(&2));
    }
}
