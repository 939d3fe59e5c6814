//! Corpus housekeeping: collapse stored near-duplicates.
//!
//! The resolution engine never deletes; over time an operator may still want
//! to compact articles that slipped in as separate documents (threshold
//! changes, reprocessed archives). The sweep groups stored articles by
//! pairwise similarity and removes every group member except the earliest
//! stored one. Deletion warrants more confidence than counting, so the
//! default sweep threshold is far stricter than the resolver's.

use std::sync::Arc;

use tracing::{info, warn};

use cityfeed_common::text::article_comparison_text;
use cityfeed_store::{ArticleStore, StoreError};

use crate::similarity::cosine_similarity;
use crate::vectorizer::{DocVector, VectorSpace};

#[derive(Debug, Clone, Default)]
pub struct SweepReport {
    pub groups: usize,
    pub removed: usize,
}

pub struct DuplicateSweeper {
    store: Arc<dyn ArticleStore>,
    threshold: f64,
}

impl DuplicateSweeper {
    pub fn new(store: Arc<dyn ArticleStore>, threshold: f64) -> Self {
        Self { store, threshold }
    }

    /// Find and remove stored near-duplicates. Keeps the earliest stored
    /// article of each group.
    pub async fn sweep(&self) -> Result<SweepReport, StoreError> {
        let articles = self.store.fetch_all().await?;
        if articles.len() < 2 {
            return Ok(SweepReport::default());
        }

        let texts: Vec<String> = articles.iter().map(article_comparison_text).collect();
        let space = VectorSpace::fit(&texts);
        let rows: Vec<DocVector> = texts.iter().map(|t| space.transform(t)).collect();

        let groups = group_duplicates(&rows, self.threshold);
        let mut report = SweepReport { groups: groups.len(), removed: 0 };

        for group in &groups {
            let kept = &articles[group[0]];
            for &member in &group[1..] {
                let duplicate = &articles[member];
                match self.store.delete_by_id(&duplicate.id).await {
                    Ok(()) => {
                        info!(
                            kept_url = %kept.url,
                            removed_url = %duplicate.url,
                            "Removed stored duplicate"
                        );
                        report.removed += 1;
                    }
                    Err(err) if err.is_connection_failure() => return Err(err),
                    Err(err) => {
                        warn!(url = %duplicate.url, error = %err, "Failed to remove duplicate");
                    }
                }
            }
        }

        info!(groups = report.groups, removed = report.removed, "Sweep complete");
        Ok(report)
    }
}

/// Group row indices whose similarity to the group head is at least
/// `threshold`. Earlier rows claim later ones; every row lands in at most
/// one group; rows with no partner produce no group.
pub(crate) fn group_duplicates(rows: &[DocVector], threshold: f64) -> Vec<Vec<usize>> {
    let mut claimed = vec![false; rows.len()];
    let mut groups = Vec::new();

    for i in 0..rows.len() {
        if claimed[i] {
            continue;
        }
        let mut group = vec![i];
        for j in (i + 1)..rows.len() {
            if claimed[j] {
                continue;
            }
            if cosine_similarity(&rows[i], &rows[j]) >= threshold {
                group.push(j);
                claimed[j] = true;
            }
        }
        if group.len() > 1 {
            groups.push(group);
        }
    }
    groups
}
