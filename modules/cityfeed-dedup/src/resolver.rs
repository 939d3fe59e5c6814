//! The duplicate resolution engine.
//!
//! One batch run classifies every candidate, in batch order, against a
//! frozen snapshot of the stored corpus and against earlier candidates in
//! the same batch, then writes only the unique ones. Matches bump the
//! matched article's `duplicate_count` instead.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, info, warn};

use cityfeed_common::text::{article_comparison_text, validate_candidate};
use cityfeed_common::{Article, CandidateArticle};
use cityfeed_store::{ArticleStore, StoreError};

use crate::similarity::BatchSimilarity;
use crate::vectorizer::VectorSpace;

/// What happened to one batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchReport {
    /// Newly stored unique articles.
    pub saved: usize,
    /// Candidates folded into an already-stored article.
    pub existing_duplicates: usize,
    /// Candidates folded into an earlier candidate of the same batch.
    pub batch_duplicates: usize,
    /// Verbatim repeats (same URL as a stored article, or same
    /// title+summary as an earlier candidate). No state change.
    pub skipped_repeats: usize,
    /// Candidates rejected at validation.
    pub skipped_invalid: usize,
}

/// Per-candidate classification, in batch order.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Decision {
    VerbatimRepeat,
    ExistingDuplicate { existing: usize, similarity: f64 },
    BatchDuplicate { earlier: usize, similarity: f64 },
    Unique { support: u32 },
}

/// Pure decision pass over a fully computed similarity scan.
///
/// Candidate `i` is checked in priority order: verbatim repeat, match
/// against the stored corpus, match against an earlier candidate (`j < i`
/// only), unique. The threshold is inclusive: a score exactly at `threshold`
/// is a match.
pub(crate) fn classify_batch(
    existing: &[Article],
    candidates: &[Article],
    sims: &BatchSimilarity,
    threshold: f64,
) -> Vec<Decision> {
    let existing_urls: HashSet<&str> = existing.iter().map(|a| a.url.as_str()).collect();

    let mut decisions = Vec::with_capacity(candidates.len());
    for (i, candidate) in candidates.iter().enumerate() {
        if existing_urls.contains(candidate.url.as_str()) {
            decisions.push(Decision::VerbatimRepeat);
            continue;
        }
        if candidates[..i]
            .iter()
            .any(|earlier| earlier.title == candidate.title && earlier.summary == candidate.summary)
        {
            decisions.push(Decision::VerbatimRepeat);
            continue;
        }

        if let Some((e, similarity)) = sims.max_existing(i).filter(|&(_, s)| s >= threshold) {
            decisions.push(Decision::ExistingDuplicate { existing: e, similarity });
            continue;
        }
        if let Some((j, similarity)) = sims.max_within_batch(i).filter(|&(_, s)| s >= threshold) {
            decisions.push(Decision::BatchDuplicate { earlier: j, similarity });
            continue;
        }

        let support =
            sims.existing_at_least(i, threshold) + sims.within_batch_at_least(i, threshold);
        decisions.push(Decision::Unique { support: support as u32 });
    }
    decisions
}

pub struct DuplicateResolver {
    store: Arc<dyn ArticleStore>,
    threshold: f64,
}

impl DuplicateResolver {
    pub fn new(store: Arc<dyn ArticleStore>, threshold: f64) -> Self {
        Self { store, threshold }
    }

    /// Process one batch of raw candidates: validate, classify against a
    /// frozen corpus snapshot, bump duplicate counters, store the unique
    /// remainder. Safe to re-run with the same batch — storage is an
    /// idempotent url-keyed upsert and repeats short-circuit.
    ///
    /// The caller's scheduler must not overlap runs: concurrent batches can
    /// race on duplicate counters.
    ///
    /// Connection-level store failures abort the batch with `Err`; nothing
    /// after the failure is written. Single-document failures are logged
    /// and skipped.
    pub async fn resolve_and_save(
        &self,
        candidates: Vec<CandidateArticle>,
    ) -> Result<BatchReport, StoreError> {
        let mut report = BatchReport::default();

        let mut batch: Vec<Article> = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            match validate_candidate(candidate) {
                Ok(article) => batch.push(article),
                Err(e) => {
                    warn!(error = %e, "Skipping malformed candidate");
                    report.skipped_invalid += 1;
                }
            }
        }
        if batch.is_empty() {
            return Ok(report);
        }

        // Frozen snapshot: every decision in this batch is made against the
        // corpus as it was here, never against this batch's own writes.
        let existing = self.store.fetch_all().await?;

        let existing_texts: Vec<String> =
            existing.iter().map(article_comparison_text).collect();
        let batch_texts: Vec<String> = batch.iter().map(article_comparison_text).collect();
        let (existing_rows, batch_rows) = VectorSpace::fit_joint(&existing_texts, &batch_texts);
        let sims = BatchSimilarity::compute(&batch_rows, &existing_rows);

        let decisions = classify_batch(&existing, &batch, &sims, self.threshold);

        // Phase one: apply counter effects in batch order. Increments on
        // stored articles persist immediately; increments on earlier batch
        // candidates stay in memory until (and unless) that candidate is
        // itself stored.
        let mut batch_increments = vec![0u32; batch.len()];
        let mut queued: Vec<usize> = Vec::new();

        for (i, decision) in decisions.iter().enumerate() {
            let candidate = &batch[i];
            match decision {
                Decision::VerbatimRepeat => {
                    debug!(url = %candidate.url, "Verbatim repeat, skipping");
                    report.skipped_repeats += 1;
                }
                Decision::ExistingDuplicate { existing: e, similarity } => {
                    let matched = &existing[*e];
                    info!(
                        url = %candidate.url,
                        existing_url = %matched.url,
                        similarity,
                        "Duplicate of stored article"
                    );
                    if let Err(err) = self.store.increment_duplicate_count(&matched.url).await {
                        if err.is_connection_failure() {
                            return Err(err);
                        }
                        warn!(url = %matched.url, error = %err, "Failed to bump duplicate count");
                    }
                    report.existing_duplicates += 1;
                }
                Decision::BatchDuplicate { earlier, similarity } => {
                    info!(
                        url = %candidate.url,
                        earlier_url = %batch[*earlier].url,
                        similarity,
                        "Duplicate of earlier candidate in batch"
                    );
                    batch_increments[*earlier] += 1;
                    report.batch_duplicates += 1;
                }
                Decision::Unique { support } => {
                    batch_increments[i] += support;
                    queued.push(i);
                }
            }
        }

        // Phase two: write the unique remainder.
        for i in queued {
            let mut article = batch[i].clone();
            article.duplicate_count = batch_increments[i];
            match self.store.upsert(&article).await {
                Ok(()) => {
                    debug!(url = %article.url, duplicate_count = article.duplicate_count, "Stored new article");
                    report.saved += 1;
                }
                Err(err) if err.is_connection_failure() => return Err(err),
                Err(err) => {
                    warn!(url = %article.url, error = %err, "Failed to store article");
                }
            }
        }

        info!(
            saved = report.saved,
            existing_duplicates = report.existing_duplicates,
            batch_duplicates = report.batch_duplicates,
            skipped_repeats = report.skipped_repeats,
            skipped_invalid = report.skipped_invalid,
            "Batch resolved"
        );
        Ok(report)
    }
}
