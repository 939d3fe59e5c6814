//! Text normalization and candidate validation.
//!
//! Pure functions for building the comparison text used by dedup and for
//! promoting raw collector output into validated [`Article`] values at the
//! processing boundary.

use chrono::Utc;

use crate::error::CityFeedError;
use crate::types::{article_id, Article, CandidateArticle};

/// Normalize an article's fields into the single string the similarity
/// engine compares: title, summary, text in that fixed order, lowercased,
/// with runs of whitespace collapsed to single spaces. Empty fields
/// contribute nothing.
pub fn comparison_text(title: &str, summary: &str, text: &str) -> String {
    let joined = [title, summary, text]
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    joined.to_lowercase().split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Comparison text for an already-validated article.
pub fn article_comparison_text(article: &Article) -> String {
    comparison_text(&article.title, &article.summary, &article.text)
}

/// Validate a raw candidate into an [`Article`].
///
/// A candidate is malformed if `title`, `url`, or `summary` is missing or
/// blank, or the URL is not an absolute URL. Missing optional fields get
/// neutral defaults; a missing publication date becomes "now" so the digest
/// window still sees the article.
pub fn validate_candidate(candidate: CandidateArticle) -> Result<Article, CityFeedError> {
    let title = nonblank(candidate.title, "title")?;
    let url = nonblank(candidate.url, "url")?;
    let summary = nonblank(candidate.summary, "summary")?;

    url::Url::parse(&url)
        .map_err(|e| CityFeedError::Validation(format!("url {url:?} does not parse: {e}")))?;

    Ok(Article {
        id: article_id(&url),
        source_id: candidate.source_id,
        title,
        url,
        summary,
        text: candidate.text.unwrap_or_default(),
        publication_date: candidate.publication_date.unwrap_or_else(Utc::now),
        duplicate_count: 0,
        categories: candidate.categories,
        district: candidate.district,
    })
}

fn nonblank(value: Option<String>, field: &str) -> Result<String, CityFeedError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(CityFeedError::Validation(format!("missing required field {field}"))),
    }
}
