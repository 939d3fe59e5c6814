use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A news article or social-media post about the city.
///
/// `url` is the canonical identity: the corpus holds exactly one stored
/// article per distinct URL. `duplicate_count` is the number of other
/// observed candidates that were judged near-duplicates of this article and
/// folded into it instead of being stored separately.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    /// Content-addressed identifier derived from the canonical URL.
    pub id: String,
    /// Which collector/source produced this article. Not used by dedup.
    pub source_id: String,
    pub title: String,
    pub url: String,
    pub summary: String,
    /// Full body text. May be empty for short social posts.
    #[serde(default)]
    pub text: String,
    pub publication_date: DateTime<Utc>,
    #[serde(default)]
    pub duplicate_count: u32,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub district: Option<String>,
}

/// A raw candidate as produced by the collectors, before validation.
///
/// Everything except `url` is optional on the wire; validation at the
/// normalization boundary decides what is usable (see [`crate::text`]).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CandidateArticle {
    #[serde(default)]
    pub source_id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub publication_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub district: Option<String>,
}

/// Deterministic article id: hex-encoded SHA-256 of the canonical URL.
pub fn article_id(url: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(url.as_bytes());
    hex::encode(hasher.finalize())
}
