// src/ingest/types.rs
use chrono::{DateTime, Utc};

/// One paper as returned by the search API. `id` is the only dedup key.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct Paper {
    pub id: String, // e.g. "2401.01234v1"
    pub title: String,
    pub authors: Vec<String>,
    pub summary: String,
    pub published: DateTime<Utc>,
    pub url: String,
    pub categories: Vec<String>,
}

impl Paper {
    /// "A, B, C et al. (N authors)" for long author lists.
    pub fn authors_short(&self) -> String {
        let mut out = self
            .authors
            .iter()
            .take(3)
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        if self.authors.len() > 3 {
            out.push_str(&format!(" et al. ({} authors)", self.authors.len()));
        }
        out
    }
}

/// A search backend. Failures are absorbed at this boundary: an unreachable or
/// malformed source yields an empty vector, never an error.
#[async_trait::async_trait]
pub trait PaperSource: Send + Sync {
    async fn search(&self, topic: &str, max_results: usize) -> Vec<Paper>;
    fn name(&self) -> &'static str;
}
