// src/ingest/providers/arxiv.rs
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use metrics::{counter, histogram};
use quick_xml::de::from_str;
use serde::Deserialize;

use crate::error::FetchError;
use crate::ingest::plain_text;
use crate::ingest::types::{Paper, PaperSource};

pub const DEFAULT_API_URL: &str = "http://export.arxiv.org/api/query";
pub const DEFAULT_MAX_RESULTS: usize = 20;
pub const DEFAULT_REQUEST_DELAY: Duration = Duration::from_secs(3);

const PUBLISHED_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

#[derive(Debug, Deserialize)]
struct Feed {
    #[serde(rename = "entry", default)]
    entries: Vec<Entry>,
}

#[derive(Debug, Deserialize)]
struct Entry {
    id: Option<String>,
    title: Option<String>,
    summary: Option<String>,
    published: Option<String>,
    #[serde(rename = "author", default)]
    authors: Vec<Author>,
    // <dc:creator>; the deserializer matches on local names
    #[serde(rename = "creator")]
    creator: Option<String>,
    #[serde(rename = "link", default)]
    links: Vec<Link>,
    #[serde(rename = "category", default)]
    categories: Vec<Category>,
}

#[derive(Debug, Deserialize)]
struct Author {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Link {
    #[serde(rename = "@href")]
    href: Option<String>,
    #[serde(rename = "@rel")]
    rel: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Category {
    #[serde(rename = "@term")]
    term: Option<String>,
}

/// Construction-time settings for [`ArxivClient`].
#[derive(Debug, Clone)]
pub struct ArxivClientConfig {
    pub api_url: String,
    /// Used when `search` is called with `max_results == 0`.
    pub max_results: usize,
    /// Waited after every call, successful or not.
    pub request_delay: Duration,
}

impl Default for ArxivClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            max_results: DEFAULT_MAX_RESULTS,
            request_delay: DEFAULT_REQUEST_DELAY,
        }
    }
}

pub struct ArxivClient {
    mode: Mode,
    max_results: usize,
    request_delay: Duration,
}

enum Mode {
    // Owned copy so tests can hand in any &str.
    Fixture(String),
    Http {
        api_url: String,
        client: reqwest::Client,
    },
}

impl ArxivClient {
    pub fn new(cfg: ArxivClientConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("arxiv-digest/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            mode: Mode::Http {
                api_url: cfg.api_url,
                client,
            },
            max_results: cfg.max_results.max(1),
            request_delay: cfg.request_delay,
        })
    }

    /// Serve every search from a fixed feed body instead of the network.
    pub fn from_fixture_str(xml: &str) -> Self {
        Self {
            mode: Mode::Fixture(xml.to_string()),
            max_results: DEFAULT_MAX_RESULTS,
            request_delay: Duration::ZERO,
        }
    }

    pub fn with_request_delay(mut self, delay: Duration) -> Self {
        self.request_delay = delay;
        self
    }

    pub fn request_delay(&self) -> Duration {
        self.request_delay
    }

    /// Full request URL for one search. The query is percent-encoded as a whole.
    pub fn query_url(api_url: &str, topic: &str, max_results: usize) -> String {
        let query = format!("all:{topic}");
        format!(
            "{api_url}?search_query={}&start=0&max_results={max_results}",
            urlencoding::encode(&query)
        )
    }

    /// One request, no delay, errors surfaced.
    pub async fn fetch(&self, topic: &str, max_results: usize) -> Result<Vec<Paper>, FetchError> {
        let max_results = if max_results == 0 {
            self.max_results
        } else {
            max_results
        };

        match &self.mode {
            Mode::Fixture(xml) => parse_feed(xml),
            Mode::Http { api_url, client } => {
                let url = Self::query_url(api_url, topic, max_results);
                tracing::debug!(target: "search", %url, "arxiv query");
                let resp = client.get(&url).send().await?;
                let status = resp.status();
                if !status.is_success() {
                    return Err(FetchError::Status(status));
                }
                let body = resp.text().await?;
                parse_feed(&body)
            }
        }
    }
}

#[async_trait]
impl PaperSource for ArxivClient {
    async fn search(&self, topic: &str, max_results: usize) -> Vec<Paper> {
        counter!("search_requests_total").increment(1);

        let papers = match self.fetch(topic, max_results).await {
            Ok(papers) => {
                tracing::info!(target: "search", topic, returned = papers.len(), "arxiv search ok");
                papers
            }
            Err(e) => {
                tracing::warn!(target: "search", error = %e, topic, "arxiv search failed");
                counter!("search_errors_total").increment(1);
                Vec::new()
            }
        };

        // Rate limit: one pause per call regardless of outcome.
        if !self.request_delay.is_zero() {
            tokio::time::sleep(self.request_delay).await;
        }
        papers
    }

    fn name(&self) -> &'static str {
        "arxiv"
    }
}

/// Parse an arXiv Atom feed into papers. Entries without an id are skipped;
/// any malformed timestamp fails the whole feed.
pub fn parse_feed(xml: &str) -> Result<Vec<Paper>, FetchError> {
    let t0 = Instant::now();
    let feed: Feed = from_str(xml)?;

    let mut out = Vec::with_capacity(feed.entries.len());
    for entry in feed.entries {
        let raw_id = entry.id.as_deref().map(str::trim).unwrap_or_default();
        if raw_id.contains("/api/errors") {
            let msg = entry.summary.as_deref().map(plain_text).unwrap_or_default();
            return Err(FetchError::Api(msg));
        }
        let id = last_path_segment(raw_id);
        if id.is_empty() {
            tracing::debug!(target: "search", "skipping entry without id");
            continue;
        }

        let published_raw = entry.published.as_deref().map(str::trim).unwrap_or_default();
        let published = parse_published(published_raw).ok_or_else(|| FetchError::Timestamp {
            id: id.to_string(),
            value: published_raw.to_string(),
        })?;

        let mut authors: Vec<String> = entry
            .authors
            .iter()
            .filter_map(|a| a.name.as_deref())
            .map(plain_text)
            .filter(|n| !n.is_empty())
            .collect();
        if authors.is_empty() {
            if let Some(single) = entry.creator.as_deref().map(plain_text) {
                if !single.is_empty() {
                    authors.push(single);
                }
            }
        }

        let url = entry
            .links
            .iter()
            .find(|l| l.rel.as_deref() == Some("alternate"))
            .or_else(|| entry.links.first())
            .and_then(|l| l.href.clone())
            .unwrap_or_else(|| raw_id.to_string());

        let categories = entry
            .categories
            .iter()
            .filter_map(|c| c.term.as_deref())
            .map(plain_text)
            .filter(|t| !t.is_empty())
            .collect();

        out.push(Paper {
            id: id.to_string(),
            title: entry.title.as_deref().map(plain_text).unwrap_or_default(),
            authors,
            summary: entry.summary.as_deref().map(plain_text).unwrap_or_default(),
            published,
            url,
            categories,
        });
    }

    let ms = t0.elapsed().as_secs_f64() * 1_000.0;
    histogram!("search_parse_ms").record(ms);
    counter!("search_entries_total").increment(out.len() as u64);
    Ok(out)
}

fn last_path_segment(uri: &str) -> &str {
    uri.trim_end_matches('/').rsplit('/').next().unwrap_or_default()
}

fn parse_published(s: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(s, PUBLISHED_FORMAT)
        .ok()
        .map(|naive| Utc.from_utc_datetime(&naive))
}
