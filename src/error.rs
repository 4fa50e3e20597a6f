// src/error.rs
//! Error taxonomy shared across the crate.
//!
//! - [`FetchError`]: one search round failed. Absorbed by the search client.
//! - [`ConfigError`]: startup configuration is unusable. Fatal before any retrieval.
//! - [`StoreError`]: the delivered-paper ledger is unavailable. Fatal at load,
//!   logged per paper at write time.

use thiserror::Error;

/// Failure of a single search call (network, HTTP status, or feed parsing).
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("arxiv request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("arxiv returned HTTP {0}")]
    Status(reqwest::StatusCode),

    #[error("parsing atom feed: {0}")]
    Xml(#[from] quick_xml::DeError),

    #[error("entry {id}: bad published timestamp {value:?}")]
    Timestamp { id: String, value: String },

    #[error("arxiv api error: {0}")]
    Api(String),
}

/// Configuration problems detected before the first retrieval.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required setting {0}")]
    Missing(&'static str),

    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },

    #[error("reading config file {path}: {message}")]
    File { path: String, message: String },
}

/// Result store failures.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("result store error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("bad delivered_at value {0:?} in result store")]
    Timestamp(String),
}
