// src/config/mod.rs
//! Runtime settings.
//!
//! Layering (later wins): built-in defaults → TOML file → environment
//! (including `.env`, loaded by the binaries through dotenvy). Every value has
//! a default, so a bare environment still yields usable crawl settings; only
//! email delivery needs [`Settings::validate_delivery`] to pass.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::engine::{
    EngineConfig, DEFAULT_LOOKBACK_DAYS, DEFAULT_MAX_ROUNDS, DEFAULT_PER_ROUND_FETCH,
    DEFAULT_TARGET_NEW, DEFAULT_TOPIC,
};
use crate::error::ConfigError;
use crate::ingest::providers::arxiv::{ArxivClientConfig, DEFAULT_API_URL, DEFAULT_MAX_RESULTS};
use crate::store::DEFAULT_DB_FILE;

pub const ENV_CONFIG_PATH: &str = "DIGEST_CONFIG_PATH";
pub const DEFAULT_CONFIG_PATH: &str = "config/digest.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlSettings {
    pub topic: String,
    pub api_url: String,
    /// Per-call bound used by the client when no explicit bound is given.
    pub max_results: usize,
    /// Per-round fetch size used by the engine.
    pub crawl_results: usize,
    pub lookback_days: u32,
    pub target_new: usize,
    pub max_rounds: usize,
    pub request_delay_secs: u64,
}

impl Default for CrawlSettings {
    fn default() -> Self {
        Self {
            topic: DEFAULT_TOPIC.to_string(),
            api_url: DEFAULT_API_URL.to_string(),
            max_results: DEFAULT_MAX_RESULTS,
            crawl_results: DEFAULT_PER_ROUND_FETCH,
            lookback_days: DEFAULT_LOOKBACK_DAYS,
            target_new: DEFAULT_TARGET_NEW,
            max_rounds: DEFAULT_MAX_ROUNDS,
            request_delay_secs: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmtpSettings {
    pub server: String,
    pub port: u16,
    pub sender: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub receiver: String,
}

impl Default for SmtpSettings {
    fn default() -> Self {
        Self {
            server: "smtp.gmail.com".to_string(),
            port: 587,
            sender: String::new(),
            password: String::new(),
            receiver: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    #[serde(flatten)]
    pub crawl: CrawlSettings,
    pub smtp: SmtpSettings,
    pub db_path: PathBuf,
    pub metrics_addr: Option<SocketAddr>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            crawl: CrawlSettings::default(),
            smtp: SmtpSettings::default(),
            db_path: PathBuf::from(DEFAULT_DB_FILE),
            metrics_addr: None,
        }
    }
}

impl Settings {
    /// Load using env var + fallbacks for the file layer:
    /// 1) $DIGEST_CONFIG_PATH (must exist)
    /// 2) config/digest.toml (optional)
    /// then apply environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let file = match std::env::var(ENV_CONFIG_PATH) {
            Ok(p) => {
                let pb = PathBuf::from(&p);
                if !pb.exists() {
                    return Err(ConfigError::File {
                        path: p,
                        message: "DIGEST_CONFIG_PATH points to non-existent path".into(),
                    });
                }
                Some(pb)
            }
            Err(_) => {
                let pb = PathBuf::from(DEFAULT_CONFIG_PATH);
                pb.exists().then_some(pb)
            }
        };
        Self::load_from(file.as_deref())
    }

    /// File layer from `path` (if any), then environment overrides.
    pub fn load_from(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut s = match path {
            Some(p) => {
                let content = std::fs::read_to_string(p).map_err(|e| ConfigError::File {
                    path: p.display().to_string(),
                    message: e.to_string(),
                })?;
                let parsed = Self::from_toml_str(&content).map_err(|e| match e {
                    ConfigError::File { message, .. } => ConfigError::File {
                        path: p.display().to_string(),
                        message,
                    },
                    other => other,
                })?;
                tracing::info!(target: "config", path = %p.display(), "loaded config file");
                parsed
            }
            None => Self::default(),
        };
        s.apply_env();
        s.sanitize();
        Ok(s)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::File {
            path: "<inline>".into(),
            message: e.to_string(),
        })
    }

    /// Environment overrides. Unparsable values are ignored with a warning.
    pub fn apply_env(&mut self) {
        let c = &mut self.crawl;
        env_override("DEFAULT_TOPIC", &mut c.topic);
        env_override("ARXIV_API_URL", &mut c.api_url);
        env_override("MAX_RESULTS", &mut c.max_results);
        env_override("CRAWL_RESULTS", &mut c.crawl_results);
        env_override("CRAWL_INTERVAL_DAYS", &mut c.lookback_days);
        env_override("MAX_PAPERS_PER_DAY", &mut c.target_new);
        env_override("MAX_CRAWL_ROUNDS", &mut c.max_rounds);
        env_override("REQUEST_DELAY_SECS", &mut c.request_delay_secs);

        let m = &mut self.smtp;
        env_override("SMTP_SERVER", &mut m.server);
        env_override("SMTP_PORT", &mut m.port);
        env_override("SENDER_EMAIL", &mut m.sender);
        env_override("SENDER_PASSWORD", &mut m.password);
        env_override("RECEIVER_EMAIL", &mut m.receiver);

        env_override("DB_FILE", &mut self.db_path);
        if let Ok(raw) = std::env::var("METRICS_ADDR") {
            match raw.trim().parse() {
                Ok(addr) => self.metrics_addr = Some(addr),
                Err(_) => tracing::warn!(target: "config", key = "METRICS_ADDR", value = %raw, "ignoring unparsable setting"),
            }
        }
    }

    /// Zero counts mean "use the default", never "do nothing".
    fn sanitize(&mut self) {
        let c = &mut self.crawl;
        if c.topic.trim().is_empty() {
            c.topic = DEFAULT_TOPIC.to_string();
        }
        if c.max_results == 0 {
            c.max_results = DEFAULT_MAX_RESULTS;
        }
        if c.crawl_results == 0 {
            c.crawl_results = DEFAULT_PER_ROUND_FETCH;
        }
        if c.target_new == 0 {
            c.target_new = DEFAULT_TARGET_NEW;
        }
        if c.max_rounds == 0 {
            c.max_rounds = DEFAULT_MAX_ROUNDS;
        }
    }

    /// Email delivery needs sender, password and receiver.
    pub fn validate_delivery(&self) -> Result<(), ConfigError> {
        if self.smtp.sender.trim().is_empty() {
            return Err(ConfigError::Missing("SENDER_EMAIL"));
        }
        if self.smtp.password.is_empty() {
            return Err(ConfigError::Missing("SENDER_PASSWORD"));
        }
        if self.smtp.receiver.trim().is_empty() {
            return Err(ConfigError::Missing("RECEIVER_EMAIL"));
        }
        Ok(())
    }

    pub fn client_config(&self) -> ArxivClientConfig {
        ArxivClientConfig {
            api_url: self.crawl.api_url.clone(),
            max_results: self.crawl.max_results,
            request_delay: Duration::from_secs(self.crawl.request_delay_secs),
        }
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            topic: self.crawl.topic.clone(),
            per_round_fetch: self.crawl.crawl_results,
            target_new: self.crawl.target_new,
            max_rounds: self.crawl.max_rounds,
            lookback_days: self.crawl.lookback_days,
        }
    }
}

fn env_override<T: FromStr>(key: &'static str, slot: &mut T) {
    if let Ok(raw) = std::env::var(key) {
        match raw.trim().parse::<T>() {
            Ok(v) => *slot = v,
            Err(_) => {
                tracing::warn!(target: "config", key, value = %raw, "ignoring unparsable setting")
            }
        }
    }
}
