//! Command-line definitions for `arxiv-digest` and `digest-admin`.

use std::path::PathBuf;

use clap::{ArgGroup, Parser, Subcommand};

use crate::error::ConfigError;
use crate::scheduler::Schedule;

const DEFAULT_DAILY_TIME: &str = "09:00";

/// Crawl arXiv for a topic and email papers that were not sent before.
#[derive(Debug, Parser)]
#[command(
    name = "arxiv-digest",
    version,
    about,
    group(ArgGroup::new("mode").args(["once", "daily", "hourly", "interval"])),
    after_help = "Examples:\n  arxiv-digest -t \"machine learning\" --once\n  arxiv-digest -t \"deep learning\" --daily 09:00\n  arxiv-digest -t \"computer vision\" --hourly\n  arxiv-digest -t \"natural language processing\" --interval 30"
)]
pub struct Cli {
    /// Topic to search (defaults to the configured topic)
    #[arg(short, long)]
    pub topic: Option<String>,

    /// Run a single crawl and exit
    #[arg(long)]
    pub once: bool,

    /// Run every day at HH:MM (local time)
    #[arg(long, value_name = "TIME")]
    pub daily: Option<String>,

    /// Run once an hour
    #[arg(long)]
    pub hourly: bool,

    /// Run every N minutes
    #[arg(long, value_name = "MINUTES")]
    pub interval: Option<u64>,

    /// TOML config file (overrides DIGEST_CONFIG_PATH)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Selected schedule; daily at 09:00 when no mode flag is given.
    pub fn schedule(&self) -> Result<Schedule, ConfigError> {
        if self.once {
            Ok(Schedule::Once)
        } else if let Some(at) = &self.daily {
            Schedule::daily(at)
        } else if self.hourly {
            Ok(Schedule::Hourly)
        } else if let Some(m) = self.interval {
            Schedule::every_minutes(m)
        } else {
            Schedule::daily(DEFAULT_DAILY_TIME)
        }
    }
}

/// Inspect and maintain the delivered-paper ledger.
#[derive(Debug, Parser)]
#[command(name = "digest-admin", version, about)]
pub struct AdminCli {
    /// SQLite file (defaults to DB_FILE or papers.db)
    #[arg(long, value_name = "PATH")]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: AdminCommand,
}

#[derive(Debug, Subcommand)]
pub enum AdminCommand {
    /// Number of delivered papers
    Count,
    /// Most recently delivered papers
    List {
        #[arg(long, default_value_t = 10)]
        limit: usize,
        /// Print JSON lines instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Delete records older than N days
    Prune {
        #[arg(long, default_value_t = 30)]
        days: u32,
    },
    /// Drop every record
    Reset {
        /// Required confirmation
        #[arg(long)]
        yes: bool,
    },
}
