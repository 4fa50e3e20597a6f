//! Maintenance commands for the delivered-paper ledger.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;

use arxiv_digest::cli::{AdminCli, AdminCommand};
use arxiv_digest::store::{ResultStore, DEFAULT_DB_FILE};

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    arxiv_digest::init_tracing();

    let cli = AdminCli::parse();
    let path = cli
        .db
        .or_else(|| std::env::var("DB_FILE").ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_FILE));
    let store = ResultStore::open(&path)
        .await
        .with_context(|| format!("opening {}", path.display()))?;

    match cli.command {
        AdminCommand::Count => {
            println!("{}", store.count().await?);
        }
        AdminCommand::List { limit, json } => {
            for e in store.list().await?.into_iter().take(limit) {
                if json {
                    println!("{}", serde_json::to_string(&e)?);
                } else {
                    let title: String = e.title.chars().take(60).collect();
                    println!(
                        "{}  {:<16}  {}",
                        e.delivered_at.format("%Y-%m-%d %H:%M"),
                        e.identifier,
                        title
                    );
                }
            }
        }
        AdminCommand::Prune { days } => {
            let n = store.prune_older_than(days).await?;
            println!("removed {n} record(s) older than {days} day(s)");
        }
        AdminCommand::Reset { yes } => {
            if !yes {
                bail!("reset drops every delivery record; re-run with --yes to confirm");
            }
            store.reset().await?;
            println!("result store reset");
        }
    }

    store.close().await;
    Ok(())
}
