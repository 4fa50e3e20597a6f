//! arxiv-digest: binary entrypoint.
//! Loads settings, opens the delivered-paper ledger, and runs the digest job
//! on the selected schedule until Ctrl-C.

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::Mutex;

use arxiv_digest::cli::Cli;
use arxiv_digest::config::Settings;
use arxiv_digest::job::run_digest;
use arxiv_digest::notify::email::EmailNotifier;
use arxiv_digest::scheduler::{self, Shutdown};
use arxiv_digest::{telemetry, ArxivClient, DeliveryHistory, ResultStore, RetrievalEngine};

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env if present; a missing file is fine.
    let _ = dotenvy::dotenv();
    arxiv_digest::init_tracing();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e:#}");
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let schedule = cli.schedule()?;

    let mut settings = match &cli.config {
        Some(path) => Settings::load_from(Some(path.as_path()))?,
        None => Settings::load()?,
    };
    if let Some(topic) = cli.topic.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        settings.crawl.topic = topic.to_string();
    }

    // Delivery credentials are checked before any retrieval happens.
    settings
        .validate_delivery()
        .context("email settings incomplete; fill SENDER_EMAIL, SENDER_PASSWORD and RECEIVER_EMAIL in .env")?;
    let notifier = EmailNotifier::new(&settings.smtp)?;

    if let Some(addr) = settings.metrics_addr {
        telemetry::install_exporter(addr)?;
    }

    let store = ResultStore::open(&settings.db_path)
        .await
        .with_context(|| format!("opening result store {}", settings.db_path.display()))?;
    let history = DeliveryHistory::load(store, Some(settings.crawl.topic.clone())).await?;
    let client = ArxivClient::new(settings.client_config())?;

    let shutdown = Shutdown::default();
    shutdown.listen_for_ctrl_c();

    let engine = RetrievalEngine::new(client, history, settings.engine_config())
        .with_shutdown(shutdown.clone());
    let engine = Arc::new(Mutex::new(engine));
    let notifier = Arc::new(notifier);

    tracing::info!(topic = %settings.crawl.topic, ?schedule, "arxiv-digest starting");
    scheduler::run(schedule, shutdown, move || {
        let engine = engine.clone();
        let notifier = notifier.clone();
        async move {
            let mut engine = engine.lock().await;
            run_digest(&mut *engine, notifier.as_ref()).await;
        }
    })
    .await;

    Ok(())
}
