// src/job.rs
//! One digest run: retrieve new papers, send them, and only then record them.

use metrics::gauge;

use crate::engine::{RetrievalEngine, Termination};
use crate::ingest::types::PaperSource;
use crate::notify::DigestNotifier;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobOutcome {
    NoNewPapers,
    /// Shutdown arrived mid-retrieval; nothing was sent or recorded.
    Interrupted,
    Delivered { sent: usize, recorded: usize },
    /// The notifier failed; nothing was recorded, so the papers stay eligible.
    DeliveryFailed { attempted: usize },
}

pub async fn run_digest<S, N>(engine: &mut RetrievalEngine<S>, notifier: &N) -> JobOutcome
where
    S: PaperSource,
    N: DigestNotifier + ?Sized,
{
    let started = chrono::Local::now();
    tracing::info!(target: "job", topic = %engine.topic(), at = %started.format("%Y-%m-%d %H:%M:%S"), "digest job started");

    let retrieval = engine.retrieve(0, 0).await;
    let outcome = if retrieval.termination == Termination::Interrupted {
        JobOutcome::Interrupted
    } else if retrieval.papers.is_empty() {
        tracing::info!(target: "job", "no new papers");
        JobOutcome::NoNewPapers
    } else {
        let papers = retrieval.papers;
        let topic = engine.topic().to_string();
        match notifier.send_digest(&papers, &topic).await {
            Ok(()) => {
                let recorded = engine.mark_delivered(&papers).await;
                JobOutcome::Delivered {
                    sent: papers.len(),
                    recorded,
                }
            }
            Err(e) => {
                tracing::warn!(target: "job", notifier = notifier.name(), error = %format!("{e:#}"), "digest delivery failed");
                JobOutcome::DeliveryFailed {
                    attempted: papers.len(),
                }
            }
        }
    };

    gauge!("digest_last_run_ts").set(chrono::Utc::now().timestamp() as f64);
    tracing::info!(target: "job", outcome = ?outcome, "digest job finished");
    outcome
}
