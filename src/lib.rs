// src/lib.rs
// Public library surface for the binaries and integration tests.

pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod history;
pub mod ingest;
pub mod job;
pub mod notify;
pub mod scheduler;
pub mod store;
pub mod telemetry;

// ---- Re-exports for stable public API ----
pub use crate::engine::{EngineConfig, Retrieval, RetrievalEngine, Termination};
pub use crate::history::DeliveryHistory;
pub use crate::ingest::providers::arxiv::ArxivClient;
pub use crate::ingest::types::{Paper, PaperSource};
pub use crate::store::ResultStore;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Compact stderr logging; `RUST_LOG` overrides the default filter.
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("arxiv_digest=info,warn"));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_writer(std::io::stderr))
        .try_init();
}
