//! # Retrieval Engine
//! Drives a [`PaperSource`] over several rounds and keeps only papers that were
//! neither delivered in an earlier run nor already collected in this one.
//!
//! Policy: stop as soon as `target` new papers are collected (checked after each
//! round), or when the round budget runs out. Running out is not a failure; the
//! caller simply gets fewer papers.
//!
//! Two separate id sets are consulted: the persisted Seen Set owned by
//! [`DeliveryHistory`] (cross-run) and a per-call set (intra-run). The search
//! API does not guarantee disjoint or stably ordered pages for repeated
//! identical queries, so the same paper can come back in several rounds.

use std::collections::HashSet;

use metrics::counter;

use crate::history::DeliveryHistory;
use crate::ingest::ensure_metrics_described;
use crate::ingest::types::{Paper, PaperSource};
use crate::scheduler::Shutdown;

pub const DEFAULT_TOPIC: &str = "machine learning";
pub const DEFAULT_PER_ROUND_FETCH: usize = 50;
pub const DEFAULT_TARGET_NEW: usize = 10;
pub const DEFAULT_MAX_ROUNDS: usize = 15;
pub const DEFAULT_LOOKBACK_DAYS: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub topic: String,
    /// Results requested from the source each round; independent of the target.
    pub per_round_fetch: usize,
    /// Used when `retrieve_new` is called with `target_count == 0`.
    pub target_new: usize,
    /// Used when `retrieve_new` is called with `max_rounds == 0`.
    pub max_rounds: usize,
    /// Advisory only; logged, never sent to the API.
    pub lookback_days: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            topic: DEFAULT_TOPIC.to_string(),
            per_round_fetch: DEFAULT_PER_ROUND_FETCH,
            target_new: DEFAULT_TARGET_NEW,
            max_rounds: DEFAULT_MAX_ROUNDS,
            lookback_days: DEFAULT_LOOKBACK_DAYS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Idle,
    Rounding,
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    TargetReached,
    RoundsExhausted,
    /// Shutdown was requested; the loop stopped between rounds.
    Interrupted,
}

#[derive(Debug, Clone)]
pub struct Retrieval {
    pub papers: Vec<Paper>,
    pub rounds: usize,
    pub termination: Termination,
}

pub struct RetrievalEngine<S> {
    source: S,
    history: DeliveryHistory,
    cfg: EngineConfig,
    state: EngineState,
    shutdown: Shutdown,
}

impl<S: PaperSource> RetrievalEngine<S> {
    pub fn new(source: S, history: DeliveryHistory, cfg: EngineConfig) -> Self {
        Self {
            source,
            history,
            cfg,
            state: EngineState::Idle,
            shutdown: Shutdown::default(),
        }
    }

    pub fn with_shutdown(mut self, shutdown: Shutdown) -> Self {
        self.shutdown = shutdown;
        self
    }

    pub fn topic(&self) -> &str {
        &self.cfg.topic
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn history(&self) -> &DeliveryHistory {
        &self.history
    }

    pub fn already_delivered(&self, id: &str) -> bool {
        self.history.already_delivered(id)
    }

    pub async fn mark_delivered(&mut self, papers: &[Paper]) -> usize {
        self.history.mark_delivered(papers).await
    }

    /// New papers in first-admission order. Zero for either argument means
    /// "use the configured default".
    pub async fn retrieve_new(&mut self, target_count: usize, max_rounds: usize) -> Vec<Paper> {
        self.retrieve(target_count, max_rounds).await.papers
    }

    pub async fn retrieve(&mut self, target_count: usize, max_rounds: usize) -> Retrieval {
        ensure_metrics_described();

        let target = pick(target_count, self.cfg.target_new);
        let max_rounds = pick(max_rounds, self.cfg.max_rounds);
        let per_round = self.cfg.per_round_fetch.max(1);

        tracing::info!(
            target: "engine",
            topic = %self.cfg.topic,
            source = self.source.name(),
            target_new = target,
            max_rounds,
            per_round,
            lookback_days = self.cfg.lookback_days,
            "retrieval started"
        );

        self.state = EngineState::Rounding;
        let mut run_ids: HashSet<String> = HashSet::new();
        let mut papers: Vec<Paper> = Vec::new();
        let mut rounds = 0usize;
        let mut termination = Termination::RoundsExhausted;

        for round in 1..=max_rounds {
            if self.shutdown.is_triggered() {
                termination = Termination::Interrupted;
                break;
            }
            rounds = round;

            let raw = self.source.search(&self.cfg.topic, per_round).await;
            counter!("crawl_rounds_total").increment(1);

            let raw_len = raw.len();
            let mut admitted = 0usize;
            for p in raw.into_iter().take(per_round) {
                if self.history.already_delivered(&p.id) || !run_ids.insert(p.id.clone()) {
                    continue;
                }
                papers.push(p);
                admitted += 1;
            }
            counter!("crawl_admitted_total").increment(admitted as u64);
            counter!("crawl_duplicates_total").increment((raw_len.min(per_round) - admitted) as u64);

            tracing::info!(
                target: "engine",
                round,
                raw = raw_len,
                admitted,
                total = papers.len(),
                "round finished"
            );

            if papers.len() >= target {
                termination = Termination::TargetReached;
                break;
            }
        }

        self.state = EngineState::Done;
        tracing::info!(
            target: "engine",
            rounds,
            found = papers.len(),
            termination = ?termination,
            "retrieval finished"
        );

        Retrieval {
            papers,
            rounds,
            termination,
        }
    }
}

fn pick(requested: usize, default: usize) -> usize {
    if requested == 0 {
        default.max(1)
    } else {
        requested
    }
}
