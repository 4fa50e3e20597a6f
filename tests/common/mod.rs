// tests/common/mod.rs
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;

use arxiv_digest::notify::DigestNotifier;
use arxiv_digest::{DeliveryHistory, EngineConfig, Paper, PaperSource, ResultStore, RetrievalEngine};
use chrono::{TimeZone, Utc};

pub fn paper(id: &str) -> Paper {
    Paper {
        id: id.to_string(),
        title: format!("Paper {id}"),
        authors: vec!["Test Author".into()],
        summary: "Abstract.".into(),
        published: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
        url: format!("http://arxiv.org/abs/{id}"),
        categories: vec!["cs.LG".into()],
    }
}

/// Returns one scripted page per call, then empty pages.
pub struct ScriptedSource {
    pages: Mutex<VecDeque<Vec<String>>>,
    pub calls: Mutex<usize>,
}

impl ScriptedSource {
    pub fn new(pages: &[&[&str]]) -> Self {
        Self {
            pages: Mutex::new(
                pages
                    .iter()
                    .map(|p| p.iter().map(|s| s.to_string()).collect())
                    .collect(),
            ),
            calls: Mutex::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait::async_trait]
impl PaperSource for ScriptedSource {
    async fn search(&self, _topic: &str, max_results: usize) -> Vec<Paper> {
        *self.calls.lock().unwrap() += 1;
        let page = self.pages.lock().unwrap().pop_front().unwrap_or_default();
        page.iter().take(max_results).map(|id| paper(id)).collect()
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

/// Records every batch; fails when `fail` is set.
#[derive(Default)]
pub struct RecordingNotifier {
    pub fail: bool,
    pub batches: Mutex<Vec<(String, Vec<String>)>>,
}

#[async_trait::async_trait]
impl DigestNotifier for RecordingNotifier {
    async fn send_digest(&self, papers: &[Paper], topic: &str) -> anyhow::Result<()> {
        if self.fail {
            anyhow::bail!("smtp unavailable");
        }
        self.batches.lock().unwrap().push((
            topic.to_string(),
            papers.iter().map(|p| p.id.clone()).collect(),
        ));
        Ok(())
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}

pub async fn history_with(seen: &[&str]) -> DeliveryHistory {
    let store = ResultStore::open_in_memory().await.unwrap();
    for id in seen {
        store.insert_if_absent(id, "seen", None).await.unwrap();
    }
    DeliveryHistory::load(store, Some("test topic".into()))
        .await
        .unwrap()
}

pub async fn engine_with(
    pages: &[&[&str]],
    seen: &[&str],
    per_round_fetch: usize,
) -> RetrievalEngine<ScriptedSource> {
    let cfg = EngineConfig {
        topic: "test topic".into(),
        per_round_fetch,
        ..EngineConfig::default()
    };
    RetrievalEngine::new(ScriptedSource::new(pages), history_with(seen).await, cfg)
}
