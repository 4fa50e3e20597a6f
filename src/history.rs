//! history.rs: which papers have already gone out.
//!
//! Keeps the Seen Set in memory (loaded once from the [`ResultStore`]) and
//! commits newly delivered papers back to the store.

use std::collections::HashSet;

use metrics::counter;

use crate::error::StoreError;
use crate::ingest::types::Paper;
use crate::store::ResultStore;

#[derive(Debug)]
pub struct DeliveryHistory {
    store: ResultStore,
    seen: HashSet<String>,
    topic: Option<String>,
}

impl DeliveryHistory {
    /// Load every delivered identifier. A store that cannot be read is fatal:
    /// without it the Seen Set cannot be trusted.
    pub async fn load(store: ResultStore, topic: Option<String>) -> Result<Self, StoreError> {
        let seen: HashSet<String> = store.load_identifiers().await?.into_iter().collect();
        tracing::info!(target: "history", delivered = seen.len(), "loaded delivery history");
        Ok(Self { store, seen, topic })
    }

    pub fn already_delivered(&self, id: &str) -> bool {
        self.seen.contains(id)
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    pub fn store(&self) -> &ResultStore {
        &self.store
    }

    /// Record `papers` as delivered. Write failures are logged and the paper
    /// stays unrecorded (it may be delivered again on a later run).
    /// Returns how many papers are now recorded from this batch.
    pub async fn mark_delivered(&mut self, papers: &[Paper]) -> usize {
        let mut recorded = 0usize;
        for p in papers {
            match self
                .store
                .insert_if_absent(&p.id, &p.title, self.topic.as_deref())
                .await
            {
                Ok(inserted) => {
                    if !inserted {
                        tracing::debug!(target: "history", id = %p.id, "already recorded");
                    }
                    self.seen.insert(p.id.clone());
                    recorded += 1;
                }
                Err(e) => {
                    tracing::warn!(target: "history", id = %p.id, error = %e, "could not record delivery");
                    counter!("delivery_record_errors_total").increment(1);
                }
            }
        }
        counter!("delivery_recorded_total").increment(recorded as u64);
        recorded
    }
}
