pub mod digest;
pub mod email;

use anyhow::Result;

use crate::ingest::types::Paper;

/// Delivers one batch of papers for a topic. `Ok` means the batch reached the
/// recipient and may be recorded as delivered.
#[async_trait::async_trait]
pub trait DigestNotifier: Send + Sync {
    async fn send_digest(&self, papers: &[Paper], topic: &str) -> Result<()>;
    fn name(&self) -> &'static str;
}
