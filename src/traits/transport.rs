use anyhow::Result;
use async_trait::async_trait;

use crate::document::Document;
use crate::types::RecipientId;

/// Delivers anchored documents to other parties (P2P, message queue, webhook).
#[async_trait]
pub trait Transport: Send + Sync {
    /// Transport name for logging.
    fn name(&self) -> &'static str;

    /// Attempt delivery of `doc` to one recipient.
    async fn transmit(&self, doc: &Document, recipient: &RecipientId) -> Result<()>;
}
