use anyhow::Result;
use async_trait::async_trait;

use crate::document::Document;
use crate::traits::Transport;
use crate::types::RecipientId;

/// Transport that drops every document.
/// Useful for testing or when distribution is handled elsewhere.
pub struct NoopTransport;

#[async_trait]
impl Transport for NoopTransport {
    fn name(&self) -> &'static str {
        "noop-transport"
    }

    async fn transmit(&self, _doc: &Document, _recipient: &RecipientId) -> Result<()> {
        Ok(())
    }
}
