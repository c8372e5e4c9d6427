use anyhow::Result;
use async_trait::async_trait;

use super::mock::MockTransport;
use super::noop::NoopTransport;
use crate::document::Document;
use crate::traits::Transport;
use crate::types::RecipientId;

/// Enum representing all transport implementations.
pub enum TransportVariant {
    Noop(NoopTransport),
    Mock(MockTransport),
}

#[async_trait]
impl Transport for TransportVariant {
    fn name(&self) -> &'static str {
        match self {
            TransportVariant::Noop(inner) => inner.name(),
            TransportVariant::Mock(inner) => inner.name(),
        }
    }

    async fn transmit(&self, doc: &Document, recipient: &RecipientId) -> Result<()> {
        match self {
            TransportVariant::Noop(inner) => inner.transmit(doc, recipient).await,
            TransportVariant::Mock(inner) => inner.transmit(doc, recipient).await,
        }
    }
}
