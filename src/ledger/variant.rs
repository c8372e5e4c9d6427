use anyhow::Result;
use async_trait::async_trait;
use kanal::AsyncReceiver;

use super::mock::MockLedger;
use super::noop::NoopLedger;
use crate::traits::AnchorLedger;
use crate::types::{AnchorConfirmation, Hash32, Identifier};

/// Enum representing all anchor ledger implementations.
pub enum LedgerVariant {
    Noop(NoopLedger),
    Mock(MockLedger),
}

#[async_trait]
impl AnchorLedger for LedgerVariant {
    fn name(&self) -> &'static str {
        match self {
            LedgerVariant::Noop(inner) => inner.name(),
            LedgerVariant::Mock(inner) => inner.name(),
        }
    }

    async fn register_anchor(
        &self,
        id: &Identifier,
        root: &Hash32,
    ) -> Result<AsyncReceiver<AnchorConfirmation>> {
        match self {
            LedgerVariant::Noop(inner) => inner.register_anchor(id, root).await,
            LedgerVariant::Mock(inner) => inner.register_anchor(id, root).await,
        }
    }
}
