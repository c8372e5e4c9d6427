use anyhow::Result;
use async_trait::async_trait;
use kanal::{bounded_async, AsyncReceiver};

use crate::traits::AnchorLedger;
use crate::types::{now_secs, AnchorConfirmation, Hash32, Identifier};

/// Ledger that confirms every anchor immediately without recording it.
pub struct NoopLedger;

#[async_trait]
impl AnchorLedger for NoopLedger {
    fn name(&self) -> &'static str {
        "noop-ledger"
    }

    async fn register_anchor(
        &self,
        id: &Identifier,
        root: &Hash32,
    ) -> Result<AsyncReceiver<AnchorConfirmation>> {
        tracing::info!(
            "Noop anchor registration: id={}, root={}",
            id,
            hex::encode(root)
        );
        let (tx, rx) = bounded_async(1);
        tx.send(AnchorConfirmation::Confirmed {
            ledger_ref: "noop".to_string(),
            anchored_at: now_secs(),
        })
        .await?;
        Ok(rx)
    }
}
