use anyhow::Result;
use async_trait::async_trait;
use kanal::AsyncReceiver;

use crate::types::{AnchorConfirmation, Hash32, Identifier};

/// Where document roots are anchored (smart contract, append-only ledger).
#[async_trait]
pub trait AnchorLedger: Send + Sync {
    /// Ledger name for logging.
    fn name(&self) -> &'static str;

    /// Submit `(id, root)` for anchoring.
    ///
    /// An `Err` means the submission itself failed. On success the returned
    /// channel yields exactly one confirmation once the ledger has decided.
    async fn register_anchor(
        &self,
        id: &Identifier,
        root: &Hash32,
    ) -> Result<AsyncReceiver<AnchorConfirmation>>;
}
