pub mod coordinator;

use crate::types::AnchorRecord;

pub use coordinator::{check_identifiers, AnchorCoordinator, ANCHOR_PREFIX};

/// Where a document identifier stands in the anchoring lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnchorState {
    NotStored,
    /// Persisted, but the ledger has not confirmed its root.
    Stored,
    Anchored(AnchorRecord),
}
