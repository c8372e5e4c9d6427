use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, span, warn, Instrument, Level};

use crate::document::Document;
use crate::error::{AnchorError, StoreError};
use crate::kv::KvBackendVariant;
use crate::ledger::LedgerVariant;
use crate::proof::compute_root;
use crate::store::DocumentStore;
use crate::traits::{AnchorLedger, KvBackend};
use crate::types::{AnchorConfirmation, AnchorRecord, Hash32, Identifier, IdentifierSlot};

use super::AnchorState;

/// Prefix of anchor record keys, ahead of the store's own prefix.
pub const ANCHOR_PREFIX: &[u8] = b"anchor/";

/// Moves documents from unanchored to anchored.
///
/// `DocumentStore::create` is the at-most-once gate: once it succeeds the
/// document is persisted for good, and only the ledger step may be repeated
/// (see [`AnchorCoordinator::retry_anchor`]).
pub struct AnchorCoordinator<B = KvBackendVariant, L = LedgerVariant>
where
    B: KvBackend,
    L: AnchorLedger,
{
    store: Arc<DocumentStore<B>>,
    ledger: Arc<L>,
    ledger_timeout: Duration,
}

impl<B, L> AnchorCoordinator<B, L>
where
    B: KvBackend,
    L: AnchorLedger,
{
    pub fn new(store: Arc<DocumentStore<B>>, ledger: Arc<L>, ledger_timeout: Duration) -> Self {
        Self {
            store,
            ledger,
            ledger_timeout,
        }
    }

    pub fn store(&self) -> &Arc<DocumentStore<B>> {
        &self.store
    }

    /// Validate, persist and anchor `doc`.
    ///
    /// Returns a copy of `doc` carrying its root. The caller's document is
    /// never mutated. If persisting succeeds and the ledger step fails, the
    /// document stays stored and unanchored.
    pub async fn anchor(&self, doc: &Document) -> Result<Document, AnchorError> {
        let id = check_identifiers(doc)?;
        let span = span!(Level::INFO, "anchor", id = %id);

        async {
            let root = compute_root(doc)?;
            let mut anchored = doc.clone();
            anchored.root = Some(root);

            self.store
                .create(&id, &anchored)
                .map_err(|e| create_error(&id, e))?;
            info!("Stored document with root {}", hex::encode(root));

            self.submit(&id, &root).await?;
            Ok::<_, AnchorError>(anchored)
        }
        .instrument(span)
        .await
    }

    /// Repeat only the ledger step for a document that is stored but not
    /// anchored.
    pub async fn retry_anchor(&self, id: &Identifier) -> Result<Document, AnchorError> {
        let span = span!(Level::INFO, "retry_anchor", id = %id);

        async {
            let doc = self.store.get_by_id(id).map_err(|e| match e {
                StoreError::NotFound(id) => AnchorError::NotStored(id),
                other => AnchorError::Store(other),
            })?;
            if self.load_record(id)?.is_some() {
                return Err(AnchorError::AlreadyAnchored(id.clone()));
            }

            let root = compute_root(&doc)?;
            if doc.root != Some(root) {
                error!(
                    "Stored root {:?} differs from recomputed {}",
                    doc.root.map(hex::encode),
                    hex::encode(root)
                );
                return Err(AnchorError::RootMismatch { id: id.clone() });
            }

            self.submit(id, &root).await?;
            Ok::<_, AnchorError>(doc)
        }
        .instrument(span)
        .await
    }

    pub fn status(&self, id: &Identifier) -> Result<AnchorState, AnchorError> {
        if let Some(record) = self.load_record(id)? {
            return Ok(AnchorState::Anchored(record));
        }
        if self.store.exists(id).map_err(AnchorError::Store)? {
            Ok(AnchorState::Stored)
        } else {
            Ok(AnchorState::NotStored)
        }
    }

    /// Register `(id, root)` with the ledger, await its answer within the
    /// configured timeout, then persist the anchor record.
    async fn submit(&self, id: &Identifier, root: &Hash32) -> Result<AnchorRecord, AnchorError> {
        let confirmation = tokio::time::timeout(self.ledger_timeout, async {
            let rx = self
                .ledger
                .register_anchor(id, root)
                .await
                .map_err(|e| AnchorError::LedgerUnavailable {
                    id: id.clone(),
                    message: format!("{e:#}"),
                })?;
            debug!("Submitted root to ledger {}", self.ledger.name());

            rx.recv().await.map_err(|e| AnchorError::LedgerUnavailable {
                id: id.clone(),
                message: format!("confirmation channel closed: {e}"),
            })
        })
        .await
        .map_err(|_| {
            warn!("Ledger confirmation timed out after {:?}", self.ledger_timeout);
            AnchorError::TimedOut {
                id: id.clone(),
                after: self.ledger_timeout,
            }
        })?
        .inspect_err(|e| error!("Ledger submission failed: {}", e))?;

        match confirmation {
            AnchorConfirmation::Rejected { reason } => {
                warn!("Ledger rejected anchor: {}", reason);
                Err(AnchorError::AnchorRejected {
                    id: id.clone(),
                    reason,
                })
            }
            AnchorConfirmation::Confirmed {
                ledger_ref,
                anchored_at,
            } => {
                let record = AnchorRecord {
                    document_identifier: id.clone(),
                    root: *root,
                    anchored_at,
                    ledger_ref,
                };
                self.save_record(&record)?;
                info!(
                    "Anchored at {} (ledger_ref={})",
                    record.anchored_at, record.ledger_ref
                );
                Ok(record)
            }
        }
    }

    fn record_key(&self, id: &Identifier) -> Vec<u8> {
        let prefix = self.store.prefix();
        let mut key = Vec::with_capacity(ANCHOR_PREFIX.len() + prefix.len() + id.as_bytes().len());
        key.extend_from_slice(ANCHOR_PREFIX);
        key.extend_from_slice(prefix);
        key.extend_from_slice(id.as_bytes());
        key
    }

    fn load_record(&self, id: &Identifier) -> Result<Option<AnchorRecord>, AnchorError> {
        let raw = self
            .store
            .backend()
            .get(&self.record_key(id))
            .map_err(|e| AnchorError::Store(StoreError::Backend(e)))?;
        raw.map(|bytes| {
            serde_json::from_slice(&bytes).map_err(|source| {
                AnchorError::Store(StoreError::Corrupt {
                    id: id.clone(),
                    source,
                })
            })
        })
        .transpose()
    }

    fn save_record(&self, record: &AnchorRecord) -> Result<(), AnchorError> {
        let id = &record.document_identifier;
        let value = serde_json::to_vec(record)
            .map_err(|e| AnchorError::Store(StoreError::Backend(e.into())))?;
        let written = self
            .store
            .backend()
            .insert_if_absent(&self.record_key(id), &value)
            .map_err(|e| AnchorError::Store(StoreError::Backend(e)))?;
        if !written {
            return Err(AnchorError::AlreadyAnchored(id.clone()));
        }
        Ok(())
    }
}

/// The document identifier anchoring is keyed on.
///
/// Version identifiers require a document identifier, and no two slots may
/// carry the same value.
pub fn check_identifiers(doc: &Document) -> Result<Identifier, AnchorError> {
    let present = |slot: &Option<Identifier>| slot.as_ref().filter(|id| !id.is_empty()).cloned();

    let slots = [
        (IdentifierSlot::Document, present(&doc.document_identifier)),
        (IdentifierSlot::CurrentVersion, present(&doc.current_version)),
        (IdentifierSlot::NextVersion, present(&doc.next_version)),
    ];

    for (i, (first, a)) in slots.iter().enumerate() {
        for (second, b) in &slots[i + 1..] {
            if let (Some(a), Some(b)) = (a, b) {
                if a == b {
                    return Err(AnchorError::InconsistentIdentifiers {
                        first: *first,
                        second: *second,
                    });
                }
            }
        }
    }

    let [(_, document), ..] = slots;
    document.ok_or(AnchorError::MissingIdentifier {
        slot: IdentifierSlot::Document,
    })
}

fn create_error(id: &Identifier, e: StoreError) -> AnchorError {
    match e {
        StoreError::AlreadyExists(_) => AnchorError::AlreadyAnchored(id.clone()),
        StoreError::Validation { id, reason } => AnchorError::ValidationFailed { id, reason },
        other => AnchorError::Store(other),
    }
}
