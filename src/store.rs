use std::sync::Arc;

use tracing::{debug, info};

use crate::document::Document;
use crate::error::StoreError;
use crate::kv::KvBackendVariant;
use crate::traits::KvBackend;
use crate::types::Identifier;

/// Business-rule hook run before every create and update.
pub type Validator = Arc<dyn Fn(&Document) -> anyhow::Result<()> + Send + Sync>;

/// Repository for one document type over a key-value backend.
///
/// Keys are `prefix || document identifier`; values are the document's JSON
/// form. A given identifier can be created at most once for the lifetime of
/// the backend.
pub struct DocumentStore<B: KvBackend = KvBackendVariant> {
    backend: Arc<B>,
    prefix: Vec<u8>,
    validator: Option<Validator>,
}

impl<B: KvBackend> DocumentStore<B> {
    pub fn new(backend: Arc<B>, prefix: impl Into<Vec<u8>>) -> Self {
        Self {
            backend,
            prefix: prefix.into(),
            validator: None,
        }
    }

    pub fn with_validator<F>(mut self, validator: F) -> Self
    where
        F: Fn(&Document) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.validator = Some(Arc::new(validator));
        self
    }

    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    pub fn prefix(&self) -> &[u8] {
        &self.prefix
    }

    fn key(&self, id: &Identifier) -> Vec<u8> {
        let mut key = Vec::with_capacity(self.prefix.len() + id.as_bytes().len());
        key.extend_from_slice(&self.prefix);
        key.extend_from_slice(id.as_bytes());
        key
    }

    fn validate(&self, id: &Identifier, doc: &Document) -> Result<(), StoreError> {
        if let Some(validator) = &self.validator {
            validator(doc).map_err(|e| StoreError::Validation {
                id: id.clone(),
                reason: format!("{e:#}"),
            })?;
        }
        Ok(())
    }

    fn encode(doc: &Document) -> Result<Vec<u8>, StoreError> {
        serde_json::to_vec(doc).map_err(|e| StoreError::Backend(e.into()))
    }

    pub fn exists(&self, id: &Identifier) -> Result<bool, StoreError> {
        Ok(self.backend.exists(&self.key(id))?)
    }

    /// Insert `doc` under `id` if nothing is stored there yet.
    pub fn create(&self, id: &Identifier, doc: &Document) -> Result<(), StoreError> {
        let key = self.key(id);
        if self.backend.exists(&key)? {
            return Err(StoreError::AlreadyExists(id.clone()));
        }
        self.validate(id, doc)?;

        let value = Self::encode(doc)?;
        if !self.backend.insert_if_absent(&key, &value)? {
            debug!("Lost create race for {}", id);
            return Err(StoreError::AlreadyExists(id.clone()));
        }
        info!(
            "Created document {} ({} bytes, backend={})",
            id,
            value.len(),
            self.backend.name()
        );
        Ok(())
    }

    /// Overwrite the document stored under `id`. The document identifier
    /// itself may not change.
    pub fn update(&self, id: &Identifier, doc: &Document) -> Result<(), StoreError> {
        let stored = self.get_by_id(id)?;
        if let Some(stored_id) = &stored.document_identifier {
            if doc.document_identifier.as_ref() != Some(stored_id) {
                return Err(StoreError::IdentifierChanged {
                    stored: stored_id.clone(),
                    given: doc.document_identifier.clone(),
                });
            }
        }
        self.validate(id, doc)?;

        let value = Self::encode(doc)?;
        self.backend.put(&self.key(id), &value)?;
        info!("Updated document {} ({} bytes)", id, value.len());
        Ok(())
    }

    pub fn get_by_id(&self, id: &Identifier) -> Result<Document, StoreError> {
        let raw = self
            .backend
            .get(&self.key(id))?
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        serde_json::from_slice(&raw).map_err(|source| StoreError::Corrupt {
            id: id.clone(),
            source,
        })
    }
}
