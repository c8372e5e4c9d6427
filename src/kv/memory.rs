use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};

use crate::traits::KvBackend;

/// In-memory backend for tests and ephemeral use.
#[derive(Clone, Default)]
pub struct MemoryBackend {
    entries: Arc<Mutex<BTreeMap<Vec<u8>, Vec<u8>>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KvBackend for MemoryBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| anyhow!("memory backend lock poisoned"))?;
        Ok(entries.get(key).cloned())
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| anyhow!("memory backend lock poisoned"))?;
        entries.insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn insert_if_absent(&self, key: &[u8], value: &[u8]) -> Result<bool> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| anyhow!("memory backend lock poisoned"))?;
        match entries.entry(key.to_vec()) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(slot) => {
                slot.insert(value.to_vec());
                Ok(true)
            }
        }
    }
}
