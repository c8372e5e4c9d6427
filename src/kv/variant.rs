use anyhow::Result;

use super::memory::MemoryBackend;
use super::rocks::RocksBackend;
use crate::traits::KvBackend;

/// Enum representing all key-value backend implementations.
pub enum KvBackendVariant {
    Rocks(RocksBackend),
    Memory(MemoryBackend),
}

impl KvBackend for KvBackendVariant {
    fn name(&self) -> &'static str {
        match self {
            KvBackendVariant::Rocks(inner) => inner.name(),
            KvBackendVariant::Memory(inner) => inner.name(),
        }
    }

    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        match self {
            KvBackendVariant::Rocks(inner) => inner.get(key),
            KvBackendVariant::Memory(inner) => inner.get(key),
        }
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        match self {
            KvBackendVariant::Rocks(inner) => inner.put(key, value),
            KvBackendVariant::Memory(inner) => inner.put(key, value),
        }
    }

    fn exists(&self, key: &[u8]) -> Result<bool> {
        match self {
            KvBackendVariant::Rocks(inner) => inner.exists(key),
            KvBackendVariant::Memory(inner) => inner.exists(key),
        }
    }

    fn insert_if_absent(&self, key: &[u8], value: &[u8]) -> Result<bool> {
        match self {
            KvBackendVariant::Rocks(inner) => inner.insert_if_absent(key, value),
            KvBackendVariant::Memory(inner) => inner.insert_if_absent(key, value),
        }
    }
}
