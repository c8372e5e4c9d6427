use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{anyhow, Result};
use rocksdb::{Options, DB};

use crate::traits::KvBackend;

const LOCK_STRIPES: usize = 64;

/// RocksDB-backed key-value store.
///
/// Writes take a per-key lock stripe so that the existence check and write
/// of `insert_if_absent` cannot interleave with another write of the same key.
pub struct RocksBackend {
    db: Arc<DB>,
    stripes: Vec<Mutex<()>>,
}

impl RocksBackend {
    pub fn open(path: &str) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        let db = DB::open(&opts, path)?;
        Ok(Self {
            db: Arc::new(db),
            stripes: (0..LOCK_STRIPES).map(|_| Mutex::new(())).collect(),
        })
    }

    fn lock_key(&self, key: &[u8]) -> Result<MutexGuard<'_, ()>> {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        let stripe = (hasher.finish() as usize) % self.stripes.len();
        self.stripes[stripe]
            .lock()
            .map_err(|_| anyhow!("key lock stripe {} poisoned", stripe))
    }
}

impl KvBackend for RocksBackend {
    fn name(&self) -> &'static str {
        "rocksdb"
    }

    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        Ok(self.db.get(key)?)
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        let _guard = self.lock_key(key)?;
        self.db.put(key, value)?;
        Ok(())
    }

    fn insert_if_absent(&self, key: &[u8], value: &[u8]) -> Result<bool> {
        let _guard = self.lock_key(key)?;
        if self.db.get_pinned(key)?.is_some() {
            return Ok(false);
        }
        self.db.put(key, value)?;
        Ok(true)
    }
}
