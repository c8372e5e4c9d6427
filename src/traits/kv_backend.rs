use anyhow::Result;

/// Ordered key-value backend underneath the document store.
///
/// `insert_if_absent` must be atomic with respect to other calls for the
/// same key: of any number of concurrent inserts of one key, exactly one
/// returns `true`.
pub trait KvBackend: Send + Sync {
    /// Backend name for logging.
    fn name(&self) -> &'static str;

    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>>;

    /// Unconditional write.
    fn put(&self, key: &[u8], value: &[u8]) -> Result<()>;

    fn exists(&self, key: &[u8]) -> Result<bool> {
        Ok(self.get(key)?.is_some())
    }

    /// Write `value` only if `key` is absent. Returns whether it was written.
    fn insert_if_absent(&self, key: &[u8], value: &[u8]) -> Result<bool>;
}
