pub mod memory;
pub mod rocks;
pub mod variant;

pub use memory::MemoryBackend;
pub use rocks::RocksBackend;
pub use variant::KvBackendVariant;
