pub mod anchor_ledger;
pub mod kv_backend;
pub mod transport;

pub use anchor_ledger::AnchorLedger;
pub use kv_backend::KvBackend;
pub use transport::Transport;
