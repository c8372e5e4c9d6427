// Library exports for testing and external use

pub mod anchor;
pub mod codec;
pub mod config;
pub mod crypto;
pub mod distribution;
pub mod document;
pub mod error;
pub mod kv;
pub mod ledger;
pub mod proof;
pub mod store;
pub mod telemetry;
pub mod traits;
pub mod transport;
pub mod types;

// Re-export commonly used types and traits
pub use anchor::{AnchorCoordinator, AnchorState};
pub use config::BaseConfig;
pub use distribution::DistributionCoordinator;
pub use document::{Document, Field, FieldDef, FieldKind, Schema, TypedValue};
pub use error::{
    AnchorError, CodecError, DeliveryFailure, DistributionError, ErrorClass, ProofError,
    StoreError,
};
pub use proof::{
    compute_root, create_proof, create_proofs_batch, verify_disclosed, verify_proof,
    DocumentTree, Proof,
};
pub use store::DocumentStore;
pub use traits::{AnchorLedger, KvBackend, Transport};
pub use types::{
    AnchorConfirmation, AnchorRecord, DocumentHasher, Hash32, Identifier, IdentifierSlot,
    RecipientId, Salt,
};

// Re-export variant enums for convenience
pub use kv::{KvBackendVariant, MemoryBackend, RocksBackend};
pub use ledger::{LedgerVariant, MockLedger, NoopLedger};
pub use transport::{MockTransport, NoopTransport, TransportVariant};
