use std::fmt;

use serde::{Deserialize, Serialize};

/// Fixed-size types used across the system.
pub type Hash32 = [u8; 32];
pub type Salt = [u8; 32];

/// Hash function fixed at the protocol level for leaves and inner nodes.
pub type DocumentHasher = rs_merkle::algorithms::Sha256;

/// Opaque identifier bytes (document id, version ids).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identifier(#[serde(with = "hex::serde")] pub Vec<u8>);

impl Identifier {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Fresh 32-byte random identifier.
    pub fn random() -> Self {
        let bytes: [u8; 32] = rand::random();
        Self(bytes.to_vec())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(&self.0))
    }
}

impl From<&str> for Identifier {
    fn from(value: &str) -> Self {
        Self(value.as_bytes().to_vec())
    }
}

/// Which identifier slot of a document a value occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IdentifierSlot {
    Document,
    CurrentVersion,
    NextVersion,
}

impl fmt::Display for IdentifierSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IdentifierSlot::Document => "document_identifier",
            IdentifierSlot::CurrentVersion => "current_version_identifier",
            IdentifierSlot::NextVersion => "next_version_identifier",
        };
        f.write_str(name)
    }
}

/// Address of a distribution recipient, opaque to the core.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecipientId(pub String);

impl fmt::Display for RecipientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecipientId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Persisted once per document identifier after the ledger confirms the root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnchorRecord {
    pub document_identifier: Identifier,
    #[serde(with = "hex::serde")]
    pub root: Hash32,
    /// UTC unix timestamp in seconds.
    pub anchored_at: u64,
    /// Ledger-side reference (transaction hash, receipt id, ...).
    pub ledger_ref: String,
}

/// Final answer from the ledger for one registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnchorConfirmation {
    Confirmed { ledger_ref: String, anchored_at: u64 },
    Rejected { reason: String },
}

/// Current UTC unix timestamp in seconds.
pub fn now_secs() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
