use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use thiserror::Error;

use crate::types::{Identifier, IdentifierSlot, RecipientId};

/// Coarse classification used by callers to decide whether to retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Caller-fixable input; never retried automatically.
    Input,
    /// The operation conflicts with existing state and cannot succeed as-is.
    Conflict,
    /// A collaborator definitively refused the request.
    Rejected,
    /// Safe to retry without re-deriving state.
    Transient,
    /// A deadline elapsed before a collaborator answered.
    Cancelled,
    /// Internal bug, not a business condition.
    Invariant,
}

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("field `{field}` has type `{kind}` which has no canonical encoding")]
    UnsupportedFieldType { field: String, kind: &'static str },

    #[error("field `{field}` declared as `{declared}` holds a `{found}` value")]
    FieldNotCommittable {
        field: String,
        declared: String,
        found: &'static str,
    },

    #[error("field `{field}` expects nested schema `{expected}`, got `{found}`")]
    SchemaMismatch {
        field: String,
        expected: String,
        found: String,
    },

    #[error("unknown field `{field}` for schema `{schema}`")]
    UnknownField { schema: String, field: String },

    #[error("invalid schema `{schema}`: {reason}")]
    InvalidSchema { schema: String, reason: String },

    #[error("document has no committable fields")]
    EmptyDocument,
}

impl CodecError {
    pub fn class(&self) -> ErrorClass {
        ErrorClass::Input
    }
}

#[derive(Debug, Error)]
pub enum ProofError {
    #[error("field `{0}` not found in document")]
    FieldNotFound(String),

    #[error("property `{0}` names a composite field; prove one of its leaves")]
    CompositeField(String),

    #[error("leaf index {index} out of range for {count} leaves")]
    LeafIndexOutOfRange { index: u64, count: u64 },

    #[error("proof path has {got} hashes but a tree of {leaf_count} leaves needs {expected}")]
    PathLengthMismatch {
        leaf_count: u64,
        expected: usize,
        got: usize,
    },

    #[error(transparent)]
    Codec(#[from] CodecError),
}

impl ProofError {
    pub fn class(&self) -> ErrorClass {
        match self {
            ProofError::PathLengthMismatch { .. } => ErrorClass::Invariant,
            _ => ErrorClass::Input,
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("document {0} already exists")]
    AlreadyExists(Identifier),

    #[error("document {0} not found")]
    NotFound(Identifier),

    #[error("document {id} failed validation: {reason}")]
    Validation { id: Identifier, reason: String },

    #[error("document {stored} cannot be replaced by a document with {}", render_identifier(.given))]
    IdentifierChanged {
        stored: Identifier,
        given: Option<Identifier>,
    },

    #[error("stored document {id} is unreadable: {source}")]
    Corrupt {
        id: Identifier,
        #[source]
        source: serde_json::Error,
    },

    #[error("storage backend error: {0}")]
    Backend(#[from] anyhow::Error),
}

impl StoreError {
    pub fn class(&self) -> ErrorClass {
        match self {
            StoreError::AlreadyExists(_) => ErrorClass::Conflict,
            StoreError::NotFound(_)
            | StoreError::Validation { .. }
            | StoreError::IdentifierChanged { .. } => ErrorClass::Input,
            StoreError::Corrupt { .. } => ErrorClass::Invariant,
            StoreError::Backend(_) => ErrorClass::Transient,
        }
    }
}

#[derive(Debug, Error)]
pub enum AnchorError {
    #[error("{slot} is required")]
    MissingIdentifier { slot: IdentifierSlot },

    #[error("{first} and {second} carry the same value")]
    InconsistentIdentifiers {
        first: IdentifierSlot,
        second: IdentifierSlot,
    },

    #[error("document {id} failed validation: {reason}")]
    ValidationFailed { id: Identifier, reason: String },

    #[error("document {0} is already anchored")]
    AlreadyAnchored(Identifier),

    #[error("document {0} has not been stored")]
    NotStored(Identifier),

    #[error("stored root for {id} does not match its fields")]
    RootMismatch { id: Identifier },

    #[error("ledger rejected anchor for {id}: {reason}")]
    AnchorRejected { id: Identifier, reason: String },

    #[error("ledger unavailable while anchoring {id}: {message}")]
    LedgerUnavailable { id: Identifier, message: String },

    #[error("ledger confirmation for {id} timed out after {after:?}")]
    TimedOut { id: Identifier, after: Duration },

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Store(StoreError),
}

impl AnchorError {
    pub fn class(&self) -> ErrorClass {
        match self {
            AnchorError::MissingIdentifier { .. }
            | AnchorError::InconsistentIdentifiers { .. }
            | AnchorError::ValidationFailed { .. }
            | AnchorError::NotStored(_) => ErrorClass::Input,
            AnchorError::AlreadyAnchored(_) => ErrorClass::Conflict,
            AnchorError::AnchorRejected { .. } => ErrorClass::Rejected,
            AnchorError::LedgerUnavailable { .. } => ErrorClass::Transient,
            AnchorError::TimedOut { .. } => ErrorClass::Cancelled,
            AnchorError::RootMismatch { .. } => ErrorClass::Invariant,
            AnchorError::Codec(e) => e.class(),
            AnchorError::Store(e) => e.class(),
        }
    }
}

/// Why a single recipient did not receive the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryFailure {
    Failed(String),
    TimedOut(Duration),
}

impl DeliveryFailure {
    pub fn class(&self) -> ErrorClass {
        match self {
            DeliveryFailure::Failed(_) => ErrorClass::Transient,
            DeliveryFailure::TimedOut(_) => ErrorClass::Cancelled,
        }
    }
}

impl fmt::Display for DeliveryFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeliveryFailure::Failed(msg) => f.write_str(msg),
            DeliveryFailure::TimedOut(after) => write!(f, "timed out after {after:?}"),
        }
    }
}

#[derive(Debug, Error)]
pub enum DistributionError {
    #[error("document has no root; anchor it before distribution")]
    Unanchored,

    #[error("delivery failed for {} of {attempted} recipients: {}", .failures.len(), render_failures(.failures))]
    Partial {
        attempted: usize,
        failures: BTreeMap<RecipientId, DeliveryFailure>,
    },
}

impl DistributionError {
    pub fn class(&self) -> ErrorClass {
        match self {
            DistributionError::Unanchored => ErrorClass::Input,
            DistributionError::Partial { failures, .. } => {
                if failures
                    .values()
                    .all(|f| f.class() == ErrorClass::Cancelled)
                {
                    ErrorClass::Cancelled
                } else {
                    ErrorClass::Transient
                }
            }
        }
    }

    /// Recipients that did not receive the document, in sorted order.
    pub fn failed_recipients(&self) -> Vec<&RecipientId> {
        match self {
            DistributionError::Unanchored => Vec::new(),
            DistributionError::Partial { failures, .. } => failures.keys().collect(),
        }
    }
}

fn render_identifier(id: &Option<Identifier>) -> String {
    match id {
        Some(id) => format!("identifier {id}"),
        None => "no identifier".to_string(),
    }
}

fn render_failures(failures: &BTreeMap<RecipientId, DeliveryFailure>) -> String {
    failures
        .iter()
        .map(|(recipient, failure)| format!("{recipient}: {failure}"))
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_distribution_error_lists_every_recipient() {
        let mut failures = BTreeMap::new();
        failures.insert(
            RecipientId::from("bob"),
            DeliveryFailure::Failed("connection refused".into()),
        );
        failures.insert(
            RecipientId::from("carol"),
            DeliveryFailure::TimedOut(Duration::from_secs(2)),
        );
        let err = DistributionError::Partial {
            attempted: 3,
            failures,
        };

        let msg = err.to_string();
        assert!(msg.contains("2 of 3"));
        assert!(msg.contains("bob: connection refused"));
        assert!(msg.contains("carol: timed out"));
        assert!(!msg.contains("alice"));
        assert_eq!(err.class(), ErrorClass::Transient);
    }

    #[test]
    fn test_store_conflict_class() {
        let err = StoreError::AlreadyExists(Identifier::from("abc1"));
        assert_eq!(err.class(), ErrorClass::Conflict);
        assert!(err.to_string().contains("0x61626331"));
    }
}
