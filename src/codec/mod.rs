//! Canonical leaf encoding of documents.

pub mod field;
pub mod leaves;

pub use field::{encode_field, salted, LENGTH_SUFFIX};
pub use leaves::{document_leaves, Leaf};
