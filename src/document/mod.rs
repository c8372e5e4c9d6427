//! Structured, versioned documents made of typed, salted fields.

pub mod schema;

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::CodecError;
use crate::types::{Hash32, Identifier, Salt};

pub use schema::{FieldDef, FieldKind, Schema};

/// Closed set of committable values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypedValue {
    Int64(i64),
    Utf8(String),
    Timestamp { seconds: i64, nanos: u32 },
    Bytes(#[serde(with = "hex::serde")] Vec<u8>),
    Message(Box<Document>),
    Repeated(Vec<Field>),
}

impl TypedValue {
    pub fn kind_name(&self) -> &'static str {
        match self {
            TypedValue::Int64(_) => "int64",
            TypedValue::Utf8(_) => "utf8",
            TypedValue::Timestamp { .. } => "timestamp",
            TypedValue::Bytes(_) => "bytes",
            TypedValue::Message(_) => "message",
            TypedValue::Repeated(_) => "repeated",
        }
    }
}

impl From<i64> for TypedValue {
    fn from(value: i64) -> Self {
        TypedValue::Int64(value)
    }
}

impl From<&str> for TypedValue {
    fn from(value: &str) -> Self {
        TypedValue::Utf8(value.to_string())
    }
}

impl From<String> for TypedValue {
    fn from(value: String) -> Self {
        TypedValue::Utf8(value)
    }
}

impl From<Vec<u8>> for TypedValue {
    fn from(value: Vec<u8>) -> Self {
        TypedValue::Bytes(value)
    }
}

impl From<Document> for TypedValue {
    fn from(value: Document) -> Self {
        TypedValue::Message(Box::new(value))
    }
}

/// A value bound to its salt.
///
/// For a `Message` value the salt enters no leaf; each nested field carries
/// its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub value: TypedValue,
    #[serde(with = "hex::serde")]
    pub salt: Salt,
}

impl Field {
    /// Bind `value` to a fresh random salt.
    pub fn new(value: impl Into<TypedValue>) -> Self {
        Self::with_salt(value, fresh_salt())
    }

    pub fn with_salt(value: impl Into<TypedValue>, salt: Salt) -> Self {
        Self {
            value: value.into(),
            salt,
        }
    }
}

pub fn fresh_salt() -> Salt {
    rand::random()
}

/// A document: schema-typed salted fields plus its identifier chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    schema: Arc<Schema>,
    fields: BTreeMap<String, Field>,
    pub document_identifier: Option<Identifier>,
    pub current_version: Option<Identifier>,
    pub next_version: Option<Identifier>,
    #[serde(default, with = "opt_hash")]
    pub root: Option<Hash32>,
}

impl Document {
    pub fn new(schema: Arc<Schema>) -> Self {
        Self {
            schema,
            fields: BTreeMap::new(),
            document_identifier: None,
            current_version: None,
            next_version: None,
            root: None,
        }
    }

    /// New document with a fresh identifier chain (document, current, next).
    pub fn with_identifiers(schema: Arc<Schema>) -> Self {
        let mut doc = Self::new(schema);
        doc.document_identifier = Some(Identifier::random());
        doc.current_version = Some(Identifier::random());
        doc.next_version = Some(Identifier::random());
        doc
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn schema_arc(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn fields(&self) -> &BTreeMap<String, Field> {
        &self.fields
    }

    pub fn get(&self, name: &str) -> Option<&Field> {
        self.fields.get(name)
    }

    /// Set a field value. A changed value gets a fresh salt; re-setting the
    /// identical value keeps the existing one.
    pub fn set(&mut self, name: &str, value: impl Into<TypedValue>) -> Result<(), CodecError> {
        self.ensure_declared(name)?;
        let value = value.into();
        match self.fields.get_mut(name) {
            Some(field) if field.value == value => {}
            Some(field) => {
                field.value = value;
                field.salt = fresh_salt();
                self.root = None;
            }
            None => {
                self.fields.insert(name.to_string(), Field::new(value));
                self.root = None;
            }
        }
        Ok(())
    }

    pub fn set_with_salt(
        &mut self,
        name: &str,
        value: impl Into<TypedValue>,
        salt: Salt,
    ) -> Result<(), CodecError> {
        self.ensure_declared(name)?;
        self.fields
            .insert(name.to_string(), Field::with_salt(value, salt));
        self.root = None;
        Ok(())
    }

    pub fn remove(&mut self, name: &str) -> Option<Field> {
        let removed = self.fields.remove(name);
        if removed.is_some() {
            self.root = None;
        }
        removed
    }

    /// Successor version: `current <- next`, a fresh `next`, same document
    /// identifier, fields and salts carried over, root cleared.
    pub fn next_version(&self) -> Self {
        let mut next = self.clone();
        next.current_version = self.next_version.clone();
        next.next_version = Some(Identifier::random());
        next.root = None;
        next
    }

    fn ensure_declared(&self, name: &str) -> Result<(), CodecError> {
        if self.schema.field(name).is_none() {
            return Err(CodecError::UnknownField {
                schema: self.schema.name().to_string(),
                field: name.to_string(),
            });
        }
        Ok(())
    }
}

mod opt_hash {
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::types::Hash32;

    pub fn serialize<S: Serializer>(value: &Option<Hash32>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(hash) => s.serialize_some(&hex::encode(hash)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Hash32>, D::Error> {
        let raw: Option<String> = Option::deserialize(d)?;
        raw.map(|s| -> Result<Hash32, D::Error> {
            let mut out = [0u8; 32];
            hex::decode_to_slice(&s, &mut out).map_err(serde::de::Error::custom)?;
            Ok(out)
        })
        .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invoice_schema() -> Arc<Schema> {
        Arc::new(
            Schema::new(
                "invoice",
                vec![
                    FieldDef::new("currency", 1, FieldKind::Utf8),
                    FieldDef::new("amount", 2, FieldKind::Int64),
                ],
            )
            .unwrap(),
        )
    }

    #[test]
    fn test_set_regenerates_salt_only_on_change() {
        let mut doc = Document::new(invoice_schema());
        doc.set("amount", 800_i64).unwrap();
        let first = doc.get("amount").unwrap().salt;

        doc.set("amount", 800_i64).unwrap();
        assert_eq!(doc.get("amount").unwrap().salt, first);

        doc.set("amount", 900_i64).unwrap();
        assert_ne!(doc.get("amount").unwrap().salt, first);
    }

    #[test]
    fn test_set_unknown_field() {
        let mut doc = Document::new(invoice_schema());
        let err = doc.set("gross", 1_i64).unwrap_err();
        assert!(matches!(err, CodecError::UnknownField { .. }));
    }

    #[test]
    fn test_next_version_links_chain() {
        let mut doc = Document::with_identifiers(invoice_schema());
        doc.set("currency", "EUR").unwrap();
        doc.root = Some([7u8; 32]);

        let next = doc.next_version();
        assert_eq!(next.document_identifier, doc.document_identifier);
        assert_eq!(next.current_version, doc.next_version);
        assert_ne!(next.next_version, doc.next_version);
        assert_eq!(next.root, None);
        assert_eq!(next.get("currency"), doc.get("currency"));
    }

    #[test]
    fn test_json_round_trip() {
        let mut doc = Document::with_identifiers(invoice_schema());
        doc.set("currency", "EUR").unwrap();
        doc.root = Some([1u8; 32]);

        let bytes = serde_json::to_vec(&doc).unwrap();
        let back: Document = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(back, doc);
        assert_eq!(serde_json::to_vec(&back).unwrap(), bytes);
    }
}
