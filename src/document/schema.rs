use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CodecError;

/// Declared type of a schema field.
///
/// `Timestamp` is reserved: it can be declared and held, but it has no
/// canonical leaf layout yet and fails to encode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Int64,
    Utf8,
    Timestamp,
    Bytes,
    /// Nested document whose schema must carry this name.
    Message(String),
    Repeated(Box<FieldKind>),
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::Int64 => f.write_str("int64"),
            FieldKind::Utf8 => f.write_str("utf8"),
            FieldKind::Timestamp => f.write_str("timestamp"),
            FieldKind::Bytes => f.write_str("bytes"),
            FieldKind::Message(name) => write!(f, "message<{name}>"),
            FieldKind::Repeated(inner) => write!(f, "repeated<{inner}>"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    /// One-based position in the schema; leaves are ordered by `tag - 1`.
    pub tag: u32,
    pub kind: FieldKind,
}

impl FieldDef {
    pub fn new(name: impl Into<String>, tag: u32, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            tag,
            kind,
        }
    }

    /// Zero-based leaf ordering key, `None` for the invalid tag 0.
    pub fn order_key(&self) -> Option<u64> {
        u64::from(self.tag).checked_sub(1)
    }
}

/// Characters reserved for property paths (`outer.inner`, `items[0]`).
const RESERVED_NAME_CHARS: [char; 3] = ['.', '[', ']'];

/// Field layout of one document type.
///
/// Deserialization goes through [`Schema::new`], so a decoded schema is
/// validated and tag-sorted like a constructed one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawSchema")]
pub struct Schema {
    name: String,
    /// Sorted ascending by tag.
    fields: Vec<FieldDef>,
}

#[derive(Deserialize)]
struct RawSchema {
    name: String,
    fields: Vec<FieldDef>,
}

impl TryFrom<RawSchema> for Schema {
    type Error = CodecError;

    fn try_from(raw: RawSchema) -> Result<Self, Self::Error> {
        Schema::new(raw.name, raw.fields)
    }
}

impl Schema {
    pub fn new(name: impl Into<String>, mut fields: Vec<FieldDef>) -> Result<Self, CodecError> {
        let name = name.into();
        let invalid = |reason: String| CodecError::InvalidSchema {
            schema: name.clone(),
            reason,
        };

        let mut tags = HashSet::new();
        let mut names = HashSet::new();
        for def in &fields {
            if def.name.is_empty() || def.name.contains(&RESERVED_NAME_CHARS[..]) {
                return Err(invalid(format!(
                    "field name `{}` is empty or contains one of `.[]`",
                    def.name
                )));
            }
            if def.tag == 0 {
                return Err(invalid(format!("field `{}` has tag 0", def.name)));
            }
            if !tags.insert(def.tag) {
                return Err(invalid(format!("tag {} declared twice", def.tag)));
            }
            if !names.insert(def.name.as_str()) {
                return Err(invalid(format!("field `{}` declared twice", def.name)));
            }
        }

        fields.sort_by_key(|def| def.tag);
        Ok(Self { name, fields })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|def| def.name == name)
    }
}
