use crate::document::{Field, FieldKind, TypedValue};
use crate::error::CodecError;
use crate::types::Salt;

use super::leaves::{document_leaves_into, Leaf};

/// Suffix of the property naming a repeated field's element-count leaf.
pub const LENGTH_SUFFIX: &str = ".length";

/// `salt || payload`
pub fn salted(salt: &Salt, payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(salt.len() + payload.len());
    out.extend_from_slice(salt);
    out.extend_from_slice(payload);
    out
}

/// Canonical payload of a scalar value, `None` for composites.
///
/// Timestamps have no layout and are rejected by the caller before this
/// point.
pub(crate) fn scalar_payload(value: &TypedValue) -> Option<Vec<u8>> {
    match value {
        TypedValue::Int64(v) => Some(v.to_le_bytes().to_vec()),
        TypedValue::Utf8(s) => Some(s.as_bytes().to_vec()),
        TypedValue::Bytes(b) => Some(b.clone()),
        TypedValue::Timestamp { .. } | TypedValue::Message(_) | TypedValue::Repeated(_) => None,
    }
}

/// Append the leaves of one field, named `property`, declared as `kind`.
///
/// Scalars emit one leaf. A repeated field emits a salted `u32` LE count leaf
/// (`property.length`) followed by each element's leaves (`property[i]`). A
/// nested message emits its own document's leaves under `property.`.
pub fn encode_field(
    property: &str,
    kind: &FieldKind,
    field: &Field,
    order_key: u64,
    out: &mut Vec<Leaf>,
) -> Result<(), CodecError> {
    match (kind, &field.value) {
        (FieldKind::Timestamp, _) => Err(CodecError::UnsupportedFieldType {
            field: property.to_string(),
            kind: "timestamp",
        }),
        (FieldKind::Int64, TypedValue::Int64(_))
        | (FieldKind::Utf8, TypedValue::Utf8(_))
        | (FieldKind::Bytes, TypedValue::Bytes(_)) => {
            let payload = scalar_payload(&field.value)
                .ok_or_else(|| not_committable(property, kind, &field.value))?;
            out.push(Leaf {
                order_key,
                property: property.to_string(),
                bytes: salted(&field.salt, &payload),
            });
            Ok(())
        }
        (FieldKind::Message(expected), TypedValue::Message(nested)) => {
            if nested.schema().name() != expected {
                return Err(CodecError::SchemaMismatch {
                    field: property.to_string(),
                    expected: expected.clone(),
                    found: nested.schema().name().to_string(),
                });
            }
            let prefix = format!("{property}.");
            document_leaves_into(nested, &prefix, Some(order_key), out)
        }
        (FieldKind::Repeated(element_kind), TypedValue::Repeated(items)) => {
            let count = u32::try_from(items.len())
                .map_err(|_| not_committable(property, kind, &field.value))?;
            out.push(Leaf {
                order_key,
                property: format!("{property}{LENGTH_SUFFIX}"),
                bytes: salted(&field.salt, &count.to_le_bytes()),
            });
            for (i, item) in items.iter().enumerate() {
                encode_field(&format!("{property}[{i}]"), element_kind, item, order_key, out)?;
            }
            Ok(())
        }
        (declared, value) => Err(not_committable(property, declared, value)),
    }
}

fn not_committable(property: &str, declared: &FieldKind, value: &TypedValue) -> CodecError {
    CodecError::FieldNotCommittable {
        field: property.to_string(),
        declared: declared.to_string(),
        found: value.kind_name(),
    }
}
