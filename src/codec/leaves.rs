use crate::document::Document;
use crate::error::CodecError;

use super::field::encode_field;

/// One hash input of a document tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Leaf {
    /// Schema tag minus one of the top-level field this leaf belongs to.
    pub order_key: u64,
    /// Path of the leaf inside the document (`amount`, `items[0]`, `items.length`, `buyer.name`).
    pub property: String,
    pub bytes: Vec<u8>,
}

/// Ordered leaf sequence of `doc`.
///
/// Leaves follow schema tag order, never insertion order, so identical
/// (field, value, salt) data always yields the same sequence. Absent fields
/// contribute nothing.
pub fn document_leaves(doc: &Document) -> Result<Vec<Leaf>, CodecError> {
    let mut out = Vec::new();
    document_leaves_into(doc, "", None, &mut out)?;
    Ok(out)
}

/// Append `doc`'s leaves with `prefix` on every property. Nested documents
/// pass the enclosing field's order key so all their leaves sort with it.
pub(crate) fn document_leaves_into(
    doc: &Document,
    prefix: &str,
    inherited_order_key: Option<u64>,
    out: &mut Vec<Leaf>,
) -> Result<(), CodecError> {
    let schema = doc.schema();

    if let Some(stray) = doc.fields().keys().find(|name| schema.field(name).is_none()) {
        return Err(CodecError::FieldNotCommittable {
            field: format!("{prefix}{stray}"),
            declared: "undeclared".to_string(),
            found: doc.fields()[stray].value.kind_name(),
        });
    }

    for def in schema.fields() {
        let Some(field) = doc.get(&def.name) else {
            continue;
        };
        let order_key = match inherited_order_key {
            Some(key) => key,
            None => def.order_key().ok_or_else(|| CodecError::InvalidSchema {
                schema: schema.name().to_string(),
                reason: format!("field `{}` has tag 0", def.name),
            })?,
        };
        let property = format!("{prefix}{}", def.name);
        encode_field(&property, &def.kind, field, order_key, out)?;
    }
    Ok(())
}
