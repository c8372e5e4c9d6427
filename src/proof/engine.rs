use rs_merkle::Hasher;
use tracing::debug;

use crate::codec::field::scalar_payload;
use crate::codec::{document_leaves, salted, Leaf};
use crate::crypto::{fold_path, path_len, MerkleTree};
use crate::document::{Document, Field, TypedValue};
use crate::error::{CodecError, ProofError};
use crate::types::{DocumentHasher, Hash32};

use super::Proof;

/// Leaves and tree of one document, built once and reused for any number of
/// proofs over the same fields and salts.
#[derive(Clone)]
pub struct DocumentTree<H = DocumentHasher>
where
    H: Hasher<Hash = Hash32>,
{
    leaves: Vec<Leaf>,
    tree: MerkleTree<H>,
    root: Hash32,
}

impl<H> DocumentTree<H>
where
    H: Hasher<Hash = Hash32>,
{
    pub fn build(doc: &Document) -> Result<Self, CodecError> {
        let leaves = document_leaves(doc)?;
        let tree = MerkleTree::<H>::build(&leaves.iter().map(|l| &l.bytes).collect::<Vec<_>>());
        let root = tree.root().ok_or(CodecError::EmptyDocument)?;
        debug!(
            "Built document tree: schema={}, leaves={}, root={}",
            doc.schema().name(),
            leaves.len(),
            hex::encode(root)
        );
        Ok(Self { leaves, tree, root })
    }

    pub fn root(&self) -> Hash32 {
        self.root
    }

    pub fn leaves(&self) -> &[Leaf] {
        &self.leaves
    }

    pub fn create_proof(&self, property: &str) -> Result<Proof, ProofError> {
        let index = self.index_of(property)?;
        let leaf_count = self.tree.leaf_count() as u64;
        let out_of_range = || ProofError::LeafIndexOutOfRange {
            index: index as u64,
            count: leaf_count,
        };
        let leaf_hash = self.tree.leaf_hash(index).ok_or_else(out_of_range)?;
        let sorted_hashes = self.tree.prove_at(index).ok_or_else(out_of_range)?;

        Ok(Proof {
            property: property.to_string(),
            leaf_hash,
            sorted_hashes,
            leaf_index: index as u64,
            leaf_count,
        })
    }

    /// One proof per property, in request order. Fails as a whole on the
    /// first property that cannot be proven.
    pub fn create_proofs_batch<S: AsRef<str>>(
        &self,
        properties: &[S],
    ) -> Result<Vec<Proof>, ProofError> {
        properties
            .iter()
            .map(|p| self.create_proof(p.as_ref()))
            .collect()
    }

    fn index_of(&self, property: &str) -> Result<usize, ProofError> {
        if let Some(index) = self.leaves.iter().position(|l| l.property == property) {
            return Ok(index);
        }
        let composite = self.leaves.iter().any(|l| {
            l.property
                .strip_prefix(property)
                .is_some_and(|rest| rest.starts_with('.') || rest.starts_with('['))
        });
        if composite {
            Err(ProofError::CompositeField(property.to_string()))
        } else {
            Err(ProofError::FieldNotFound(property.to_string()))
        }
    }
}

/// Root of `doc` under the protocol hash.
pub fn compute_root(doc: &Document) -> Result<Hash32, CodecError> {
    Ok(DocumentTree::<DocumentHasher>::build(doc)?.root())
}

pub fn create_proof(doc: &Document, property: &str) -> Result<Proof, ProofError> {
    DocumentTree::<DocumentHasher>::build(doc)?.create_proof(property)
}

pub fn create_proofs_batch<S: AsRef<str>>(
    doc: &Document,
    properties: &[S],
) -> Result<Vec<Proof>, ProofError> {
    DocumentTree::<DocumentHasher>::build(doc)?.create_proofs_batch(properties)
}

/// Check `proof` against `claimed_root` using hash function `H`.
///
/// `Ok(false)` means the proof does not lead to the root. A proof whose
/// position or path length is impossible for its leaf count is an error,
/// never `Ok(true)`.
pub fn verify_proof<H: Hasher<Hash = Hash32>>(
    proof: &Proof,
    claimed_root: &Hash32,
) -> Result<bool, ProofError> {
    if proof.leaf_index >= proof.leaf_count {
        return Err(ProofError::LeafIndexOutOfRange {
            index: proof.leaf_index,
            count: proof.leaf_count,
        });
    }
    let expected = path_len(proof.leaf_count);
    if proof.sorted_hashes.len() != expected {
        return Err(ProofError::PathLengthMismatch {
            leaf_count: proof.leaf_count,
            expected,
            got: proof.sorted_hashes.len(),
        });
    }

    let candidate = fold_path::<H>(proof.leaf_hash, proof.leaf_index, &proof.sorted_hashes);
    Ok(&candidate == claimed_root)
}

/// Verify a disclosed scalar field (value and salt) against its proof and
/// the claimed root.
pub fn verify_disclosed<H: Hasher<Hash = Hash32>>(
    proof: &Proof,
    field: &Field,
    claimed_root: &Hash32,
) -> Result<bool, ProofError> {
    let payload = match &field.value {
        TypedValue::Timestamp { .. } => {
            return Err(CodecError::UnsupportedFieldType {
                field: proof.property.clone(),
                kind: "timestamp",
            }
            .into())
        }
        value => scalar_payload(value)
            .ok_or_else(|| ProofError::CompositeField(proof.property.clone()))?,
    };
    if H::hash(&salted(&field.salt, &payload)) != proof.leaf_hash {
        return Ok(false);
    }
    verify_proof::<H>(proof, claimed_root)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::document::{FieldDef, FieldKind, Schema};

    fn invoice() -> Document {
        let schema = Arc::new(
            Schema::new(
                "invoice",
                vec![
                    FieldDef::new("currency", 1, FieldKind::Utf8),
                    FieldDef::new("amount", 2, FieldKind::Int64),
                    FieldDef::new(
                        "lines",
                        3,
                        FieldKind::Repeated(Box::new(FieldKind::Utf8)),
                    ),
                ],
            )
            .unwrap(),
        );
        let mut doc = Document::new(schema);
        doc.set_with_salt("currency", "EUR", [1u8; 32]).unwrap();
        doc.set_with_salt("amount", 800_i64, [2u8; 32]).unwrap();
        doc.set_with_salt(
            "lines",
            TypedValue::Repeated(vec![Field::with_salt("widget", [4u8; 32])]),
            [3u8; 32],
        )
        .unwrap();
        doc
    }

    #[test]
    fn test_proof_for_repeated_element_and_length() {
        let doc = invoice();
        let tree = DocumentTree::<DocumentHasher>::build(&doc).unwrap();
        for property in ["lines.length", "lines[0]"] {
            let proof = tree.create_proof(property).unwrap();
            assert!(verify_proof::<DocumentHasher>(&proof, &tree.root()).unwrap());
        }
    }

    #[test]
    fn test_composite_property_is_rejected() {
        let err = create_proof(&invoice(), "lines").unwrap_err();
        assert!(matches!(err, ProofError::CompositeField(p) if p == "lines"));
    }

    #[test]
    fn test_missing_field() {
        let err = create_proof(&invoice(), "gross").unwrap_err();
        assert!(matches!(err, ProofError::FieldNotFound(p) if p == "gross"));
    }

    #[test]
    fn test_batch_fails_fast() {
        let doc = invoice();
        let ok = create_proofs_batch(&doc, &["currency", "amount"]).unwrap();
        assert_eq!(ok.len(), 2);
        assert_eq!(ok[1].property, "amount");

        let err = create_proofs_batch(&doc, &["currency", "gross", "amount"]).unwrap_err();
        assert!(matches!(err, ProofError::FieldNotFound(_)));
    }

    #[test]
    fn test_truncated_path_is_an_error() {
        let doc = invoice();
        let tree = DocumentTree::<DocumentHasher>::build(&doc).unwrap();
        let mut proof = tree.create_proof("amount").unwrap();
        proof.sorted_hashes.clear();

        let err = verify_proof::<DocumentHasher>(&proof, &tree.root()).unwrap_err();
        assert_eq!(err.class(), crate::error::ErrorClass::Invariant);
    }

    #[test]
    fn test_huge_leaf_count_is_rejected() {
        let proof = Proof {
            property: "amount".to_string(),
            leaf_hash: [0u8; 32],
            sorted_hashes: vec![],
            leaf_index: 0,
            leaf_count: u64::MAX,
        };
        let err = verify_proof::<DocumentHasher>(&proof, &[0u8; 32]).unwrap_err();
        assert!(matches!(
            err,
            ProofError::PathLengthMismatch {
                expected: 64,
                got: 0,
                ..
            }
        ));
    }

    #[test]
    fn test_disclosed_value_must_match_leaf() {
        let doc = invoice();
        let tree = DocumentTree::<DocumentHasher>::build(&doc).unwrap();
        let proof = tree.create_proof("amount").unwrap();

        let honest = doc.get("amount").unwrap();
        assert!(verify_disclosed::<DocumentHasher>(&proof, honest, &tree.root()).unwrap());

        let forged = Field::with_salt(900_i64, honest.salt);
        assert!(!verify_disclosed::<DocumentHasher>(&proof, &forged, &tree.root()).unwrap());
    }

    #[test]
    fn test_proof_json_uses_hex_hashes() {
        let proof = create_proof(&invoice(), "currency").unwrap();
        let json = serde_json::to_value(&proof).unwrap();
        assert_eq!(json["property"], "currency");
        assert_eq!(json["leafHash"].as_str().unwrap().len(), 64);
        let back: Proof = serde_json::from_value(json).unwrap();
        assert_eq!(back, proof);
    }
}
