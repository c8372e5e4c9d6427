use std::sync::Arc;

use docsmith::codec::document_leaves;
use docsmith::crypto::MerkleTree;
use docsmith::{
    compute_root, create_proof, verify_proof, Document, DocumentHasher, Field, FieldDef,
    FieldKind, Schema, TypedValue,
};
use proptest::prelude::*;

fn schema() -> Arc<Schema> {
    Arc::new(
        Schema::new(
            "record",
            vec![
                FieldDef::new("label", 1, FieldKind::Utf8),
                FieldDef::new("amount", 2, FieldKind::Int64),
                FieldDef::new("blob", 3, FieldKind::Bytes),
                FieldDef::new("tags", 4, FieldKind::Repeated(Box::new(FieldKind::Utf8))),
            ],
        )
        .unwrap(),
    )
}

#[derive(Debug, Clone)]
struct Inputs {
    label: String,
    amount: i64,
    blob: Vec<u8>,
    tags: Vec<String>,
    salts: Vec<[u8; 32]>,
}

fn inputs() -> impl Strategy<Value = Inputs> {
    (
        ".{0,16}",
        any::<i64>(),
        proptest::collection::vec(any::<u8>(), 0..32),
        proptest::collection::vec("[a-z]{1,6}", 0..4),
        proptest::collection::vec(any::<[u8; 32]>(), 8),
    )
        .prop_map(|(label, amount, blob, tags, salts)| Inputs {
            label,
            amount,
            blob,
            tags,
            salts,
        })
}

/// Build the document, setting fields in the given order.
fn build(inputs: &Inputs, reverse: bool) -> Document {
    let tags = TypedValue::Repeated(
        inputs
            .tags
            .iter()
            .enumerate()
            .map(|(i, t)| Field::with_salt(t.as_str(), inputs.salts[4 + i]))
            .collect(),
    );
    let mut setters: Vec<(&str, TypedValue, [u8; 32])> = vec![
        ("label", inputs.label.clone().into(), inputs.salts[0]),
        ("amount", inputs.amount.into(), inputs.salts[1]),
        ("blob", inputs.blob.clone().into(), inputs.salts[2]),
        ("tags", tags, inputs.salts[3]),
    ];
    if reverse {
        setters.reverse();
    }
    let mut doc = Document::new(schema());
    for (name, value, salt) in setters {
        doc.set_with_salt(name, value, salt).unwrap();
    }
    doc
}

proptest! {
    #[test]
    fn root_is_independent_of_set_order(inputs in inputs()) {
        let forward = compute_root(&build(&inputs, false)).unwrap();
        let backward = compute_root(&build(&inputs, true)).unwrap();
        prop_assert_eq!(forward, backward);
    }

    #[test]
    fn every_leaf_proof_verifies(inputs in inputs()) {
        let doc = build(&inputs, false);
        let root = compute_root(&doc).unwrap();
        for leaf in document_leaves(&doc).unwrap() {
            let proof = create_proof(&doc, &leaf.property).unwrap();
            prop_assert!(verify_proof::<DocumentHasher>(&proof, &root).unwrap());
        }
    }

    #[test]
    fn flipping_a_salt_bit_changes_the_root(inputs in inputs(), which in 0usize..4, bit in 0usize..256) {
        let original = compute_root(&build(&inputs, false)).unwrap();
        let mut tampered = inputs.clone();
        tampered.salts[which][bit / 8] ^= 1 << (bit % 8);
        prop_assert_ne!(original, compute_root(&build(&tampered, false)).unwrap());
    }

    #[test]
    fn flipping_an_amount_bit_changes_the_root(inputs in inputs(), bit in 0u32..64) {
        let original = compute_root(&build(&inputs, false)).unwrap();
        let mut tampered = inputs.clone();
        tampered.amount ^= 1_i64.rotate_left(bit);
        prop_assert_ne!(original, compute_root(&build(&tampered, false)).unwrap());
    }

    #[test]
    fn tampering_only_the_count_leaf_changes_the_root(inputs in inputs(), bit in 0usize..32) {
        let doc = build(&inputs, false);
        let root = compute_root(&doc).unwrap();
        let leaves = document_leaves(&doc).unwrap();
        let mut bytes: Vec<Vec<u8>> = leaves.iter().map(|l| l.bytes.clone()).collect();
        prop_assert_eq!(MerkleTree::<DocumentHasher>::build(&bytes).root(), Some(root));

        let count_at = leaves.iter().position(|l| l.property == "tags.length").unwrap();
        let count_leaf = &mut bytes[count_at];
        let payload_start = count_leaf.len() - 4;
        count_leaf[payload_start + bit / 8] ^= 1 << (bit % 8);

        let tampered = MerkleTree::<DocumentHasher>::build(&bytes).root().unwrap();
        prop_assert_ne!(tampered, root);
        let proof = create_proof(&doc, "tags.length").unwrap();
        prop_assert!(!verify_proof::<DocumentHasher>(&proof, &tampered).unwrap());
    }

    #[test]
    fn dropping_a_tag_changes_the_root(inputs in inputs()) {
        prop_assume!(!inputs.tags.is_empty());
        let original = compute_root(&build(&inputs, false)).unwrap();
        let mut tampered = inputs.clone();
        tampered.tags.pop();
        prop_assert_ne!(original, compute_root(&build(&tampered, false)).unwrap());
    }
}
