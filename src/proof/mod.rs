//! Field inclusion proofs against a document root.

pub mod engine;

use serde::{Deserialize, Serialize};

use crate::types::Hash32;

pub use engine::{
    compute_root, create_proof, create_proofs_batch, verify_disclosed, verify_proof, DocumentTree,
};

/// Inclusion proof of one leaf.
///
/// `{property, leafHash, sortedHashes}` is reproducible from the document,
/// the property path and the salts alone. `leafIndex`/`leafCount` carry the
/// position needed to order each concatenation and to check the path length.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Proof {
    pub property: String,
    #[serde(with = "hex::serde")]
    pub leaf_hash: Hash32,
    #[serde(with = "hex_hashes")]
    pub sorted_hashes: Vec<Hash32>,
    pub leaf_index: u64,
    pub leaf_count: u64,
}

mod hex_hashes {
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::types::Hash32;

    pub fn serialize<S: Serializer>(hashes: &[Hash32], s: S) -> Result<S::Ok, S::Error> {
        s.collect_seq(hashes.iter().map(hex::encode))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<Hash32>, D::Error> {
        let raw: Vec<String> = Vec::deserialize(d)?;
        raw.iter()
            .map(|s| -> Result<Hash32, D::Error> {
                let mut out = [0u8; 32];
                hex::decode_to_slice(s, &mut out).map_err(serde::de::Error::custom)?;
                Ok(out)
            })
            .collect()
    }
}
