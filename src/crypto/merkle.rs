use std::marker::PhantomData;

use rs_merkle::Hasher;

use crate::types::{DocumentHasher, Hash32};

/// Binary hash tree over an ordered leaf sequence.
///
/// Padding rule: whenever a level has an odd number of nodes (and more than
/// one), its last node is duplicated before pairing. Every implementation
/// must pad the same way to agree on roots.
#[derive(Clone)]
pub struct MerkleTree<H = DocumentHasher>
where
    H: Hasher<Hash = Hash32>,
{
    leaf_count: usize,
    /// `levels[0]` holds leaf hashes; each level is stored already padded.
    levels: Vec<Vec<Hash32>>,
    _hasher: PhantomData<H>,
}

impl<H> MerkleTree<H>
where
    H: Hasher<Hash = Hash32>,
{
    /// Hash each leaf and build the tree.
    pub fn build<B: AsRef<[u8]>>(leaves: &[B]) -> Self {
        let hashes = leaves.iter().map(|l| H::hash(l.as_ref())).collect();
        Self::from_leaf_hashes(hashes)
    }

    pub fn from_leaf_hashes(leaf_hashes: Vec<Hash32>) -> Self {
        let leaf_count = leaf_hashes.len();
        let mut levels = Vec::new();
        let mut current = leaf_hashes;

        while current.len() > 1 {
            if current.len() % 2 == 1 {
                let last = current[current.len() - 1];
                current.push(last);
            }
            let next = current
                .chunks(2)
                .map(|pair| hash_pair::<H>(&pair[0], &pair[1]))
                .collect();
            levels.push(current);
            current = next;
        }
        levels.push(current);

        Self {
            leaf_count,
            levels,
            _hasher: PhantomData,
        }
    }

    pub fn leaf_count(&self) -> usize {
        self.leaf_count
    }

    /// `None` for an empty tree.
    pub fn root(&self) -> Option<Hash32> {
        self.levels.last().and_then(|top| top.first()).copied()
    }

    pub fn leaf_hash(&self, index: usize) -> Option<Hash32> {
        if index >= self.leaf_count {
            return None;
        }
        Some(self.levels[0][index])
    }

    /// Sibling hashes from leaf `index` up to the root, leaf-to-root order.
    pub fn prove_at(&self, index: usize) -> Option<Vec<Hash32>> {
        if index >= self.leaf_count {
            return None;
        }
        let mut idx = index;
        let mut path = Vec::with_capacity(self.levels.len().saturating_sub(1));
        for level in &self.levels[..self.levels.len() - 1] {
            path.push(level[idx ^ 1]);
            idx /= 2;
        }
        Some(path)
    }
}

/// `H(left || right)`
pub fn hash_pair<H: Hasher<Hash = Hash32>>(left: &Hash32, right: &Hash32) -> Hash32 {
    let mut buf = [0u8; 64];
    buf[..32].copy_from_slice(left);
    buf[32..].copy_from_slice(right);
    H::hash(&buf)
}

/// Number of sibling hashes on any leaf-to-root path of a tree with
/// `leaf_count` leaves.
pub fn path_len(leaf_count: u64) -> usize {
    let mut n = leaf_count;
    let mut depth = 0;
    while n > 1 {
        n = n / 2 + n % 2;
        depth += 1;
    }
    depth
}

/// Recompute a root from a leaf hash, its index and its sibling path.
/// The leaf index parity at each level decides the concatenation order.
pub fn fold_path<H: Hasher<Hash = Hash32>>(
    leaf_hash: Hash32,
    index: u64,
    path: &[Hash32],
) -> Hash32 {
    let mut idx = index;
    let mut cur = leaf_hash;
    for sibling in path {
        cur = if idx % 2 == 0 {
            hash_pair::<H>(&cur, sibling)
        } else {
            hash_pair::<H>(sibling, &cur)
        };
        idx /= 2;
    }
    cur
}
