pub mod merkle;

pub use merkle::{fold_path, hash_pair, path_len, MerkleTree};
