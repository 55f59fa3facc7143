//! # hashfold-merkle
//!
//! A binary Merkle tree that commits to an ordered list of records.
//!
//! - [`leaf`]: records are hashed into leaves with SHA-256.
//! - [`tree`]: leaves are folded layer by layer into a single root.
//! - [`proof`]: inclusion proofs extracted from a built tree.
//!
//! ## Hashing scheme
//!
//! - Leaf: `SHA-256(record_bytes)`.
//! - Parent: `SHA-256(hex(left) ++ hex(right))`, where `hex` is the 64 character
//!   lowercase rendering of a digest. The hex text is hashed, not the raw bytes.
//! - A lone last node in an odd-length layer is paired with itself.
//!
//! Any other implementation must follow the same three rules to reproduce
//! roots and verify proofs.

pub mod error;
pub mod hash;
pub mod leaf;
pub mod proof;
pub mod tree;

pub use error::{MerkleError, MerkleResult};
pub use hash::HashValue;
pub use leaf::{build_leaves, build_leaves_serialized, Leaf};
pub use proof::{proof_for, verify_proof, MerkleProof, ProofStep, Side};
pub use tree::{build_tree, MerkleTree, Node, NodeId};

/// The length of hash digests used in merkle trees (32 bytes = 256 bits)
pub const HASH_LENGTH: usize = 32;
