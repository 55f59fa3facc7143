//! Leaf construction: one SHA-256 digest per input record.
//!
//! Records are hashed as-is, with no domain prefix, so a leaf digest is the
//! plain `SHA-256(record_bytes)`. Order and multiplicity of the input are
//! preserved one to one.

use serde::{Deserialize, Serialize};

use crate::error::{MerkleError, MerkleResult};
use crate::hash::{sha256, HashValue};

/// The digest of a single input record.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct Leaf {
    digest: HashValue,
}

impl Leaf {
    /// Hash one record into a leaf.
    pub fn from_record(record: impl AsRef<[u8]>) -> Self {
        Self {
            digest: sha256(record.as_ref()),
        }
    }

    /// Wrap a digest that was already computed elsewhere.
    pub fn from_digest(digest: HashValue) -> Self {
        Self { digest }
    }

    /// The leaf digest, `SHA-256(record)`
    pub fn digest(&self) -> HashValue {
        self.digest
    }
}

impl From<HashValue> for Leaf {
    fn from(digest: HashValue) -> Self {
        Self::from_digest(digest)
    }
}

/// Hash every record into a leaf, preserving input order.
pub fn build_leaves<I>(records: I) -> Vec<Leaf>
where
    I: IntoIterator,
    I::Item: AsRef<[u8]>,
{
    records.into_iter().map(Leaf::from_record).collect()
}

/// Encode each record with bincode, then hash the encoded bytes.
///
/// Every record is encoded before any hashing happens; the first record that
/// fails to encode aborts the whole call with [`MerkleError::InvalidInput`].
pub fn build_leaves_serialized<T: Serialize>(records: &[T]) -> MerkleResult<Vec<Leaf>> {
    let encoded = records
        .iter()
        .enumerate()
        .map(|(i, record)| {
            bincode::serialize(record).map_err(|e| {
                MerkleError::InvalidInput(format!("record {} cannot be encoded: {}", i, e))
            })
        })
        .collect::<MerkleResult<Vec<_>>>()?;

    Ok(build_leaves(encoded))
}
