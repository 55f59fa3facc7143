//! Inclusion proofs.
//!
//! A proof lists, bottom-up, the sibling digest met at each layer on the way
//! from a leaf to the root together with the side that sibling sits on.
//! When the path node was the lone last node of an odd layer it was
//! self-paired, so the recorded sibling is the node's own digest on the
//! [`Side::Right`].

use serde::{Deserialize, Serialize};

use crate::error::{MerkleError, MerkleResult};
use crate::hash::{hash_pair, HashValue};
use crate::leaf::Leaf;
use crate::tree::MerkleTree;

/// Position of a sibling relative to the node on the proof path.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

/// One layer of an inclusion proof: the sibling digest and the side it sits on.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct ProofStep {
    pub sibling: HashValue,
    pub side: Side,
}

/// Proof that a leaf sits at `leaf_index` in a tree of `leaf_count` leaves.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct MerkleProof {
    pub leaf_index: usize,
    pub leaf_count: usize,
    pub steps: Vec<ProofStep>,
}

impl MerkleProof {
    /// Number of sibling steps, equal to the tree depth.
    pub fn depth(&self) -> usize {
        self.steps.len()
    }

    /// Fold `leaf` up through every step and return the resulting root.
    pub fn compute_root(&self, leaf: &Leaf) -> HashValue {
        self.steps
            .iter()
            .fold(leaf.digest(), |current, step| match step.side {
                Side::Left => hash_pair(&step.sibling, &current),
                Side::Right => hash_pair(&current, &step.sibling),
            })
    }

    /// Check that the steps describe the path of `leaf_index` in a tree of
    /// `leaf_count` leaves: one step per layer below the root, and each side
    /// matching the parity of the path index at that layer.
    pub fn check_shape(&self) -> MerkleResult<()> {
        if self.leaf_index >= self.leaf_count {
            return Err(MerkleError::IndexOutOfRange {
                index: self.leaf_index,
                leaf_count: self.leaf_count,
            });
        }

        let mut width = self.leaf_count;
        let mut index = self.leaf_index;
        for (height, step) in self.steps.iter().enumerate() {
            if width == 1 {
                return Err(MerkleError::InvalidProof(format!(
                    "Proof has {} steps, tree of {} leaves has depth {}",
                    self.steps.len(),
                    self.leaf_count,
                    height
                )));
            }
            let expected = if index % 2 == 1 { Side::Left } else { Side::Right };
            if step.side != expected {
                return Err(MerkleError::InvalidProof(format!(
                    "Step {} has side {:?}, expected {:?}",
                    height, step.side, expected
                )));
            }
            width = width.div_ceil(2);
            index /= 2;
        }

        if width != 1 {
            return Err(MerkleError::InvalidProof(format!(
                "Proof has {} steps, too few for a tree of {} leaves",
                self.steps.len(),
                self.leaf_count
            )));
        }
        Ok(())
    }

    /// Verify that `leaf` is committed to by `root`.
    pub fn verify(&self, root: &HashValue, leaf: &Leaf) -> MerkleResult<()> {
        self.check_shape()?;
        let computed = self.compute_root(leaf);
        if &computed == root {
            Ok(())
        } else {
            Err(MerkleError::InvalidProof(format!(
                "Root mismatch: expected {}, computed {}",
                root, computed
            )))
        }
    }
}

/// Extract the inclusion proof for the leaf at `leaf_index`.
pub fn proof_for(tree: &MerkleTree, leaf_index: usize) -> MerkleResult<MerkleProof> {
    let leaf_count = tree.leaf_count();
    if leaf_index >= leaf_count {
        return Err(MerkleError::IndexOutOfRange {
            index: leaf_index,
            leaf_count,
        });
    }

    let mut steps = Vec::with_capacity(tree.depth());
    let mut index = leaf_index;
    // The root layer has no sibling
    for layer in tree.layers().take(tree.depth()) {
        let step = if index % 2 == 1 {
            ProofStep {
                sibling: layer[index - 1].digest(),
                side: Side::Left,
            }
        } else {
            let sibling = layer.get(index + 1).unwrap_or(&layer[index]);
            ProofStep {
                sibling: sibling.digest(),
                side: Side::Right,
            }
        };
        steps.push(step);
        index /= 2;
    }

    Ok(MerkleProof {
        leaf_index,
        leaf_count,
        steps,
    })
}

/// Check `proof` for `leaf` against `expected_root`, byte for byte.
///
/// A proof whose steps do not fit its `leaf_index` and `leaf_count` is
/// rejected before any hashing.
pub fn verify_proof(leaf: &Leaf, proof: &MerkleProof, expected_root: &HashValue) -> bool {
    proof.verify(expected_root, leaf).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leaf::build_leaves;
    use crate::tree::build_tree;

    fn records(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("record-{}", i)).collect()
    }

    #[test]
    fn test_proof_round_trip_all_sizes() {
        for n in [1usize, 2, 3, 5, 8] {
            let leaves = build_leaves(records(n));
            let tree = MerkleTree::build(&leaves).unwrap();
            let root = build_tree(&leaves).unwrap();

            for (i, leaf) in leaves.iter().enumerate() {
                let proof = proof_for(&tree, i).unwrap();
                assert_eq!(proof.depth(), tree.depth());
                assert!(verify_proof(leaf, &proof, &root), "n={} i={}", n, i);
                assert!(proof.verify(&root, leaf).is_ok());
            }
        }
    }

    #[test]
    fn test_tampered_sibling_fails() {
        for n in [2usize, 3, 5, 8] {
            let leaves = build_leaves(records(n));
            let tree = MerkleTree::build(&leaves).unwrap();
            let root = tree.root();

            for (i, leaf) in leaves.iter().enumerate() {
                let proof = tree.proof(i).unwrap();
                for step in 0..proof.steps.len() {
                    for byte in [0usize, 17, 31] {
                        let mut tampered = proof.clone();
                        let mut bytes = *tampered.steps[step].sibling.as_bytes();
                        bytes[byte] ^= 0x01;
                        tampered.steps[step].sibling = HashValue::new(bytes);
                        assert!(!verify_proof(leaf, &tampered, &root));
                    }
                }
            }
        }
    }

    #[test]
    fn test_self_paired_step_uses_own_digest() {
        let leaves = build_leaves(["A", "B", "C"]);
        let tree = MerkleTree::build(&leaves).unwrap();
        let proof = tree.proof(2).unwrap();

        assert_eq!(
            proof.steps[0],
            ProofStep {
                sibling: leaves[2].digest(),
                side: Side::Right,
            }
        );
        assert_eq!(proof.steps[1].side, Side::Left);
    }

    #[test]
    fn test_single_leaf_proof_is_empty() {
        let leaf = Leaf::from_record("solo");
        let tree = MerkleTree::build(&[leaf]).unwrap();
        let proof = tree.proof(0).unwrap();

        assert!(proof.steps.is_empty());
        assert!(verify_proof(&leaf, &proof, &leaf.digest()));
    }

    #[test]
    fn test_index_out_of_range() {
        let tree = MerkleTree::from_records(records(5)).unwrap();
        assert_eq!(
            proof_for(&tree, 5),
            Err(MerkleError::IndexOutOfRange {
                index: 5,
                leaf_count: 5
            })
        );
    }

    #[test]
    fn test_wrong_leaf_or_root_fails() {
        let leaves = build_leaves(records(5));
        let tree = MerkleTree::build(&leaves).unwrap();
        let proof = tree.proof(1).unwrap();

        assert!(!verify_proof(&leaves[2], &proof, &tree.root()));
        assert!(matches!(
            proof.verify(&leaves[0].digest(), &leaves[1]),
            Err(MerkleError::InvalidProof(_))
        ));
    }

    #[test]
    fn test_extra_step_rejected() {
        let leaves = build_leaves(records(4));
        let tree = MerkleTree::build(&leaves).unwrap();
        let mut proof = tree.proof(0).unwrap();
        proof.steps.push(ProofStep {
            sibling: tree.root(),
            side: Side::Right,
        });

        assert!(matches!(proof.check_shape(), Err(MerkleError::InvalidProof(_))));
        assert!(!verify_proof(&leaves[0], &proof, &proof.compute_root(&leaves[0])));
    }

    #[test]
    fn test_missing_step_rejected() {
        let leaves = build_leaves(records(5));
        let tree = MerkleTree::build(&leaves).unwrap();
        let mut proof = tree.proof(3).unwrap();
        proof.steps.pop();

        assert!(proof.check_shape().is_err());
        assert!(!verify_proof(&leaves[3], &proof, &proof.compute_root(&leaves[3])));
    }

    #[test]
    fn test_side_must_match_index() {
        let leaves = build_leaves(records(4));
        let tree = MerkleTree::build(&leaves).unwrap();
        let proof = tree.proof(2).unwrap();

        // Same steps claimed for the neighbouring index
        let mut moved = proof.clone();
        moved.leaf_index = 3;
        assert!(moved.check_shape().is_err());
        assert!(!verify_proof(&leaves[2], &moved, &tree.root()));
    }

    #[test]
    fn test_leaf_count_must_match_steps() {
        let leaves = build_leaves(records(4));
        let tree = MerkleTree::build(&leaves).unwrap();

        let mut proof = tree.proof(1).unwrap();
        proof.leaf_count = 9;
        assert!(!verify_proof(&leaves[1], &proof, &tree.root()));

        proof.leaf_count = 1;
        assert_eq!(
            proof.check_shape(),
            Err(MerkleError::IndexOutOfRange {
                index: 1,
                leaf_count: 1
            })
        );
    }

    #[test]
    fn test_extracted_proofs_have_valid_shape() {
        for n in 1usize..=17 {
            let tree = MerkleTree::from_records(records(n)).unwrap();
            for i in 0..n {
                assert!(tree.proof(i).unwrap().check_shape().is_ok(), "n={} i={}", n, i);
            }
        }
    }

    #[test]
    fn test_proof_json_shape() {
        let tree = MerkleTree::from_records(["a", "b"]).unwrap();
        let proof = tree.proof(0).unwrap();
        let json = serde_json::to_value(&proof).unwrap();

        assert_eq!(json["leaf_index"], 0);
        assert_eq!(json["steps"][0]["side"], "right");

        let decoded: MerkleProof = serde_json::from_value(json).unwrap();
        assert_eq!(decoded, proof);
    }
}
