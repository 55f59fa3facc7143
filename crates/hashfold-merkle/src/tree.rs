//! Binary Merkle tree construction.
//!
//! Layers are folded bottom-up, left to right. Adjacent nodes `(L[i], L[i+1])`
//! combine into `hash_pair(L[i], L[i+1])`; a lone last node at the end of an
//! odd-length layer is self-paired as `hash_pair(L[i], L[i])`. Every layer
//! above the leaves therefore has `ceil(n / 2)` nodes and the tree has depth
//! `ceil(log2(n))` for every leaf count.
//!
//! Two entry points are provided:
//!
//! - [`build_tree`] computes only the root and drops each layer as soon as
//!   the next one exists.
//! - [`MerkleTree::build`] keeps every node in an arena so inclusion proofs
//!   can be extracted later.
//!
//! # Example
//!
//! ```
//! use hashfold_merkle::{build_leaves, build_tree, MerkleTree};
//!
//! let leaves = build_leaves(["In", "Pursuit", "Of", "His", "Own", "Hat"]);
//! let tree = MerkleTree::build(&leaves).unwrap();
//!
//! assert_eq!(tree.root(), build_tree(&leaves).unwrap());
//! assert_eq!(tree.depth(), 3);
//! ```

use tracing::{debug, trace};

use crate::error::{MerkleError, MerkleResult};
use crate::hash::{hash_pair, HashValue};
use crate::leaf::{build_leaves, Leaf};
use crate::proof::{proof_for, MerkleProof};

/// Handle of a node inside a [`MerkleTree`] arena.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct NodeId(usize);

impl NodeId {
    /// Position of the node in the arena
    pub fn index(&self) -> usize {
        self.0
    }
}

/// A node of the tree.
///
/// Leaves have no children. A parent built by self-pairing has only a
/// `left` child; every other parent has both.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Node {
    digest: HashValue,
    left: Option<NodeId>,
    right: Option<NodeId>,
}

impl Node {
    /// The digest stored at this node
    pub fn digest(&self) -> HashValue {
        self.digest
    }

    /// Left child, `None` for a leaf
    pub fn left(&self) -> Option<NodeId> {
        self.left
    }

    /// Right child, `None` for a leaf or a self-paired parent
    pub fn right(&self) -> Option<NodeId> {
        self.right
    }

    /// True for nodes of the leaf layer
    pub fn is_leaf(&self) -> bool {
        self.left.is_none()
    }

    /// True for a parent whose digest came from pairing its only child with itself.
    pub fn is_self_paired(&self) -> bool {
        self.left.is_some() && self.right.is_none()
    }
}

/// Compute the Merkle root of `leaves` without retaining intermediate layers.
pub fn build_tree(leaves: &[Leaf]) -> MerkleResult<HashValue> {
    if leaves.is_empty() {
        return Err(MerkleError::EmptyInput);
    }

    let mut layer: Vec<HashValue> = leaves.iter().map(Leaf::digest).collect();
    let mut height = 0usize;
    while layer.len() > 1 {
        layer = combine_layer(&layer);
        height += 1;
        trace!(height, width = layer.len(), "Folded layer");
    }

    debug!(leaves = leaves.len(), depth = height, root = %layer[0], "Computed merkle root");
    Ok(layer[0])
}

/// Produce the parent layer of `layer` (length `ceil(n / 2)`).
#[cfg(not(feature = "parallel"))]
pub fn combine_layer(layer: &[HashValue]) -> Vec<HashValue> {
    layer.chunks(2).map(combine_chunk).collect()
}

/// Produce the parent layer of `layer` (length `ceil(n / 2)`), hashing
/// pairs on the rayon pool. Output order matches the sequential version.
#[cfg(feature = "parallel")]
pub fn combine_layer(layer: &[HashValue]) -> Vec<HashValue> {
    use rayon::prelude::*;
    layer.par_chunks(2).map(combine_chunk).collect()
}

fn combine_chunk(chunk: &[HashValue]) -> HashValue {
    match chunk {
        [left, right] => hash_pair(left, right),
        [lone] => hash_pair(lone, lone),
        _ => unreachable!("chunks(2) yields one or two elements"),
    }
}

/// A fully materialized binary Merkle tree.
///
/// Nodes are stored layer after layer in a single arena, leaves first and
/// the root last. Nothing is mutated after construction; changing any record
/// means building a new tree.
#[derive(Clone, Debug)]
pub struct MerkleTree {
    nodes: Vec<Node>,
    /// Start offset of each layer in `nodes`, bottom (leaves) first.
    layer_starts: Vec<usize>,
}

impl MerkleTree {
    /// Build the tree over `leaves`, keeping every node.
    pub fn build(leaves: &[Leaf]) -> MerkleResult<Self> {
        if leaves.is_empty() {
            return Err(MerkleError::EmptyInput);
        }

        // A full tree over n leaves holds fewer than 2n + log2(n) nodes.
        let mut nodes = Vec::with_capacity(leaves.len() * 2 + 64);
        nodes.extend(leaves.iter().map(|leaf| Node {
            digest: leaf.digest(),
            left: None,
            right: None,
        }));
        let mut layer_starts = vec![0];

        let mut start = 0;
        let mut end = nodes.len();
        while end - start > 1 {
            let digests: Vec<HashValue> = nodes[start..end].iter().map(Node::digest).collect();
            let parents = combine_layer(&digests);

            for (pair, digest) in parents.into_iter().enumerate() {
                let left = start + pair * 2;
                let right = left + 1;
                nodes.push(Node {
                    digest,
                    left: Some(NodeId(left)),
                    right: (right < end).then_some(NodeId(right)),
                });
            }

            layer_starts.push(end);
            start = end;
            end = nodes.len();
            trace!(height = layer_starts.len() - 1, width = end - start, "Built layer");
        }

        let tree = Self { nodes, layer_starts };
        debug!(
            leaves = leaves.len(),
            depth = tree.depth(),
            root = %tree.root(),
            "Built merkle tree"
        );
        Ok(tree)
    }

    /// Hash `records` into leaves and build the tree over them.
    pub fn from_records<I>(records: I) -> MerkleResult<Self>
    where
        I: IntoIterator,
        I::Item: AsRef<[u8]>,
    {
        Self::build(&build_leaves(records))
    }

    /// The root digest.
    pub fn root(&self) -> HashValue {
        self.nodes[self.nodes.len() - 1].digest
    }

    /// Handle of the root node (the last node in the arena)
    pub fn root_node(&self) -> NodeId {
        NodeId(self.nodes.len() - 1)
    }

    /// Number of leaves the tree was built from
    pub fn leaf_count(&self) -> usize {
        self.layer_width(0)
    }

    /// Number of layers above the leaves; 0 for a single-leaf tree.
    pub fn depth(&self) -> usize {
        self.layer_starts.len() - 1
    }

    /// Number of layers including the leaf layer and the root layer.
    pub fn layer_count(&self) -> usize {
        self.layer_starts.len()
    }

    /// Nodes of layer `height` (0 = leaves), left to right.
    pub fn layer(&self, height: usize) -> Option<&[Node]> {
        let start = *self.layer_starts.get(height)?;
        let end = self
            .layer_starts
            .get(height + 1)
            .copied()
            .unwrap_or(self.nodes.len());
        Some(&self.nodes[start..end])
    }

    /// All layers, leaves first and the single-node root layer last.
    pub fn layers(&self) -> impl Iterator<Item = &[Node]> + '_ {
        (0..self.layer_count()).filter_map(move |height| self.layer(height))
    }

    /// Look up a node by handle
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    /// Leaf at `index` in input order.
    pub fn leaf(&self, index: usize) -> Option<Leaf> {
        self.layer(0)?
            .get(index)
            .map(|node| Leaf::from_digest(node.digest))
    }

    /// All leaves in input order
    pub fn leaves(&self) -> impl Iterator<Item = Leaf> + '_ {
        self.nodes[..self.leaf_count()]
            .iter()
            .map(|node| Leaf::from_digest(node.digest))
    }

    /// Inclusion proof for the leaf at `index`.
    pub fn proof(&self, index: usize) -> MerkleResult<MerkleProof> {
        proof_for(self, index)
    }

    fn layer_width(&self, height: usize) -> usize {
        self.layer(height).map_or(0, <[Node]>::len)
    }
}
