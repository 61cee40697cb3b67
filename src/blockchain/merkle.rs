//! Merkle tree over the transactions of a block.
//!
//! The tree is built fresh for each block and only its root digest is kept.

use super::crypto::sha256_hex;
use super::transaction::Transaction;

/// A node in the Merkle tree
///
/// Leaves have no children. Internal nodes own both of their children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MerkleNode {
    pub left: Option<Box<MerkleNode>>,
    pub right: Option<Box<MerkleNode>>,
    pub hash: String,
}

impl MerkleNode {
    fn leaf(transaction: &Transaction) -> Self {
        MerkleNode {
            left: None,
            right: None,
            hash: sha256_hex(transaction.data.as_bytes()),
        }
    }

    fn parent(left: MerkleNode, right: MerkleNode) -> Self {
        let hash = sha256_hex(format!("{}{}", left.hash, right.hash).as_bytes());
        MerkleNode {
            left: Some(Box::new(left)),
            right: Some(Box::new(right)),
            hash,
        }
    }
}

/// Builds the Merkle tree for an ordered list of transactions
///
/// Adjacent nodes are paired left to right. When a level has an odd number of
/// nodes, the last one is paired with a copy of itself.
///
/// # Returns
///
/// The root node, or `None` when there are no transactions
pub fn build_tree(transactions: &[Transaction]) -> Option<MerkleNode> {
    let mut level: Vec<MerkleNode> = transactions.iter().map(MerkleNode::leaf).collect();

    if level.is_empty() {
        return None;
    }

    while level.len() > 1 {
        let mut next_level = Vec::with_capacity(level.len().div_ceil(2));
        let mut nodes = level.into_iter();

        while let Some(left) = nodes.next() {
            let right = match nodes.next() {
                Some(right) => right,
                None => left.clone(),
            };
            next_level.push(MerkleNode::parent(left, right));
        }

        level = next_level;
    }

    level.pop()
}

/// Computes the Merkle root of an ordered list of transactions
///
/// An empty list has an empty-string root.
pub fn merkle_root(transactions: &[Transaction]) -> String {
    build_tree(transactions)
        .map(|root| root.hash)
        .unwrap_or_default()
}
