use chrono::Utc;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::crypto::{meets_difficulty, sha256_hex};
use super::merkle::merkle_root;
use super::transaction::{concat_payloads, Transaction};

/// Represents a block in the ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Block {
    /// Index of the block in the chain
    pub index: u64,

    /// Creation time in seconds since the Unix epoch
    #[schema(example = 1700000000)]
    pub timestamp: i64,

    /// Transactions included in this block, in inclusion order
    pub transactions: Vec<Transaction>,

    /// Hash of the previous block
    pub previous_hash: String,

    /// Hash of the current block (set by mining)
    pub hash: String,

    /// Proof of work
    pub nonce: u64,

    /// Merkle root of the transactions
    pub merkle_root: String,
}

impl Block {
    /// Creates a new unmined block
    ///
    /// # Arguments
    ///
    /// * `index` - The index of the block in the chain
    /// * `transactions` - The transactions to include in the block
    /// * `previous_hash` - The hash of the previous block
    ///
    /// # Returns
    ///
    /// A block stamped with the current time, with its Merkle root computed,
    /// a nonce of 0 and an empty hash
    pub fn new(index: u64, transactions: Vec<Transaction>, previous_hash: String) -> Self {
        let merkle_root = merkle_root(&transactions);

        Block {
            index,
            timestamp: Utc::now().timestamp(),
            transactions,
            previous_hash,
            hash: String::new(),
            nonce: 0,
            merkle_root,
        }
    }

    /// Calculates the hash of the block from its stored fields
    ///
    /// The digest covers index, timestamp, Merkle root, previous hash, the
    /// concatenated transaction payloads and the nonce, in that order.
    pub fn calculate_hash(&self) -> String {
        let block_data = format!(
            "{}{}{}{}{}{}",
            self.index,
            self.timestamp,
            self.merkle_root,
            self.previous_hash,
            concat_payloads(&self.transactions),
            self.nonce,
        );

        sha256_hex(block_data.as_bytes())
    }

    /// Performs proof of work on the block
    ///
    /// Starting from the current nonce, increments it until the block hash
    /// begins with `difficulty` zero hex characters, then stores that hash.
    /// There is no upper bound on the number of attempts.
    ///
    /// # Returns
    ///
    /// The number of hashes computed
    pub fn mine(&mut self, difficulty: usize) -> u64 {
        let mut attempts = 0;

        loop {
            attempts += 1;
            let hash = self.calculate_hash();

            if meets_difficulty(&hash, difficulty) {
                self.hash = hash;
                return attempts;
            }

            self.nonce += 1;
        }
    }

    /// Checks whether the stored hash matches the block contents
    pub fn has_valid_hash(&self) -> bool {
        self.hash == self.calculate_hash()
    }
}
