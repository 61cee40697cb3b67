use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use super::block::Block;
use super::transaction::Transaction;

/// Difficulty used when no other value is configured
pub const DEFAULT_DIFFICULTY: u8 = 4;

/// Lowest accepted difficulty
pub const MIN_DIFFICULTY: u8 = 1;

/// Highest accepted difficulty
pub const MAX_DIFFICULTY: u8 = 6;

/// Payload of the single transaction in the genesis block
pub const GENESIS_DATA: &str = "Genesis Block";

/// Payload used when a block is mined with an empty pending pool
pub const EMPTY_BLOCK_DATA: &str = "No transactions - empty block";

/// Errors that can occur during blockchain operations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BlockchainError {
    #[error("Difficulty must be between 1 and 6, got {0}")]
    InvalidDifficulty(u8),
}

/// Checks whether a difficulty lies in the accepted range
pub fn is_valid_difficulty(difficulty: i64) -> bool {
    (MIN_DIFFICULTY as i64..=MAX_DIFFICULTY as i64).contains(&difficulty)
}

/// A transaction matching a search query, with its containing block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SearchResult {
    pub block_index: u64,
    pub block_hash: String,
    pub transaction: String,
    pub timestamp: i64,
}

/// Point-in-time copy of the ledger
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChainSnapshot {
    /// The blocks in the chain
    pub chain: Vec<Block>,

    /// Current mining difficulty
    pub difficulty: u8,

    /// Transactions waiting to be mined
    pub pending_transactions: Vec<Transaction>,
}

/// Summary figures for the ledger
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChainStats {
    pub total_blocks: usize,
    pub pending_transactions: usize,
    pub difficulty: u8,
    pub is_valid: bool,
}

/// State guarded by the blockchain lock
#[derive(Debug)]
struct Ledger {
    chain: Vec<Block>,
    difficulty: u8,
    pending_transactions: Vec<Transaction>,
}

impl Ledger {
    fn tip(&self) -> &Block {
        // The genesis block is pushed before the ledger is shared.
        &self.chain[self.chain.len() - 1]
    }

    fn is_valid(&self) -> bool {
        for pair in self.chain.windows(2) {
            let (previous_block, current_block) = (&pair[0], &pair[1]);

            if !current_block.has_valid_hash() {
                warn!("Block {} hash does not match its contents", current_block.index);
                return false;
            }

            if current_block.previous_hash != previous_block.hash {
                warn!(
                    "Block {} does not link to block {}",
                    current_block.index, previous_block.index
                );
                return false;
            }
        }

        true
    }
}

/// Represents the ledger
///
/// Chain, pending pool and difficulty live behind a single read-write lock.
/// Mutations hold the write lock for their whole duration, including mining,
/// so readers only ever see the state before or after an operation.
#[derive(Debug, Clone)]
pub struct Blockchain {
    inner: Arc<RwLock<Ledger>>,
}

impl Default for Blockchain {
    fn default() -> Self {
        Self::new()
    }
}

impl Blockchain {
    /// Creates a new blockchain with a mined genesis block
    ///
    /// # Returns
    ///
    /// A new Blockchain instance using the default difficulty
    pub fn new() -> Self {
        Self::with_genesis(DEFAULT_DIFFICULTY)
    }

    /// Creates a new blockchain with the given starting difficulty
    ///
    /// # Arguments
    ///
    /// * `difficulty` - The number of leading zero hex characters required in block hashes
    ///
    /// # Returns
    ///
    /// A new Blockchain instance, or an error if the difficulty is out of range
    pub fn with_difficulty(difficulty: u8) -> Result<Self, BlockchainError> {
        if !is_valid_difficulty(difficulty as i64) {
            return Err(BlockchainError::InvalidDifficulty(difficulty));
        }

        Ok(Self::with_genesis(difficulty))
    }

    fn with_genesis(difficulty: u8) -> Self {
        let mut genesis_block = Block::new(
            0,
            vec![Transaction::new(GENESIS_DATA)],
            "0".to_string(),
        );
        let attempts = genesis_block.mine(difficulty as usize);
        info!(
            "Genesis block mined: {} (nonce {}, {} attempts)",
            genesis_block.hash, genesis_block.nonce, attempts
        );

        Blockchain {
            inner: Arc::new(RwLock::new(Ledger {
                chain: vec![genesis_block],
                difficulty,
                pending_transactions: Vec::new(),
            })),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Ledger> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Ledger> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Adds a new transaction to the pending pool
    ///
    /// Payloads are not validated here. Duplicate payloads produce duplicate entries.
    ///
    /// # Returns
    ///
    /// The size of the pending pool after the insert
    pub fn add_transaction(&self, data: impl Into<String>) -> usize {
        let mut ledger = self.write();
        ledger.pending_transactions.push(Transaction::new(data));

        let pending = ledger.pending_transactions.len();
        debug!("Transaction added to pending pool ({} pending)", pending);
        pending
    }

    /// Mines a new block with the pending transactions
    ///
    /// If the pool is empty a placeholder transaction is used so no block is
    /// ever empty. The write lock is held until the block is appended and the
    /// pool cleared. Mining is not cancellable and may take arbitrarily long
    /// at high difficulty.
    ///
    /// # Returns
    ///
    /// The newly mined block
    pub fn mine_block(&self) -> Block {
        let mut ledger = self.write();

        if ledger.pending_transactions.is_empty() {
            ledger
                .pending_transactions
                .push(Transaction::new(EMPTY_BLOCK_DATA));
        }

        let transactions = std::mem::take(&mut ledger.pending_transactions);
        let (index, previous_hash) = {
            let tip = ledger.tip();
            (tip.index + 1, tip.hash.clone())
        };

        let mut block = Block::new(index, transactions, previous_hash);
        let attempts = block.mine(ledger.difficulty as usize);
        info!(
            "Block {} mined: {} (nonce {}, {} attempts, difficulty {})",
            block.index, block.hash, block.nonce, attempts, ledger.difficulty
        );

        ledger.chain.push(block.clone());
        block
    }

    /// Validates the blockchain
    ///
    /// Recomputes every block hash after genesis and checks each block links to
    /// its predecessor.
    ///
    /// # Returns
    ///
    /// true if the blockchain is valid, false otherwise
    pub fn is_valid(&self) -> bool {
        self.read().is_valid()
    }

    /// Searches every transaction payload for a case-insensitive substring
    ///
    /// Results are ordered by block, then by position within the block.
    pub fn search(&self, query: &str) -> Vec<SearchResult> {
        let needle = query.to_lowercase();
        let ledger = self.read();
        let mut results = Vec::new();

        for block in &ledger.chain {
            for transaction in &block.transactions {
                if transaction.data.to_lowercase().contains(&needle) {
                    results.push(SearchResult {
                        block_index: block.index,
                        block_hash: block.hash.clone(),
                        transaction: transaction.data.clone(),
                        timestamp: block.timestamp,
                    });
                }
            }
        }

        debug!("Search for {:?} matched {} transactions", query, results.len());
        results
    }

    /// Sets the difficulty used for future blocks
    ///
    /// Blocks already in the chain are unaffected.
    pub fn set_difficulty(&self, difficulty: u8) -> Result<u8, BlockchainError> {
        if !is_valid_difficulty(difficulty as i64) {
            return Err(BlockchainError::InvalidDifficulty(difficulty));
        }

        self.write().difficulty = difficulty;
        info!("Difficulty set to {}", difficulty);
        Ok(difficulty)
    }

    /// Gets a copy of the chain, the pending pool and the difficulty
    pub fn snapshot(&self) -> ChainSnapshot {
        let ledger = self.read();

        ChainSnapshot {
            chain: ledger.chain.clone(),
            difficulty: ledger.difficulty,
            pending_transactions: ledger.pending_transactions.clone(),
        }
    }

    pub fn stats(&self) -> ChainStats {
        let ledger = self.read();

        ChainStats {
            total_blocks: ledger.chain.len(),
            pending_transactions: ledger.pending_transactions.len(),
            difficulty: ledger.difficulty,
            is_valid: ledger.is_valid(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn easy_blockchain() -> Blockchain {
        Blockchain::with_difficulty(1).unwrap()
    }

    impl Blockchain {
        fn get_chain(&self) -> Vec<Block> {
            self.read().chain.clone()
        }

        fn get_pending_transactions(&self) -> Vec<Transaction> {
            self.read().pending_transactions.clone()
        }

        fn get_last_block(&self) -> Block {
            self.read().tip().clone()
        }
    }

    #[test]
    fn test_new_blockchain() {
        let blockchain = Blockchain::new();
        let chain = blockchain.get_chain();

        assert_eq!(chain.len(), 1);
        assert_eq!(blockchain.snapshot().difficulty, DEFAULT_DIFFICULTY);

        let genesis = &chain[0];
        assert_eq!(genesis.index, 0);
        assert_eq!(genesis.previous_hash, "0");
        assert_eq!(genesis.transactions, vec![Transaction::new(GENESIS_DATA)]);
        assert!(genesis.hash.starts_with("0000"));
        assert!(genesis.has_valid_hash());
        assert!(blockchain.is_valid());
    }

    #[test]
    fn test_with_difficulty_out_of_range() {
        assert_eq!(
            Blockchain::with_difficulty(0).unwrap_err(),
            BlockchainError::InvalidDifficulty(0)
        );
        assert!(Blockchain::with_difficulty(7).is_err());
    }

    #[test]
    fn test_add_transaction() {
        let blockchain = easy_blockchain();

        assert_eq!(blockchain.add_transaction("hello"), 1);
        assert_eq!(blockchain.add_transaction("hello"), 2);

        let pending = blockchain.get_pending_transactions();
        assert_eq!(pending, vec![Transaction::new("hello"), Transaction::new("hello")]);
        assert_eq!(blockchain.get_chain().len(), 1);
    }

    #[test]
    fn test_mine_block() {
        let blockchain = easy_blockchain();
        blockchain.add_transaction("hello");
        blockchain.add_transaction("world");

        let genesis = blockchain.get_last_block();
        let block = blockchain.mine_block();

        assert_eq!(block.index, 1);
        assert_eq!(block.previous_hash, genesis.hash);
        assert_eq!(
            block.transactions,
            vec![Transaction::new("hello"), Transaction::new("world")]
        );
        assert!(block.hash.starts_with('0'));
        assert!(blockchain.get_pending_transactions().is_empty());
        assert_eq!(blockchain.get_last_block(), block);
        assert!(blockchain.is_valid());
    }

    #[test]
    fn test_mine_block_empty_pool() {
        let blockchain = easy_blockchain();
        let block = blockchain.mine_block();

        assert_eq!(block.transactions, vec![Transaction::new(EMPTY_BLOCK_DATA)]);
        assert!(blockchain.get_pending_transactions().is_empty());
    }

    #[test]
    fn test_difficulty_applies_to_future_blocks_only() {
        let blockchain = easy_blockchain();
        blockchain.mine_block();

        assert_eq!(blockchain.set_difficulty(3), Ok(3));
        let block = blockchain.mine_block();

        assert!(block.hash.starts_with("000"));
        assert!(blockchain.is_valid());
    }

    #[test]
    fn test_set_difficulty_out_of_range() {
        let blockchain = easy_blockchain();

        assert_eq!(
            blockchain.set_difficulty(7),
            Err(BlockchainError::InvalidDifficulty(7))
        );
        assert_eq!(blockchain.snapshot().difficulty, 1);
    }

    #[test]
    fn test_tampered_transaction_invalidates_chain() {
        let blockchain = easy_blockchain();
        blockchain.add_transaction("Alice sends 10 coins to Bob");
        blockchain.mine_block();
        blockchain.mine_block();
        assert!(blockchain.is_valid());

        blockchain.write().chain[1].transactions[0].data =
            "Alice sends 99 coins to Bob".to_string();
        assert!(!blockchain.is_valid());
    }

    #[test]
    fn test_tampered_merkle_root_invalidates_chain() {
        let blockchain = easy_blockchain();
        blockchain.mine_block();

        blockchain.write().chain[1].merkle_root = "forged".to_string();
        assert!(!blockchain.is_valid());
    }

    #[test]
    fn test_broken_link_invalidates_chain() {
        let blockchain = easy_blockchain();
        blockchain.mine_block();
        blockchain.mine_block();

        {
            // Re-mine block 2 against a forged predecessor so its own hash stays consistent.
            let mut ledger = blockchain.write();
            let block = &mut ledger.chain[2];
            block.previous_hash = "0".repeat(64);
            block.nonce = 0;
            block.mine(1);
        }

        assert!(!blockchain.is_valid());
        assert!(!blockchain.stats().is_valid);
    }

    #[test]
    fn test_genesis_is_not_rechecked() {
        let blockchain = easy_blockchain();
        blockchain.write().chain[0].transactions[0].data = "edited".to_string();

        assert!(blockchain.is_valid());
    }

    #[test]
    fn test_search_case_insensitive() {
        let blockchain = easy_blockchain();
        let genesis = blockchain.get_last_block();

        let results = blockchain.search("GENESIS");
        assert_eq!(
            results,
            vec![SearchResult {
                block_index: 0,
                block_hash: genesis.hash,
                transaction: GENESIS_DATA.to_string(),
                timestamp: genesis.timestamp,
            }]
        );
    }

    #[test]
    fn test_search_order_and_misses() {
        let blockchain = easy_blockchain();
        blockchain.add_transaction("Alice pays Bob");
        blockchain.add_transaction("Carol pays Dave");
        blockchain.mine_block();
        blockchain.add_transaction("bob pays alice");
        blockchain.mine_block();

        let results = blockchain.search("bob");
        let found: Vec<(u64, &str)> = results
            .iter()
            .map(|r| (r.block_index, r.transaction.as_str()))
            .collect();
        assert_eq!(found, vec![(1, "Alice pays Bob"), (2, "bob pays alice")]);

        assert!(blockchain.search("mallory").is_empty());
    }

    #[test]
    fn test_search_ignores_pending() {
        let blockchain = easy_blockchain();
        blockchain.add_transaction("unmined");

        assert!(blockchain.search("unmined").is_empty());
    }

    #[test]
    fn test_snapshot_and_stats() {
        let blockchain = easy_blockchain();
        blockchain.mine_block();
        blockchain.add_transaction("pending");

        let snapshot = blockchain.snapshot();
        assert_eq!(snapshot.chain.len(), 2);
        assert_eq!(snapshot.difficulty, 1);
        assert_eq!(snapshot.pending_transactions, vec![Transaction::new("pending")]);

        let stats = blockchain.stats();
        assert_eq!(stats.total_blocks, 2);
        assert_eq!(stats.pending_transactions, 1);
        assert_eq!(stats.difficulty, 1);
        assert!(stats.is_valid);
    }

    #[test]
    fn test_concurrent_submissions_are_not_lost() {
        let blockchain = easy_blockchain();

        let writers: Vec<_> = (0..4)
            .map(|worker| {
                let blockchain = blockchain.clone();
                thread::spawn(move || {
                    for i in 0..25 {
                        blockchain.add_transaction(format!("tx-{}-{}", worker, i));
                    }
                })
            })
            .collect();

        for _ in 0..5 {
            blockchain.mine_block();
        }

        for writer in writers {
            writer.join().unwrap();
        }
        blockchain.mine_block();

        let mined = blockchain
            .get_chain()
            .iter()
            .flat_map(|block| block.transactions.iter())
            .filter(|tx| tx.data.starts_with("tx-"))
            .count();
        assert_eq!(mined, 100);
        assert!(blockchain.get_pending_transactions().is_empty());
        assert!(blockchain.is_valid());
    }
}
