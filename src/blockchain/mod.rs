// Blockchain module
//
// This module contains the core ledger implementation including:
// - Digest helpers
// - Transaction structure
// - Merkle tree
// - Block structure and proof of work
// - Blockchain structure, validation and search

pub mod block;
pub mod chain;
pub mod crypto;
pub mod merkle;
pub mod transaction;

// Re-export main components for easier access
pub use block::Block;
pub use chain::{Blockchain, ChainSnapshot, ChainStats, SearchResult};
pub use transaction::Transaction;
