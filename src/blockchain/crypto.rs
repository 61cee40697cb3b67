use sha2::{Digest, Sha256};

/// Computes the SHA-256 digest of the given bytes
///
/// # Arguments
///
/// * `data` - The bytes to hash
///
/// # Returns
///
/// The digest as a 64 character lowercase hexadecimal string
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Checks whether a hex digest starts with `difficulty` zero characters
pub fn meets_difficulty(hash: &str, difficulty: usize) -> bool {
    hash.len() >= difficulty && hash.bytes().take(difficulty).all(|b| b == b'0')
}
