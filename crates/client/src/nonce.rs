//! Nonce key allocation for concurrent user operations of one sender

use ethers::types::{Address, U256};
use parking_lot::Mutex;
use std::collections::HashMap;

/// Hands out nonce keys (entry point nonce channels)
pub trait NonceKeyManager: Send + Sync {
    /// Next key for a user operation of `sender`
    fn next_key(&self, sender: Address, entry_point: Address, chain_id: u64) -> U256;
}

/// In-memory [NonceKeyManager](NonceKeyManager): every call returns a fresh key per
/// (sender, entry point, chain), counting up from `start`
#[derive(Debug, Default)]
pub struct MemoryNonceKeyManager {
    start: U256,
    keys: Mutex<HashMap<(Address, Address, u64), U256>>,
}

impl MemoryNonceKeyManager {
    pub fn new(start: U256) -> Self {
        Self { start, keys: Mutex::new(HashMap::new()) }
    }
}

impl NonceKeyManager for MemoryNonceKeyManager {
    fn next_key(&self, sender: Address, entry_point: Address, chain_id: u64) -> U256 {
        let mut keys = self.keys.lock();
        let key = keys.entry((sender, entry_point, chain_id)).or_insert(self.start);
        let current = *key;
        *key = current.saturating_add(U256::one());
        current
    }
}
