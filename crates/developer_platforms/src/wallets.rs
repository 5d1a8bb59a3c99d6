//! A wallet registry backed by a fixed map, used when wallet addresses come
//! from configuration rather than a database.

use std::collections::HashMap;

use async_trait::async_trait;
use tracing::debug;

use crate::{errors::Error, WalletRegistry};

#[cfg(test)]
#[path = "wallets_tests.rs"]
mod tests;

#[derive(Debug, Clone, Default)]
pub struct InMemoryWalletRegistry {
    wallets: HashMap<u64, String>,
}

impl InMemoryWalletRegistry {
    pub fn new(wallets: HashMap<u64, String>) -> Self {
        Self { wallets }
    }

    /// Registers or replaces the wallet of a user.
    pub fn register(&mut self, user_id: u64, address: impl Into<String>) {
        self.wallets.insert(user_id, address.into());
    }
}

#[async_trait]
impl WalletRegistry for InMemoryWalletRegistry {
    async fn get_wallet_address(&self, user_id: u64) -> Result<Option<String>, Error> {
        let wallet = self.wallets.get(&user_id).cloned();
        debug!(
            user = user_id,
            registered = wallet.is_some(),
            "Looked up wallet address"
        );
        Ok(wallet)
    }
}
