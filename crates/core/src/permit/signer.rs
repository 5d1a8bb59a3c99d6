//! Permit signing.

use k256::ecdsa::SigningKey;

use crate::errors::PermitError;
use crate::permit::eip712::{keccak256, to_checksum_address, Address};

#[cfg(test)]
#[path = "signer_tests.rs"]
mod tests;

/// Signs permit digests on behalf of the funding wallet.
pub trait PermitSigner: Send + Sync {
    /// The address of the funding wallet, i.e. the permit owner.
    fn address(&self) -> Address;

    /// Signs a 32-byte digest, returning `r ‖ s ‖ v`.
    fn sign_digest(&self, digest: &[u8; 32]) -> Result<[u8; 65], PermitError>;
}

/// Turns the configured signer key into a raw secp256k1 private key.
pub trait SignerKeyDecryptor: Send + Sync {
    fn decrypt_signer_key(&self, stored_key: &str) -> Result<[u8; 32], PermitError>;
}

/// Accepts an unencrypted hex private key, with or without `0x`.
#[derive(Debug, Clone, Copy, Default)]
pub struct HexKeyDecryptor;

impl SignerKeyDecryptor for HexKeyDecryptor {
    fn decrypt_signer_key(&self, stored_key: &str) -> Result<[u8; 32], PermitError> {
        let trimmed = stored_key.trim();
        let hex_part = trimmed.strip_prefix("0x").unwrap_or(trimmed);
        if hex_part.is_empty() {
            return Err(PermitError::MissingSignerKey);
        }
        if hex_part.len() != 64 {
            return Err(PermitError::InvalidSignerKey(format!(
                "expected 64 hex digits, found {}",
                hex_part.len()
            )));
        }

        let mut key = [0u8; 32];
        hex::decode_to_slice(hex_part, &mut key)
            .map_err(|e| PermitError::InvalidSignerKey(e.to_string()))?;
        Ok(key)
    }
}

/// Signs with a secp256k1 key held in memory.
pub struct LocalKeySigner {
    key: SigningKey,
    address: Address,
}

impl LocalKeySigner {
    pub fn from_bytes(private_key: &[u8; 32]) -> Result<Self, PermitError> {
        let key = SigningKey::from_slice(private_key)
            .map_err(|e| PermitError::InvalidSignerKey(e.to_string()))?;
        let address = address_of(&key);
        Ok(Self { key, address })
    }

    /// Decrypts `stored_key` and builds a signer from it.
    pub fn from_stored_key(
        stored_key: &str,
        decryptor: &dyn SignerKeyDecryptor,
    ) -> Result<Self, PermitError> {
        let private_key = decryptor.decrypt_signer_key(stored_key)?;
        Self::from_bytes(&private_key)
    }

    pub fn checksum_address(&self) -> String {
        to_checksum_address(&self.address)
    }
}

impl std::fmt::Debug for LocalKeySigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalKeySigner")
            .field("address", &self.checksum_address())
            .finish_non_exhaustive()
    }
}

impl PermitSigner for LocalKeySigner {
    fn address(&self) -> Address {
        self.address
    }

    fn sign_digest(&self, digest: &[u8; 32]) -> Result<[u8; 65], PermitError> {
        let (signature, recovery_id) = self
            .key
            .sign_prehash_recoverable(digest)
            .map_err(|e| PermitError::Signing(e.to_string()))?;

        let mut bytes = [0u8; 65];
        bytes[..64].copy_from_slice(&signature.to_bytes());
        bytes[64] = 27 + recovery_id.to_byte();
        Ok(bytes)
    }
}

fn address_of(key: &SigningKey) -> Address {
    let point = key.verifying_key().to_encoded_point(false);
    let hash = keccak256(&point.as_bytes()[1..]);
    let mut address = [0u8; 20];
    address.copy_from_slice(&hash[12..]);
    address
}
