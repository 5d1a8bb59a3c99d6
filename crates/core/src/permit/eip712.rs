//! EIP-712 hashing for Permit2 `PermitTransferFrom` messages.

use lazy_static::lazy_static;
use sha3::{Digest, Keccak256};

use crate::errors::PermitError;
use crate::permit::uint::U256;

#[cfg(test)]
#[path = "eip712_tests.rs"]
mod tests;

/// A 20-byte account address.
pub type Address = [u8; 20];

pub const DOMAIN_TYPE: &str = "EIP712Domain(string name,uint256 chainId,address verifyingContract)";

pub const TOKEN_PERMISSIONS_TYPE: &str = "TokenPermissions(address token,uint256 amount)";

pub const PERMIT_TRANSFER_FROM_TYPE: &str = "PermitTransferFrom(TokenPermissions permitted,address spender,uint256 nonce,uint256 deadline)TokenPermissions(address token,uint256 amount)";

pub const PERMIT2_DOMAIN_NAME: &str = "Permit2";

lazy_static! {
    static ref DOMAIN_TYPE_HASH: [u8; 32] = keccak256(DOMAIN_TYPE.as_bytes());
    static ref TOKEN_PERMISSIONS_TYPE_HASH: [u8; 32] = keccak256(TOKEN_PERMISSIONS_TYPE.as_bytes());
    static ref PERMIT_TRANSFER_FROM_TYPE_HASH: [u8; 32] =
        keccak256(PERMIT_TRANSFER_FROM_TYPE.as_bytes());
}

pub fn keccak256(data: &[u8]) -> [u8; 32] {
    Keccak256::digest(data).into()
}

/// Parses a `0x`-prefixed, 40 hex digit address. Checksums are not enforced.
pub fn parse_address(value: &str) -> Result<Address, PermitError> {
    let trimmed = value.trim();
    let hex_part = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .ok_or_else(|| PermitError::InvalidAddress(value.to_string()))?;
    if hex_part.len() != 40 {
        return Err(PermitError::InvalidAddress(value.to_string()));
    }

    let mut address = [0u8; 20];
    hex::decode_to_slice(hex_part, &mut address)
        .map_err(|_| PermitError::InvalidAddress(value.to_string()))?;
    Ok(address)
}

/// Formats an address with its EIP-55 mixed-case checksum.
pub fn to_checksum_address(address: &Address) -> String {
    let lower = hex::encode(address);
    let hash = keccak256(lower.as_bytes());

    let mut checksummed = String::with_capacity(42);
    checksummed.push_str("0x");
    for (i, c) in lower.chars().enumerate() {
        let nibble = if i % 2 == 0 {
            hash[i / 2] >> 4
        } else {
            hash[i / 2] & 0x0f
        };
        if c.is_ascii_alphabetic() && nibble >= 8 {
            checksummed.push(c.to_ascii_uppercase());
        } else {
            checksummed.push(c);
        }
    }
    checksummed
}

fn address_word(address: &Address) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[12..].copy_from_slice(address);
    word
}

/// The Permit2 signing domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Permit2Domain {
    pub chain_id: u64,
    pub verifying_contract: Address,
}

impl Permit2Domain {
    pub fn separator(&self) -> [u8; 32] {
        let mut encoded = Vec::with_capacity(32 * 4);
        encoded.extend_from_slice(&*DOMAIN_TYPE_HASH);
        encoded.extend_from_slice(&keccak256(PERMIT2_DOMAIN_NAME.as_bytes()));
        encoded.extend_from_slice(&U256::from_u128(u128::from(self.chain_id)).to_be_bytes());
        encoded.extend_from_slice(&address_word(&self.verifying_contract));
        keccak256(&encoded)
    }
}

/// A single-token Permit2 transfer authorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PermitTransferFrom {
    pub token: Address,
    pub amount: U256,
    /// The account allowed to redeem the permit
    pub spender: Address,
    pub nonce: U256,
    pub deadline: U256,
}

impl PermitTransferFrom {
    fn token_permissions_hash(&self) -> [u8; 32] {
        let mut encoded = Vec::with_capacity(32 * 3);
        encoded.extend_from_slice(&*TOKEN_PERMISSIONS_TYPE_HASH);
        encoded.extend_from_slice(&address_word(&self.token));
        encoded.extend_from_slice(&self.amount.to_be_bytes());
        keccak256(&encoded)
    }

    pub fn struct_hash(&self) -> [u8; 32] {
        let mut encoded = Vec::with_capacity(32 * 5);
        encoded.extend_from_slice(&*PERMIT_TRANSFER_FROM_TYPE_HASH);
        encoded.extend_from_slice(&self.token_permissions_hash());
        encoded.extend_from_slice(&address_word(&self.spender));
        encoded.extend_from_slice(&self.nonce.to_be_bytes());
        encoded.extend_from_slice(&self.deadline.to_be_bytes());
        keccak256(&encoded)
    }

    /// The digest that is signed: `keccak256(0x1901 ‖ domain ‖ struct)`.
    pub fn signing_hash(&self, domain: &Permit2Domain) -> [u8; 32] {
        let mut encoded = Vec::with_capacity(2 + 32 * 2);
        encoded.extend_from_slice(&[0x19, 0x01]);
        encoded.extend_from_slice(&domain.separator());
        encoded.extend_from_slice(&self.struct_hash());
        keccak256(&encoded)
    }
}

/// The permit nonce for a user's reward on an issue.
///
/// Derived from the issue and user ids so re-running a payout produces the
/// same nonce, which Permit2 only lets be spent once.
pub fn permit_nonce(issue_id: u64, user_id: u64) -> U256 {
    U256::from_be_bytes(keccak256(format!("{}-{}", issue_id, user_id).as_bytes()))
}
