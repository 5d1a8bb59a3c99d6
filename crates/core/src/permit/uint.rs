//! A minimal unsigned 256-bit integer for EIP-712 encoding.
//!
//! Only the operations permit generation needs are provided: construction
//! from small integers and hashes, decimal scaling and decimal formatting.

use std::fmt;

#[cfg(test)]
#[path = "uint_tests.rs"]
mod tests;

/// Big-endian 256-bit unsigned integer.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct U256([u8; 32]);

impl U256 {
    pub const ZERO: U256 = U256([0; 32]);
    pub const MAX: U256 = U256([0xff; 32]);

    pub fn from_be_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn to_be_bytes(self) -> [u8; 32] {
        self.0
    }

    pub fn from_u128(value: u128) -> Self {
        let mut bytes = [0u8; 32];
        bytes[16..].copy_from_slice(&value.to_be_bytes());
        Self(bytes)
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|b| *b == 0)
    }

    /// Multiplies by `factor`, returning `None` on overflow.
    pub fn checked_mul_small(self, factor: u64) -> Option<Self> {
        let mut result = [0u8; 32];
        let mut carry: u128 = 0;
        for i in (0..32).rev() {
            let product = u128::from(self.0[i]) * u128::from(factor) + carry;
            result[i] = (product & 0xff) as u8;
            carry = product >> 8;
        }
        if carry == 0 {
            Some(Self(result))
        } else {
            None
        }
    }

    /// `self × 10^exponent`, or `None` on overflow.
    pub fn checked_mul_pow10(self, exponent: u32) -> Option<Self> {
        (0..exponent).try_fold(self, |acc, _| acc.checked_mul_small(10))
    }

    /// Parses a base-10 string of digits.
    #[cfg(test)]
    pub fn from_dec_str(value: &str) -> Option<Self> {
        if value.is_empty() {
            return None;
        }
        value.chars().try_fold(Self::ZERO, |acc, c| {
            let digit = c.to_digit(10)?;
            acc.checked_mul_small(10)?.checked_add_small(u64::from(digit))
        })
    }

    #[cfg(test)]
    fn checked_add_small(self, addend: u64) -> Option<Self> {
        let mut result = self.0;
        let mut carry = u128::from(addend);
        for byte in result.iter_mut().rev() {
            if carry == 0 {
                break;
            }
            let sum = u128::from(*byte) + (carry & 0xff);
            *byte = (sum & 0xff) as u8;
            carry = (carry >> 8) + (sum >> 8);
        }
        if carry == 0 {
            Some(Self(result))
        } else {
            None
        }
    }

    /// Base-10 representation.
    pub fn to_dec_string(&self) -> String {
        if self.is_zero() {
            return "0".to_string();
        }

        let mut value = self.0;
        let mut digits = Vec::with_capacity(78);
        while value.iter().any(|b| *b != 0) {
            let mut remainder: u32 = 0;
            for byte in value.iter_mut() {
                let current = (remainder << 8) | u32::from(*byte);
                *byte = (current / 10) as u8;
                remainder = current % 10;
            }
            digits.push(char::from(b'0' + remainder as u8));
        }

        digits.iter().rev().collect()
    }
}

impl fmt::Display for U256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_dec_string())
    }
}

impl fmt::Debug for U256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "U256({})", self.to_dec_string())
    }
}
