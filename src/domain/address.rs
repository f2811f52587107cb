//! Ethereum address parsing and checksum (EIP-55)

use std::fmt;
use std::str::FromStr;

use alloy_primitives::keccak256;
use serde::{Serialize, Serializer};

const PAYLOAD_LEN: usize = 40;

/// Why a string was not accepted as an address
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddressError {
    #[error("missing 0x prefix")]
    MissingPrefix,

    #[error("expected 40 hex chars, got {0}")]
    WrongLength(usize),

    #[error("invalid hex character '{0}'")]
    InvalidHex(char),

    #[error("mixed-case address fails its checksum")]
    BadChecksum,
}

/// An address in canonical EIP-55 form (`0x` + 40 checksum-cased hex chars)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChecksumAddress(String);

impl ChecksumAddress {
    /// Parse user input into canonical form.
    ///
    /// All-lowercase and all-uppercase payloads are accepted as-is and
    /// re-cased; a mixed-case payload must already carry a valid checksum.
    pub fn parse(raw: &str) -> Result<Self, AddressError> {
        let trimmed = raw.trim();
        let payload = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .ok_or(AddressError::MissingPrefix)?;

        if let Some(bad) = payload.chars().find(|c| !c.is_ascii_hexdigit()) {
            return Err(AddressError::InvalidHex(bad));
        }
        if payload.len() != PAYLOAD_LEN {
            return Err(AddressError::WrongLength(payload.len()));
        }

        let lower = payload.to_ascii_lowercase();
        let checksummed = to_checksum(&lower);

        let has_lower = payload.chars().any(|c| c.is_ascii_lowercase());
        let has_upper = payload.chars().any(|c| c.is_ascii_uppercase());
        if has_lower && has_upper && checksummed[2..] != *payload {
            return Err(AddressError::BadChecksum);
        }

        Ok(Self(checksummed))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Shortened form for narrow columns: `0x742d…d8B6`
    pub fn short(&self) -> String {
        format!("{}…{}", &self.0[..6], &self.0[self.0.len() - 4..])
    }

    pub fn to_alloy(&self) -> alloy_primitives::Address {
        // The payload is validated hex of the right length.
        let mut bytes = [0u8; 20];
        if let Ok(decoded) = hex::decode(&self.0[2..]) {
            bytes.copy_from_slice(&decoded);
        }
        alloy_primitives::Address::from(bytes)
    }
}

impl fmt::Display for ChecksumAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ChecksumAddress {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for ChecksumAddress {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Serialize for ChecksumAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

/// Apply EIP-55 casing to a lowercase 40-char hex payload (no prefix)
fn to_checksum(lower: &str) -> String {
    let hash = keccak256(lower.as_bytes());
    let hash_hex = hex::encode(hash.as_slice());

    let mut result = String::with_capacity(2 + PAYLOAD_LEN);
    result.push_str("0x");

    for (c, h) in lower.chars().zip(hash_hex.chars()) {
        let nibble = h.to_digit(16).unwrap_or(0);
        if nibble >= 8 {
            result.push(c.to_ascii_uppercase());
        } else {
            result.push(c);
        }
    }

    result
}
