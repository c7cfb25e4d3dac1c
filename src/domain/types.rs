//! Core identifier types for the Delego broker.
//!
//! Addresses follow the fixed-width account format used by every endpoint:
//! `0x` followed by exactly 16 hex characters, case-insensitive on input and
//! normalized to lowercase for storage and comparison.

use std::fmt;

use serde::{Deserialize, Serialize};

/// 32-byte hash (SHA-256)
pub type Hash256 = [u8; 32];

/// Error produced when parsing an account address.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid address format: expected 0x followed by 16 hex characters")]
pub struct AddressParseError;

/// A 16-hex-character account address, prefixed `0x`.
///
/// Stored lowercase so equality checks never depend on the caller's casing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

impl Address {
    /// Parse and normalize an address.
    pub fn parse(s: &str) -> Result<Self, AddressParseError> {
        let hex_part = s.strip_prefix("0x").ok_or(AddressParseError)?;
        if hex_part.len() != 16 || !hex_part.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(AddressParseError);
        }
        Ok(Self(format!("0x{}", hex_part.to_ascii_lowercase())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Last six hex characters, used for delegate-facing display names.
    pub fn short_suffix(&self) -> &str {
        &self.0[self.0.len() - 6..]
    }
}

impl TryFrom<String> for Address {
    type Error = AddressParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Address::parse(&s)
    }
}

impl From<Address> for String {
    fn from(addr: Address) -> Self {
        addr.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a subscription pass (the asset a delegation scopes access to).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PassId(pub u64);

impl PassId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for PassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Monotonically assigned delegation identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DelegationId(pub u64);

impl DelegationId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for DelegationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Serde module for serializing Hash256 as hex strings
pub mod hash256_hex {
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(bytes: &[u8; 32], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<[u8; 32], D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let bytes = hex::decode(&s).map_err(serde::de::Error::custom)?;
        bytes
            .try_into()
            .map_err(|_| serde::de::Error::custom("expected 32 bytes for Hash256"))
    }
}
