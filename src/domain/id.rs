//! Domain identifier types with proper encapsulation.

use std::fmt;

use alloy_primitives::B256;
use serde::{Deserialize, Serialize};

/// Name under which a gateway is registered (e.g. `"aave-v3"`).
///
/// The inner String is private to ensure all construction goes through
/// the defined constructors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProtocolName(String);

impl ProtocolName {
    /// Create a new `ProtocolName` from a string.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Get the protocol name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProtocolName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ProtocolName {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for ProtocolName {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// Name under which a flash lender is registered.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LenderId(String);

impl LenderId {
    /// Create a new `LenderId` from a string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the lender ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LenderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for LenderId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Numeric venue identifier used by view aggregators and trigger parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProtocolId(u8);

impl ProtocolId {
    /// Create a new `ProtocolId`.
    #[must_use]
    pub const fn new(id: u8) -> Self {
        Self(id)
    }

    /// Get the underlying value.
    #[must_use]
    pub const fn value(self) -> u8 {
        self.0
    }
}

impl fmt::Display for ProtocolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "protocol-{}", self.0)
    }
}

/// Conditional order identity, `keccak256(abi.encode(user, salt))`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderHash(B256);

impl OrderHash {
    /// Wrap a raw hash.
    #[must_use]
    pub const fn new(hash: B256) -> Self {
        Self(hash)
    }

    /// Get the raw hash.
    #[must_use]
    pub const fn as_b256(&self) -> B256 {
        self.0
    }
}

impl fmt::Display for OrderHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<B256> for OrderHash {
    fn from(hash: B256) -> Self {
        Self(hash)
    }
}
