//! Compact MD5 digest used for cache sidecars
//!
//! Hashes are stored as their raw 16 bytes and rendered as lowercase hex
//! in sidecar files and JSON output.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::{CacheError, CacheResult};

/// MD5 digest stored as a 16-byte array
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Md5Hash([u8; 16]);

impl Md5Hash {
    /// Parse a 32-character hex string (case insensitive)
    ///
    /// # Errors
    ///
    /// Returns `CacheError::InvalidState` if the string is not a valid digest
    pub fn from_hex(hex: &str) -> CacheResult<Self> {
        let invalid = || CacheError::InvalidState {
            reason: format!("Invalid MD5 digest: {:?}", hex),
        };

        if hex.len() != 32 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }

        let mut bytes = [0u8; 16];
        for (i, chunk) in hex.as_bytes().chunks(2).enumerate() {
            let pair = std::str::from_utf8(chunk).map_err(|_| invalid())?;
            bytes[i] = u8::from_str_radix(pair, 16).map_err(|_| invalid())?;
        }

        Ok(Md5Hash(bytes))
    }

    /// Lowercase 32-character hex representation
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{:02x}", b)).collect()
    }

    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        Md5Hash(bytes)
    }

    /// Digest of an in-memory buffer
    pub fn compute(content: &[u8]) -> Self {
        Md5Hash(md5::compute(content).0)
    }
}

impl From<md5::Digest> for Md5Hash {
    fn from(digest: md5::Digest) -> Self {
        Md5Hash(digest.0)
    }
}

impl fmt::Display for Md5Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl FromStr for Md5Hash {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s.trim())
    }
}

impl Serialize for Md5Hash {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Md5Hash {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let hex_string = String::deserialize(deserializer)?;
        Self::from_hex(&hex_string).map_err(serde::de::Error::custom)
    }
}
