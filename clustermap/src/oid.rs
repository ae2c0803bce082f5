//! Opaque 12-byte identifiers used for collection epochs and election ids.
//!
//! Many document databases mint object identifiers as a timestamp prefix
//! followed by process/counter bytes, which makes byte-wise ordering
//! coincide with creation order. We don't need anything that elaborate here;
//! a high-order timestamp and random low-order bytes are enough to give
//! `Ord` implementations that are monotonic for same-process generation
//! without requiring a global counter.

use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// A 12-byte opaque, totally-ordered identifier.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OpaqueId([u8; 12]);

impl OpaqueId {
    pub const ZERO: OpaqueId = OpaqueId([0; 12]);

    /// Generate a fresh id: 4 bytes of unix-epoch seconds, 8 random bytes.
    pub fn new() -> Self {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs() as u32;

        let mut bytes = [0u8; 12];
        bytes[0..4].copy_from_slice(&secs.to_be_bytes());
        rand::rng().fill_bytes(&mut bytes[4..]);

        Self(bytes)
    }

    pub fn from_bytes(bytes: [u8; 12]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 12] {
        &self.0
    }
}

impl Default for OpaqueId {
    fn default() -> Self {
        Self::ZERO
    }
}

impl fmt::Debug for OpaqueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}

impl fmt::Display for OpaqueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_zero_is_less_than_fresh() {
        let fresh = OpaqueId::new();
        assert!(OpaqueId::ZERO < fresh || OpaqueId::ZERO == fresh);
    }

    #[test]
    fn test_distinct_ids_are_distinct() {
        let a = OpaqueId::new();
        let b = OpaqueId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn test_display_is_hex() {
        let id = OpaqueId::from_bytes([0xab; 12]);
        assert_eq!(id.to_string(), "ab".repeat(12));
    }
}
