//! # Snapshot Format
//!
//! Binary serialization of the whole persisted key space.
//!
//! Used by the file store and by export/import. File I/O lives with the
//! callers; this module is pure transformation.
//!
//! Format: Header (5 bytes) + postcard-serialized `BTreeMap<String, String>`.
//! - 4 bytes: Magic ("P29S")
//! - 1 byte: Version
//!
//! Size and header are validated before the payload is decoded.

use crate::{PlaybookError, primitives};
use std::collections::BTreeMap;

/// Maximum accepted snapshot size.
///
/// Local state is a handful of small JSON documents; anything near this
/// size is corrupt or hostile.
pub const MAX_SNAPSHOT_SIZE: usize = 16 * 1024 * 1024; // 16 MB

/// Minimum valid snapshot size (header only).
const HEADER_LEN: usize = 5;

// =============================================================================
// HEADER
// =============================================================================

/// The header that precedes every snapshot payload.
#[derive(Debug, Clone, Copy)]
pub struct SnapshotHeader {
    pub magic: [u8; 4],
    pub version: u8,
}

impl SnapshotHeader {
    /// Create a header with the current format version.
    #[must_use]
    pub fn new() -> Self {
        Self {
            magic: *primitives::MAGIC_BYTES,
            version: primitives::FORMAT_VERSION,
        }
    }

    /// Validate magic bytes and version.
    pub fn validate(&self) -> Result<(), PlaybookError> {
        if &self.magic != primitives::MAGIC_BYTES {
            return Err(PlaybookError::DeserializationError(
                "Invalid magic bytes".to_string(),
            ));
        }
        if self.version != primitives::FORMAT_VERSION {
            return Err(PlaybookError::DeserializationError(format!(
                "Unsupported version: {} (expected {})",
                self.version,
                primitives::FORMAT_VERSION
            )));
        }
        Ok(())
    }

    /// Write header to bytes.
    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let mut bytes = [0u8; HEADER_LEN];
        bytes[0..4].copy_from_slice(&self.magic);
        bytes[4] = self.version;
        bytes
    }

    /// Read header from bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PlaybookError> {
        if bytes.len() < HEADER_LEN {
            return Err(PlaybookError::DeserializationError(
                "Header too short".to_string(),
            ));
        }
        let mut magic = [0u8; 4];
        magic.copy_from_slice(&bytes[0..4]);
        Ok(Self {
            magic,
            version: bytes[4],
        })
    }
}

impl Default for SnapshotHeader {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// ENCODE / DECODE
// =============================================================================

/// Encode stored entries as snapshot bytes.
pub fn snapshot_to_bytes(entries: &BTreeMap<String, String>) -> Result<Vec<u8>, PlaybookError> {
    let payload = postcard::to_stdvec(entries)
        .map_err(|e| PlaybookError::SerializationError(e.to_string()))?;

    let mut out = Vec::with_capacity(HEADER_LEN + payload.len());
    out.extend_from_slice(&SnapshotHeader::new().to_bytes());
    out.extend_from_slice(&payload);
    Ok(out)
}

/// Decode snapshot bytes into stored entries.
pub fn snapshot_from_bytes(bytes: &[u8]) -> Result<BTreeMap<String, String>, PlaybookError> {
    if bytes.len() < HEADER_LEN {
        return Err(PlaybookError::DeserializationError(format!(
            "Data too short: minimum {} bytes required",
            HEADER_LEN
        )));
    }
    if bytes.len() > MAX_SNAPSHOT_SIZE {
        return Err(PlaybookError::DeserializationError(format!(
            "Data size {} bytes exceeds maximum allowed {} bytes",
            bytes.len(),
            MAX_SNAPSHOT_SIZE
        )));
    }

    let header = SnapshotHeader::from_bytes(bytes)?;
    header.validate()?;

    postcard::from_bytes(&bytes[HEADER_LEN..]).map_err(|e| {
        PlaybookError::DeserializationError(format!("Failed to decode snapshot: {}", e))
    })
}

/// BLAKE3 fingerprint of snapshot bytes, hex encoded.
#[cfg(feature = "crypto-hash")]
#[must_use]
pub fn snapshot_fingerprint(bytes: &[u8]) -> String {
    blake3::hash(bytes).to_hex().to_string()
}

// =============================================================================
// TESTS
// =============================================================================
