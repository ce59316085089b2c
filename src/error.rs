//! Error types shared by the image decoders
//!
//! Every decoder is total: malformed input never panics and never aborts the
//! surrounding walk. Errors are collected into the `errors` list of the
//! decoder's result, so a result can be `valid` and still carry sub-issues.

use std::fmt;

use serde::{Serialize, Serializer};

/// Result type alias for decoder-internal operations
pub type DecodeResult<T> = Result<T, DecodeError>;

/// Errors raised while decoding forensic image structures
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Magic bytes did not match (EWF signature, MBR/GPT signature, FAT boot signature)
    InvalidSignature(String),
    /// A requested byte range extends past the end of the input buffer
    Truncated {
        offset: u64,
        needed: u64,
        available: u64,
    },
    /// An EWF section payload could not be decoded; the section walk continues
    MalformedSection {
        section: String,
        message: String,
    },
    /// Neither an MBR nor a GPT signature was found on the disk buffer
    UnknownPartitionScheme,
    /// The boot sector does not describe a FAT variant
    UnsupportedFilesystem(String),
    /// zlib inflate of a compressed payload failed
    Decompress(String),
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // Variant payload carries the full message ("Invalid EWF signature ...")
            DecodeError::InvalidSignature(e) => write!(f, "{}", e),
            DecodeError::Truncated {
                offset,
                needed,
                available,
            } => write!(
                f,
                "Truncated input: need {} bytes at offset {}, {} available",
                needed, offset, available
            ),
            DecodeError::MalformedSection { section, message } => {
                write!(f, "Malformed '{}' section: {}", section, message)
            }
            DecodeError::UnknownPartitionScheme => {
                write!(f, "Unknown partition scheme: no MBR or GPT signature")
            }
            DecodeError::UnsupportedFilesystem(e) => write!(f, "Unsupported filesystem: {}", e),
            DecodeError::Decompress(e) => write!(f, "Decompression failed: {}", e),
        }
    }
}

impl std::error::Error for DecodeError {}

// Errors travel inside Serialize-able results; the human-readable message is
// the wire representation.
impl Serialize for DecodeError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl DecodeError {
    /// Build a `Truncated` error from usize slice arithmetic
    pub(crate) fn truncated(offset: usize, needed: usize, available: usize) -> Self {
        DecodeError::Truncated {
            offset: offset as u64,
            needed: needed as u64,
            available: available as u64,
        }
    }
}
