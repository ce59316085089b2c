//! Type definitions for EWF format parsing

use std::collections::HashMap;

use serde::Serialize;

use crate::error::DecodeError;

// =============================================================================
// Core Constants
// =============================================================================

/// EWF v1 signature: `45 56 46 09 0D 0A FF 00`
pub const EWF_SIGNATURE: &[u8; 8] = b"EVF\x09\x0d\x0a\xff\x00";

/// Section descriptor layout: type[16] + next_offset u64 + size u64 +
/// padding[40] + checksum u32
pub const SECTION_DESCRIPTOR_SIZE: u64 = 76;

/// First section starts after the 8-byte signature and the 5-byte segment
/// header, which is skipped without interpretation
pub const SECTION_WALK_START: u64 = 13;

// =============================================================================
// Section Descriptors
// =============================================================================

/// One section of the EWF container, with its sliced payload
#[derive(Clone, Debug, Serialize)]
pub struct SectionDescriptor {
    /// Lowercased, trimmed section type (1-16 chars)
    pub section_type: String,
    /// Absolute byte offset of the next section descriptor (0 if none)
    pub next_offset: u64,
    /// Declared section size; payloads are bounded by the file remainder
    pub size: u64,
    /// Byte offset of this descriptor in the file
    pub offset: u64,
    /// Payload bytes following the 76-byte descriptor
    #[serde(skip_serializing)]
    pub data: Vec<u8>,
}

// =============================================================================
// Case Metadata
// =============================================================================

/// Alias table collapsing the short header keys EnCase-family tools emit
/// onto canonical names. Unknown keys pass through verbatim.
const KEY_ALIASES: &[(&str, &str)] = &[
    ("c", "case_number"),
    ("case", "case_number"),
    ("n", "description"),
    ("name", "description"),
    ("e", "examiner_name"),
    ("examiner", "examiner_name"),
    ("ev", "evidence_number"),
    ("evidence", "evidence_number"),
    ("no", "notes"),
    ("a", "acquired_date"),
    ("acquired", "acquired_date"),
    ("m", "system_date"),
    ("system", "system_date"),
    ("os", "operating_system"),
    ("p", "password"),
    ("r", "compression_level"),
    ("compression", "compression_level"),
];

/// Resolve a lowercased header key to its canonical name
pub fn canonical_key(key: &str) -> &str {
    KEY_ALIASES
        .iter()
        .find(|(alias, _)| *alias == key)
        .map(|(_, canonical)| *canonical)
        .unwrap_or(key)
}

/// Case metadata from `header`/`header2` sections.
///
/// An open map from lowercase canonical key to value; later sections
/// override earlier ones on key collision.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct CaseMetadata {
    pub fields: HashMap<String, String>,
}

impl CaseMetadata {
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(|s| s.as_str())
    }

    pub fn case_number(&self) -> Option<&str> {
        self.get("case_number")
    }

    pub fn description(&self) -> Option<&str> {
        self.get("description")
    }

    pub fn examiner_name(&self) -> Option<&str> {
        self.get("examiner_name")
    }

    pub fn evidence_number(&self) -> Option<&str> {
        self.get("evidence_number")
    }

    pub fn acquired_date(&self) -> Option<&str> {
        self.get("acquired_date")
    }
}

// =============================================================================
// Volume / Hash Sections
// =============================================================================

/// Volume geometry from a `volume`/`disk` section
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct VolumeInfo {
    pub media_type: u8,
    pub chunk_count: u32,
    pub sectors_per_chunk: u32,
    pub bytes_per_sector: u32,
    pub sector_count: u64,
}

impl VolumeInfo {
    /// Human-readable media type
    pub fn media_type_name(&self) -> &'static str {
        match self.media_type {
            0x00 => "Removable",
            0x01 => "Fixed Disk",
            0x03 => "Optical Disc",
            0x0E => "Logical Evidence",
            0x10 => "RAM",
            _ => "Unknown",
        }
    }
}

/// Acquisition hashes from a `hash`/`digest` section
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct HashInfo {
    /// 32-char lowercase hex
    pub md5: Option<String>,
    /// 40-char lowercase hex
    pub sha1: Option<String>,
}

// =============================================================================
// Parse Result
// =============================================================================

/// Complete parse result for one EWF segment file.
///
/// `valid` means the signature was accepted and the section framework
/// decoded; `errors` may still list sub-issues for individual sections.
#[derive(Clone, Debug, Default, Serialize)]
pub struct EwfImage {
    pub valid: bool,
    pub signature: [u8; 8],
    /// Sections in walk order; offsets are strictly increasing
    pub sections: Vec<SectionDescriptor>,
    pub metadata: CaseMetadata,
    pub volume: Option<VolumeInfo>,
    pub hashes: Option<HashInfo>,
    /// Concatenated `sectors`/`data` payloads in emission order
    #[serde(skip_serializing)]
    pub raw_disk: Option<Vec<u8>>,
    pub errors: Vec<DecodeError>,
}

/// Outcome of re-hashing the reconstructed disk against a stored hash
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HashVerification {
    pub algorithm: String,
    pub stored: String,
    pub computed: String,
    pub matches: bool,
}
