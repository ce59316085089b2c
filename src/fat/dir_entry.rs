//! 32-byte FAT directory entry decoding
//!
//! Handles the short (8.3) entry layout, the attribute bits, and the LFN
//! slot format: attribute 0x0F entries carrying 13 UTF-16LE code units each
//! at fixed in-entry positions, assembled by ordinal into the long name for
//! the short entry that follows them.

use crate::common::binary::ascii_trimmed;

use super::types::DIR_ENTRY_SIZE;

pub(crate) const ATTR_HIDDEN: u8 = 0x02;
pub(crate) const ATTR_SYSTEM: u8 = 0x04;
pub(crate) const ATTR_VOLUME_ID: u8 = 0x08;
pub(crate) const ATTR_DIRECTORY: u8 = 0x10;
pub(crate) const ATTR_LONG_NAME: u8 = 0x0F;

/// UTF-16LE code unit positions inside one LFN slot
const LFN_CHAR_OFFSETS: [usize; 13] = [1, 3, 5, 7, 9, 14, 16, 18, 20, 22, 24, 28, 30];

/// Classification of one raw 32-byte record
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum DirEntry {
    /// Byte 0 == 0x00: no further entries in this directory
    Terminator,
    /// Deleted (0xE5) entry; skipped without touching the LFN buffer
    Deleted,
    /// LFN slot: 1-based ordinal and its 13-unit name fragment
    LongName { ordinal: u8, fragment: String },
    /// Volume label pseudo-entry; never listed
    VolumeLabel,
    Short(ShortEntry),
}

/// A decoded short (8.3) directory entry
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ShortEntry {
    pub short_name: String,
    pub extension: String,
    pub is_directory: bool,
    pub is_hidden: bool,
    pub is_system: bool,
    pub cluster: u32,
    pub size: u32,
}

impl ShortEntry {
    /// `.` and `..` never appear in the listing
    pub fn is_dot(&self) -> bool {
        self.short_name == "." || self.short_name == ".."
    }
}

/// Decode one 32-byte record
pub(crate) fn decode(entry: &[u8]) -> DirEntry {
    debug_assert_eq!(entry.len(), DIR_ENTRY_SIZE);

    match entry[0] {
        0x00 => return DirEntry::Terminator,
        0xE5 => return DirEntry::Deleted,
        _ => {}
    }

    let attributes = entry[11];
    if attributes & 0x0F == ATTR_LONG_NAME {
        return DirEntry::LongName {
            ordinal: entry[0] & 0x3F,
            fragment: decode_lfn_fragment(entry),
        };
    }

    let is_directory = attributes & ATTR_DIRECTORY != 0;
    if attributes & ATTR_VOLUME_ID != 0 && !is_directory {
        return DirEntry::VolumeLabel;
    }

    // 0x05 escapes a real leading 0xE5 in the name
    let mut name_bytes = [0u8; 8];
    name_bytes.copy_from_slice(&entry[0..8]);
    if name_bytes[0] == 0x05 {
        name_bytes[0] = 0xE5;
    }

    let cluster_high = u16::from_le_bytes([entry[20], entry[21]]) as u32;
    let cluster_low = u16::from_le_bytes([entry[26], entry[27]]) as u32;

    DirEntry::Short(ShortEntry {
        short_name: ascii_trimmed(&name_bytes),
        extension: ascii_trimmed(&entry[8..11]),
        is_directory,
        is_hidden: attributes & ATTR_HIDDEN != 0,
        is_system: attributes & ATTR_SYSTEM != 0,
        cluster: (cluster_high << 16) | cluster_low,
        size: u32::from_le_bytes([entry[28], entry[29], entry[30], entry[31]]),
    })
}

/// Pull the UTF-16LE units out of an LFN slot, stopping at the 0x0000
/// terminator or 0xFFFF padding
fn decode_lfn_fragment(entry: &[u8]) -> String {
    let mut units = Vec::with_capacity(LFN_CHAR_OFFSETS.len());
    for &offset in &LFN_CHAR_OFFSETS {
        let unit = u16::from_le_bytes([entry[offset], entry[offset + 1]]);
        if unit == 0x0000 || unit == 0xFFFF {
            break;
        }
        units.push(unit);
    }
    String::from_utf16_lossy(&units)
}

/// Sparse ordinal-indexed accumulator for LFN fragments.
///
/// Slots appear on disk in reverse ordinal order; the buffer reassembles
/// them by index and is drained when the owning short entry arrives.
#[derive(Debug, Default)]
pub(crate) struct LongNameBuffer {
    fragments: Vec<Option<String>>,
}

impl LongNameBuffer {
    pub fn is_empty(&self) -> bool {
        self.fragments.iter().all(|f| f.is_none())
    }

    pub fn insert(&mut self, ordinal: u8, fragment: String) {
        if ordinal == 0 {
            return;
        }
        let index = ordinal as usize - 1;
        if index >= self.fragments.len() {
            self.fragments.resize(index + 1, None);
        }
        self.fragments[index] = Some(fragment);
    }

    /// Concatenate fragments in ordinal order and reset
    pub fn take(&mut self) -> String {
        let name = self
            .fragments
            .iter()
            .flatten()
            .cloned()
            .collect::<String>();
        self.clear();
        name
    }

    pub fn clear(&mut self) {
        self.fragments.clear();
    }
}

// =============================================================================
// Test fixture builders (shared with the parser tests)
// =============================================================================
