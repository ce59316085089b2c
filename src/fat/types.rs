//! Type definitions for FAT filesystem parsing

use serde::Serialize;

use crate::error::DecodeError;

/// Directory entries are fixed 32-byte records
pub const DIR_ENTRY_SIZE: usize = 32;

/// Upper bound on clusters visited while following one chain. Corrupt or
/// crafted tables can contain cycles; the walk never detects them, it just
/// stops here.
pub const MAX_CLUSTER_CHAIN: usize = 10_000;

/// Upper bound on directory nesting. Deeper trees get empty children.
pub const MAX_DIRECTORY_DEPTH: usize = 10;

/// FAT family variant, decided by cluster count
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum FatVariant {
    Fat12,
    Fat16,
    Fat32,
}

impl FatVariant {
    pub fn name(&self) -> &'static str {
        match self {
            FatVariant::Fat12 => "FAT12",
            FatVariant::Fat16 => "FAT16",
            FatVariant::Fat32 => "FAT32",
        }
    }
}

/// Decoded BPB (BIOS parameter block) fields
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct BootSector {
    pub bytes_per_sector: u16,
    pub sectors_per_cluster: u8,
    pub reserved_sectors: u16,
    pub num_fats: u8,
    /// FAT12/16 fixed root directory entry count; 0 on FAT32
    pub root_entry_count: u16,
    pub total_sectors: u32,
    pub sectors_per_fat: u32,
    /// First cluster of the root directory; FAT32 only, else 0
    pub root_cluster: u32,
    pub volume_label: String,
    pub fs_type: String,
}

/// One file or directory in the listing
#[derive(Clone, Debug, Serialize)]
pub struct FatEntry {
    /// Resolved name: long name when present, else `SHORT.EXT`
    pub name: String,
    pub short_name: String,
    pub extension: String,
    pub is_directory: bool,
    pub is_hidden: bool,
    pub is_system: bool,
    /// File size in bytes; 0 for directories
    pub size: u32,
    /// First cluster of the entry's data
    pub cluster: u32,
    /// Present only on directories
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<FatEntry>>,
    /// Slash-joined path from the filesystem root
    pub path: String,
}

/// Parse result for one FAT partition.
///
/// `valid` means the boot sector carried the 0x55AA signature and sane
/// geometry; traversal problems downgrade to an empty listing plus an
/// error entry, never to `valid = false`.
#[derive(Clone, Debug, Default, Serialize)]
pub struct FatResult {
    pub valid: bool,
    pub variant: Option<FatVariant>,
    pub boot_sector: Option<BootSector>,
    /// Recursive root directory listing
    pub entries: Vec<FatEntry>,
    pub errors: Vec<DecodeError>,
}

impl FatResult {
    /// Flatten the recursive tree into `(path, entry)` pairs, depth-first
    pub fn all_files(&self) -> Vec<&FatEntry> {
        fn walk<'a>(entries: &'a [FatEntry], out: &mut Vec<&'a FatEntry>) {
            for entry in entries {
                out.push(entry);
                if let Some(children) = &entry.children {
                    walk(children, out);
                }
            }
        }

        let mut out = Vec::new();
        walk(&self.entries, &mut out);
        out
    }
}
