//! Type definitions for partition table parsing

use serde::Serialize;

use crate::common::binary::clamped_slice;
use crate::error::DecodeError;

/// Sector size assumed when the caller does not supply one
pub const DEFAULT_SECTOR_SIZE: u32 = 512;

/// Which partitioning scheme was detected on the disk buffer
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum TableKind {
    Mbr,
    Gpt,
    Unknown,
}

/// Scheme-specific partition type identifier
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum PartitionTypeCode {
    /// MBR one-byte type code
    Mbr(u8),
    /// GPT type GUID in canonical printed form
    Gpt(String),
}

/// One partition entry, normalized across MBR and GPT
#[derive(Clone, Debug, Serialize)]
pub struct Partition {
    /// 1-based slot (MBR) or entry (GPT) number
    pub index: u32,
    /// Human-readable partition type
    pub type_name: String,
    pub type_code: PartitionTypeCode,
    /// Inclusive LBA range
    pub start_lba: u64,
    pub end_lba: u64,
    pub size_lba: u64,
    pub size_bytes: u64,
    /// MBR boot flag; always false for GPT entries
    pub bootable: bool,
    /// GPT UTF-16LE partition label
    pub name: Option<String>,
    /// GPT unique partition GUID
    pub guid: Option<String>,
    /// Filesystem guess from the type code, when one is known
    pub filesystem: Option<String>,
}

/// Parsed partition table for a whole disk buffer
#[derive(Clone, Debug, Serialize)]
pub struct PartitionTable {
    pub kind: TableKind,
    pub sector_size: u32,
    pub partitions: Vec<Partition>,
    /// GPT disk GUID; absent for MBR disks
    pub disk_guid: Option<String>,
    pub errors: Vec<DecodeError>,
}

impl PartitionTable {
    pub(crate) fn empty(kind: TableKind, sector_size: u32) -> Self {
        Self {
            kind,
            sector_size,
            partitions: Vec::new(),
            disk_guid: None,
            errors: Vec::new(),
        }
    }

    /// Borrow a partition's byte range from the disk buffer, clipped to the
    /// buffer end. Never exceeds `size_lba * sector_size` bytes.
    pub fn partition_data<'a>(&self, disk: &'a [u8], partition: &Partition) -> &'a [u8] {
        let start = partition.start_lba.saturating_mul(self.sector_size as u64);
        clamped_slice(disk, start, partition.size_bytes)
    }
}

// =============================================================================
// Type Tables
// =============================================================================

/// Human-readable name for an MBR partition type code
pub fn mbr_type_name(type_code: u8) -> String {
    let name = match type_code {
        0x00 => "Empty",
        0x01 => "FAT12",
        0x04 => "FAT16 (<32MB)",
        0x05 => "Extended",
        0x06 => "FAT16",
        0x07 => "NTFS/exFAT/HPFS",
        0x0B => "FAT32 (CHS)",
        0x0C => "FAT32 (LBA)",
        0x0E => "FAT16 (LBA)",
        0x0F => "Extended (LBA)",
        0x11 => "Hidden FAT12",
        0x14 => "Hidden FAT16 (<32MB)",
        0x16 => "Hidden FAT16",
        0x17 => "Hidden NTFS",
        0x1B => "Hidden FAT32",
        0x1C => "Hidden FAT32 (LBA)",
        0x1E => "Hidden FAT16 (LBA)",
        0x27 => "Windows Recovery",
        0x42 => "Windows Dynamic",
        0x82 => "Linux Swap",
        0x83 => "Linux",
        0x85 => "Linux Extended",
        0x8E => "Linux LVM",
        0xEE => "GPT Protective MBR",
        0xEF => "EFI System",
        0xFD => "Linux RAID",
        _ => return format!("Unknown (0x{:02X})", type_code),
    };
    name.to_string()
}

/// Filesystem guess for an MBR partition type code
pub fn mbr_filesystem_guess(type_code: u8) -> Option<&'static str> {
    match type_code {
        0x01 | 0x11 => Some("FAT12"),
        0x04 | 0x06 | 0x0E | 0x14 | 0x16 | 0x1E => Some("FAT16"),
        0x0B | 0x0C | 0x1B | 0x1C => Some("FAT32"),
        0x07 | 0x17 => Some("NTFS"),
        0x83 => Some("ext4"),
        0xEF => Some("FAT32"),
        _ => None,
    }
}

/// Recognized GPT partition type GUIDs (canonical lowercase form)
const GPT_TYPE_GUIDS: &[(&str, &str, Option<&str>)] = &[
    ("c12a7328-f81f-11d2-ba4b-00a0c93ec93b", "EFI System", Some("FAT32")),
    ("024dee41-33e7-11d3-9d69-0008c781f39f", "MBR Scheme", None),
    ("e3c9e316-0b5c-4db8-817d-f92df00215ae", "Microsoft Reserved", None),
    ("ebd0a0a2-b9e5-4433-87c0-68b6b72699c7", "Microsoft Basic Data", Some("NTFS")),
    ("de94bba4-06d1-4d40-a16a-bfd50179d6ac", "Windows Recovery", None),
    ("0fc63daf-8483-4772-8e79-3d69d8477de4", "Linux Filesystem", Some("ext4")),
    ("0657fd6d-a4ab-43c4-84e5-0933c84b4f4f", "Linux Swap", None),
    ("e6d6d379-f507-44c2-a23c-238f2a3df928", "Linux LVM", None),
    ("933ac7e1-2eb4-4f13-b844-0e14e2aef915", "Linux Home", None),
    ("48465300-0000-11aa-aa11-00306543ecac", "Apple HFS+", Some("HFS+")),
    ("7c3457ef-0000-11aa-aa11-00306543ecac", "Apple APFS", Some("APFS")),
];

/// Human-readable name and filesystem guess for a GPT type GUID
pub fn gpt_type_name(type_guid: &str) -> (String, Option<&'static str>) {
    for (guid, name, filesystem) in GPT_TYPE_GUIDS {
        if *guid == type_guid {
            return (name.to_string(), *filesystem);
        }
    }
    (format!("Unknown ({})", type_guid), None)
}
