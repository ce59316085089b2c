//! Partition table detection and parsing
//!
//! Looks for an MBR on the reconstructed disk first and escalates to GPT
//! when a protective entry (type 0xEE) is present, or when no MBR boot
//! signature exists but a GPT header does. Disks matching neither scheme
//! come back as [`TableKind::Unknown`].

mod gpt;
mod mbr;
mod types;

pub use types::{
    gpt_type_name, mbr_filesystem_guess, mbr_type_name, Partition, PartitionTable,
    PartitionTypeCode, TableKind, DEFAULT_SECTOR_SIZE,
};

use tracing::debug;

use crate::error::DecodeError;

/// Parse the partition table with the default 512-byte sector size
pub fn parse(disk: &[u8]) -> PartitionTable {
    parse_with_sector_size(disk, DEFAULT_SECTOR_SIZE)
}

/// Parse the partition table on a raw disk buffer. Pure; never panics.
pub fn parse_with_sector_size(disk: &[u8], sector_size: u32) -> PartitionTable {
    if mbr::has_boot_signature(disk) {
        if mbr::has_protective_entry(disk) {
            debug!("protective MBR entry found, escalating to GPT");
            return gpt::parse(disk, sector_size);
        }
        return mbr::parse(disk, sector_size);
    }

    // No MBR; some disks carry a bare GPT header
    if gpt::has_gpt_signature(disk, sector_size) {
        debug!("no MBR boot signature, parsing bare GPT");
        return gpt::parse(disk, sector_size);
    }

    let mut table = PartitionTable::empty(TableKind::Unknown, sector_size);
    table.errors.push(DecodeError::UnknownPartitionScheme);
    table
}
