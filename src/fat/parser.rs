//! FAT12/16/32 filesystem walker
//!
//! Decodes the boot sector of a partition byte slice, determines the FAT
//! variant from the cluster count, and recursively builds the root
//! directory listing by following cluster chains.
//!
//! Traversal is bounded on hostile input: chains stop after 10,000
//! clusters, directory recursion stops at depth 10, and any cluster whose
//! byte range falls outside the partition is skipped rather than fatal.

use tracing::{debug, warn};

use crate::common::binary::{ascii_trimmed, clamped_slice, read_u16_le, read_u32_le};
use crate::error::DecodeError;

use super::dir_entry::{self, DirEntry, LongNameBuffer};
use super::types::{
    BootSector, FatEntry, FatResult, FatVariant, DIR_ENTRY_SIZE, MAX_CLUSTER_CHAIN,
    MAX_DIRECTORY_DEPTH,
};

const BOOT_SECTOR_SIZE: usize = 512;

/// Parse a FAT partition byte slice. Pure; bounded work.
pub fn parse(partition: &[u8]) -> FatResult {
    let mut result = FatResult::default();

    if partition.len() < BOOT_SECTOR_SIZE
        || partition[510] != 0x55
        || partition[511] != 0xAA
    {
        result.errors.push(DecodeError::InvalidSignature(
            "Invalid FAT boot sector: missing 0x55AA signature".to_string(),
        ));
        return result;
    }

    let boot_sector = decode_boot_sector(partition);
    if boot_sector.bytes_per_sector == 0 || boot_sector.sectors_per_cluster == 0 {
        result.errors.push(DecodeError::UnsupportedFilesystem(format!(
            "boot sector geometry is not FAT ({} bytes/sector, {} sectors/cluster)",
            boot_sector.bytes_per_sector, boot_sector.sectors_per_cluster
        )));
        result.boot_sector = Some(boot_sector);
        return result;
    }

    let variant = determine_variant(&boot_sector);
    debug!(
        variant = variant.name(),
        bytes_per_sector = boot_sector.bytes_per_sector,
        sectors_per_cluster = boot_sector.sectors_per_cluster,
        total_sectors = boot_sector.total_sectors,
        "FAT boot sector"
    );

    result.valid = true;
    result.variant = Some(variant);

    let bytes_per_sector = boot_sector.bytes_per_sector as u64;
    let fat_offset = boot_sector.reserved_sectors as u64 * bytes_per_sector;
    let fat_len = boot_sector.sectors_per_fat as u64 * bytes_per_sector;

    if fat_offset.saturating_add(fat_len) > partition.len() as u64 {
        result.errors.push(DecodeError::Truncated {
            offset: fat_offset,
            needed: fat_len,
            available: partition.len() as u64,
        });
        result.boot_sector = Some(boot_sector);
        return result;
    }
    let fat = &partition[fat_offset as usize..(fat_offset + fat_len) as usize];

    let root_dir_sectors = root_dir_sectors(&boot_sector);
    let walker = FatWalker {
        partition,
        fat,
        variant,
        bytes_per_sector,
        sectors_per_cluster: boot_sector.sectors_per_cluster as u64,
        first_data_sector: boot_sector.reserved_sectors as u64
            + boot_sector.num_fats as u64 * boot_sector.sectors_per_fat as u64
            + root_dir_sectors,
    };

    let root_bytes = match variant {
        FatVariant::Fat32 => walker.read_cluster_chain(boot_sector.root_cluster),
        FatVariant::Fat12 | FatVariant::Fat16 => {
            let offset = (boot_sector.reserved_sectors as u64
                + boot_sector.num_fats as u64 * boot_sector.sectors_per_fat as u64)
                * bytes_per_sector;
            let len = boot_sector.root_entry_count as u64 * DIR_ENTRY_SIZE as u64;
            clamped_slice(partition, offset, len).to_vec()
        }
    };

    result.entries = walker.decode_directory(&root_bytes, "", 0);
    result.boot_sector = Some(boot_sector);
    result
}

// =============================================================================
// Boot Sector
// =============================================================================

/// Decode the BPB fields; the caller has verified the 512-byte minimum
fn decode_boot_sector(partition: &[u8]) -> BootSector {
    let bytes_per_sector = u16::from_le_bytes([partition[11], partition[12]]);
    let sectors_per_cluster = partition[13];
    let reserved_sectors = u16::from_le_bytes([partition[14], partition[15]]);
    let num_fats = partition[16];
    let root_entry_count = u16::from_le_bytes([partition[17], partition[18]]);

    let total_sectors_16 = u16::from_le_bytes([partition[19], partition[20]]);
    let total_sectors = if total_sectors_16 == 0 {
        u32::from_le_bytes([partition[32], partition[33], partition[34], partition[35]])
    } else {
        total_sectors_16 as u32
    };

    let sectors_per_fat_16 = u16::from_le_bytes([partition[22], partition[23]]);
    if sectors_per_fat_16 == 0 {
        // FAT32 BPB layout
        BootSector {
            bytes_per_sector,
            sectors_per_cluster,
            reserved_sectors,
            num_fats,
            root_entry_count,
            total_sectors,
            sectors_per_fat: u32::from_le_bytes([
                partition[36],
                partition[37],
                partition[38],
                partition[39],
            ]),
            root_cluster: u32::from_le_bytes([
                partition[44],
                partition[45],
                partition[46],
                partition[47],
            ]),
            volume_label: ascii_trimmed(&partition[71..82]),
            fs_type: ascii_trimmed(&partition[82..90]),
        }
    } else {
        BootSector {
            bytes_per_sector,
            sectors_per_cluster,
            reserved_sectors,
            num_fats,
            root_entry_count,
            total_sectors,
            sectors_per_fat: sectors_per_fat_16 as u32,
            root_cluster: 0,
            volume_label: ascii_trimmed(&partition[43..54]),
            fs_type: ascii_trimmed(&partition[54..62]),
        }
    }
}

fn root_dir_sectors(boot_sector: &BootSector) -> u64 {
    let bytes_per_sector = boot_sector.bytes_per_sector as u64;
    (boot_sector.root_entry_count as u64 * DIR_ENTRY_SIZE as u64 + bytes_per_sector - 1)
        / bytes_per_sector
}

/// Variant is decided purely by cluster count (Microsoft's rule)
fn determine_variant(boot_sector: &BootSector) -> FatVariant {
    let overhead = boot_sector.reserved_sectors as u64
        + boot_sector.num_fats as u64 * boot_sector.sectors_per_fat as u64
        + root_dir_sectors(boot_sector);
    let data_sectors = (boot_sector.total_sectors as u64).saturating_sub(overhead);
    let cluster_count = data_sectors / boot_sector.sectors_per_cluster as u64;

    if cluster_count < 4085 {
        FatVariant::Fat12
    } else if cluster_count < 65525 {
        FatVariant::Fat16
    } else {
        FatVariant::Fat32
    }
}

// =============================================================================
// FAT Lookup
// =============================================================================

/// Raw FAT entry value for `cluster`; `None` when the read falls outside
/// the table
pub(crate) fn fat_entry_value(fat: &[u8], variant: FatVariant, cluster: u32) -> Option<u32> {
    match variant {
        FatVariant::Fat32 => read_u32_le(fat, cluster as usize * 4)
            .ok()
            .map(|v| v & 0x0FFF_FFFF),
        FatVariant::Fat16 => read_u16_le(fat, cluster as usize * 2).ok().map(u32::from),
        FatVariant::Fat12 => {
            // Entries are 12 bits packed two-per-three-bytes
            let offset = cluster as usize + cluster as usize / 2;
            let value = read_u16_le(fat, offset).ok()?;
            Some(if cluster % 2 == 0 {
                (value & 0x0FFF) as u32
            } else {
                (value >> 4) as u32
            })
        }
    }
}

fn is_end_of_chain(variant: FatVariant, value: u32) -> bool {
    match variant {
        FatVariant::Fat32 => value >= 0x0FFF_FFF8,
        FatVariant::Fat16 => value >= 0xFFF8,
        FatVariant::Fat12 => value >= 0xFF8,
    }
}

// =============================================================================
// Traversal
// =============================================================================

struct FatWalker<'a> {
    partition: &'a [u8],
    fat: &'a [u8],
    variant: FatVariant,
    bytes_per_sector: u64,
    sectors_per_cluster: u64,
    first_data_sector: u64,
}

impl FatWalker<'_> {
    /// Next cluster in the chain, or `None` at end-of-chain / out of table
    fn next_cluster(&self, cluster: u32) -> Option<u32> {
        let value = fat_entry_value(self.fat, self.variant, cluster)?;
        if is_end_of_chain(self.variant, value) {
            None
        } else {
            Some(value)
        }
    }

    /// Byte range of a data cluster; `None` when it falls outside the
    /// partition (skipped, not fatal)
    fn cluster_bytes(&self, cluster: u32) -> Option<&[u8]> {
        let sector = self.first_data_sector + (cluster as u64 - 2) * self.sectors_per_cluster;
        let start = sector * self.bytes_per_sector;
        let len = self.sectors_per_cluster * self.bytes_per_sector;
        let end = start.checked_add(len)?;
        if end > self.partition.len() as u64 {
            return None;
        }
        Some(&self.partition[start as usize..end as usize])
    }

    /// Concatenate a cluster chain's payload, bounded by the step cap
    fn read_cluster_chain(&self, start_cluster: u32) -> Vec<u8> {
        let mut data = Vec::new();
        let mut cluster = start_cluster;
        let mut steps = 0usize;

        while cluster >= 2 && steps < MAX_CLUSTER_CHAIN {
            if let Some(bytes) = self.cluster_bytes(cluster) {
                data.extend_from_slice(bytes);
            }
            steps += 1;
            match self.next_cluster(cluster) {
                Some(next) => cluster = next,
                None => break,
            }
        }

        if steps >= MAX_CLUSTER_CHAIN {
            warn!(start_cluster, "cluster chain guard fired");
        }
        data
    }

    /// Decode a directory region into entries, recursing into
    /// subdirectories up to the depth cap
    fn decode_directory(&self, bytes: &[u8], parent_path: &str, depth: usize) -> Vec<FatEntry> {
        let mut entries = Vec::new();
        let mut long_name = LongNameBuffer::default();

        for chunk in bytes.chunks_exact(DIR_ENTRY_SIZE) {
            let short = match dir_entry::decode(chunk) {
                DirEntry::Terminator => break,
                DirEntry::Deleted | DirEntry::VolumeLabel => continue,
                DirEntry::LongName { ordinal, fragment } => {
                    long_name.insert(ordinal, fragment);
                    continue;
                }
                DirEntry::Short(short) => short,
            };

            if short.is_dot() {
                long_name.clear();
                continue;
            }

            let name = if !long_name.is_empty() {
                long_name.take()
            } else if !short.extension.is_empty() {
                format!("{}.{}", short.short_name, short.extension)
            } else {
                short.short_name.clone()
            };
            long_name.clear();

            let path = format!("{}/{}", parent_path, name);
            let children = if short.is_directory {
                if depth < MAX_DIRECTORY_DEPTH && short.cluster >= 2 {
                    let dir_bytes = self.read_cluster_chain(short.cluster);
                    Some(self.decode_directory(&dir_bytes, &path, depth + 1))
                } else {
                    Some(Vec::new())
                }
            } else {
                None
            };

            entries.push(FatEntry {
                name,
                short_name: short.short_name,
                extension: short.extension,
                is_directory: short.is_directory,
                is_hidden: short.is_hidden,
                is_system: short.is_system,
                size: if short.is_directory { 0 } else { short.size },
                cluster: short.cluster,
                children,
                path,
            });
        }

        entries
    }
}
