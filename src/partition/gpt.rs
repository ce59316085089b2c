//! GPT (GUID Partition Table) parsing
//!
//! The GPT header lives at LBA 1; partition entries are read from the
//! location it declares, capped at 128 entries. Header and entry CRCs are
//! not verified.

use tracing::{debug, warn};

use crate::common::binary::{format_guid, read_slice, read_u32_le, read_u64_le, utf16le_trimmed};
use crate::error::DecodeError;

use super::types::{gpt_type_name, Partition, PartitionTable, PartitionTypeCode, TableKind};

const GPT_SIGNATURE: &[u8; 8] = b"EFI PART";
const GPT_HEADER_SIZE: usize = 92;
const MAX_PARTITION_ENTRIES: u32 = 128;

/// True when a GPT header signature is present at LBA 1
pub(crate) fn has_gpt_signature(disk: &[u8], sector_size: u32) -> bool {
    let offset = sector_size as usize;
    disk.len() >= offset + GPT_SIGNATURE.len() && &disk[offset..offset + 8] == GPT_SIGNATURE
}

/// Parse the GPT header and its partition entry array.
///
/// Returns a table of kind `Unknown` with an error entry when the header
/// signature is missing or the header does not fit the buffer.
pub(crate) fn parse(disk: &[u8], sector_size: u32) -> PartitionTable {
    let header_offset = sector_size as usize;

    let header = match read_slice(disk, header_offset, GPT_HEADER_SIZE) {
        Ok(header) => header,
        Err(e) => {
            let mut table = PartitionTable::empty(TableKind::Unknown, sector_size);
            table.errors.push(e);
            return table;
        }
    };

    if &header[..8] != GPT_SIGNATURE {
        let mut table = PartitionTable::empty(TableKind::Unknown, sector_size);
        table.errors.push(DecodeError::InvalidSignature(
            "Invalid GPT signature: expected \"EFI PART\" at LBA 1".to_string(),
        ));
        return table;
    }

    let mut table = PartitionTable::empty(TableKind::Gpt, sector_size);

    let mut disk_guid = [0u8; 16];
    disk_guid.copy_from_slice(&header[56..72]);
    table.disk_guid = Some(format_guid(&disk_guid));

    let partition_entry_lba = read_u64_le(header, 72).unwrap_or(0);
    let num_partition_entries = read_u32_le(header, 80).unwrap_or(0);
    let partition_entry_size = read_u32_le(header, 84).unwrap_or(0);

    debug!(
        partition_entry_lba,
        num_partition_entries, partition_entry_size, "GPT header"
    );

    if partition_entry_size == 0 {
        table.errors.push(DecodeError::MalformedSection {
            section: "gpt".to_string(),
            message: "partition entry size is zero".to_string(),
        });
        return table;
    }

    let array_start = partition_entry_lba.saturating_mul(sector_size as u64);
    let entry_count = num_partition_entries.min(MAX_PARTITION_ENTRIES);

    for index in 0..entry_count {
        let offset = array_start + index as u64 * partition_entry_size as u64;
        let Some(entry) = entry_slice(disk, offset, partition_entry_size as usize) else {
            warn!(index, offset, "partition entry array truncated");
            break;
        };

        if let Some(partition) = parse_entry(entry, index + 1, sector_size) {
            table.partitions.push(partition);
        }
    }

    table
}

fn entry_slice(disk: &[u8], offset: u64, len: usize) -> Option<&[u8]> {
    if offset > usize::MAX as u64 {
        return None;
    }
    read_slice(disk, offset as usize, len).ok()
}

/// Decode one 128-byte partition entry; zero type GUIDs mark unused slots
fn parse_entry(entry: &[u8], index: u32, sector_size: u32) -> Option<Partition> {
    if entry.len() < 128 {
        return None;
    }

    let mut type_guid = [0u8; 16];
    type_guid.copy_from_slice(&entry[0..16]);
    if type_guid == [0u8; 16] {
        return None;
    }

    let mut partition_guid = [0u8; 16];
    partition_guid.copy_from_slice(&entry[16..32]);

    let start_lba = read_u64_le(entry, 32).ok()?;
    let end_lba = read_u64_le(entry, 40).ok()?;
    let size_lba = end_lba.saturating_sub(start_lba) + 1;

    let name = utf16le_trimmed(&entry[56..128]);

    let type_guid_text = format_guid(&type_guid);
    let (type_name, filesystem) = gpt_type_name(&type_guid_text);

    Some(Partition {
        index,
        type_name,
        type_code: PartitionTypeCode::Gpt(type_guid_text),
        start_lba,
        end_lba,
        size_lba,
        size_bytes: size_lba.saturating_mul(sector_size as u64),
        bootable: false,
        name: (!name.is_empty()).then_some(name),
        guid: Some(format_guid(&partition_guid)),
        filesystem: filesystem.map(str::to_string),
    })
}
