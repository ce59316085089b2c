//! End-to-end pipeline tests over synthetic E01 images
//!
//! Builds a complete in-memory evidence file (EWF container wrapping an
//! MBR-partitioned disk with a FAT12 filesystem) and drives the full
//! decode chain through `analyze`.

use std::io::Write;

use flate2::write::ZlibEncoder;
use flate2::Compression;
use sha1::{Digest, Sha1};

use ewfprobe::fat::FatVariant;
use ewfprobe::partition::{PartitionTypeCode, TableKind};
use ewfprobe::{analyze, ewf};

// =============================================================================
// Image builders
// =============================================================================

fn deflate(data: &[u8]) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

fn push_section(image: &mut Vec<u8>, section_type: &str, payload: &[u8]) {
    let mut type_field = [0u8; 16];
    type_field[..section_type.len()].copy_from_slice(section_type.as_bytes());
    image.extend_from_slice(&type_field);
    image.extend_from_slice(&0u64.to_le_bytes()); // next_offset: advance by size
    // The walk stops on size == 0, so payload-less sections declare the
    // descriptor length instead
    let size = if payload.is_empty() { 76 } else { payload.len() as u64 };
    image.extend_from_slice(&size.to_le_bytes());
    image.extend_from_slice(&[0u8; 44]); // padding + checksum
    image.extend_from_slice(payload);
}

/// Wrap a raw disk in a minimal single-segment EWF container
fn wrap_in_ewf(disk: &[u8], header_text: &str) -> Vec<u8> {
    let mut image = ewf::EWF_SIGNATURE.to_vec();
    image.extend_from_slice(&[1, 0, 0, 0, 0]); // segment header, uninterpreted

    push_section(&mut image, "header", &deflate(header_text.as_bytes()));

    let mut volume = vec![0u8; 32];
    volume[0] = 0x01; // fixed disk
    volume[4..8].copy_from_slice(&1u32.to_le_bytes()); // chunk count
    volume[8..12].copy_from_slice(&64u32.to_le_bytes()); // sectors per chunk
    volume[12..16].copy_from_slice(&512u32.to_le_bytes());
    volume[16..24].copy_from_slice(&(disk.len() as u64 / 512).to_le_bytes());
    push_section(&mut image, "volume", &volume);

    // Split the payload across two sections to exercise reassembly
    let mid = disk.len() / 2;
    push_section(&mut image, "sectors", &disk[..mid]);
    push_section(&mut image, "sectors", &disk[mid..]);

    let mut hashes = md5::compute(disk).0.to_vec();
    let mut sha1 = Sha1::new();
    sha1.update(disk);
    hashes.extend_from_slice(&sha1.finalize());
    push_section(&mut image, "hash", &hashes);

    push_section(&mut image, "done", &[]);
    image
}

fn short_entry(name: &str, ext: &str, attributes: u8, cluster: u32, size: u32) -> [u8; 32] {
    let mut entry = [0u8; 32];
    entry[0..8].copy_from_slice(b"        ");
    entry[0..name.len()].copy_from_slice(name.as_bytes());
    entry[8..11].copy_from_slice(b"   ");
    entry[8..8 + ext.len()].copy_from_slice(ext.as_bytes());
    entry[11] = attributes;
    entry[20..22].copy_from_slice(&((cluster >> 16) as u16).to_le_bytes());
    entry[26..28].copy_from_slice(&(cluster as u16).to_le_bytes());
    entry[28..32].copy_from_slice(&size.to_le_bytes());
    entry
}

fn lfn_entry(ordinal: u8, last: bool, fragment: &str) -> [u8; 32] {
    const OFFSETS: [usize; 13] = [1, 3, 5, 7, 9, 14, 16, 18, 20, 22, 24, 28, 30];
    let mut entry = [0u8; 32];
    entry[0] = if last { ordinal | 0x40 } else { ordinal };
    entry[11] = 0x0F;
    let units: Vec<u16> = fragment.encode_utf16().collect();
    for (i, &offset) in OFFSETS.iter().enumerate() {
        let unit = match units.len() {
            n if i < n => units[i],
            n if i == n => 0x0000,
            _ => 0xFFFF,
        };
        entry[offset..offset + 2].copy_from_slice(&unit.to_le_bytes());
    }
    entry
}

/// FAT12 partition: 1 reserved sector, 1 FAT sector, 1 root sector, data
/// clusters from sector 3. Contains /hello.txt and /SUB/inner.txt.
fn build_fat12_partition(total_sectors: u16) -> Vec<u8> {
    let mut p = vec![0u8; total_sectors as usize * 512];
    p[11..13].copy_from_slice(&512u16.to_le_bytes());
    p[13] = 1; // sectors per cluster
    p[14..16].copy_from_slice(&1u16.to_le_bytes()); // reserved
    p[16] = 1; // FAT count
    p[17..19].copy_from_slice(&16u16.to_le_bytes()); // root entries
    p[19..21].copy_from_slice(&total_sectors.to_le_bytes());
    p[22..24].copy_from_slice(&1u16.to_le_bytes()); // sectors per FAT
    p[43..54].copy_from_slice(b"EVIDENCE   ");
    p[54..62].copy_from_slice(b"FAT12   ");
    p[510] = 0x55;
    p[511] = 0xAA;

    // FAT: clusters 2, 3, 4 all end-of-chain
    set_fat12(&mut p, 2, 0xFFF);
    set_fat12(&mut p, 3, 0xFFF);
    set_fat12(&mut p, 4, 0xFFF);

    // Root directory at sector 2
    let root = 1024;
    p[root..root + 32].copy_from_slice(&lfn_entry(1, true, "hello.txt"));
    p[root + 32..root + 64].copy_from_slice(&short_entry("HELLO~1", "TXT", 0x20, 2, 12));
    p[root + 64..root + 96].copy_from_slice(&short_entry("SUB", "", 0x10, 3, 0));

    // Cluster 2: file content
    let c2 = 3 * 512;
    p[c2..c2 + 12].copy_from_slice(b"hello world\n");

    // Cluster 3: the SUB directory
    let c3 = 4 * 512;
    p[c3..c3 + 32].copy_from_slice(&short_entry(".", "", 0x10, 3, 0));
    p[c3 + 32..c3 + 64].copy_from_slice(&short_entry("..", "", 0x10, 0, 0));
    p[c3 + 64..c3 + 96].copy_from_slice(&short_entry("INNER~1", "TXT", 0x20, 4, 5));

    // Cluster 4: inner file content
    let c4 = 5 * 512;
    p[c4..c4 + 5].copy_from_slice(b"inner");

    p
}

fn set_fat12(partition: &mut [u8], cluster: u32, value: u16) {
    let offset = 512 + cluster as usize + cluster as usize / 2;
    let existing = u16::from_le_bytes([partition[offset], partition[offset + 1]]);
    let merged = if cluster % 2 == 0 {
        (existing & 0xF000) | (value & 0x0FFF)
    } else {
        (existing & 0x000F) | (value << 4)
    };
    partition[offset..offset + 2].copy_from_slice(&merged.to_le_bytes());
}

/// MBR disk with one FAT12 partition at LBA 1
fn build_disk() -> Vec<u8> {
    let partition = build_fat12_partition(63);
    let mut disk = vec![0u8; 512];
    disk[446] = 0x80; // bootable
    disk[446 + 4] = 0x01; // FAT12
    disk[446 + 8..446 + 12].copy_from_slice(&1u32.to_le_bytes());
    disk[446 + 12..446 + 16].copy_from_slice(&63u32.to_le_bytes());
    disk[510] = 0x55;
    disk[511] = 0xAA;
    disk.extend_from_slice(&partition);
    disk
}

// =============================================================================
// Tests
// =============================================================================

#[test]
fn full_chain_decodes_files_from_e01() {
    let disk = build_disk();
    let image = wrap_in_ewf(&disk, "c\tCASE-42\ne\tRivera\nos\tLinux\n");

    let analysis = analyze(&image);

    // Stage 1: container
    assert!(analysis.ewf.valid);
    assert!(analysis.ewf.errors.is_empty());
    assert_eq!(analysis.ewf.metadata.case_number(), Some("CASE-42"));
    assert_eq!(analysis.ewf.metadata.examiner_name(), Some("Rivera"));
    assert_eq!(analysis.ewf.metadata.get("operating_system"), Some("Linux"));
    assert_eq!(analysis.ewf.raw_disk.as_deref(), Some(&disk[..]));

    let volume = analysis.ewf.volume.unwrap();
    assert_eq!(volume.bytes_per_sector, 512);
    assert_eq!(volume.sector_count, disk.len() as u64 / 512);
    assert_eq!(volume.media_type_name(), "Fixed Disk");

    // Stage 2: partitions
    let table = analysis.partition_table.as_ref().unwrap();
    assert_eq!(table.kind, TableKind::Mbr);
    assert_eq!(table.partitions.len(), 1);
    let p = &table.partitions[0];
    assert!(p.bootable);
    assert_eq!(p.type_code, PartitionTypeCode::Mbr(0x01));
    assert_eq!(p.start_lba, 1);
    assert_eq!(p.end_lba, 63);
    assert_eq!(p.size_bytes, 63 * 512);
    assert_eq!(p.filesystem.as_deref(), Some("FAT12"));

    // Stage 3: filesystem
    assert_eq!(analysis.filesystems.len(), 1);
    let fs = &analysis.filesystems[0].filesystem;
    assert!(fs.valid);
    assert_eq!(fs.variant, Some(FatVariant::Fat12));
    assert_eq!(fs.boot_sector.as_ref().unwrap().volume_label, "EVIDENCE");

    assert_eq!(fs.entries.len(), 2);
    assert_eq!(fs.entries[0].name, "hello.txt");
    assert_eq!(fs.entries[0].short_name, "HELLO~1");
    assert_eq!(fs.entries[0].size, 12);
    assert_eq!(fs.entries[0].path, "/hello.txt");

    let sub = &fs.entries[1];
    assert!(sub.is_directory);
    let children = sub.children.as_ref().unwrap();
    assert_eq!(children.len(), 1);
    assert_eq!(children[0].name, "INNER~1.TXT");
    assert_eq!(children[0].path, "/SUB/INNER~1.TXT");

    let paths: Vec<&str> = fs.all_files().iter().map(|e| e.path.as_str()).collect();
    assert_eq!(paths, vec!["/hello.txt", "/SUB", "/SUB/INNER~1.TXT"]);
}

#[test]
fn stored_hashes_match_reconstructed_disk() {
    let disk = build_disk();
    let image = wrap_in_ewf(&disk, "c\tCASE-42\n");

    let parsed = ewf::parse(&image);
    let results = ewf::verify_stored_hashes(&parsed);
    assert_eq!(results.len(), 2);
    assert!(results.iter().all(|r| r.matches), "{results:?}");
}

#[test]
fn gpt_disk_inside_e01() {
    // Protective MBR + GPT header; the partition decoder must escalate
    let mut disk = vec![0u8; 512 * 40];
    disk[446 + 4] = 0xEE;
    disk[446 + 8..446 + 12].copy_from_slice(&1u32.to_le_bytes());
    disk[446 + 12..446 + 16].copy_from_slice(&0xFFFF_FFFFu32.to_le_bytes());
    disk[510] = 0x55;
    disk[511] = 0xAA;

    disk[512..520].copy_from_slice(b"EFI PART");
    disk[512 + 56..512 + 72].copy_from_slice(&[0xBB; 16]);
    disk[512 + 72..512 + 80].copy_from_slice(&2u64.to_le_bytes());
    disk[512 + 80..512 + 84].copy_from_slice(&128u32.to_le_bytes());
    disk[512 + 84..512 + 88].copy_from_slice(&128u32.to_le_bytes());

    let image = wrap_in_ewf(&disk, "c\tGPT-CASE\n");
    let analysis = analyze(&image);

    let table = analysis.partition_table.as_ref().unwrap();
    assert_eq!(table.kind, TableKind::Gpt);
    assert_eq!(
        table.disk_guid.as_deref(),
        Some("bbbbbbbb-bbbb-bbbb-bbbb-bbbbbbbbbbbb")
    );
}

#[test]
fn non_ewf_input_stops_at_stage_one() {
    let analysis = analyze(&vec![0u8; 512]);
    assert!(!analysis.ewf.valid);
    assert_eq!(analysis.ewf.errors.len(), 1);
    assert!(analysis.ewf.errors[0]
        .to_string()
        .contains("Invalid EWF signature"));
    assert!(analysis.partition_table.is_none());
    assert!(analysis.filesystems.is_empty());
}

#[test]
fn repeated_analysis_is_structurally_equal() {
    let disk = build_disk();
    let image = wrap_in_ewf(&disk, "c\tCASE-42\n");

    let first = serde_json::to_value(analyze(&image)).unwrap();
    let second = serde_json::to_value(analyze(&image)).unwrap();
    assert_eq!(first, second);
}
