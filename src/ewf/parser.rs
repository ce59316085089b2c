//! EWF (Expert Witness Format) container walker
//!
//! Walks the section chain of an E01 segment held in memory, decoding case
//! metadata, volume geometry, and the embedded acquisition hashes, and
//! reconstructing the raw disk from the `sectors`/`data` payloads.
//!
//! The walker is total over untrusted input: a malformed section yields an
//! error entry and an incomplete sub-result, never a panic, and the
//! strictly-monotone offset rule bounds the walk on adversarial chains.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │ Signature (8 bytes) + segment header (5, skipped)   │
//! ├─────────────────────────────────────────────────────┤
//! │ Section chain (descriptor: 76 bytes, then payload)  │
//! │   header/header2  case metadata (zlib, key/value)   │
//! │   volume/disk     chunk count, sector geometry      │
//! │   sectors/data    raw disk payload                  │
//! │   hash/digest     embedded MD5/SHA1                 │
//! │   done            end of segment                    │
//! └─────────────────────────────────────────────────────┘
//! ```

use tracing::{debug, warn};

use crate::common::binary::{ascii_trimmed, bytes_to_hex, clamped_slice, read_u64_le};
use crate::compress::{Decompressor, Zlib, ZLIB_MAGIC};
use crate::error::{DecodeError, DecodeResult};

use super::types::{
    canonical_key, CaseMetadata, EwfImage, HashInfo, SectionDescriptor, VolumeInfo, EWF_SIGNATURE,
    SECTION_DESCRIPTOR_SIZE, SECTION_WALK_START,
};

/// Parse an in-memory EWF segment with the default zlib decompressor
pub fn parse(bytes: &[u8]) -> EwfImage {
    parse_with_decompressor(bytes, &Zlib)
}

/// Parse an in-memory EWF segment with a caller-supplied decompressor.
///
/// Never fails outright: malformed input is reported through
/// [`EwfImage::errors`] next to whatever was decoded before the problem.
pub fn parse_with_decompressor(bytes: &[u8], decompressor: &dyn Decompressor) -> EwfImage {
    let mut image = EwfImage::default();

    if bytes.len() < EWF_SIGNATURE.len() || &bytes[..8] != EWF_SIGNATURE {
        image.errors.push(DecodeError::InvalidSignature(format!(
            "Invalid EWF signature: expected {}, got {}",
            bytes_to_hex(EWF_SIGNATURE),
            bytes_to_hex(&bytes[..bytes.len().min(8)])
        )));
        return image;
    }

    image.valid = true;
    image.signature.copy_from_slice(&bytes[..8]);

    let file_len = bytes.len() as u64;
    let mut disk_chunks: Vec<&[u8]> = Vec::new();
    let mut offset = SECTION_WALK_START;

    while offset.saturating_add(SECTION_DESCRIPTOR_SIZE) <= file_len {
        let desc = offset as usize;

        // type[16], next_offset u64 @+16, size u64 @+24; the trailing
        // Adler-32 checksum is not verified
        let section_type = ascii_trimmed(&bytes[desc..desc + 16]).to_lowercase();
        let next_offset = read_u64_le(bytes, desc + 16).unwrap_or(0);
        let size = read_u64_le(bytes, desc + 24).unwrap_or(0);

        if section_type.is_empty() || size == 0 {
            debug!(offset, "section walk stopped on empty descriptor");
            break;
        }

        let payload_start = offset + SECTION_DESCRIPTOR_SIZE;
        let payload = clamped_slice(bytes, payload_start, size);
        if (payload.len() as u64) < size {
            warn!(
                section = %section_type,
                declared = size,
                actual = payload.len(),
                "section payload clipped to file remainder"
            );
        }

        debug!(section = %section_type, offset, size, next_offset, "section");

        image.sections.push(SectionDescriptor {
            section_type: section_type.clone(),
            next_offset,
            size,
            offset,
            data: payload.to_vec(),
        });

        match section_type.as_str() {
            "header" | "header2" => {
                decode_header_section(payload, decompressor, &mut image.metadata);
            }
            "volume" | "disk" => match decode_volume_section(payload) {
                Ok(volume) => image.volume = Some(volume),
                Err(e) => image.errors.push(DecodeError::MalformedSection {
                    section: section_type.clone(),
                    message: e.to_string(),
                }),
            },
            "sectors" | "data" => disk_chunks.push(payload),
            "hash" | "digest" => match decode_hash_section(payload) {
                Ok(hashes) => image.hashes = Some(hashes),
                Err(e) => image.errors.push(DecodeError::MalformedSection {
                    section: section_type.clone(),
                    message: e.to_string(),
                }),
            },
            "done" => break,
            _ => {}
        }

        // Prefer the chain link when it moves forward; otherwise skip the
        // payload. A non-advancing offset would loop forever.
        let advanced = if next_offset > offset {
            next_offset
        } else {
            payload_start + payload.len() as u64
        };
        if advanced <= offset {
            warn!(offset, advanced, "section chain does not advance, stopping");
            break;
        }
        offset = advanced;
    }

    if !disk_chunks.is_empty() {
        let total: usize = disk_chunks.iter().map(|c| c.len()).sum();
        let mut raw = Vec::with_capacity(total);
        for chunk in disk_chunks {
            raw.extend_from_slice(chunk);
        }
        debug!(bytes = raw.len(), "reconstructed raw disk");
        image.raw_disk = Some(raw);
    }

    image
}

// =============================================================================
// Section Payload Decoders
// =============================================================================

/// Decode a `header`/`header2` payload into the running metadata map.
///
/// The payload is usually zlib-compressed; an inflate failure falls back to
/// the raw bytes. Lines are key/value records split on TAB (or `=` when no
/// TAB is present). Later sections override earlier ones.
fn decode_header_section(
    payload: &[u8],
    decompressor: &dyn Decompressor,
    metadata: &mut CaseMetadata,
) {
    let inflated;
    let text_bytes = if payload.first() == Some(&ZLIB_MAGIC) {
        match decompressor.decompress_zlib(payload) {
            Ok(data) => {
                inflated = data;
                &inflated[..]
            }
            Err(e) => {
                debug!(error = %e, "header inflate failed, using raw payload");
                payload
            }
        }
    } else {
        payload
    };

    let content = String::from_utf8_lossy(text_bytes);
    for line in content.split(['\r', '\n']) {
        if line.trim().is_empty() {
            continue;
        }

        let fields: Vec<&str> = if line.contains('\t') {
            line.split('\t').collect()
        } else {
            line.split('=').collect()
        };
        if fields.len() < 2 {
            continue;
        }

        let key = fields[0].trim().to_lowercase();
        let value = fields[1..].join("=").trim().to_string();
        if key.is_empty() || value.is_empty() {
            continue;
        }

        metadata
            .fields
            .insert(canonical_key(&key).to_string(), value);
    }
}

/// Decode a `volume`/`disk` payload: fixed little-endian fields
fn decode_volume_section(payload: &[u8]) -> DecodeResult<VolumeInfo> {
    use crate::common::binary::{read_u32_le, read_u8};

    if payload.len() < 32 {
        return Err(DecodeError::truncated(0, 32, payload.len()));
    }

    Ok(VolumeInfo {
        media_type: read_u8(payload, 0)?,
        chunk_count: read_u32_le(payload, 4)?,
        sectors_per_chunk: read_u32_le(payload, 8)?,
        bytes_per_sector: read_u32_le(payload, 12)?,
        sector_count: read_u64_le(payload, 16)?,
    })
}

/// Decode a `hash`/`digest` payload: MD5 in the first 16 bytes, SHA1 in the
/// following 20 when present
fn decode_hash_section(payload: &[u8]) -> DecodeResult<HashInfo> {
    if payload.len() < 16 {
        return Err(DecodeError::truncated(0, 16, payload.len()));
    }

    let mut hashes = HashInfo {
        md5: Some(bytes_to_hex(&payload[0..16])),
        sha1: None,
    };
    if payload.len() >= 36 {
        hashes.sha1 = Some(bytes_to_hex(&payload[16..36]));
    }
    Ok(hashes)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::compress::deflate;

    /// Append one section (descriptor + payload) to an image under
    /// construction, returning the descriptor's offset
    pub(crate) fn push_section(
        image: &mut Vec<u8>,
        section_type: &str,
        next_offset: u64,
        size: u64,
        payload: &[u8],
    ) -> u64 {
        let offset = image.len() as u64;
        let mut type_field = [0u8; 16];
        type_field[..section_type.len()].copy_from_slice(section_type.as_bytes());
        image.extend_from_slice(&type_field);
        image.extend_from_slice(&next_offset.to_le_bytes());
        image.extend_from_slice(&size.to_le_bytes());
        image.extend_from_slice(&[0u8; 40]); // padding
        image.extend_from_slice(&[0u8; 4]); // checksum, unverified
        image.extend_from_slice(payload);
        offset
    }

    /// Signature + 5-byte segment header
    pub(crate) fn image_prelude() -> Vec<u8> {
        let mut image = EWF_SIGNATURE.to_vec();
        image.extend_from_slice(&[1, 0, 0, 0, 0]);
        image
    }

    fn volume_payload(
        media_type: u8,
        chunk_count: u32,
        sectors_per_chunk: u32,
        bytes_per_sector: u32,
        sector_count: u64,
    ) -> Vec<u8> {
        let mut payload = vec![0u8; 32];
        payload[0] = media_type;
        payload[4..8].copy_from_slice(&chunk_count.to_le_bytes());
        payload[8..12].copy_from_slice(&sectors_per_chunk.to_le_bytes());
        payload[12..16].copy_from_slice(&bytes_per_sector.to_le_bytes());
        payload[16..24].copy_from_slice(&sector_count.to_le_bytes());
        payload
    }

    #[test]
    fn test_rejects_bad_signature() {
        let image = parse(&[0u8; 512]);
        assert!(!image.valid);
        assert!(image.sections.is_empty());
        assert_eq!(image.errors.len(), 1);
        assert!(image.errors[0].to_string().contains("Invalid EWF signature"));
    }

    #[test]
    fn test_rejects_short_input() {
        let image = parse(b"EVF");
        assert!(!image.valid);
        assert_eq!(image.errors.len(), 1);
    }

    #[test]
    fn test_minimal_done_only_image() {
        let mut bytes = image_prelude();
        push_section(&mut bytes, "done", 0, 76, &[]);

        let image = parse(&bytes);
        assert!(image.valid);
        assert_eq!(image.sections.len(), 1);
        assert_eq!(image.sections[0].section_type, "done");
        assert!(image.metadata.is_empty());
        assert!(image.raw_disk.is_none());
        assert!(image.errors.is_empty());
    }

    #[test]
    fn test_header_alias_resolution() {
        let text = b"c\tACME-1\ne\tJane\nfoo\tbar\n";
        let compressed = deflate(text);

        let mut bytes = image_prelude();
        push_section(&mut bytes, "header", 0, compressed.len() as u64, &compressed);
        push_section(&mut bytes, "done", 0, 76, &[]);

        let image = parse(&bytes);
        assert!(image.valid);
        assert_eq!(image.metadata.case_number(), Some("ACME-1"));
        assert_eq!(image.metadata.examiner_name(), Some("Jane"));
        assert_eq!(image.metadata.get("foo"), Some("bar"));
    }

    #[test]
    fn test_header_equals_fallback_and_overrides() {
        // Uncompressed header using key=value lines; the second header
        // section overrides the first on collision
        let mut bytes = image_prelude();
        push_section(&mut bytes, "header", 0, 10, b"case=ONE\n\n");
        push_section(&mut bytes, "header2", 0, 26, b"c=TWO\nnotes=a=b\nempty=\n\n\n\n");
        push_section(&mut bytes, "done", 0, 76, &[]);

        let image = parse(&bytes);
        assert_eq!(image.metadata.case_number(), Some("TWO"));
        // Values containing '=' are rejoined
        assert_eq!(image.metadata.get("notes"), Some("a=b"));
        // Empty values are dropped
        assert_eq!(image.metadata.get("empty"), None);
    }

    #[test]
    fn test_header_inflate_failure_falls_back_to_raw() {
        // Starts with the zlib magic but is not a valid stream; the line
        // itself still parses as key=value after the fallback
        let mut payload = vec![ZLIB_MAGIC];
        payload.extend_from_slice(b"junk\nc=CASE-9\n");

        let mut bytes = image_prelude();
        push_section(&mut bytes, "header", 0, payload.len() as u64, &payload);
        push_section(&mut bytes, "done", 0, 76, &[]);

        let image = parse(&bytes);
        assert_eq!(image.metadata.case_number(), Some("CASE-9"));
    }

    #[test]
    fn test_volume_and_hash_sections() {
        let mut hash_payload = vec![0xAB; 16];
        hash_payload.extend_from_slice(&[0xCD; 20]);

        let mut bytes = image_prelude();
        push_section(
            &mut bytes,
            "volume",
            0,
            32,
            &volume_payload(0x01, 4, 64, 512, 256),
        );
        push_section(&mut bytes, "hash", 0, 36, &hash_payload);
        push_section(&mut bytes, "done", 0, 76, &[]);

        let image = parse(&bytes);
        let volume = image.volume.expect("volume decoded");
        assert_eq!(volume.media_type, 0x01);
        assert_eq!(volume.chunk_count, 4);
        assert_eq!(volume.sectors_per_chunk, 64);
        assert_eq!(volume.bytes_per_sector, 512);
        assert_eq!(volume.sector_count, 256);

        let hashes = image.hashes.expect("hashes decoded");
        assert_eq!(hashes.md5.as_deref(), Some("ab".repeat(16).as_str()));
        assert_eq!(hashes.sha1.as_deref(), Some("cd".repeat(20).as_str()));
    }

    #[test]
    fn test_malformed_volume_keeps_walking() {
        let mut bytes = image_prelude();
        push_section(&mut bytes, "volume", 0, 8, &[0u8; 8]); // too short
        push_section(&mut bytes, "sectors", 0, 4, &[1, 2, 3, 4]);
        push_section(&mut bytes, "done", 0, 76, &[]);

        let image = parse(&bytes);
        assert!(image.valid);
        assert!(image.volume.is_none());
        assert_eq!(image.raw_disk.as_deref(), Some(&[1u8, 2, 3, 4][..]));
        assert_eq!(image.errors.len(), 1);
        assert!(matches!(
            image.errors[0],
            DecodeError::MalformedSection { .. }
        ));
    }

    #[test]
    fn test_raw_disk_concatenates_in_order() {
        let mut bytes = image_prelude();
        push_section(&mut bytes, "sectors", 0, 3, &[1, 2, 3]);
        push_section(&mut bytes, "data", 0, 2, &[4, 5]);
        push_section(&mut bytes, "done", 0, 76, &[]);

        let image = parse(&bytes);
        assert_eq!(image.raw_disk.as_deref(), Some(&[1u8, 2, 3, 4, 5][..]));

        let payload_total: usize = image
            .sections
            .iter()
            .filter(|s| s.section_type == "sectors" || s.section_type == "data")
            .map(|s| s.data.len())
            .sum();
        assert_eq!(image.raw_disk.as_ref().unwrap().len(), payload_total);
    }

    #[test]
    fn test_section_offsets_strictly_increase() {
        let mut bytes = image_prelude();
        push_section(&mut bytes, "header", 0, 6, b"c=X\n\n\n");
        push_section(&mut bytes, "sectors", 0, 16, &[0u8; 16]);
        push_section(&mut bytes, "done", 0, 76, &[]);

        let image = parse(&bytes);
        for pair in image.sections.windows(2) {
            assert!(pair[0].offset < pair[1].offset);
        }
    }

    #[test]
    fn test_backwards_next_offset_terminates() {
        // Section whose next_offset points at itself; the monotone rule
        // must stop the walk rather than loop
        let mut bytes = image_prelude();
        push_section(&mut bytes, "sectors", SECTION_WALK_START, 4, &[9, 9, 9, 9]);

        let image = parse(&bytes);
        assert!(image.valid);
        // next_offset (13) is not > offset (13), so the walk advances past
        // the payload and then runs out of bytes
        assert_eq!(image.sections.len(), 1);
        assert_eq!(image.raw_disk.as_deref(), Some(&[9u8, 9, 9, 9][..]));
    }

    #[test]
    fn test_payload_clipped_to_file_remainder() {
        let mut bytes = image_prelude();
        push_section(&mut bytes, "sectors", 0, 1024, &[7u8; 10]); // declares more than exists

        let image = parse(&bytes);
        assert_eq!(image.raw_disk.as_deref(), Some(&[7u8; 10][..]));
    }

    #[test]
    fn test_reparse_is_structurally_equal() {
        let mut bytes = image_prelude();
        push_section(&mut bytes, "header", 0, 8, b"c=SAME\n\n");
        push_section(&mut bytes, "sectors", 0, 4, &[1, 2, 3, 4]);
        push_section(&mut bytes, "done", 0, 76, &[]);

        let first = parse(&bytes);
        let second = parse(&bytes);
        assert_eq!(
            serde_json::to_value(&first).unwrap(),
            serde_json::to_value(&second).unwrap()
        );
    }
}
