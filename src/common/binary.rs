// Shared binary reading utilities for the image decoders
//
// Provides consistent bounds-checked little-endian reads over byte slices.
// Offsets are carried as u64 by callers and narrowed here, at the slice
// boundary, with explicit truncation errors.

use crate::error::{DecodeError, DecodeResult};

// =============================================================================
// Bounds-Checked Reads
// =============================================================================

/// Read a single byte at `offset`
pub fn read_u8(data: &[u8], offset: usize) -> DecodeResult<u8> {
    data.get(offset)
        .copied()
        .ok_or_else(|| DecodeError::truncated(offset, 1, data.len()))
}

/// Read u16 little-endian at `offset`
pub fn read_u16_le(data: &[u8], offset: usize) -> DecodeResult<u16> {
    let bytes = read_slice(data, offset, 2)?;
    Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
}

/// Read u32 little-endian at `offset`
pub fn read_u32_le(data: &[u8], offset: usize) -> DecodeResult<u32> {
    let bytes = read_slice(data, offset, 4)?;
    Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

/// Read u64 little-endian at `offset`
pub fn read_u64_le(data: &[u8], offset: usize) -> DecodeResult<u64> {
    let bytes = read_slice(data, offset, 8)?;
    Ok(u64::from_le_bytes([
        bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
    ]))
}

/// Borrow `len` bytes starting at `offset`, or fail with `Truncated`
pub fn read_slice(data: &[u8], offset: usize, len: usize) -> DecodeResult<&[u8]> {
    let end = offset
        .checked_add(len)
        .ok_or_else(|| DecodeError::truncated(offset, len, data.len()))?;
    data.get(offset..end)
        .ok_or_else(|| DecodeError::truncated(offset, len, data.len()))
}

/// Borrow up to `len` bytes starting at `offset`, clipped to the buffer end.
/// Returns an empty slice when `offset` is past the end.
pub fn clamped_slice(data: &[u8], offset: u64, len: u64) -> &[u8] {
    let start = (offset.min(data.len() as u64)) as usize;
    let end = (offset.saturating_add(len).min(data.len() as u64)) as usize;
    &data[start..end]
}

// =============================================================================
// String Decoding
// =============================================================================

/// Decode a fixed ASCII field, trimming NULs and surrounding whitespace
pub fn ascii_trimmed(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes)
        .trim_matches(|c: char| c == '\0' || c.is_whitespace())
        .to_string()
}

/// Decode a UTF-16LE field, stopping at the first NUL code unit
pub fn utf16le_trimmed(bytes: &[u8]) -> String {
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|c| u16::from_le_bytes([c[0], c[1]]))
        .take_while(|&u| u != 0)
        .collect();
    String::from_utf16_lossy(&units)
}

// =============================================================================
// Formatting
// =============================================================================

/// Format bytes as lowercase hex
pub fn bytes_to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Format a 16-byte mixed-endian GUID in its canonical printed form.
///
/// Fields 1-3 are little-endian, fields 4-5 are in byte order (UEFI layout).
pub fn format_guid(bytes: &[u8; 16]) -> String {
    format!(
        "{:08x}-{:04x}-{:04x}-{:02x}{:02x}-{:02x}{:02x}{:02x}{:02x}{:02x}{:02x}",
        u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
        u16::from_le_bytes([bytes[4], bytes[5]]),
        u16::from_le_bytes([bytes[6], bytes[7]]),
        bytes[8],
        bytes[9],
        bytes[10],
        bytes[11],
        bytes[12],
        bytes[13],
        bytes[14],
        bytes[15]
    )
}
