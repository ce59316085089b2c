//! zlib decompression boundary
//!
//! EWF `header`/`header2` payloads are usually zlib-compressed. The decoder
//! only needs an inflate capability, so it is kept behind a trait: the
//! default implementation wraps `flate2`, and [`Passthrough`] returns the
//! payload unchanged for callers that feed pre-inflated data. Either way an
//! inflate failure is non-fatal; the decoder falls back to the raw payload.

use std::io::Read;

use flate2::read::ZlibDecoder;

use crate::error::{DecodeError, DecodeResult};

/// First byte of a zlib stream (deflate, any window size)
pub(crate) const ZLIB_MAGIC: u8 = 0x78;

/// Pluggable inflate capability used for EWF header payloads
pub trait Decompressor {
    fn decompress_zlib(&self, data: &[u8]) -> DecodeResult<Vec<u8>>;
}

/// Default decompressor backed by `flate2`
#[derive(Debug, Default, Clone, Copy)]
pub struct Zlib;

impl Decompressor for Zlib {
    fn decompress_zlib(&self, data: &[u8]) -> DecodeResult<Vec<u8>> {
        let mut decoder = ZlibDecoder::new(data);
        let mut decompressed = Vec::new();
        decoder
            .read_to_end(&mut decompressed)
            .map_err(|e| DecodeError::Decompress(e.to_string()))?;
        Ok(decompressed)
    }
}

/// No-op decompressor: hands the payload back unchanged
#[derive(Debug, Default, Clone, Copy)]
pub struct Passthrough;

impl Decompressor for Passthrough {
    fn decompress_zlib(&self, data: &[u8]) -> DecodeResult<Vec<u8>> {
        Ok(data.to_vec())
    }
}

/// Compress with zlib; shared by the decoder tests to build fixtures
#[cfg(test)]
pub(crate) fn deflate(data: &[u8]) -> Vec<u8> {
    use flate2::write::ZlibEncoder;
    use flate2::Compression;
    use std::io::Write;

    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}
