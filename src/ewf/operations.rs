//! Convenience operations over parsed EWF images

use std::io;
use std::path::Path;

use sha1::{Digest, Sha1};
use tracing::info;

use crate::common::binary::bytes_to_hex;

use super::parser;
use super::types::{EwfImage, HashVerification, EWF_SIGNATURE};

/// Check whether a byte buffer starts with the EWF v1 signature
pub fn is_ewf(bytes: &[u8]) -> bool {
    bytes.len() >= EWF_SIGNATURE.len() && &bytes[..8] == EWF_SIGNATURE
}

/// Read a segment file from disk and parse it.
///
/// File access is the only fallible step; the parse itself reports its
/// problems through [`EwfImage::errors`].
pub fn parse_file(path: impl AsRef<Path>) -> io::Result<EwfImage> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)?;
    info!(path = %path.display(), bytes = bytes.len(), "parsing EWF segment");
    Ok(parser::parse(&bytes))
}

/// Re-hash the reconstructed raw disk and compare against the hashes stored
/// in the image's `hash`/`digest` section.
///
/// Returns one entry per stored algorithm; empty when the image carries no
/// hash block or no disk data was reconstructed.
pub fn verify_stored_hashes(image: &EwfImage) -> Vec<HashVerification> {
    let (Some(hashes), Some(raw_disk)) = (&image.hashes, &image.raw_disk) else {
        return Vec::new();
    };

    let mut results = Vec::new();

    if let Some(stored) = &hashes.md5 {
        let computed = format!("{:x}", md5::compute(raw_disk));
        results.push(HashVerification {
            algorithm: "MD5".to_string(),
            matches: computed == *stored,
            stored: stored.clone(),
            computed,
        });
    }

    if let Some(stored) = &hashes.sha1 {
        let mut hasher = Sha1::new();
        hasher.update(raw_disk);
        let computed = bytes_to_hex(&hasher.finalize());
        results.push(HashVerification {
            algorithm: "SHA-1".to_string(),
            matches: computed == *stored,
            stored: stored.clone(),
            computed,
        });
    }

    results
}
