//! EWF (Expert Witness Format) - E01 forensic image parser
//!
//! Parses a single E01 segment held in memory: section chain, case
//! metadata, volume geometry, embedded acquisition hashes, and the
//! reconstructed raw disk built from the `sectors`/`data` payloads.
//!
//! Multi-segment sets (.E02, .E03, ...) and the EWF v2 formats are out of
//! scope; the parser handles the classic EWF v1 layout.

mod operations;
pub(crate) mod parser;
mod types;

pub use types::{
    canonical_key, CaseMetadata, EwfImage, HashInfo, HashVerification, SectionDescriptor,
    VolumeInfo, EWF_SIGNATURE, SECTION_DESCRIPTOR_SIZE, SECTION_WALK_START,
};

pub use parser::{parse, parse_with_decompressor};

pub use operations::{is_ewf, parse_file, verify_stored_hashes};
