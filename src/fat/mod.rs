//! FAT12/16/32 filesystem parsing
//!
//! Decodes a FAT partition into its boot-sector parameters, variant, and a
//! recursive directory listing with long filenames resolved. NTFS, exFAT,
//! and the unix filesystems are out of scope.

mod dir_entry;
mod parser;
mod types;

pub use types::{
    BootSector, FatEntry, FatResult, FatVariant, DIR_ENTRY_SIZE, MAX_CLUSTER_CHAIN,
    MAX_DIRECTORY_DEPTH,
};

pub use parser::parse;
