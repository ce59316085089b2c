//! Whole-image analysis pipeline
//!
//! Chains the three decoders: EWF container -> reconstructed disk ->
//! partition table -> per-partition FAT listings. Each stage can fail
//! independently; earlier results are always kept.

use std::io;
use std::path::Path;

use serde::Serialize;
use tracing::{debug, info};

use crate::ewf::{self, EwfImage};
use crate::fat::{self, FatResult};
use crate::partition::{self, PartitionTable};

/// FAT listing for one partition of the analyzed disk
#[derive(Clone, Debug, Serialize)]
pub struct PartitionFilesystem {
    /// Index of the partition in the table
    pub partition_index: u32,
    pub filesystem: FatResult,
}

/// Aggregated result of the full decode chain
#[derive(Clone, Debug, Serialize)]
pub struct ImageAnalysis {
    pub ewf: EwfImage,
    /// Partition table of the reconstructed disk; absent when no disk data
    /// was recovered
    pub partition_table: Option<PartitionTable>,
    /// One entry per partition whose contents parsed as a FAT filesystem
    pub filesystems: Vec<PartitionFilesystem>,
}

/// Run the full pipeline over an in-memory E01 segment
pub fn analyze(bytes: &[u8]) -> ImageAnalysis {
    let ewf = ewf::parse(bytes);

    let Some(raw_disk) = ewf.raw_disk.as_deref() else {
        debug!("no disk data reconstructed, skipping partition scan");
        return ImageAnalysis {
            ewf,
            partition_table: None,
            filesystems: Vec::new(),
        };
    };

    let table = partition::parse(raw_disk);
    info!(
        kind = ?table.kind,
        partitions = table.partitions.len(),
        "partition scan"
    );

    let mut filesystems = Vec::new();
    for p in &table.partitions {
        let data = table.partition_data(raw_disk, p);
        let listing = fat::parse(data);
        if listing.valid {
            debug!(
                partition = p.index,
                variant = ?listing.variant,
                entries = listing.entries.len(),
                "FAT filesystem"
            );
            filesystems.push(PartitionFilesystem {
                partition_index: p.index,
                filesystem: listing,
            });
        }
    }

    ImageAnalysis {
        ewf,
        partition_table: Some(table),
        filesystems,
    }
}

/// Read an E01 segment from disk and run the full pipeline
pub fn analyze_file(path: impl AsRef<Path>) -> io::Result<ImageAnalysis> {
    let bytes = std::fs::read(path)?;
    Ok(analyze(&bytes))
}
