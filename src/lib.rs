//! ewfprobe - forensic disk image exploration
//!
//! Three pure, slice-based decoders chained into a pipeline:
//!
//! 1. [`ewf`] walks an E01 (Expert Witness Format) container, extracting
//!    case metadata, volume geometry, stored hashes, and the reconstructed
//!    raw disk.
//! 2. [`partition`] detects and parses the partition table on that disk
//!    (MBR, with GPT escalation on a protective entry).
//! 3. [`fat`] walks FAT12/16/32 partitions into a recursive directory
//!    listing with long filenames resolved.
//!
//! [`analysis::analyze`] runs the whole chain. All decoders are total over
//! untrusted input: they collect recoverable errors into their results
//! instead of panicking, and traversal is bounded on adversarial images.
//!
//! ```no_run
//! let bytes = std::fs::read("evidence.E01")?;
//! let analysis = ewfprobe::analysis::analyze(&bytes);
//!
//! if let Some(case) = analysis.ewf.metadata.case_number() {
//!     println!("case: {case}");
//! }
//! for fs in &analysis.filesystems {
//!     for entry in fs.filesystem.all_files() {
//!         println!("{}", entry.path);
//!     }
//! }
//! # Ok::<(), std::io::Error>(())
//! ```

pub mod analysis;
mod common;
pub mod compress;
pub mod error;
pub mod ewf;
pub mod fat;
pub mod logging;
pub mod partition;

pub use analysis::{analyze, analyze_file, ImageAnalysis};
pub use error::{DecodeError, DecodeResult};
