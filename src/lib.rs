//! snr-bam: single-nucleotide-resolution coordinates from paired-end mNET-seq BAMs.
//!
//! Every properly paired read-2 alignment is collapsed to the base holding the
//! last nucleotide incorporated by RNA polymerase, re-flagged with read-1
//! orientation, then coordinate-sorted and indexed.
//!
//! # Library usage
//!
//! ```no_run
//! use snr_bam::{convert_file, ConvertOptions};
//! use std::path::Path;
//!
//! fn main() -> anyhow::Result<()> {
//!     let options = ConvertOptions::default();
//!     let stats = convert_file(Path::new("sample.bam"), "sample", Path::new("out"), &options)?;
//!     println!("{} single-base records", stats.written);
//!     Ok(())
//! }
//! ```

// Internal modules, used by the conversion pipeline.
pub(crate) mod index;
pub(crate) mod scratch;

// Public modules.
pub mod cigar;
pub mod cli;
pub mod error;
pub mod pipeline;
pub mod sort;
pub mod strand;
pub mod transform;

// Flat re-exports for the most commonly used public types.
pub use error::{CigarError, Error, TransformError};
pub use pipeline::{convert_file, output_path, validate_prefix, ConvertOptions, Stats};
pub use transform::{FlagPolicy, Orientation, Outcome, SkipReason, Transformer};

// Re-exports needed by integration tests in tests/.
#[doc(hidden)]
pub use index::bai_path;
#[doc(hidden)]
pub use scratch::Scratch;
