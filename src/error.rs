//! Error types for the snr-bam library.

use thiserror::Error;

/// Malformed CIGAR text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CigarError {
    #[error("empty CIGAR string")]
    Empty,

    #[error("operation '{op}' at byte {position} has no length")]
    MissingLength { op: char, position: usize },

    #[error("trailing length '{0}' has no operation")]
    TrailingLength(String),

    #[error("invalid CIGAR operation '{op}' at byte {position}")]
    InvalidOperation { op: char, position: usize },

    #[error("operation length overflows at byte {position}")]
    LengthOverflow { position: usize },

    #[error("CIGAR consumes no counted bases")]
    NoCountedBases,
}

/// Failures of the record transformer that abort processing.
#[derive(Error, Debug)]
pub enum TransformError {
    #[error("read {name}: unrecognized second-mate flag {flag}")]
    UnrecognizedFlag { name: String, flag: u16 },

    #[error("read {name}: eligible record has no alignment start")]
    MissingAlignmentStart { name: String },

    #[error("read {name}: shifted alignment start {position} is out of range")]
    PositionOutOfRange { name: String, position: usize },

    #[error("read {name}: {source}")]
    Cigar {
        name: String,
        #[source]
        source: CigarError,
    },
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("Number of files and new file names disagree: {files} file(s), {names} name(s)")]
    Naming { files: usize, names: usize },

    #[error("Invalid output prefix '{prefix}': {reason}")]
    InvalidPrefix { prefix: String, reason: &'static str },

    #[error("Index error: {0}")]
    Index(String),
}

pub type Result<T> = std::result::Result<T, Error>;
