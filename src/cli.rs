use crate::error::Error;
use crate::pipeline::{validate_prefix, ConvertOptions};
use crate::sort::DEFAULT_MAX_RECORDS_IN_MEMORY;
use crate::strand::parse_tag;
use crate::transform::FlagPolicy;
use clap::{Parser, ValueEnum};
use noodles::sam::alignment::record::data::field::Tag;
use std::path::PathBuf;

/// Returns the coordinates of the last incorporated base of mNET-seq reads.
///
/// The library is taken to be second-stranded: the last incorporated base is
/// in read 2 and the strand information in read 1. Each input produces
/// `<outdir>/<filename>_sorted.bam` and its BAI index.
#[derive(Parser, Debug)]
#[command(name = "snr-bam", version)]
pub struct Args {
    /// One or more input BAM files
    #[arg(short = 'f', long = "filepath", value_name = "BAM", num_args = 1.., required = true)]
    pub filepath: Vec<PathBuf>,

    /// Output prefixes (no extension), one per input file, in the same order
    #[arg(short = 's', long = "filename", value_name = "PREFIX", num_args = 1.., required = true)]
    pub filename: Vec<String>,

    /// Output directory, created if missing
    #[arg(short = 'd', long = "outdir", value_name = "DIR", default_value = "./")]
    pub outdir: PathBuf,

    /// Tag holding the inferred strand, flipped on every emitted record
    #[arg(long, value_name = "TAG", default_value = "XS", value_parser = parse_tag)]
    pub strand_tag: Tag,

    /// How to treat second-mate records whose flag is neither 147 nor 163
    #[arg(long, value_enum, default_value_t = UnrecognizedFlag::Skip)]
    pub on_unrecognized_flag: UnrecognizedFlag,

    /// Records held in memory before a sorted run is spilled to disk
    #[arg(short = 'm', long, default_value_t = DEFAULT_MAX_RECORDS_IN_MEMORY)]
    pub max_records_in_memory: usize,

    /// Set logging level to WARN
    #[arg(short = 'q', long)]
    pub quiet: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnrecognizedFlag {
    /// Drop the record and count it
    Skip,
    /// Abort the run
    Error,
}

impl From<UnrecognizedFlag> for FlagPolicy {
    fn from(value: UnrecognizedFlag) -> Self {
        match value {
            UnrecognizedFlag::Skip => FlagPolicy::Skip,
            UnrecognizedFlag::Error => FlagPolicy::Error,
        }
    }
}

impl Args {
    /// Pair every input with its output prefix.
    pub fn jobs(&self) -> Result<Vec<(PathBuf, String)>, Error> {
        if self.filepath.len() != self.filename.len() {
            return Err(Error::Naming {
                files: self.filepath.len(),
                names: self.filename.len(),
            });
        }
        for prefix in &self.filename {
            validate_prefix(prefix)?;
        }
        Ok(self
            .filepath
            .iter()
            .cloned()
            .zip(self.filename.iter().cloned())
            .collect())
    }

    pub fn convert_options(&self) -> ConvertOptions {
        ConvertOptions {
            strand_tag: self.strand_tag,
            flag_policy: self.on_unrecognized_flag.into(),
            max_records_in_memory: self.max_records_in_memory,
        }
    }

    pub fn log_level(&self) -> &'static str {
        if self.quiet {
            "warn"
        } else {
            "info"
        }
    }
}
