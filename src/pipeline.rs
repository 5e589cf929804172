use crate::error::Error;
use crate::index;
use crate::scratch::Scratch;
use crate::sort::{CoordinateSorter, DEFAULT_MAX_RECORDS_IN_MEMORY};
use crate::strand::DEFAULT_STRAND_TAG;
use crate::transform::{FlagPolicy, Orientation, Outcome, SkipReason, Transformer};
use anyhow::{Context, Result};
use noodles::bam;
use noodles::sam::alignment::record::data::field::Tag;
use noodles::sam::alignment::RecordBuf;
use std::fs;
use std::path::{Path, PathBuf};

const PROGRESS_INTERVAL: u64 = 1_000_000;

#[derive(Debug, Clone)]
pub struct ConvertOptions {
    pub strand_tag: Tag,
    pub flag_policy: FlagPolicy,
    pub max_records_in_memory: usize,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            strand_tag: DEFAULT_STRAND_TAG,
            flag_policy: FlagPolicy::Skip,
            max_records_in_memory: DEFAULT_MAX_RECORDS_IN_MEMORY,
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Stats {
    pub total_records: u64,
    pub emitted: u64,
    pub reverse_emitted: u64,
    pub forward_emitted: u64,
    pub not_second_mate: u64,
    pub unrecognized_flag: u64,
    pub mate_on_other_reference: u64,
    pub indel: u64,
    pub zero_template_length: u64,
    /// Records in the sorted output.
    pub written: u64,
}

impl Stats {
    pub fn record(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Emit { orientation, .. } => {
                self.emitted += 1;
                match orientation {
                    Orientation::Reverse => self.reverse_emitted += 1,
                    Orientation::Forward => self.forward_emitted += 1,
                }
            }
            Outcome::Skip(reason) => match reason {
                SkipReason::NotSecondMate => self.not_second_mate += 1,
                SkipReason::UnrecognizedFlag(_) => self.unrecognized_flag += 1,
                SkipReason::MateOnOtherReference => self.mate_on_other_reference += 1,
                SkipReason::Indel => self.indel += 1,
                SkipReason::ZeroTemplateLength => self.zero_template_length += 1,
            },
        }
    }

    pub fn skipped(&self) -> u64 {
        self.not_second_mate
            + self.unrecognized_flag
            + self.mate_on_other_reference
            + self.indel
            + self.zero_template_length
    }
}

/// `<outdir>/<prefix>_sorted.bam`
pub fn output_path(outdir: &Path, prefix: &str) -> PathBuf {
    outdir.join(format!("{prefix}_sorted.bam"))
}

/// Check that `prefix` names a file below the output directory.
///
/// Prefixes may contain directories (`sub/sample`) but must be relative and
/// end in a file name.
pub fn validate_prefix(prefix: &str) -> Result<(), Error> {
    let path = Path::new(prefix);
    let reason = if prefix.is_empty() {
        "prefix is empty"
    } else if path.has_root() {
        "prefix must be relative to the output directory"
    } else if prefix.ends_with(std::path::is_separator) || path.file_name().is_none() {
        "prefix does not end in a file name"
    } else {
        return Ok(());
    };
    Err(Error::InvalidPrefix {
        prefix: prefix.to_string(),
        reason,
    })
}

/// Convert one mNET-seq BAM into a sorted, indexed single-nucleotide BAM.
///
/// The sorted output is staged in a scratch directory next to the output
/// file and only moved into place once complete. The scratch directory is removed on
/// every return path.
pub fn convert_file(
    input: &Path,
    prefix: &str,
    outdir: &Path,
    options: &ConvertOptions,
) -> Result<Stats> {
    validate_prefix(prefix)?;
    let out_path = output_path(outdir, prefix);
    // scratch and output share a directory; the output is moved in by rename
    let out_parent = out_path.parent().unwrap_or(outdir);
    let stem = Path::new(prefix)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(prefix);

    let mut reader = bam::io::reader::Builder::default()
        .build_from_path(input)
        .with_context(|| format!("failed to open {}", input.display()))?;
    let header = reader
        .read_header()
        .with_context(|| format!("failed to read BAM header of {}", input.display()))?;

    let transformer = Transformer::new(options.strand_tag, options.flag_policy);
    let scratch = Scratch::new_in(out_parent, stem).with_context(|| {
        format!("failed to create scratch directory in {}", out_parent.display())
    })?;
    let mut sorter = CoordinateSorter::new(&header, &scratch, options.max_records_in_memory);

    let mut stats = Stats::default();
    let mut record = RecordBuf::default();

    while reader
        .read_record_buf(&header, &mut record)
        .with_context(|| format!("failed to decode record in {}", input.display()))?
        != 0
    {
        stats.total_records += 1;
        if stats.total_records % PROGRESS_INTERVAL == 0 {
            tracing::debug!(
                records = stats.total_records,
                emitted = stats.emitted,
                "{prefix}: progress"
            );
        }

        let outcome = transformer
            .apply(&record)
            .with_context(|| format!("failed to transform record in {}", input.display()))?;
        stats.record(&outcome);

        match outcome {
            Outcome::Emit { record, .. } => sorter.push(record)?,
            Outcome::Skip(SkipReason::UnrecognizedFlag(flag)) => {
                let name = record
                    .name()
                    .map(|n| String::from_utf8_lossy(n.as_ref()).into_owned())
                    .unwrap_or_else(|| "*".to_string());
                if stats.unrecognized_flag == 1 {
                    tracing::warn!(
                        flag,
                        read = %name,
                        "{prefix}: skipping second mate with unrecognized flag (further occurrences at debug level)"
                    );
                } else {
                    tracing::debug!(flag, read = %name, "skipping second mate with unrecognized flag");
                }
            }
            Outcome::Skip(_) => {}
        }
    }

    let spilled = sorter.spilled_runs();
    let staged = scratch.path().join("sorted.bam");
    stats.written = sorter
        .finish(&staged)
        .with_context(|| format!("failed to sort records of {}", input.display()))?;

    fs::rename(&staged, &out_path)
        .with_context(|| format!("failed to move sorted output to {}", out_path.display()))?;
    let bai = index::build_bai(&out_path)?;

    scratch.close()?;

    tracing::info!(
        total_records = stats.total_records,
        emitted = stats.emitted,
        reverse = stats.reverse_emitted,
        forward = stats.forward_emitted,
        skipped = stats.skipped(),
        indel = stats.indel,
        mate_on_other_reference = stats.mate_on_other_reference,
        unrecognized_flag = stats.unrecognized_flag,
        zero_template_length = stats.zero_template_length,
        spilled_runs = spilled,
        output = %out_path.display(),
        index = %bai.display(),
        "{prefix}: conversion complete"
    );

    Ok(stats)
}
