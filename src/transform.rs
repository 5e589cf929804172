//! The record transformer.
//!
//! An mNET-seq library is second-stranded: the last nucleotide incorporated by
//! the polymerase is the 5' end of read 2, and the transcript strand follows
//! read 1. Each properly paired read-2 alignment is collapsed to that single
//! base and re-flagged as a read-1 alignment of the opposite orientation.

use crate::cigar;
use crate::error::TransformError;
use crate::strand::{self, DEFAULT_STRAND_TAG};
use noodles::core::Position;
use noodles::sam::alignment::record::cigar::{op::Kind as CigarKind, Op as CigarOp};
use noodles::sam::alignment::record::data::field::Tag;
use noodles::sam::alignment::record::Flags;
use noodles::sam::alignment::record_buf::{Cigar, QualityScores, Sequence};
use noodles::sam::alignment::RecordBuf;

/// Read 2, reverse strand, proper pair.
pub const READ2_REVERSE_FLAG: u16 = 147;
/// Read 2, forward strand, proper pair.
pub const READ2_FORWARD_FLAG: u16 = 163;
/// Read 1, forward strand, mate reverse, proper pair.
pub const READ1_FORWARD_FLAG: u16 = 99;
/// Read 1, reverse strand, proper pair.
pub const READ1_REVERSE_FLAG: u16 = 83;

/// Orientation of an eligible read-2 alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    /// Flag 147. The polymerase base is the last counted base of the alignment.
    Reverse,
    /// Flag 163. The polymerase base is the alignment start.
    Forward,
}

impl Orientation {
    pub fn from_flag(flag: u16) -> Option<Self> {
        match flag {
            READ2_REVERSE_FLAG => Some(Self::Reverse),
            READ2_FORWARD_FLAG => Some(Self::Forward),
            _ => None,
        }
    }

    /// Flag of the rewritten single-base record.
    pub fn output_flag(self) -> u16 {
        match self {
            Self::Reverse => READ1_FORWARD_FLAG,
            Self::Forward => READ1_REVERSE_FLAG,
        }
    }
}

/// What to do with a second-mate record whose flag is neither 147 nor 163.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FlagPolicy {
    #[default]
    Skip,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkipReason {
    /// Read 1, single-end or otherwise not the second segment.
    NotSecondMate,
    /// Second segment with a flag other than 147/163.
    UnrecognizedFlag(u16),
    MateOnOtherReference,
    Indel,
    ZeroTemplateLength,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Emit {
        record: RecordBuf,
        orientation: Orientation,
    },
    Skip(SkipReason),
}

#[derive(Debug, Clone)]
pub struct Transformer {
    pub strand_tag: Tag,
    pub flag_policy: FlagPolicy,
}

impl Default for Transformer {
    fn default() -> Self {
        Self {
            strand_tag: DEFAULT_STRAND_TAG,
            flag_policy: FlagPolicy::Skip,
        }
    }
}

impl Transformer {
    pub fn new(strand_tag: Tag, flag_policy: FlagPolicy) -> Self {
        Self {
            strand_tag,
            flag_policy,
        }
    }

    /// Decide whether `record` is eligible, and if so build its single-base
    /// replacement. The input is never modified.
    pub fn apply(&self, record: &RecordBuf) -> Result<Outcome, TransformError> {
        let flags = record.flags();
        let flag = u16::from(flags);

        let orientation = match Orientation::from_flag(flag) {
            Some(orientation) => orientation,
            None if !flags.is_last_segment() => {
                return Ok(Outcome::Skip(SkipReason::NotSecondMate));
            }
            None => {
                return match self.flag_policy {
                    FlagPolicy::Skip => Ok(Outcome::Skip(SkipReason::UnrecognizedFlag(flag))),
                    FlagPolicy::Error => Err(TransformError::UnrecognizedFlag {
                        name: read_name(record),
                        flag,
                    }),
                };
            }
        };

        if !mate_on_same_reference(record) {
            return Ok(Outcome::Skip(SkipReason::MateOnOtherReference));
        }

        if cigar::has_indel(record.cigar().as_ref()) {
            return Ok(Outcome::Skip(SkipReason::Indel));
        }

        let sign = record.template_length().signum();
        if sign == 0 {
            return Ok(Outcome::Skip(SkipReason::ZeroTemplateLength));
        }

        let start = record
            .alignment_start()
            .ok_or_else(|| TransformError::MissingAlignmentStart {
                name: read_name(record),
            })?;

        let mut out = record.clone();
        *out.flags_mut() = Flags::from(orientation.output_flag());
        *out.template_length_mut() = sign;
        strand::flip_strand(out.data_mut(), self.strand_tag);

        match orientation {
            Orientation::Reverse => {
                let offset = cigar::reference_offset(record.cigar().as_ref()).map_err(|source| {
                    TransformError::Cigar {
                        name: read_name(record),
                        source,
                    }
                })?;
                *out.alignment_start_mut() = Some(shift(record, start, offset)?);
                *out.sequence_mut() = Sequence::from(last_base(record.sequence().as_ref()));
                *out.quality_scores_mut() =
                    QualityScores::from(last_base(record.quality_scores().as_ref()));
            }
            Orientation::Forward => {
                *out.sequence_mut() = Sequence::from(first_base(record.sequence().as_ref()));
                *out.quality_scores_mut() =
                    QualityScores::from(first_base(record.quality_scores().as_ref()));
            }
        }

        *out.cigar_mut() = Cigar::from(vec![CigarOp::new(CigarKind::Match, 1)]);

        Ok(Outcome::Emit {
            record: out,
            orientation,
        })
    }
}

fn mate_on_same_reference(record: &RecordBuf) -> bool {
    match (
        record.reference_sequence_id(),
        record.mate_reference_sequence_id(),
    ) {
        (Some(id), Some(mate_id)) => id == mate_id,
        _ => false,
    }
}

fn shift(record: &RecordBuf, start: Position, offset: usize) -> Result<Position, TransformError> {
    let position = usize::from(start).saturating_add(offset);
    Position::try_from(position).map_err(|_| TransformError::PositionOutOfRange {
        name: read_name(record),
        position,
    })
}

fn first_base(bytes: &[u8]) -> Vec<u8> {
    bytes.first().copied().into_iter().collect()
}

fn last_base(bytes: &[u8]) -> Vec<u8> {
    bytes.last().copied().into_iter().collect()
}

fn read_name(record: &RecordBuf) -> String {
    record
        .name()
        .map(|n| String::from_utf8_lossy(n.as_ref()).into_owned())
        .unwrap_or_else(|| "*".to_string())
}
