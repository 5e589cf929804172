//! CIGAR parsing and the reference offset used to locate the 3' base of a read.
//!
//! The transformer works on the typed operations of a decoded record
//! ([`has_indel`], [`reference_offset`]). The text parser is for callers that
//! hold SAM CIGAR strings, such as tools reporting offsets for SAM text input.

use crate::error::CigarError;
use noodles::sam::alignment::record::cigar::{op::Kind, Op};

/// Map a SAM CIGAR operation code to its kind.
pub fn kind_from_code(code: u8) -> Option<Kind> {
    let kind = match code {
        b'M' => Kind::Match,
        b'I' => Kind::Insertion,
        b'D' => Kind::Deletion,
        b'N' => Kind::Skip,
        b'S' => Kind::SoftClip,
        b'H' => Kind::HardClip,
        b'P' => Kind::Pad,
        b'=' => Kind::SequenceMatch,
        b'X' => Kind::SequenceMismatch,
        _ => return None,
    };
    Some(kind)
}

/// Parse a textual CIGAR (`10M5N66M`) into operations.
///
/// Digits are accumulated until an operation code is seen, so multi-digit
/// lengths and any number of operations are accepted. `*` is not a valid
/// input here: an absent CIGAR has no reference offset.
pub fn parse(cigar: &str) -> Result<Vec<Op>, CigarError> {
    if cigar.is_empty() {
        return Err(CigarError::Empty);
    }

    let mut ops = Vec::new();
    let mut len: Option<usize> = None;
    let mut digits_start = 0;

    for (position, &b) in cigar.as_bytes().iter().enumerate() {
        if b.is_ascii_digit() {
            if len.is_none() {
                digits_start = position;
            }
            let n = len
                .unwrap_or(0)
                .checked_mul(10)
                .and_then(|n| n.checked_add(usize::from(b - b'0')))
                .ok_or(CigarError::LengthOverflow { position })?;
            len = Some(n);
            continue;
        }

        let kind = kind_from_code(b).ok_or(CigarError::InvalidOperation {
            op: char::from(b),
            position,
        })?;
        let n = len.take().ok_or(CigarError::MissingLength {
            op: char::from(b),
            position,
        })?;
        ops.push(Op::new(kind, n));
    }

    if len.is_some() {
        return Err(CigarError::TrailingLength(cigar[digits_start..].to_string()));
    }

    Ok(ops)
}

/// True if any operation is an insertion or a deletion.
pub fn has_indel(ops: &[Op]) -> bool {
    ops.iter()
        .any(|op| matches!(op.kind(), Kind::Insertion | Kind::Deletion))
}

/// Distance from the alignment start to the last counted base.
///
/// Every operation except `I` and `D` is counted, clips and skips included,
/// and one is subtracted so the result is an inclusive 0-based offset.
pub fn reference_offset(ops: &[Op]) -> Result<usize, CigarError> {
    let counted: usize = ops
        .iter()
        .filter(|op| !matches!(op.kind(), Kind::Insertion | Kind::Deletion))
        .map(|op| op.len())
        .sum();
    counted.checked_sub(1).ok_or(CigarError::NoCountedBases)
}

/// `reference_offset` of a textual CIGAR: `76M` gives 75, `10M5N66M` gives 80.
pub fn read_length_offset(cigar: &str) -> Result<usize, CigarError> {
    let ops = parse(cigar)?;
    reference_offset(&ops)
}
