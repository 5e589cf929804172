//! Strand-tag handling.
//!
//! The inferred transcription strand lives in an optional tag (`XS:A:+` for
//! most spliced aligners). When a read-2 alignment is re-expressed with read-1
//! orientation the tag has to be flipped.

use noodles::sam::alignment::record::data::field::Tag;
use noodles::sam::alignment::record_buf::{data::field::Value, Data};

pub const DEFAULT_STRAND_TAG: Tag = Tag::new(b'X', b'S');

fn complement(strand: u8) -> Option<u8> {
    match strand {
        b'+' => Some(b'-'),
        b'-' => Some(b'+'),
        _ => None,
    }
}

/// Flip the trailing `+`/`-` of the strand tag in place.
///
/// Returns `false` when the tag is absent or does not end in a strand
/// character; neither case is an error.
pub fn flip_strand(data: &mut Data, tag: Tag) -> bool {
    let flipped = match data.get(&tag) {
        Some(Value::Character(c)) => complement(*c).map(Value::Character),
        Some(Value::String(s)) => s.last().copied().and_then(complement).map(|c| {
            let mut bytes = s.to_vec();
            if let Some(last) = bytes.last_mut() {
                *last = c;
            }
            Value::String(bytes.into())
        }),
        _ => None,
    };

    match flipped {
        Some(value) => {
            data.insert(tag, value);
            true
        }
        None => false,
    }
}

/// Strand character of the tag, if present and well formed.
pub fn strand_of(data: &Data, tag: Tag) -> Option<char> {
    let c = match data.get(&tag)? {
        Value::Character(c) => *c,
        Value::String(s) => *s.last()?,
        _ => return None,
    };
    complement(c).map(|_| char::from(c))
}

/// Parse a two-character SAM tag name given on the command line.
pub fn parse_tag(s: &str) -> Result<Tag, String> {
    match s.as_bytes() {
        [a, b] if a.is_ascii_alphabetic() && b.is_ascii_alphanumeric() => Ok(Tag::new(*a, *b)),
        _ => Err(format!("invalid tag '{s}': expected two characters like XS")),
    }
}
