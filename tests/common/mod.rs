//! Synthetic alignment fixtures shared by the integration tests.
#![allow(dead_code)]

use bstr::BString;
use noodles::bam;
use noodles::core::Position;
use noodles::sam;
use noodles::sam::alignment::io::Write as _;
use noodles::sam::alignment::record::cigar::op::Kind as CigarKind;
use noodles::sam::alignment::record::data::field::Tag;
use noodles::sam::alignment::record::{Flags, MappingQuality};
use noodles::sam::alignment::record_buf::{data::field::Value, Cigar, QualityScores, Sequence};
use noodles::sam::alignment::RecordBuf;
use noodles::sam::header::record::value::map::{Program, ReadGroup, ReferenceSequence};
use noodles::sam::header::record::value::Map;
use snr_bam::cigar;
use std::fs::File;
use std::num::NonZeroUsize;
use std::path::Path;

pub const XS: Tag = Tag::new(b'X', b'S');
pub const NH: Tag = Tag::new(b'N', b'H');

pub fn header() -> sam::Header {
    sam::Header::builder()
        .add_reference_sequence(
            BString::from("chr1"),
            Map::<ReferenceSequence>::new(NonZeroUsize::new(1_000_000).unwrap()),
        )
        .add_reference_sequence(
            BString::from("chr2"),
            Map::<ReferenceSequence>::new(NonZeroUsize::new(500_000).unwrap()),
        )
        .add_read_group(BString::from("rg1"), Map::<ReadGroup>::default())
        .add_program(BString::from("aligner"), Map::<Program>::default())
        .build()
}

/// Description of one alignment; `build` turns it into a record.
#[derive(Debug, Clone)]
pub struct Read {
    pub name: String,
    pub flag: u16,
    pub ref_id: Option<usize>,
    pub pos: usize,
    pub cigar: String,
    pub mate_ref_id: Option<usize>,
    pub mate_pos: usize,
    pub tlen: i32,
    /// Defaults to a repeating ACGT pattern of the CIGAR's read length.
    pub seq: Option<Vec<u8>>,
    pub strand: Option<u8>,
}

impl Default for Read {
    fn default() -> Self {
        Self {
            name: "read".to_string(),
            flag: 147,
            ref_id: Some(0),
            pos: 1000,
            cigar: "50M".to_string(),
            mate_ref_id: Some(0),
            mate_pos: 900,
            tlen: -150,
            seq: None,
            strand: Some(b'+'),
        }
    }
}

impl Read {
    pub fn build(&self) -> RecordBuf {
        let ops = cigar::parse(&self.cigar).expect("valid test CIGAR");
        let read_len: usize = ops
            .iter()
            .filter(|op| {
                matches!(
                    op.kind(),
                    CigarKind::Match
                        | CigarKind::Insertion
                        | CigarKind::SoftClip
                        | CigarKind::SequenceMatch
                        | CigarKind::SequenceMismatch
                )
            })
            .map(|op| op.len())
            .sum();
        let seq = self
            .seq
            .clone()
            .unwrap_or_else(|| b"ACGT".iter().copied().cycle().take(read_len).collect());
        let qual: Vec<u8> = (0..seq.len()).map(|i| (i % 41) as u8).collect();

        let mut record = RecordBuf::default();
        *record.name_mut() = Some(self.name.as_bytes().to_vec().into());
        *record.flags_mut() = Flags::from(self.flag);
        *record.reference_sequence_id_mut() = self.ref_id;
        *record.alignment_start_mut() = Position::new(self.pos);
        *record.mapping_quality_mut() = MappingQuality::new(60);
        *record.cigar_mut() = Cigar::from(ops);
        *record.mate_reference_sequence_id_mut() = self.mate_ref_id;
        *record.mate_alignment_start_mut() = Position::new(self.mate_pos);
        *record.template_length_mut() = self.tlen;
        *record.sequence_mut() = Sequence::from(seq);
        *record.quality_scores_mut() = QualityScores::from(qual);

        record.data_mut().insert(NH, Value::from(1i32));
        if let Some(strand) = self.strand {
            record.data_mut().insert(XS, Value::Character(strand));
        }

        record
    }
}

pub fn write_bam(path: &Path, header: &sam::Header, records: &[RecordBuf]) {
    let mut writer = bam::io::Writer::new(File::create(path).expect("create BAM"));
    writer.write_header(header).expect("write header");
    for record in records {
        writer
            .write_alignment_record(header, record)
            .expect("write record");
    }
    writer.try_finish().expect("finish BAM");
}

pub fn read_bam(path: &Path) -> (sam::Header, Vec<RecordBuf>) {
    let mut reader = bam::io::reader::Builder::default()
        .build_from_path(path)
        .expect("open BAM");
    let header = reader.read_header().expect("read header");
    let mut records = Vec::new();
    let mut record = RecordBuf::default();
    loop {
        match reader.read_record_buf(&header, &mut record) {
            Ok(0) => break,
            Ok(_) => records.push(record.clone()),
            Err(e) => panic!("read_record_buf error: {e}"),
        }
    }
    (header, records)
}

/// Four mate pairs: two eligible reverse read 2s, one eligible forward read 2
/// and one read 2 with an insertion. Written deliberately out of order.
pub fn four_pairs() -> Vec<RecordBuf> {
    vec![
        // pair 1: read 2 reverse, 50M at 1000 -> single base at 1049
        Read {
            name: "pair1".into(),
            flag: 99,
            pos: 900,
            mate_pos: 1000,
            tlen: 150,
            strand: Some(b'-'),
            ..Default::default()
        }
        .build(),
        Read {
            name: "pair1".into(),
            flag: 147,
            pos: 1000,
            mate_pos: 900,
            tlen: -150,
            seq: Some(
                b"ACGTACGTACGTACGTACGTACGTACGTACGTACGTACGTACGTACGTAG".to_vec(),
            ),
            strand: Some(b'+'),
            ..Default::default()
        }
        .build(),
        // pair 2: read 2 reverse, spliced 10M5N40M at 300 -> single base at 354
        Read {
            name: "pair2".into(),
            flag: 99,
            pos: 250,
            mate_pos: 300,
            tlen: 105,
            strand: Some(b'+'),
            ..Default::default()
        }
        .build(),
        Read {
            name: "pair2".into(),
            flag: 147,
            pos: 300,
            cigar: "10M5N40M".into(),
            mate_pos: 250,
            tlen: -105,
            strand: Some(b'-'),
            ..Default::default()
        }
        .build(),
        // pair 3: read 2 forward at 500 -> single base at 500
        Read {
            name: "pair3".into(),
            flag: 163,
            pos: 500,
            mate_pos: 560,
            tlen: 110,
            seq: Some(
                b"TCGTACGTACGTACGTACGTACGTACGTACGTACGTACGTACGTACGTAC".to_vec(),
            ),
            strand: Some(b'-'),
            ..Default::default()
        }
        .build(),
        Read {
            name: "pair3".into(),
            flag: 83,
            pos: 560,
            mate_pos: 500,
            tlen: -110,
            strand: Some(b'+'),
            ..Default::default()
        }
        .build(),
        // pair 4: read 2 carries an insertion and is dropped
        Read {
            name: "pair4".into(),
            flag: 99,
            pos: 2000,
            mate_pos: 2100,
            tlen: 150,
            ..Default::default()
        }
        .build(),
        Read {
            name: "pair4".into(),
            flag: 147,
            pos: 2100,
            cigar: "20M2I28M".into(),
            mate_pos: 2000,
            tlen: -150,
            ..Default::default()
        }
        .build(),
    ]
}
