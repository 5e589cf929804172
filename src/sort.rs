//! Coordinate sorting of the rewritten records.
//!
//! Records are buffered in memory. Once the buffer reaches its limit it is
//! sorted and spilled as a BAM run into the scratch directory; at the end all
//! runs are merged. Small inputs never touch the disk. At most `merge_width`
//! runs are open at once; larger run counts are merged in several passes.

use crate::scratch::Scratch;
use noodles::sam::alignment::io::Write as _;
use noodles::sam::alignment::RecordBuf;
use noodles::sam::header::record::value::map::{header::Tag as HeaderTag, Header as HeaderRecord};
use noodles::sam::header::record::value::Map;
use noodles::{bam, sam};
use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

pub const DEFAULT_MAX_RECORDS_IN_MEMORY: usize = 1_000_000;
/// Runs read concurrently by one merge pass.
pub const DEFAULT_MERGE_WIDTH: usize = 64;

/// (reference id, alignment start, reverse strand). Unplaced records sort last.
pub type SortKey = (usize, usize, bool);

pub fn sort_key(record: &RecordBuf) -> SortKey {
    (
        record.reference_sequence_id().unwrap_or(usize::MAX),
        record.alignment_start().map(usize::from).unwrap_or(0),
        record.flags().is_reverse_complemented(),
    )
}

/// Copy of `header` with `@HD SO:coordinate`.
pub fn coordinate_sorted_header(header: &sam::Header) -> sam::Header {
    let mut header = header.clone();
    if let HeaderTag::Other(sort_order) = HeaderTag::from([b'S', b'O']) {
        header
            .header_mut()
            .get_or_insert_with(Map::<HeaderRecord>::default)
            .other_fields_mut()
            .insert(sort_order, "coordinate".into());
    }
    header
}

pub struct CoordinateSorter<'a> {
    header: &'a sam::Header,
    scratch: &'a Scratch,
    max_records: usize,
    merge_width: usize,
    buffer: Vec<RecordBuf>,
    runs: Vec<PathBuf>,
}

impl<'a> CoordinateSorter<'a> {
    pub fn new(header: &'a sam::Header, scratch: &'a Scratch, max_records: usize) -> Self {
        let max_records = max_records.max(1);
        Self {
            header,
            scratch,
            max_records,
            merge_width: DEFAULT_MERGE_WIDTH,
            buffer: Vec::with_capacity(max_records.min(DEFAULT_MAX_RECORDS_IN_MEMORY)),
            runs: Vec::new(),
        }
    }

    /// Limit how many runs a single merge pass opens. Values below 2 are
    /// raised to 2.
    pub fn with_merge_width(mut self, width: usize) -> Self {
        self.merge_width = width.max(2);
        self
    }

    pub fn push(&mut self, record: RecordBuf) -> io::Result<()> {
        self.buffer.push(record);
        if self.buffer.len() >= self.max_records {
            self.spill()?;
        }
        Ok(())
    }

    /// Number of runs written to disk so far.
    pub fn spilled_runs(&self) -> usize {
        self.runs.len()
    }

    fn spill(&mut self) -> io::Result<()> {
        self.buffer.sort_by_key(sort_key);
        let path = self.scratch.run_path(self.runs.len());
        let n = write_bam(&path, self.header, self.buffer.iter())?;
        tracing::debug!(run = self.runs.len(), records = n, "spilled sorted run");
        self.runs.push(path);
        self.buffer.clear();
        Ok(())
    }

    /// Write every pushed record to `path` in coordinate order and return
    /// how many were written.
    pub fn finish(mut self, path: &Path) -> io::Result<u64> {
        let header = coordinate_sorted_header(self.header);

        if self.runs.is_empty() {
            self.buffer.sort_by_key(sort_key);
            return write_bam(path, &header, self.buffer.iter());
        }

        if !self.buffer.is_empty() {
            self.spill()?;
        }

        let spilled = self.runs.len();
        let mut runs = std::mem::take(&mut self.runs);
        let mut next_run = runs.len();
        while runs.len() > self.merge_width {
            let mut merged = Vec::with_capacity(runs.len().div_ceil(self.merge_width));
            for group in runs.chunks(self.merge_width) {
                if let [single] = group {
                    merged.push(single.clone());
                    continue;
                }
                let run = self.scratch.run_path(next_run);
                next_run += 1;
                merge_to_path(group, self.header, &run)?;
                for input in group {
                    fs::remove_file(input)?;
                }
                merged.push(run);
            }
            tracing::debug!(from = runs.len(), to = merged.len(), "intermediate merge pass");
            runs = merged;
        }

        let n = merge_to_path(&runs, &header, path)?;
        tracing::debug!(runs = spilled, records = n, "merged sorted runs");
        Ok(n)
    }
}

/// Merge the sorted `runs` into a new BAM at `path`.
fn merge_to_path(runs: &[PathBuf], header: &sam::Header, path: &Path) -> io::Result<u64> {
    let mut cursors = runs
        .iter()
        .map(|run| open_run(run))
        .collect::<io::Result<Vec<_>>>()?;

    let mut writer = bam::io::Writer::new(File::create(path)?);
    writer.write_header(header)?;
    let n = merge_runs(&mut cursors, header, &mut writer)?;
    writer.try_finish()?;
    Ok(n)
}

fn write_bam<'r, I>(path: &Path, header: &sam::Header, records: I) -> io::Result<u64>
where
    I: IntoIterator<Item = &'r RecordBuf>,
{
    let mut writer = bam::io::Writer::new(File::create(path)?);
    writer.write_header(header)?;
    let mut n = 0u64;
    for record in records {
        writer.write_alignment_record(header, record)?;
        n += 1;
    }
    writer.try_finish()?;
    Ok(n)
}

struct RunCursor<R> {
    reader: bam::io::Reader<R>,
    header: sam::Header,
    record: RecordBuf,
}

fn open_run(path: &Path) -> io::Result<RunCursor<impl Read>> {
    let mut reader = bam::io::reader::Builder::default().build_from_path(path)?;
    let header = reader.read_header()?;
    Ok(RunCursor {
        reader,
        header,
        record: RecordBuf::default(),
    })
}

impl<R: Read> RunCursor<R> {
    /// Load the next record; `false` at end of run.
    fn advance(&mut self) -> io::Result<bool> {
        Ok(self.reader.read_record_buf(&self.header, &mut self.record)? != 0)
    }
}

fn merge_runs<R, W>(
    cursors: &mut [RunCursor<R>],
    header: &sam::Header,
    writer: &mut bam::io::Writer<W>,
) -> io::Result<u64>
where
    R: Read,
    W: Write,
{
    let mut heap = BinaryHeap::with_capacity(cursors.len());
    for (i, cursor) in cursors.iter_mut().enumerate() {
        if cursor.advance()? {
            heap.push(Reverse((sort_key(&cursor.record), i)));
        }
    }

    let mut n = 0u64;
    while let Some(Reverse((_, i))) = heap.pop() {
        let cursor = &mut cursors[i];
        writer.write_alignment_record(header, &cursor.record)?;
        n += 1;
        if cursor.advance()? {
            heap.push(Reverse((sort_key(&cursor.record), i)));
        }
    }

    Ok(n)
}
