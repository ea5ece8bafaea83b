//! Posting-list codec: delta-varint doc-ids, raw-varint term frequencies.
//!
//! Grounded in `original_source/ssot/cpp_index/src/searcher.cpp`'s
//! `load_postings` and `indexer.cpp`'s merge-phase writer.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::Path;

use crate::error::SearchError;
use crate::varint::{read_varint, write_varint};

pub const POSTINGS_FILE: &str = "postings.bin";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Posting {
    pub doc_id: u32,
    pub tf: u32,
}

/// Append-only writer driven by the indexer's k-way merge. Tracks the
/// previous doc-id per term so the caller only needs to supply absolute
/// doc-ids.
pub struct PostingsWriter {
    out: BufWriter<File>,
    position: u64,
    prev_doc_id: u32,
}

impl PostingsWriter {
    pub fn create(dir: &Path) -> std::io::Result<Self> {
        Ok(Self {
            out: BufWriter::new(File::create(dir.join(POSTINGS_FILE))?),
            position: 0,
            prev_doc_id: 0,
        })
    }

    pub fn position(&self) -> u64 {
        self.position
    }

    /// Start a new term's posting list; resets the delta base to 0.
    pub fn start_term(&mut self) {
        self.prev_doc_id = 0;
    }

    /// Append one posting to the current term's list. `doc_id` must be
    /// strictly greater than the previously written doc-id for this term
    /// (enforced by the caller via the merge's sort order).
    pub fn write_posting(&mut self, doc_id: u32, tf: u32) -> std::io::Result<()> {
        let delta = doc_id - self.prev_doc_id;
        self.position += count_varint_len(delta as u64) as u64;
        write_varint(&mut self.out, delta as u64)?;
        self.position += count_varint_len(tf as u64) as u64;
        write_varint(&mut self.out, tf as u64)?;
        self.prev_doc_id = doc_id;
        Ok(())
    }

    pub fn finish(mut self) -> std::io::Result<()> {
        self.out.flush()
    }
}

fn count_varint_len(mut value: u64) -> usize {
    let mut len = 1;
    while value >= 0x80 {
        value >>= 7;
        len += 1;
    }
    len
}

/// Random-access reader over a built `postings.bin`.
pub struct PostingsReader {
    file: BufReader<File>,
}

impl PostingsReader {
    pub fn open(dir: &Path) -> std::io::Result<Self> {
        Ok(Self {
            file: BufReader::new(File::open(dir.join(POSTINGS_FILE))?),
        })
    }

    /// Read exactly `count` postings starting at `offset`, decoding the
    /// delta-coded doc-ids back to absolute values.
    pub fn read(&mut self, offset: u64, count: u32) -> Result<Vec<Posting>, SearchError> {
        self.file.seek(SeekFrom::Start(offset))?;
        let mut out = Vec::with_capacity(count as usize);
        let mut doc_id: u32 = 0;
        for _ in 0..count {
            let delta = read_varint(&mut self.file)
                .map_err(|e| SearchError::Format(format!("malformed posting delta: {e}")))?;
            let tf = read_varint(&mut self.file)
                .map_err(|e| SearchError::Format(format!("malformed posting tf: {e}")))?;
            doc_id = doc_id
                .checked_add(delta as u32)
                .ok_or_else(|| SearchError::Format("doc-id delta overflow".to_string()))?;
            out.push(Posting {
                doc_id,
                tf: tf as u32,
            });
        }
        Ok(out)
    }
}
