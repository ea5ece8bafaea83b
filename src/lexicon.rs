//! Sorted term directory mapping each term to its posting list's location.
//!
//! On-disk layout per entry: `u32 term_len, term_bytes, u64 postings_offset,
//! u32 postings_count`, concatenated in sorted-by-term order. Grounded in
//! `original_source/ssot/cpp_index/src/indexer.cpp`'s `LexEntry` write loop
//! and `searcher.cpp`'s `load_lexicon`/`find_term`.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::error::SearchError;

pub const LEXICON_FILE: &str = "lexicon.bin";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexiconEntry {
    pub term: String,
    pub postings_offset: u64,
    pub postings_count: u32,
}

/// Append-only writer used by the indexer's merge phase. The caller is
/// responsible for calling it in ascending term order; this type does not
/// re-sort.
pub struct LexiconWriter {
    out: BufWriter<File>,
}

impl LexiconWriter {
    pub fn create(dir: &Path) -> std::io::Result<Self> {
        Ok(Self {
            out: BufWriter::new(File::create(dir.join(LEXICON_FILE))?),
        })
    }

    pub fn append(&mut self, entry: &LexiconEntry) -> std::io::Result<()> {
        let term_bytes = entry.term.as_bytes();
        self.out.write_u32::<LittleEndian>(term_bytes.len() as u32)?;
        self.out.write_all(term_bytes)?;
        self.out.write_u64::<LittleEndian>(entry.postings_offset)?;
        self.out.write_u32::<LittleEndian>(entry.postings_count)?;
        Ok(())
    }

    pub fn finish(mut self) -> std::io::Result<()> {
        self.out.flush()
    }
}

/// In-memory sorted lexicon, loaded once at search time.
pub struct Lexicon {
    entries: Vec<LexiconEntry>,
}

impl Lexicon {
    pub fn load(dir: &Path) -> Result<Self, SearchError> {
        let mut reader = BufReader::new(File::open(dir.join(LEXICON_FILE))?);
        let mut entries = Vec::new();

        loop {
            let term_len = match reader.read_u32::<LittleEndian>() {
                Ok(len) => len,
                Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => break,
                Err(e) => return Err(e.into()),
            };
            let mut term_bytes = vec![0u8; term_len as usize];
            reader.read_exact(&mut term_bytes)?;
            let term = String::from_utf8(term_bytes)
                .map_err(|e| SearchError::Format(format!("invalid UTF-8 in lexicon term: {e}")))?;
            let postings_offset = reader.read_u64::<LittleEndian>()?;
            let postings_count = reader.read_u32::<LittleEndian>()?;

            if let Some(last) = entries.last() {
                let last: &LexiconEntry = last;
                if term <= last.term {
                    return Err(SearchError::Format(format!(
                        "lexicon out of order: '{}' after '{}'",
                        term, last.term
                    )));
                }
            }

            entries.push(LexiconEntry {
                term,
                postings_offset,
                postings_count,
            });
        }

        Ok(Self { entries })
    }

    pub fn empty() -> Self {
        Self { entries: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Binary search by term; `None` means the term is absent, not an error
    /// (spec.md §4.4).
    pub fn find(&self, term: &str) -> Option<&LexiconEntry> {
        self.entries
            .binary_search_by(|e| e.term.as_str().cmp(term))
            .ok()
            .map(|idx| &self.entries[idx])
    }

    pub fn iter(&self) -> impl Iterator<Item = &LexiconEntry> {
        self.entries.iter()
    }
}
