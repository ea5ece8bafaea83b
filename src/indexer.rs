//! External-memory sort-merge indexer: Phase A (ingest + interleaved
//! spill), Phase B (final spill), Phase C (k-way merge).
//!
//! Grounded in `original_source/ssot/cpp_index/src/indexer.cpp`: the
//! `Entry`/`ChunkReader`/`ReaderCmp` types and the merge loop's
//! `current_term`/`postings_offset`/`postings_count`/`prev_doc_id` state
//! machine are carried over directly; only the storage types (varint
//! postings instead of fixed-width, Rust's `BinaryHeap` instead of
//! `std::priority_queue`) differ.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::docstore::{DocStoreReader, DocStoreWriter};
use crate::error::IndexerError;
use crate::lexicon::{LexiconEntry, LexiconWriter};
use crate::meta::IndexMeta;
use crate::postings::PostingsWriter;
use crate::source::{DocumentSource, SourceRow};
use crate::tokenizer::Tokenizer;

/// Terms longer than this are rejected as a format error (spec.md §9(b)).
pub const MAX_TERM_BYTES: usize = 1024;

pub const DEFAULT_CHUNK_LIMIT: usize = 1_000_000;

#[derive(Debug, Clone)]
struct Entry {
    term: String,
    doc_id: u32,
    tf: u32,
}

/// Build an index at `output_dir`. Any previous contents of `output_dir`
/// are overwritten by the new index files (spec.md §3 Lifecycle).
pub fn build<S: DocumentSource>(
    source: S,
    output_dir: &Path,
    chunk_limit: usize,
    source_tag: &str,
) -> Result<(), IndexerError> {
    fs::create_dir_all(output_dir)?;
    let tmp_dir = output_dir.join("tmp");
    fs::create_dir_all(&tmp_dir)?;

    let tokenizer = Tokenizer::new();
    let mut doc_store = DocStoreWriter::create(output_dir)?;
    let mut buffer: Vec<Entry> = Vec::with_capacity(chunk_limit.min(1 << 20));
    let mut next_chunk: usize = 0;
    let mut total_tokens: u64 = 0;
    let mut row_count: u64 = 0;

    for row in source.rows() {
        let row = row?;
        let (counts, token_count) = tokenizer.tokenize_counts(row.content());
        let doc_id = doc_store.append(row.doc_key(), row.file_path(), token_count)?;
        total_tokens += token_count as u64;

        for (term, tf) in counts {
            if term.len() > MAX_TERM_BYTES {
                return Err(IndexerError::Format(format!(
                    "term exceeds {MAX_TERM_BYTES} bytes: {} bytes",
                    term.len()
                )));
            }
            buffer.push(Entry { term, doc_id, tf });
            if buffer.len() >= chunk_limit {
                spill(&mut buffer, &tmp_dir, next_chunk)?;
                next_chunk += 1;
            }
        }

        row_count += 1;
        if row_count % 5000 == 0 {
            log::info!("indexed {row_count} docs...");
        }
    }

    if !buffer.is_empty() {
        spill(&mut buffer, &tmp_dir, next_chunk)?;
    }

    doc_store.finish(output_dir)?;
    let doc_count = DocStoreReader::open(output_dir)?.doc_count();

    let chunk_files = discover_chunks(&tmp_dir)?;
    merge_chunks(&chunk_files, output_dir)?;
    fs::remove_dir_all(&tmp_dir).ok();

    let avg_doc_len = if doc_count == 0 {
        0.0
    } else {
        total_tokens as f64 / doc_count as f64
    };

    IndexMeta {
        doc_count,
        avg_doc_len,
        source_db: source_tag.to_string(),
    }
    .write(output_dir)?;

    log::info!("index build complete, docs={doc_count}");
    Ok(())
}

fn chunk_path(tmp_dir: &Path, index: usize) -> PathBuf {
    tmp_dir.join(format!("chunk_{index}.bin"))
}

fn discover_chunks(tmp_dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut paths: Vec<PathBuf> = fs::read_dir(tmp_dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.extension().map(|ext| ext == "bin").unwrap_or(false))
        .collect();
    paths.sort();
    Ok(paths)
}

fn spill(buffer: &mut Vec<Entry>, tmp_dir: &Path, chunk_index: usize) -> std::io::Result<()> {
    buffer.sort_by(|a, b| a.term.cmp(&b.term).then(a.doc_id.cmp(&b.doc_id)));

    let path = chunk_path(tmp_dir, chunk_index);
    let mut out = BufWriter::new(File::create(path)?);
    for entry in buffer.iter() {
        let term_bytes = entry.term.as_bytes();
        out.write_u32::<LittleEndian>(term_bytes.len() as u32)?;
        out.write_all(term_bytes)?;
        out.write_u32::<LittleEndian>(entry.doc_id)?;
        out.write_u32::<LittleEndian>(entry.tf)?;
    }
    out.flush()?;
    buffer.clear();
    Ok(())
}

/// Streaming reader over one chunk file, exposing a peekable current entry.
struct ChunkReader {
    reader: BufReader<File>,
    current: Option<Entry>,
}

impl ChunkReader {
    fn open(path: &Path) -> std::io::Result<Self> {
        let mut reader = BufReader::new(File::open(path)?);
        let current = read_entry(&mut reader)?;
        Ok(Self { reader, current })
    }

    fn advance(&mut self) -> std::io::Result<()> {
        self.current = read_entry(&mut self.reader)?;
        Ok(())
    }
}

fn read_entry(reader: &mut BufReader<File>) -> std::io::Result<Option<Entry>> {
    let term_len = match reader.read_u32::<LittleEndian>() {
        Ok(len) => len,
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e),
    };
    let mut term_bytes = vec![0u8; term_len as usize];
    reader.read_exact(&mut term_bytes)?;
    let term = String::from_utf8(term_bytes)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    let doc_id = reader.read_u32::<LittleEndian>()?;
    let tf = reader.read_u32::<LittleEndian>()?;
    Ok(Some(Entry { term, doc_id, tf }))
}

/// Heap key: ascending `(term, doc_id)`, wrapped in `Reverse` so
/// `BinaryHeap` (a max-heap) behaves as a min-heap.
#[derive(PartialEq, Eq)]
struct HeapKey {
    term: String,
    doc_id: u32,
    reader_idx: usize,
}

impl Ord for HeapKey {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.term.cmp(&other.term).then(self.doc_id.cmp(&other.doc_id))
    }
}

impl PartialOrd for HeapKey {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

fn merge_chunks(chunk_files: &[PathBuf], output_dir: &Path) -> Result<(), IndexerError> {
    let mut readers: Vec<ChunkReader> = chunk_files
        .iter()
        .map(|p| ChunkReader::open(p))
        .collect::<std::io::Result<_>>()?;

    let mut heap: BinaryHeap<Reverse<HeapKey>> = BinaryHeap::new();
    for (idx, reader) in readers.iter().enumerate() {
        if let Some(entry) = &reader.current {
            heap.push(Reverse(HeapKey {
                term: entry.term.clone(),
                doc_id: entry.doc_id,
                reader_idx: idx,
            }));
        }
    }

    let mut postings = PostingsWriter::create(output_dir)?;
    let mut lexicon = LexiconWriter::create(output_dir)?;

    let mut current_term: Option<String> = None;
    let mut postings_offset: u64 = 0;
    let mut postings_count: u32 = 0;

    while let Some(Reverse(key)) = heap.pop() {
        let reader = &mut readers[key.reader_idx];
        let entry = reader
            .current
            .take()
            .expect("heap key only exists while current entry is Some");

        if current_term.as_deref() != Some(entry.term.as_str()) {
            if let Some(term) = current_term.take() {
                lexicon.append(&LexiconEntry {
                    term,
                    postings_offset,
                    postings_count,
                })?;
            }
            postings_offset = postings.position();
            postings_count = 0;
            postings.start_term();
            current_term = Some(entry.term.clone());
        }

        postings.write_posting(entry.doc_id, entry.tf)?;
        postings_count += 1;

        reader.advance()?;
        if let Some(next) = &reader.current {
            heap.push(Reverse(HeapKey {
                term: next.term.clone(),
                doc_id: next.doc_id,
                reader_idx: key.reader_idx,
            }));
        }
    }

    if let Some(term) = current_term {
        lexicon.append(&LexiconEntry {
            term,
            postings_offset,
            postings_count,
        })?;
    }

    postings.finish()?;
    lexicon.finish()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docstore::DocStoreReader;
    use crate::lexicon::Lexicon;
    use crate::meta::IndexMeta;
    use crate::postings::PostingsReader;
    use crate::source::VecSource;
    use tempfile::tempdir;

    fn docs() -> Vec<(String, String, String)> {
        vec![
            ("d1".into(), "the cat sat on the mat".into(), "/c/d1.txt".into()),
            ("d2".into(), "the dog sat".into(), "/c/d2.txt".into()),
            ("d3".into(), "cats and dogs".into(), "/c/d3.txt".into()),
        ]
    }

    #[test]
    fn builds_a_searchable_index_from_a_tiny_corpus() {
        let dir = tempdir().unwrap();
        build(VecSource::new(docs()), dir.path(), 1_000_000, "test").unwrap();

        let meta = IndexMeta::load(dir.path()).unwrap();
        assert_eq!(meta.doc_count, 3);

        let lex = Lexicon::load(dir.path()).unwrap();
        let entry = lex.find("sat").expect("term 'sat' should be indexed");
        let mut reader = PostingsReader::open(dir.path()).unwrap();
        let postings = reader.read(entry.postings_offset, entry.postings_count).unwrap();
        assert_eq!(postings.len(), 2);
        assert_eq!(postings[0].doc_id, 0);
        assert_eq!(postings[1].doc_id, 1);

        let mut store = DocStoreReader::open(dir.path()).unwrap();
        assert_eq!(store.get(0).unwrap().0, "d1");
        assert_eq!(store.doc_len(0), Some(6));
    }

    #[test]
    fn forcing_many_small_chunks_still_merges_correctly() {
        let dir = tempdir().unwrap();
        // chunk_limit=2 forces multiple spills across these docs, exercising
        // the k-way merge rather than a single in-memory sort.
        build(VecSource::new(docs()), dir.path(), 2, "test").unwrap();

        let lex = Lexicon::load(dir.path()).unwrap();
        let mut reader = PostingsReader::open(dir.path()).unwrap();

        let entry = lex.find("cat").expect("term 'cat' should be indexed");
        let postings = reader.read(entry.postings_offset, entry.postings_count).unwrap();
        assert_eq!(postings.len(), 1);
        assert_eq!(postings[0].doc_id, 0);

        let entry = lex.find("sat").unwrap();
        let postings = reader.read(entry.postings_offset, entry.postings_count).unwrap();
        assert_eq!(postings.iter().map(|p| p.doc_id).collect::<Vec<_>>(), vec![0, 1]);

        // Every lexicon term's posting list must be in ascending doc-id order.
        for entry in lex.iter() {
            let postings = reader.read(entry.postings_offset, entry.postings_count).unwrap();
            for pair in postings.windows(2) {
                assert!(pair[0].doc_id < pair[1].doc_id);
            }
        }
    }

    #[test]
    fn empty_corpus_produces_an_empty_but_valid_index() {
        let dir = tempdir().unwrap();
        build(VecSource::new(vec![]), dir.path(), 1_000_000, "test").unwrap();

        let meta = IndexMeta::load(dir.path()).unwrap();
        assert_eq!(meta.doc_count, 0);
        assert_eq!(meta.avg_doc_len, 0.0);

        let lex = Lexicon::load(dir.path()).unwrap();
        assert!(lex.is_empty());
    }

    #[test]
    fn oversized_term_is_rejected_as_a_format_error() {
        let dir = tempdir().unwrap();
        let huge_term = "a".repeat(MAX_TERM_BYTES + 1);
        let docs = vec![("d1".into(), huge_term, "/c/d1.txt".into())];
        let err = build(VecSource::new(docs), dir.path(), 1_000_000, "test").unwrap_err();
        assert!(matches!(err, IndexerError::Format(_)));
    }
}
