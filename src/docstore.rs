//! Append-only store of `(doc_key, file_path)` pairs addressed by doc-id.
//!
//! Grounded in `original_source/ssot/cpp_index/src/indexer.cpp`'s doc-store
//! write loop and `searcher.cpp`'s `read_string_at`.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::varint::{read_varint, write_varint};

pub const DATA_FILE: &str = "docstore_data.bin";
pub const OFFSETS_FILE: &str = "docstore_offsets.bin";
pub const DOCLEN_FILE: &str = "docstore_doclen.bin";

/// Append-only writer for `docstore_data.bin`, plus the companion
/// doc-offsets and doc-lengths arrays.
pub struct DocStoreWriter {
    data: BufWriter<File>,
    offsets: Vec<u64>,
    doc_lengths: Vec<u32>,
    position: u64,
}

impl DocStoreWriter {
    pub fn create(dir: &Path) -> std::io::Result<Self> {
        let data = BufWriter::new(File::create(dir.join(DATA_FILE))?);
        Ok(Self {
            data,
            offsets: Vec::new(),
            doc_lengths: Vec::new(),
            position: 0,
        })
    }

    /// Append one document's `(doc_key, file_path)` and its token count.
    /// Returns the assigned doc-id.
    pub fn append(&mut self, doc_key: &str, file_path: &str, doc_len: u32) -> std::io::Result<u32> {
        let doc_id = self.offsets.len() as u32;
        self.offsets.push(self.position);

        self.position += write_len_prefixed(&mut self.data, doc_key.as_bytes())?;
        self.position += write_len_prefixed(&mut self.data, file_path.as_bytes())?;
        self.doc_lengths.push(doc_len);

        Ok(doc_id)
    }

    /// Flush the data stream and write the offsets/doc-length side files.
    pub fn finish(mut self, dir: &Path) -> std::io::Result<()> {
        self.data.flush()?;

        let mut offsets_out = BufWriter::new(File::create(dir.join(OFFSETS_FILE))?);
        for &off in &self.offsets {
            offsets_out.write_u64::<LittleEndian>(off)?;
        }
        offsets_out.flush()?;

        let mut doclen_out = BufWriter::new(File::create(dir.join(DOCLEN_FILE))?);
        for &len in &self.doc_lengths {
            doclen_out.write_u32::<LittleEndian>(len)?;
        }
        doclen_out.flush()?;

        Ok(())
    }
}

fn write_len_prefixed<W: Write>(out: &mut W, bytes: &[u8]) -> std::io::Result<u64> {
    let mut written = 0u64;
    let len_bytes = crate::varint::encode(bytes.len() as u64);
    out.write_all(&len_bytes)?;
    written += len_bytes.len() as u64;
    out.write_all(bytes)?;
    written += bytes.len() as u64;
    Ok(written)
}

/// Read-only view over a built doc-store: dense offsets/lengths arrays in
/// memory, seek-and-read against the data file per lookup.
pub struct DocStoreReader {
    data: BufReader<File>,
    offsets: Vec<u64>,
    doc_lengths: Vec<u32>,
}

impl DocStoreReader {
    pub fn open(dir: &Path) -> std::io::Result<Self> {
        let data = BufReader::new(File::open(dir.join(DATA_FILE))?);

        let mut offsets = Vec::new();
        let mut offsets_in = BufReader::new(File::open(dir.join(OFFSETS_FILE))?);
        while let Ok(off) = offsets_in.read_u64::<LittleEndian>() {
            offsets.push(off);
        }

        let mut doc_lengths = Vec::new();
        let mut doclen_in = BufReader::new(File::open(dir.join(DOCLEN_FILE))?);
        while let Ok(len) = doclen_in.read_u32::<LittleEndian>() {
            doc_lengths.push(len);
        }

        Ok(Self {
            data,
            offsets,
            doc_lengths,
        })
    }

    pub fn doc_count(&self) -> u64 {
        self.offsets.len() as u64
    }

    pub fn doc_len(&self, doc_id: u32) -> Option<u32> {
        self.doc_lengths.get(doc_id as usize).copied()
    }

    /// Resolve `doc_id` to `(doc_key, file_path)`.
    pub fn get(&mut self, doc_id: u32) -> std::io::Result<(String, String)> {
        let offset = *self.offsets.get(doc_id as usize).ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "doc_id out of range")
        })?;

        self.data.seek(SeekFrom::Start(offset))?;
        let doc_key = read_len_prefixed_string(&mut self.data)?;
        let file_path = read_len_prefixed_string(&mut self.data)?;
        Ok((doc_key, file_path))
    }
}

fn read_len_prefixed_string<R: Read>(reader: &mut R) -> std::io::Result<String> {
    let len = read_varint(reader)?;
    let mut buf = vec![0u8; len as usize];
    reader.read_exact(&mut buf)?;
    String::from_utf8(buf).map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
}
