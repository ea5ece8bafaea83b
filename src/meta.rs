//! `index_meta.json`: the handful of build-wide facts the searcher needs
//! before it can rank anything.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{IndexerError, SearchError};

pub const META_FILE: &str = "index_meta.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexMeta {
    pub doc_count: u64,
    pub avg_doc_len: f64,
    /// Free-form provenance tag; callers should not parse it (spec.md §9(c)).
    pub source_db: String,
}

impl IndexMeta {
    pub fn write(&self, dir: &Path) -> Result<(), IndexerError> {
        let file = File::create(dir.join(META_FILE))?;
        serde_json::to_writer_pretty(BufWriter::new(file), self)?;
        Ok(())
    }

    pub fn load(dir: &Path) -> Result<Self, SearchError> {
        let file = File::open(dir.join(META_FILE))?;
        let meta = serde_json::from_reader(BufReader::new(file))?;
        Ok(meta)
    }
}
