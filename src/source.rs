//! The indexer's input: an abstract stream of `(doc_key, content,
//! file_path)` rows. The relational corpus store this ultimately binds to
//! is explicitly out of scope (spec.md §1); this module defines the seam
//! and one concrete SQLite adapter, mirroring how
//! `original_source/ssot/cpp_index/src/indexer.cpp` queried
//! `documents_fts JOIN documents_meta` over the C sqlite3 API.

use crate::error::SourceError;

/// One row yielded by a [`DocumentSource`].
pub trait SourceRow {
    fn doc_key(&self) -> &str;
    fn content(&self) -> &str;
    fn file_path(&self) -> &str;
}

/// A stream of document rows, consumed once by `indexer::build`.
pub trait DocumentSource {
    type Row: SourceRow;
    type Iter: Iterator<Item = Result<Self::Row, SourceError>>;

    fn rows(self) -> Self::Iter;
}

/// A plain owned row, used by both in-memory test sources and the SQLite
/// adapter below.
#[derive(Debug, Clone)]
pub struct OwnedRow {
    pub doc_key: String,
    pub content: String,
    pub file_path: String,
}

impl SourceRow for OwnedRow {
    fn doc_key(&self) -> &str {
        &self.doc_key
    }
    fn content(&self) -> &str {
        &self.content
    }
    fn file_path(&self) -> &str {
        &self.file_path
    }
}

/// In-memory source for tests and small corpora: a fixed `Vec` of rows,
/// iterated in order.
pub struct VecSource {
    rows: Vec<OwnedRow>,
}

impl VecSource {
    pub fn new(rows: Vec<(String, String, String)>) -> Self {
        Self {
            rows: rows
                .into_iter()
                .map(|(doc_key, content, file_path)| OwnedRow {
                    doc_key,
                    content,
                    file_path,
                })
                .collect(),
        }
    }
}

impl DocumentSource for VecSource {
    type Row = OwnedRow;
    type Iter = std::vec::IntoIter<Result<OwnedRow, SourceError>>;

    fn rows(self) -> Self::Iter {
        self.rows
            .into_iter()
            .map(Ok)
            .collect::<Vec<_>>()
            .into_iter()
    }
}

/// Rows fetched per page by [`SqliteRowIter`]. Bounds how much of the
/// corpus is ever resident in memory at once, independent of how large
/// the underlying table is.
const PAGE_SIZE: usize = 10_000;

/// SQLite-backed source: `SELECT doc_key, content, file_path FROM <table>`.
///
/// No pooling, no pragmas beyond opening read-only — the relational store
/// is an external collaborator the spec does not ask us to re-specify.
pub struct SqliteSource {
    conn: rusqlite::Connection,
    table: String,
}

impl SqliteSource {
    pub fn open(path: &str, table: &str) -> Result<Self, SourceError> {
        let conn = rusqlite::Connection::open_with_flags(
            path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY,
        )
        .map_err(|e| SourceError::Open(e.to_string()))?;
        Ok(Self {
            conn,
            table: table.to_string(),
        })
    }
}

impl DocumentSource for SqliteSource {
    type Row = OwnedRow;
    type Iter = SqliteRowIter;

    fn rows(self) -> Self::Iter {
        SqliteRowIter {
            conn: self.conn,
            table: self.table,
            offset: 0,
            buffer: std::collections::VecDeque::new(),
            exhausted: false,
        }
    }
}

/// Streams `(doc_key, content, file_path)` rows a page at a time via
/// `LIMIT`/`OFFSET`, so `indexer::build` never has to hold more than
/// [`PAGE_SIZE`] rows of the corpus in memory regardless of table size —
/// `rusqlite::Rows<'stmt>` borrows from its `Statement`, which borrows from
/// the `Connection`, so a single long-lived cursor can't be stored in this
/// struct without self-referential lifetimes; re-querying per page avoids
/// that without reaching for an unsafe workaround.
pub struct SqliteRowIter {
    conn: rusqlite::Connection,
    table: String,
    offset: usize,
    buffer: std::collections::VecDeque<OwnedRow>,
    exhausted: bool,
}

impl SqliteRowIter {
    fn fetch_page(&mut self) -> Result<(), SourceError> {
        let query = format!(
            "SELECT doc_key, content, file_path FROM {} LIMIT {} OFFSET {}",
            self.table, PAGE_SIZE, self.offset
        );
        let mut stmt = self.conn.prepare(&query)?;
        let rows = stmt.query_map([], |row| {
            Ok(OwnedRow {
                doc_key: row.get(0)?,
                content: row.get(1)?,
                file_path: row.get(2)?,
            })
        })?;

        let mut fetched = 0usize;
        for row in rows {
            self.buffer.push_back(row?);
            fetched += 1;
        }
        self.offset += fetched;
        if fetched < PAGE_SIZE {
            self.exhausted = true;
        }
        Ok(())
    }
}

impl Iterator for SqliteRowIter {
    type Item = Result<OwnedRow, SourceError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.buffer.is_empty() && !self.exhausted {
            if let Err(e) = self.fetch_page() {
                self.exhausted = true;
                return Some(Err(e));
            }
        }
        self.buffer.pop_front().map(Ok)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_memory_with_rows(n: usize) -> rusqlite::Connection {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        conn.execute(
            "CREATE TABLE documents (doc_key TEXT, content TEXT, file_path TEXT)",
            [],
        )
        .unwrap();
        for i in 0..n {
            conn.execute(
                "INSERT INTO documents (doc_key, content, file_path) VALUES (?1, ?2, ?3)",
                rusqlite::params![format!("d{i}"), format!("content {i}"), format!("/c/d{i}.txt")],
            )
            .unwrap();
        }
        conn
    }

    #[test]
    fn reads_rows_in_insertion_order() {
        let conn = open_memory_with_rows(5);
        let iter = SqliteRowIter {
            conn,
            table: "documents".to_string(),
            offset: 0,
            buffer: std::collections::VecDeque::new(),
            exhausted: false,
        };
        let rows: Vec<OwnedRow> = iter.map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 5);
        assert_eq!(rows[0].doc_key, "d0");
        assert_eq!(rows[4].doc_key, "d4");
    }

    #[test]
    fn pages_past_a_single_page_boundary() {
        // A handful more rows than fit in one fetch, exercising the
        // offset-advancing path across two pages.
        let conn = open_memory_with_rows(PAGE_SIZE + 3);
        let iter = SqliteRowIter {
            conn,
            table: "documents".to_string(),
            offset: 0,
            buffer: std::collections::VecDeque::new(),
            exhausted: false,
        };
        let rows: Vec<OwnedRow> = iter.map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), PAGE_SIZE + 3);
        assert_eq!(rows[PAGE_SIZE].doc_key, format!("d{PAGE_SIZE}"));
    }
}
