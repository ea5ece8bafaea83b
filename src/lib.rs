//! External-memory inverted index builder and BM25/boolean search service
//! over a flat document corpus.

pub mod docstore;
pub mod error;
pub mod indexer;
pub mod lexicon;
pub mod meta;
pub mod postings;
pub mod searcher;
pub mod source;
pub mod tokenizer;
pub mod varint;

pub use error::{IndexerError, SearchError, SourceError};
pub use indexer::{build, DEFAULT_CHUNK_LIMIT};
pub use meta::IndexMeta;
pub use searcher::{SearchHit, SearchMode, Searcher};
pub use source::{DocumentSource, OwnedRow, SourceRow, SqliteRowIter, SqliteSource, VecSource};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
