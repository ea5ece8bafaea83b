//! CLI front-end for `ssot_index::build`.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use ssot_index::IndexerError;

#[derive(Parser, Debug)]
#[command(name = "indexer", about = "Build an external-memory inverted index over a SQLite document corpus")]
struct Args {
    /// Path to the SQLite database holding the document corpus.
    #[arg(long)]
    source: PathBuf,

    /// Table to read `(doc_key, content, file_path)` rows from.
    #[arg(long, default_value = "documents")]
    table: String,

    /// Output directory for the built index. Overwritten if it exists.
    #[arg(long)]
    out: PathBuf,

    /// Number of postings buffered in memory before spilling a sorted chunk.
    #[arg(long, default_value_t = ssot_index::DEFAULT_CHUNK_LIMIT)]
    chunk: usize,
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    let source = match ssot_index::SqliteSource::open(
        args.source.to_string_lossy().as_ref(),
        &args.table,
    ) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("indexer: {e}");
            return ExitCode::from(2);
        }
    };

    let source_tag = args.source.to_string_lossy().into_owned();
    match ssot_index::build(source, &args.out, args.chunk, &source_tag) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("indexer: {e}");
            exit_code_for(&e)
        }
    }
}

fn exit_code_for(err: &IndexerError) -> ExitCode {
    match err {
        IndexerError::Source(_) => ExitCode::from(2),
        IndexerError::Io(_) => ExitCode::from(3),
        IndexerError::Format(_) => ExitCode::from(4),
    }
}
