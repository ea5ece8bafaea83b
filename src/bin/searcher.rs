//! CLI front-end for `ssot_index::Searcher`.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use ssot_index::{SearchError, SearchMode, Searcher};

#[derive(Parser, Debug)]
#[command(name = "searcher", about = "Run a boolean or BM25-ranked query against a built index")]
struct Args {
    /// Directory holding a previously built index.
    #[arg(long)]
    index: PathBuf,

    /// "boolean" for unranked AND retrieval, "full" for BM25-ranked top-k.
    #[arg(long, default_value = "full")]
    mode: String,

    /// Maximum number of results to return.
    #[arg(long, default_value_t = 10)]
    limit: usize,

    /// The query string.
    #[arg(long)]
    query: String,
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    let mode: SearchMode = match args.mode.parse() {
        Ok(mode) => mode,
        Err(e) => {
            eprintln!("searcher: {e}");
            return ExitCode::from(1);
        }
    };

    let mut searcher = match Searcher::open(&args.index) {
        Ok(searcher) => searcher,
        Err(e) => {
            eprintln!("searcher: {e}");
            return exit_code_for(&e);
        }
    };

    match searcher.search(&args.query, mode, args.limit) {
        Ok(hits) if hits.is_empty() => {
            println!("No results.");
            ExitCode::SUCCESS
        }
        Ok(hits) => {
            for hit in hits {
                match mode {
                    SearchMode::Full => println!("{:.6}\t{}\t{}", hit.score, hit.doc_key, hit.file_path),
                    SearchMode::Boolean => println!("{}\t{}", hit.doc_key, hit.file_path),
                }
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("searcher: {e}");
            exit_code_for(&e)
        }
    }
}

fn exit_code_for(err: &SearchError) -> ExitCode {
    match err {
        SearchError::Usage(_) => ExitCode::from(1),
        SearchError::Io(_) => ExitCode::from(3),
        SearchError::Format(_) => ExitCode::from(4),
    }
}
