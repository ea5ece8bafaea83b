//! End-to-end build-then-search scenarios over small in-memory corpora.

use ssot_index::{build, SearchMode, Searcher, VecSource};
use tempfile::tempdir;

fn corpus() -> Vec<(String, String, String)> {
    vec![
        ("alpha".to_string(), "the quick brown fox jumps over the lazy dog".to_string(), "/c/alpha.txt".to_string()),
        ("beta".to_string(), "the lazy dog sleeps all day".to_string(), "/c/beta.txt".to_string()),
        ("gamma".to_string(), "quick foxes are rare in the city".to_string(), "/c/gamma.txt".to_string()),
    ]
}

#[test]
fn boolean_query_returns_docs_containing_every_term() {
    let dir = tempdir().unwrap();
    build(VecSource::new(corpus()), dir.path(), 1_000_000, "test").unwrap();

    let mut searcher = Searcher::open(dir.path()).unwrap();
    let hits = searcher.search("lazy dog", SearchMode::Boolean, 10).unwrap();
    let keys: Vec<&str> = hits.iter().map(|h| h.doc_key.as_str()).collect();
    assert_eq!(keys, vec!["alpha", "beta"]);
}

#[test]
fn boolean_query_with_unknown_term_yields_no_results() {
    let dir = tempdir().unwrap();
    build(VecSource::new(corpus()), dir.path(), 1_000_000, "test").unwrap();

    let mut searcher = Searcher::open(dir.path()).unwrap();
    let hits = searcher.search("lazy dragon", SearchMode::Boolean, 10).unwrap();
    assert!(hits.is_empty());
}

#[test]
fn ranked_query_scores_match_hand_computed_bm25() {
    // Two documents, one term, so BM25 reduces to a form we can check
    // arithmetically: k1=1.2, b=0.75.
    let dir = tempdir().unwrap();
    let docs = vec![
        ("short".to_string(), "needle".to_string(), "/c/short.txt".to_string()),
        ("long".to_string(), "needle hay hay hay hay hay hay hay hay".to_string(), "/c/long.txt".to_string()),
    ];
    build(VecSource::new(docs), dir.path(), 1_000_000, "test").unwrap();

    let mut searcher = Searcher::open(dir.path()).unwrap();
    let hits = searcher.search("needle", SearchMode::Full, 10).unwrap();
    assert_eq!(hits.len(), 2);

    // n=2, df=1: idf = ln((2-1+0.5)/(1+0.5) + 1) = ln(2.0)
    let n = 2.0;
    let df = 1.0;
    let idf = ((n - df + 0.5) / (df + 0.5) + 1.0_f64).ln();
    let avg_doc_len = (1.0 + 9.0) / 2.0;

    let score_short = {
        let tf = 1.0;
        let dl = 1.0;
        idf * (tf * 2.2) / (tf + 1.2 * (0.25 + 0.75 * dl / avg_doc_len))
    };
    let score_long = {
        let tf = 1.0;
        let dl = 9.0;
        idf * (tf * 2.2) / (tf + 1.2 * (0.25 + 0.75 * dl / avg_doc_len))
    };

    let short_hit = hits.iter().find(|h| h.doc_key == "short").unwrap();
    let long_hit = hits.iter().find(|h| h.doc_key == "long").unwrap();
    assert!((short_hit.score - score_short).abs() < 1e-9);
    assert!((long_hit.score - score_long).abs() < 1e-9);
    assert!(score_short > score_long, "shorter document should score higher for equal tf");
}

#[test]
fn empty_corpus_is_searchable_and_returns_nothing() {
    let dir = tempdir().unwrap();
    build(VecSource::new(vec![]), dir.path(), 1_000_000, "test").unwrap();

    let mut searcher = Searcher::open(dir.path()).unwrap();
    assert!(searcher.search("anything", SearchMode::Boolean, 10).unwrap().is_empty());
    assert!(searcher.search("anything", SearchMode::Full, 10).unwrap().is_empty());
}

#[test]
fn duplicate_doc_keys_are_preserved_as_distinct_documents() {
    let dir = tempdir().unwrap();
    let docs = vec![
        ("dup".to_string(), "alpha term".to_string(), "/c/a.txt".to_string()),
        ("dup".to_string(), "alpha term again".to_string(), "/c/b.txt".to_string()),
    ];
    build(VecSource::new(docs), dir.path(), 1_000_000, "test").unwrap();

    let mut searcher = Searcher::open(dir.path()).unwrap();
    let hits = searcher.search("alpha", SearchMode::Boolean, 10).unwrap();
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].doc_key, "dup");
    assert_eq!(hits[1].doc_key, "dup");
    assert_ne!(hits[0].file_path, hits[1].file_path);
}
