//! Query execution: boolean AND and BM25-ranked retrieval over a built
//! index.
//!
//! Grounded in `original_source/ssot/cpp_index/src/searcher.cpp`'s
//! `search_boolean`/`search_ranked` pair and the teacher's
//! `profiles/mod.rs::Bm25Params::score` for the ranking arithmetic.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::path::Path;

use crate::docstore::DocStoreReader;
use crate::error::SearchError;
use crate::lexicon::Lexicon;
use crate::meta::IndexMeta;
use crate::postings::{Posting, PostingsReader};
use crate::tokenizer::Tokenizer;

const K1: f64 = 1.2;
const B: f64 = 0.75;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchMode {
    /// Unranked set intersection; a query term absent from the lexicon
    /// yields zero results for the whole query.
    Boolean,
    /// BM25-ranked top-k.
    Full,
}

impl std::str::FromStr for SearchMode {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "boolean" => Ok(SearchMode::Boolean),
            "full" => Ok(SearchMode::Full),
            other => Err(SearchError::Usage(format!(
                "unknown mode '{other}', expected 'boolean' or 'full'"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub doc_key: String,
    pub file_path: String,
    pub score: f64,
}

pub struct Searcher {
    lexicon: Lexicon,
    postings: PostingsReader,
    doc_store: DocStoreReader,
    meta: IndexMeta,
    tokenizer: Tokenizer,
}

impl Searcher {
    pub fn open(index_dir: &Path) -> Result<Self, SearchError> {
        Ok(Self {
            lexicon: Lexicon::load(index_dir)?,
            postings: PostingsReader::open(index_dir)?,
            doc_store: DocStoreReader::open(index_dir)?,
            meta: IndexMeta::load(index_dir)?,
            tokenizer: Tokenizer::new(),
        })
    }

    pub fn search(&mut self, query: &str, mode: SearchMode, limit: usize) -> Result<Vec<SearchHit>, SearchError> {
        let mut terms = self.tokenizer.tokenize_list(query);
        terms.sort();
        terms.dedup();

        if terms.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }

        let mut postings_per_term: Vec<Vec<Posting>> = Vec::with_capacity(terms.len());
        for term in &terms {
            let Some(entry) = self.lexicon.find(term) else {
                // Any missing term makes the whole AND query empty.
                return Ok(Vec::new());
            };
            let list = self.postings.read(entry.postings_offset, entry.postings_count)?;
            postings_per_term.push(list);
        }

        // Rarest term first keeps the intersection's working set small.
        postings_per_term.sort_by_key(|p| p.len());

        match mode {
            SearchMode::Boolean => self.search_boolean(postings_per_term, limit),
            SearchMode::Full => self.search_ranked(postings_per_term, limit),
        }
    }

    fn search_boolean(&mut self, postings_per_term: Vec<Vec<Posting>>, limit: usize) -> Result<Vec<SearchHit>, SearchError> {
        let candidates = intersect_all(&postings_per_term);
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let mut hits = Vec::with_capacity(limit.min(candidates.len()));
        for &doc_id in candidates.iter().take(limit) {
            let (doc_key, file_path) = self.doc_store.get(doc_id)?;
            hits.push(SearchHit {
                doc_key,
                file_path,
                score: 0.0,
            });
        }
        Ok(hits)
    }

    fn search_ranked(&mut self, postings_per_term: Vec<Vec<Posting>>, limit: usize) -> Result<Vec<SearchHit>, SearchError> {
        let candidates = intersect_all(&postings_per_term);
        if candidates.is_empty() {
            return Ok(Vec::new());
        }
        let candidate_set: std::collections::BTreeSet<u32> = candidates.into_iter().collect();

        let n = self.meta.doc_count;
        // Only the literal spec formula's division-by-zero case is guarded;
        // a genuine sub-1.0 average (e.g. mostly-empty docs) is left as-is.
        let avg_doc_len = if self.meta.avg_doc_len <= 0.0 { 1.0 } else { self.meta.avg_doc_len };

        let mut scores: std::collections::BTreeMap<u32, f64> = std::collections::BTreeMap::new();
        for list in &postings_per_term {
            let df = list.len() as u64;
            let idf = idf(n, df);
            for posting in list {
                if !candidate_set.contains(&posting.doc_id) {
                    continue;
                }
                let Some(dl) = self.doc_store.doc_len(posting.doc_id) else {
                    continue;
                };
                let tf = posting.tf as f64;
                let denom = tf + K1 * (1.0 - B + B * (dl as f64) / avg_doc_len);
                let contribution = idf * (tf * (K1 + 1.0)) / denom;
                *scores.entry(posting.doc_id).or_insert(0.0) += contribution;
            }
        }

        let mut heap: BinaryHeap<ScoredDoc> = BinaryHeap::with_capacity(limit + 1);
        for (doc_id, score) in scores {
            heap.push(ScoredDoc { doc_id, score });
            if heap.len() > limit {
                heap.pop();
            }
        }

        let mut ranked: Vec<ScoredDoc> = heap.into_vec();
        ranked.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then(a.doc_id.cmp(&b.doc_id))
        });

        let mut hits = Vec::with_capacity(ranked.len());
        for scored in ranked {
            let (doc_key, file_path) = self.doc_store.get(scored.doc_id)?;
            hits.push(SearchHit {
                doc_key,
                file_path,
                score: scored.score,
            });
        }
        Ok(hits)
    }
}

fn idf(n: u64, df: u64) -> f64 {
    (((n.saturating_sub(df)) as f64 + 0.5) / (df as f64 + 0.5) + 1.0).ln()
}

fn intersect_sorted(a: &[u32], b: &[Posting]) -> Vec<u32> {
    let mut out = Vec::new();
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j].doc_id) {
            Ordering::Equal => {
                out.push(a[i]);
                i += 1;
                j += 1;
            }
            Ordering::Less => i += 1,
            Ordering::Greater => j += 1,
        }
    }
    out
}

/// Intersect every term's posting list down to the doc-ids present in all
/// of them. `postings_per_term` is assumed sorted rarest-first, so the
/// running candidate set only shrinks as each subsequent list is merged in.
fn intersect_all(postings_per_term: &[Vec<Posting>]) -> Vec<u32> {
    let mut candidates: Vec<u32> = postings_per_term[0].iter().map(|p| p.doc_id).collect();
    for list in &postings_per_term[1..] {
        candidates = intersect_sorted(&candidates, list);
        if candidates.is_empty() {
            break;
        }
    }
    candidates
}

/// Min-ordered by score so a bounded `BinaryHeap` can evict the weakest
/// candidate once it grows past `limit`. Ties break on doc-id, with lower
/// doc-ids treated as "weaker" so the eventual output tie-breaks ascending.
#[derive(Debug, Clone, Copy, PartialEq)]
struct ScoredDoc {
    doc_id: u32,
    score: f64,
}

impl Eq for ScoredDoc {}

impl Ord for ScoredDoc {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .score
            .partial_cmp(&self.score)
            .unwrap_or(Ordering::Equal)
            .then(other.doc_id.cmp(&self.doc_id))
    }
}

impl PartialOrd for ScoredDoc {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
