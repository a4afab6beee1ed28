use std::{str::FromStr, time::Instant};

use crate::{
    query::{
        daat::{daat_conjunctive, daat_disjunctive_blockmax_wand, daat_disjunctive_maxscore},
        inverted_list::{INF_DOCID, InvertedList},
        list_cache::InvertedListCache,
        startup::QueryStartupContext,
    },
    scoring::bm_25::BM25Params,
    shared::{
        error::{Result, SearchError},
        tokenizer::tokenize,
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryMode {
    And,
    Or,
    BwandOr,
}

impl FromStr for QueryMode {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<QueryMode> {
        match s.trim().to_lowercase().as_str() {
            "and" => Ok(QueryMode::And),
            "or" => Ok(QueryMode::Or),
            "bwand-or" => Ok(QueryMode::BwandOr),
            other => Err(SearchError::UserError(format!(
                "unknown query mode: {:?} (expected and, or, bwand-or)",
                other
            ))),
        }
    }
}

/// Open an inverted list for a term, preferring a cached cursor (which is
/// rewound before reuse). `Ok(None)` means the term is not in the lexicon.
fn open_list(
    term: &str,
    ctx: &QueryStartupContext,
    cache: &mut InvertedListCache,
) -> Result<Option<InvertedList>> {
    if let Some(mut cached) = cache.get(term) {
        cached.reset()?;
        return Ok(Some(cached));
    }
    InvertedList::open(term, ctx, BM25Params::default())
}

/// Check a cursor back into the session cache.
fn close_list(list: InvertedList, cache: &mut InvertedListCache) {
    cache.put(list.term.clone(), list);
}

/// Execute one ranked BM25 retrieval and return the top-k `(docID, score)`
/// pairs sorted by (score desc, docID asc). Prints a per-stage timing
/// breakdown.
pub fn run_query(
    ctx: &QueryStartupContext,
    cache: &mut InvertedListCache,
    query: &str,
    mode: QueryMode,
    top_k: usize,
) -> Result<Vec<(u64, f32)>> {
    let time0 = Instant::now();

    // one cursor per distinct query term present in the lexicon
    let mut terms: Vec<String> = Vec::new();
    for term in tokenize(query) {
        if !terms.contains(&term) {
            terms.push(term);
        }
    }
    let tokenize_time = time0.elapsed();

    let time1 = Instant::now();
    let mut lists: Vec<InvertedList> = Vec::new();
    for term in terms {
        match open_list(&term, ctx, cache)? {
            Some(list) if list.doc_id < INF_DOCID => lists.push(list),
            Some(list) => close_list(list, cache),
            None => {}
        }
    }
    let open_time = time1.elapsed();

    if lists.is_empty() {
        return Ok(Vec::new());
    }

    let time2 = Instant::now();
    let results = match mode {
        QueryMode::And => daat_conjunctive(&mut lists, top_k)?,
        QueryMode::Or => daat_disjunctive_maxscore(&mut lists, top_k)?,
        QueryMode::BwandOr => daat_disjunctive_blockmax_wand(&mut lists, top_k)?,
    };
    let traversal_time = time2.elapsed();

    for list in lists {
        close_list(list, cache);
    }

    println!("\n[Timing]");
    println!("  Tokenizing     : {:.4} s", tokenize_time.as_secs_f64());
    println!("  Opening lists  : {:.4} s", open_time.as_secs_f64());
    println!("  Traversal      : {:.4} s", traversal_time.as_secs_f64());
    println!("  Total          : {:.4} s", time0.elapsed().as_secs_f64());

    Ok(results)
}
