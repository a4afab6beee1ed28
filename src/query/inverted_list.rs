use std::{
    fs::File,
    io::{Read, Seek, SeekFrom},
    sync::Arc,
};

use rustc_hash::FxHashMap;

use crate::{
    indexer::indexer::BlockMeta,
    query::startup::QueryStartupContext,
    scoring::bm_25::{BM25Params, compute_idf, compute_tf_bm25},
    shared::{compression::varbyte_decode, error::Result},
};

/// Sentinel docID marking an exhausted cursor.
pub const INF_DOCID: u64 = 1 << 62;

/*
 A lazily-paged cursor over one term's posting list. Only the current block
 is decoded; the lexicon's per-block last_doc_id lets nextGEQ skip whole
 blocks without touching the index file. The cursor owns its file handle
 for its lifetime.
*/
pub struct InvertedList {
    pub term: String,
    file: File,
    blocks: Vec<BlockMeta>,
    block_last_doc_ids: Vec<u64>,
    block_max_scores: Vec<f32>,
    pub max_score: f32,
    curr_block_idx: usize,
    curr_block_doc_ids: Vec<u64>,
    curr_block_freqs: Vec<u64>,
    curr_idx: usize,
    /// Current docID, or `INF_DOCID` once the list is exhausted.
    pub doc_id: u64,
    pub df: u64,
    idf: f32,
    page_table: Arc<FxHashMap<u64, u32>>,
    avg_len: f32,
    params: BM25Params,
}

impl InvertedList {
    /// Open a cursor for `term`. Returns `Ok(None)` when the term is absent
    /// from the lexicon; the caller drops it from the query.
    pub fn open(
        term: &str,
        ctx: &QueryStartupContext,
        params: BM25Params,
    ) -> Result<Option<InvertedList>> {
        let Some(term_meta) = ctx.lexicon.get(term) else {
            return Ok(None);
        };

        let block_last_doc_ids: Vec<u64> =
            term_meta.blocks.iter().map(|b| b.last_doc_id).collect();
        let block_max_scores: Vec<f32> =
            term_meta.blocks.iter().map(|b| b.block_max_score).collect();
        let max_score = block_max_scores.iter().copied().fold(0.0_f32, f32::max);

        let mut list = InvertedList {
            term: term.to_string(),
            file: File::open(&ctx.index_path)?,
            blocks: term_meta.blocks.clone(),
            block_last_doc_ids,
            block_max_scores,
            max_score,
            curr_block_idx: 0,
            curr_block_doc_ids: Vec::new(),
            curr_block_freqs: Vec::new(),
            curr_idx: 0,
            doc_id: INF_DOCID,
            df: term_meta.df,
            idf: compute_idf(ctx.total_docs, term_meta.df),
            page_table: Arc::clone(&ctx.page_table),
            avg_len: ctx.avg_len,
            params,
        };
        if !list.blocks.is_empty() {
            list.load_block(0)?;
        }
        Ok(Some(list))
    }

    /// Read and decode one block from disk into the cursor.
    fn load_block(&mut self, block_idx: usize) -> Result<()> {
        let block = &self.blocks[block_idx];
        self.file.seek(SeekFrom::Start(block.offset))?;

        let mut encoded_doc_ids = vec![0u8; block.bytes_doc_ids as usize];
        self.file.read_exact(&mut encoded_doc_ids)?;
        let mut encoded_freqs = vec![0u8; block.bytes_freqs as usize];
        self.file.read_exact(&mut encoded_freqs)?;

        let mut doc_ids = varbyte_decode(&encoded_doc_ids)?;
        // gap form to absolute docIDs
        for i in 1..doc_ids.len() {
            doc_ids[i] += doc_ids[i - 1];
        }
        self.curr_block_doc_ids = doc_ids;
        self.curr_block_freqs = varbyte_decode(&encoded_freqs)?;

        self.curr_block_idx = block_idx;
        self.curr_idx = 0;
        self.doc_id = self.curr_block_doc_ids.first().copied().unwrap_or(INF_DOCID);
        Ok(())
    }

    /// Reposition to the first posting.
    pub fn reset(&mut self) -> Result<()> {
        if self.blocks.is_empty() {
            self.doc_id = INF_DOCID;
            return Ok(());
        }
        self.load_block(0)
    }

    /// Advance to the smallest remaining docID >= k, or `INF_DOCID` if none.
    /// Whole blocks whose last_doc_id < k are skipped without decoding;
    /// within the target block a galloping search runs from the current
    /// position. Monotone until `reset`.
    pub fn next_geq(&mut self, k: u64) -> Result<u64> {
        if self.doc_id >= k {
            return Ok(self.doc_id);
        }

        let mut target_block = self.curr_block_idx;
        while target_block < self.blocks.len() && self.block_last_doc_ids[target_block] < k {
            target_block += 1;
        }
        if target_block >= self.blocks.len() {
            self.doc_id = INF_DOCID;
            return Ok(self.doc_id);
        }
        if target_block != self.curr_block_idx {
            self.load_block(target_block)?;
        }

        // last_doc_id >= k guarantees a hit inside this block
        self.curr_idx = galloping_search(&self.curr_block_doc_ids, k, self.curr_idx);
        self.doc_id = self.curr_block_doc_ids[self.curr_idx];
        Ok(self.doc_id)
    }

    /// BM25 contribution of this term for the cursor's current posting;
    /// 0.0 if the cursor is not positioned on `doc_id`.
    pub fn get_score(&self, doc_id: u64) -> f32 {
        if self.curr_idx >= self.curr_block_doc_ids.len() {
            return 0.0;
        }
        if self.doc_id != doc_id || self.curr_block_doc_ids[self.curr_idx] != doc_id {
            return 0.0;
        }
        let tf = self.curr_block_freqs.get(self.curr_idx).copied().unwrap_or(0) as u32;
        let doc_len = self.page_table.get(&doc_id).copied().unwrap_or(1);
        self.idf * compute_tf_bm25(tf, doc_len, self.avg_len, &self.params)
    }

    /// Precomputed BM25 upper bound of the block the cursor sits in.
    pub fn curr_block_max(&self) -> f32 {
        self.block_max_scores
            .get(self.curr_block_idx)
            .copied()
            .unwrap_or(0.0)
    }

    /// Jump to the next block; the cursor lands on its first docID, or
    /// `INF_DOCID` when no block remains.
    pub fn advance_to_next_block(&mut self) -> Result<()> {
        if self.curr_block_idx + 1 < self.blocks.len() {
            self.load_block(self.curr_block_idx + 1)
        } else {
            self.doc_id = INF_DOCID;
            Ok(())
        }
    }

    /// Release the cursor. Dropping closes the underlying file handle.
    pub fn close(self) {}
}

/// Find the first index >= start whose docID is >= k, via exponential
/// probing followed by a binary search over the bracketed range.
/// Precondition: doc_ids[start..] contains such an entry.
fn galloping_search(doc_ids: &[u64], k: u64, start: usize) -> usize {
    if doc_ids[start] >= k {
        return start;
    }
    let mut lo = start; // doc_ids[lo] < k
    let mut step = 1;
    while lo + step < doc_ids.len() && doc_ids[lo + step] < k {
        lo += step;
        step *= 2;
    }
    let hi = doc_ids.len().min(lo + step + 1);
    lo + 1 + doc_ids[lo + 1..hi].partition_point(|&d| d < k)
}
