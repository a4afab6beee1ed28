use std::{cmp::Ordering, cmp::Reverse, collections::BinaryHeap};

use crate::{
    query::inverted_list::{INF_DOCID, InvertedList},
    shared::error::Result,
};

#[derive(Debug, PartialEq)]
struct ScoredDoc {
    score: f32,
    doc_id: u64,
}

impl Eq for ScoredDoc {}

impl Ord for ScoredDoc {
    fn cmp(&self, other: &Self) -> Ordering {
        self.score
            .total_cmp(&other.score)
            .then_with(|| self.doc_id.cmp(&other.doc_id))
    }
}

impl PartialOrd for ScoredDoc {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

type TopK = BinaryHeap<Reverse<ScoredDoc>>;

/// Keep at most k highest-scoring documents in the min-heap.
fn check_push_topk(heap: &mut TopK, doc_id: u64, score: f32, k: usize) {
    if heap.len() < k {
        heap.push(Reverse(ScoredDoc { score, doc_id }));
    } else if heap
        .peek()
        .is_some_and(|Reverse(worst)| score > worst.score)
    {
        heap.pop();
        heap.push(Reverse(ScoredDoc { score, doc_id }));
    }
}

/// The pruning threshold: the k-th best score, or 0 while the heap is not
/// yet full.
fn min_score_in_heap(heap: &TopK, k: usize) -> f32 {
    if heap.len() < k {
        return 0.0;
    }
    heap.peek().map_or(0.0, |Reverse(worst)| worst.score)
}

/// Ranked results sorted by (score desc, docID asc).
fn drain_topk(heap: TopK) -> Vec<(u64, f32)> {
    let mut ranked: Vec<(u64, f32)> = heap
        .into_iter()
        .map(|Reverse(doc)| (doc.doc_id, doc.score))
        .collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked
}

/// Conjunctive (AND) document-at-a-time traversal. The shortest list leads;
/// once any cursor exhausts, no further document can match every term.
pub fn daat_conjunctive(lists: &mut [InvertedList], k: usize) -> Result<Vec<(u64, f32)>> {
    if lists.is_empty() {
        return Ok(Vec::new());
    }
    if lists.len() > 1 {
        lists.sort_by_key(|lp| lp.df);
    }

    let mut heap = TopK::new();
    loop {
        if lists.iter().any(|lp| lp.doc_id >= INF_DOCID) {
            break;
        }
        let target = lists.iter().map(|lp| lp.doc_id).max().expect("non-empty");

        for lp in lists.iter_mut() {
            if lp.doc_id < target {
                lp.next_geq(target)?;
            }
        }

        if lists.iter().all(|lp| lp.doc_id == target) {
            let score = lists.iter().map(|lp| lp.get_score(target)).sum();
            check_push_topk(&mut heap, target, score, k);
            for lp in lists.iter_mut() {
                lp.next_geq(target + 1)?;
            }
        }
    }
    Ok(drain_topk(heap))
}

/// Disjunctive (OR) traversal with the MaxScore optimization: a candidate
/// whose summed per-term upper bound cannot reach the current threshold is
/// skipped without scoring.
pub fn daat_disjunctive_maxscore(lists: &mut [InvertedList], k: usize) -> Result<Vec<(u64, f32)>> {
    if lists.is_empty() {
        return Ok(Vec::new());
    }
    lists.sort_by(|a, b| b.max_score.total_cmp(&a.max_score));

    let mut heap = TopK::new();
    loop {
        let current = lists.iter().map(|lp| lp.doc_id).min().expect("non-empty");
        if current >= INF_DOCID {
            break;
        }

        let upper_bound: f32 = lists
            .iter()
            .filter(|lp| lp.doc_id <= current)
            .map(|lp| lp.max_score)
            .sum();

        if upper_bound < min_score_in_heap(&heap, k) {
            for lp in lists.iter_mut() {
                if lp.doc_id == current {
                    lp.next_geq(current + 1)?;
                }
            }
            continue;
        }

        let mut score = 0.0;
        for lp in lists.iter() {
            if lp.doc_id == current {
                score += lp.get_score(current);
            }
        }
        check_push_topk(&mut heap, current, score, k);

        for lp in lists.iter_mut() {
            if lp.doc_id == current {
                lp.next_geq(current + 1)?;
            }
        }
    }
    Ok(drain_topk(heap))
}

/// Disjunctive (OR) traversal with Block-Max WAND: per-block BM25 upper
/// bounds let whole blocks be skipped when even their sum cannot beat the
/// current threshold.
pub fn daat_disjunctive_blockmax_wand(
    lists: &mut [InvertedList],
    k: usize,
) -> Result<Vec<(u64, f32)>> {
    if lists.is_empty() {
        return Ok(Vec::new());
    }
    lists.sort_by(|a, b| b.max_score.total_cmp(&a.max_score));

    let mut heap = TopK::new();
    loop {
        let pivot = lists.iter().map(|lp| lp.doc_id).min().expect("non-empty");
        if pivot >= INF_DOCID {
            break;
        }

        let ub: f32 = lists
            .iter()
            .filter(|lp| lp.doc_id < INF_DOCID)
            .map(|lp| lp.curr_block_max())
            .sum();

        if ub < min_score_in_heap(&heap, k) {
            // skip the current block of the smallest-docID list
            let smallest = lists
                .iter_mut()
                .filter(|lp| lp.doc_id < INF_DOCID)
                .min_by_key(|lp| lp.doc_id)
                .expect("pivot is finite");
            smallest.advance_to_next_block()?;
            continue;
        }

        let mut score = 0.0;
        for lp in lists.iter() {
            if lp.doc_id == pivot {
                score += lp.get_score(pivot);
            }
        }
        check_push_topk(&mut heap, pivot, score, k);

        for lp in lists.iter_mut() {
            if lp.doc_id == pivot {
                lp.next_geq(pivot + 1)?;
            }
        }
    }
    Ok(drain_topk(heap))
}
