use std::{
    collections::BTreeMap,
    fs::{self, File},
    io::{BufWriter, Seek, Write},
    path::Path,
};

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::{
    indexer::merge::ChunkMerger,
    scoring::bm_25::{BM25Params, compute_idf, compute_tf_bm25},
    shared::{
        compression::varbyte_encode,
        config::{
            get_collection_stats_path, get_inverted_index_path, get_lexicon_path,
            get_page_table_path,
        },
        error::{Result, SearchError},
    },
};

/// Per-block metadata recorded in the lexicon. `last_doc_id` drives block
/// skipping, `block_max_score` is the block's BM25 upper bound.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BlockMeta {
    pub offset: u64,
    pub bytes_block: u64,
    pub bytes_doc_ids: u64,
    pub bytes_freqs: u64,
    pub last_doc_id: u64,
    pub block_max_score: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LexiconEntry {
    pub offset: u64,
    pub df: u64,
    pub block_count: u64,
    pub blocks: Vec<BlockMeta>,
    pub bytes: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PageTableEntry {
    pub length: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CollectionStats {
    pub total_docs: u64,
    pub avg_len: f32,
}

/*
 Merges the sorted chunk files into the final index. Two passes over the
 merged stream: the first builds the page table and the collection stats,
 the second cuts each term's postings into fixed-size compressed blocks and
 writes them, so every block_max_score and write-time idf uses the final
 total_docs and avg_len rather than a running estimate.

 Outputs:
   - inverted_index.bin : per block, varbyte(docID gaps) || varbyte(freqs)
   - lexicon.json       : term -> { offset, df, block_count, blocks, bytes }
   - page_table.json    : docID -> { length }
   - collection_stats.json : { total_docs, avg_len }
*/
pub fn run_indexer(input_dir: &Path, output_dir: &Path, block_size: usize) -> Result<()> {
    fs::create_dir_all(output_dir)?;
    let inverted_index_path = get_inverted_index_path(output_dir);

    // Pass 1: page table and collection stats
    let mut page_table: FxHashMap<u64, u32> = FxHashMap::default();
    let mut total_len: u64 = 0;
    let merger = ChunkMerger::new(input_dir)?;
    println!("[Indexer] Merging {} chunk files...", merger.chunk_count());
    for posting in merger {
        let posting = posting?;
        *page_table.entry(posting.doc_id).or_insert(0) += posting.tf;
        total_len += posting.tf as u64;
    }
    let total_docs = page_table.len() as u64;
    let avg_len = if total_docs > 0 {
        (total_len as f64 / total_docs as f64) as f32
    } else {
        1.0
    };

    // Pass 2: group the re-merged stream by term and write blocks
    let mut lexicon: BTreeMap<String, LexiconEntry> = BTreeMap::new();
    let mut index_file = BufWriter::new(File::create(&inverted_index_path)?);
    let params = BM25Params::default();

    let mut current_term = String::new();
    let mut current_offset: u64 = 0;
    let mut doc_ids: Vec<u64> = Vec::new();
    let mut freqs: Vec<u32> = Vec::new();
    let mut postings_seen: u64 = 0;

    for posting in ChunkMerger::new(input_dir)? {
        let posting = posting?;
        postings_seen += 1;
        if postings_seen % 1_000_000 == 0 {
            println!("[Indexer] {} postings merged", postings_seen);
        }

        // Flush previous term when encountering a new one
        if !current_term.is_empty() && posting.term != current_term {
            current_offset += write_term(
                &mut index_file,
                &mut lexicon,
                block_size,
                &current_term,
                current_offset,
                &doc_ids,
                &freqs,
                &page_table,
                total_docs,
                avg_len,
                &params,
            )?;
            doc_ids.clear();
            freqs.clear();
        }

        // Duplicate (term, docID) records across chunks collapse into one
        // posting with the summed tf
        if posting.term == current_term && doc_ids.last() == Some(&posting.doc_id) {
            if let Some(last_tf) = freqs.last_mut() {
                *last_tf += posting.tf;
            }
        } else {
            doc_ids.push(posting.doc_id);
            freqs.push(posting.tf);
        }
        current_term = posting.term;
    }

    // Flush last term after the merge completes
    if !current_term.is_empty() {
        write_term(
            &mut index_file,
            &mut lexicon,
            block_size,
            &current_term,
            current_offset,
            &doc_ids,
            &freqs,
            &page_table,
            total_docs,
            avg_len,
            &params,
        )?;
    }
    index_file.flush()?;
    let index_size = index_file.get_mut().stream_position()?;

    write_json(&get_lexicon_path(output_dir), &lexicon)?;

    let page_table_on_disk: BTreeMap<u64, PageTableEntry> = page_table
        .into_iter()
        .map(|(doc_id, length)| (doc_id, PageTableEntry { length }))
        .collect();
    write_json(&get_page_table_path(output_dir), &page_table_on_disk)?;

    let collection_stats = CollectionStats {
        total_docs,
        avg_len,
    };
    write_json(&get_collection_stats_path(output_dir), &collection_stats)?;

    println!(
        "[Indexer] Wrote {} terms, {} docs | avg_len={:.2} | index_size={:.2} MB",
        lexicon.len(),
        total_docs,
        avg_len,
        index_size as f64 / (1024.0 * 1024.0)
    );
    Ok(())
}

/// Write one term's postings as fixed-size compressed blocks and record the
/// lexicon entry. Returns the number of bytes written.
fn write_term(
    index_file: &mut BufWriter<File>,
    lexicon: &mut BTreeMap<String, LexiconEntry>,
    block_size: usize,
    term: &str,
    offset: u64,
    doc_ids: &[u64],
    freqs: &[u32],
    page_table: &FxHashMap<u64, u32>,
    total_docs: u64,
    avg_len: f32,
    params: &BM25Params,
) -> Result<u64> {
    if doc_ids.is_empty() {
        return Ok(0);
    }

    let df = doc_ids.len() as u64;
    let idf = compute_idf(total_docs, df);

    let mut blocks_meta: Vec<BlockMeta> = Vec::new();
    let mut current_offset = offset;
    let mut total_bytes: u64 = 0;

    for (block_doc_ids, block_freqs) in doc_ids
        .chunks(block_size.max(1))
        .zip(freqs.chunks(block_size.max(1)))
    {
        let (encoded_doc_ids, encoded_freqs) = encode_postings(block_doc_ids, block_freqs);
        index_file.write_all(&encoded_doc_ids)?;
        index_file.write_all(&encoded_freqs)?;

        let bytes_doc_ids = encoded_doc_ids.len() as u64;
        let bytes_freqs = encoded_freqs.len() as u64;
        let bytes_block = bytes_doc_ids + bytes_freqs;

        let mut block_max_score: f32 = 0.0;
        for (&doc_id, &tf) in block_doc_ids.iter().zip(block_freqs) {
            let doc_len = page_table.get(&doc_id).copied().unwrap_or(1);
            let score = idf * compute_tf_bm25(tf, doc_len, avg_len, params);
            if score > block_max_score {
                block_max_score = score;
            }
        }

        blocks_meta.push(BlockMeta {
            offset: current_offset,
            bytes_block,
            bytes_doc_ids,
            bytes_freqs,
            last_doc_id: *block_doc_ids.last().expect("non-empty block"),
            block_max_score,
        });
        current_offset += bytes_block;
        total_bytes += bytes_block;
    }

    lexicon.insert(
        term.to_string(),
        LexiconEntry {
            offset,
            df,
            block_count: blocks_meta.len() as u64,
            blocks: blocks_meta,
            bytes: total_bytes,
        },
    );
    Ok(total_bytes)
}

/// Gap-encode docIDs (first absolute, the rest differences to the previous
/// docID in the same block) and varbyte both sequences.
fn encode_postings(doc_ids: &[u64], freqs: &[u32]) -> (Vec<u8>, Vec<u8>) {
    let mut gaps = Vec::with_capacity(doc_ids.len());
    let mut last_doc_id = 0;
    for (i, &doc_id) in doc_ids.iter().enumerate() {
        if i == 0 {
            gaps.push(doc_id);
        } else {
            gaps.push(doc_id - last_doc_id);
        }
        last_doc_id = doc_id;
    }
    let freqs_wide: Vec<u64> = freqs.iter().map(|&tf| tf as u64).collect();
    (varbyte_encode(&gaps), varbyte_encode(&freqs_wide))
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let mut file = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut file, value)
        .map_err(|e| SearchError::Format(e.to_string()))?;
    file.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::compression::varbyte_decode;
    use std::io::Read;
    use tempfile::tempdir;

    fn write_chunk_file(dir: &Path, name: &str, lines: &[&str]) {
        let mut file = File::create(dir.join(name)).unwrap();
        for line in lines {
            writeln!(file, "{}", line).unwrap();
        }
    }

    fn load_lexicon(index_dir: &Path) -> BTreeMap<String, LexiconEntry> {
        let file = File::open(get_lexicon_path(index_dir)).unwrap();
        serde_json::from_reader(file).unwrap()
    }

    fn load_page_table(index_dir: &Path) -> BTreeMap<u64, PageTableEntry> {
        let file = File::open(get_page_table_path(index_dir)).unwrap();
        serde_json::from_reader(file).unwrap()
    }

    fn load_stats(index_dir: &Path) -> CollectionStats {
        let file = File::open(get_collection_stats_path(index_dir)).unwrap();
        serde_json::from_reader(file).unwrap()
    }

    #[test]
    fn test_single_term_two_blocks() {
        let dir = tempdir().unwrap();
        let postings_dir = dir.path().join("postings");
        let index_dir = dir.path().join("index");
        fs::create_dir_all(&postings_dir).unwrap();
        write_chunk_file(
            &postings_dir,
            "chunk0.txt",
            &["t 1 1", "t 2 2", "t 130 1", "t 131 3"],
        );

        run_indexer(&postings_dir, &index_dir, 2).unwrap();

        let lexicon = load_lexicon(&index_dir);
        let entry = &lexicon["t"];
        assert_eq!(entry.df, 4);
        assert_eq!(entry.block_count, 2);
        assert_eq!(entry.offset, 0);
        assert_eq!(entry.blocks[0].last_doc_id, 2);
        assert_eq!(entry.blocks[1].last_doc_id, 131);
        assert_eq!(
            entry.bytes,
            entry.blocks.iter().map(|b| b.bytes_block).sum::<u64>()
        );

        // blocks are laid out contiguously
        assert_eq!(
            entry.blocks[1].offset,
            entry.blocks[0].offset + entry.blocks[0].bytes_block
        );

        // decode the raw index file: gaps restart at every block
        let mut raw = Vec::new();
        File::open(get_inverted_index_path(&index_dir))
            .unwrap()
            .read_to_end(&mut raw)
            .unwrap();
        let block0 = &entry.blocks[0];
        let gaps0 = varbyte_decode(&raw[0..block0.bytes_doc_ids as usize]).unwrap();
        assert_eq!(gaps0, vec![1, 1]);
        let block1 = &entry.blocks[1];
        let start1 = block1.offset as usize;
        let gaps1 = varbyte_decode(&raw[start1..start1 + block1.bytes_doc_ids as usize]).unwrap();
        assert_eq!(gaps1, vec![130, 1]);

        let stats = load_stats(&index_dir);
        assert_eq!(stats.total_docs, 4);
        assert!((stats.avg_len - 1.75).abs() < 1e-6);
    }

    #[test]
    fn test_block_count_matches_ceil_df_over_block_size() {
        let dir = tempdir().unwrap();
        let postings_dir = dir.path().join("postings");
        let index_dir = dir.path().join("index");
        fs::create_dir_all(&postings_dir).unwrap();

        let lines: Vec<String> = (1..=300).map(|d| format!("w {} 1", d)).collect();
        let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
        write_chunk_file(&postings_dir, "chunk0.txt", &refs);

        run_indexer(&postings_dir, &index_dir, 128).unwrap();

        let lexicon = load_lexicon(&index_dir);
        let entry = &lexicon["w"];
        assert_eq!(entry.df, 300);
        assert_eq!(entry.block_count, 3); // ceil(300 / 128)
        // successive blocks strictly increase in last_doc_id
        for pair in entry.blocks.windows(2) {
            assert!(pair[0].last_doc_id < pair[1].last_doc_id);
        }
    }

    #[test]
    fn test_page_table_sums_term_frequencies() {
        let dir = tempdir().unwrap();
        let postings_dir = dir.path().join("postings");
        let index_dir = dir.path().join("index");
        fs::create_dir_all(&postings_dir).unwrap();
        write_chunk_file(
            &postings_dir,
            "chunk0.txt",
            &["alpha 1 2", "beta 1 3", "beta 2 1"],
        );

        run_indexer(&postings_dir, &index_dir, 128).unwrap();

        let page_table = load_page_table(&index_dir);
        assert_eq!(page_table[&1].length, 5);
        assert_eq!(page_table[&2].length, 1);

        let stats = load_stats(&index_dir);
        assert_eq!(stats.total_docs, 2);
        assert!((stats.avg_len - 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_duplicate_postings_are_merged() {
        let dir = tempdir().unwrap();
        let postings_dir = dir.path().join("postings");
        let index_dir = dir.path().join("index");
        fs::create_dir_all(&postings_dir).unwrap();
        write_chunk_file(&postings_dir, "chunk0.txt", &["dup 5 1"]);
        write_chunk_file(&postings_dir, "chunk1.txt", &["dup 5 3"]);

        run_indexer(&postings_dir, &index_dir, 128).unwrap();

        let lexicon = load_lexicon(&index_dir);
        assert_eq!(lexicon["dup"].df, 1);

        // the merged posting carries the summed tf
        let mut raw = Vec::new();
        File::open(get_inverted_index_path(&index_dir))
            .unwrap()
            .read_to_end(&mut raw)
            .unwrap();
        let block = &lexicon["dup"].blocks[0];
        let split = block.bytes_doc_ids as usize;
        assert_eq!(varbyte_decode(&raw[..split]).unwrap(), vec![5]);
        assert_eq!(
            varbyte_decode(&raw[split..split + block.bytes_freqs as usize]).unwrap(),
            vec![4]
        );

        let page_table = load_page_table(&index_dir);
        assert_eq!(page_table[&5].length, 4);
    }

    #[test]
    fn test_block_max_score_bounds_every_posting() {
        let dir = tempdir().unwrap();
        let postings_dir = dir.path().join("postings");
        let index_dir = dir.path().join("index");
        fs::create_dir_all(&postings_dir).unwrap();
        write_chunk_file(
            &postings_dir,
            "chunk0.txt",
            &["q 1 1", "q 2 7", "q 3 2", "r 1 1", "r 3 5"],
        );

        run_indexer(&postings_dir, &index_dir, 2).unwrap();

        let lexicon = load_lexicon(&index_dir);
        let page_table = load_page_table(&index_dir);
        let stats = load_stats(&index_dir);
        let params = BM25Params::default();

        let postings = [("q", 1u64, 1u32), ("q", 2, 7), ("q", 3, 2), ("r", 1, 1), ("r", 3, 5)];
        for (term, doc_id, tf) in postings {
            let entry = &lexicon[term];
            let idf = compute_idf(stats.total_docs, entry.df);
            let score = idf
                * compute_tf_bm25(tf, page_table[&doc_id].length, stats.avg_len, &params);
            let block = entry
                .blocks
                .iter()
                .find(|b| b.last_doc_id >= doc_id)
                .unwrap();
            assert!(block.block_max_score >= score - 1e-6);
        }
    }

    #[test]
    fn test_empty_postings_directory() {
        let dir = tempdir().unwrap();
        let postings_dir = dir.path().join("postings");
        let index_dir = dir.path().join("index");
        fs::create_dir_all(&postings_dir).unwrap();

        run_indexer(&postings_dir, &index_dir, 128).unwrap();

        assert!(load_lexicon(&index_dir).is_empty());
        assert!(load_page_table(&index_dir).is_empty());
        let stats = load_stats(&index_dir);
        assert_eq!(stats.total_docs, 0);
        assert!((stats.avg_len - 1.0).abs() < 1e-6);
    }
}
