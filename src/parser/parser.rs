use std::{
    fs::{self, File},
    io::{BufRead, BufReader, BufWriter, Write},
    path::Path,
};

use rustc_hash::{FxHashMap, FxHashSet};

use crate::shared::{error::Result, tokenizer::tokenize};

/*
 Streams the raw collection (one `docID<TAB>text` record per line) and
 produces sorted posting chunks. Postings accumulate in memory as
 (term, docID, tf) triples; once the buffer grows past `chunk_size` the
 smallest `chunk_size` postings (by term, then docID) are cut into the next
 chunk file and the tail stays buffered. Chunk lines are `term docID tf`.
*/

/// Parse the corpus at `dataset_path` into chunk files under `output_dir`.
/// Malformed lines are skipped silently; i/o errors abort the stage.
/// Returns the number of documents parsed.
pub fn run_parser(
    dataset_path: &Path,
    output_dir: &Path,
    chunk_size: usize,
    max_docs: Option<usize>,
    subset_ids_path: Option<&Path>,
) -> Result<usize> {
    fs::create_dir_all(output_dir)?;

    let subset_ids = match subset_ids_path {
        Some(path) => Some(load_subset_ids(path)?),
        None => None,
    };

    let dataset_file = File::open(dataset_path)?;
    let reader = BufReader::new(dataset_file);

    let mut postings: Vec<(String, u64, u32)> = Vec::new();
    let mut chunk_id: usize = 0;
    let mut doc_count: usize = 0;

    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        // Split document into (docID, text) on the first tab
        let Some((doc_id_str, text)) = line.split_once('\t') else {
            continue;
        };
        let Ok(doc_id) = doc_id_str.trim().parse::<u64>() else {
            continue;
        };

        if let Some(ids) = &subset_ids {
            if !ids.contains(&doc_id) {
                continue;
            }
        }

        for (term, tf) in count_term_frequencies(text) {
            postings.push((term, doc_id, tf));
        }

        doc_count += 1;
        if doc_count % 100_000 == 0 {
            println!("[Parser] {} documents parsed", doc_count);
        }
        if max_docs.is_some_and(|limit| doc_count >= limit) {
            break;
        }

        // Cut full chunks off the front of the sorted buffer
        if postings.len() > chunk_size {
            postings.sort_unstable();
            while postings.len() > chunk_size {
                let rest = postings.split_off(chunk_size);
                write_chunk(&postings, output_dir, chunk_id)?;
                chunk_id += 1;
                postings = rest;
            }
        }
    }

    // Flush any remaining postings
    if !postings.is_empty() {
        postings.sort_unstable();
        for slice in postings.chunks(chunk_size.max(1)) {
            write_chunk(slice, output_dir, chunk_id)?;
            chunk_id += 1;
        }
    }

    println!("[Parser] Processed {} documents.", doc_count);
    Ok(doc_count)
}

/// Tokenize a document and count term frequencies.
fn count_term_frequencies(text: &str) -> FxHashMap<String, u32> {
    let mut freqs = FxHashMap::default();
    for token in tokenize(text) {
        *freqs.entry(token).or_insert(0) += 1;
    }
    freqs
}

// one docID per line; unparsable lines are skipped
fn load_subset_ids(path: &Path) -> Result<FxHashSet<u64>> {
    let file = File::open(path)?;
    let mut subset_ids = FxHashSet::default();
    for line in BufReader::new(file).lines() {
        let line = line?;
        if let Ok(doc_id) = line.trim().parse::<u64>() {
            subset_ids.insert(doc_id);
        }
    }
    Ok(subset_ids)
}

fn write_chunk(postings: &[(String, u64, u32)], output_dir: &Path, chunk_id: usize) -> Result<()> {
    let chunk_path = output_dir.join(format!("chunk{}.txt", chunk_id));
    let mut chunk_file = BufWriter::new(File::create(chunk_path)?);
    for (term, doc_id, tf) in postings {
        writeln!(chunk_file, "{} {} {}", term, doc_id, tf)?;
    }
    chunk_file.flush()?;
    Ok(())
}
