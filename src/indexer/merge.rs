use std::{
    cmp::{Ordering, Reverse},
    collections::BinaryHeap,
    fs::{self, File},
    io::{BufRead, BufReader, Lines},
    path::Path,
};

use crate::shared::error::Result;

/// One record of the merged posting stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Posting {
    pub term: String,
    pub doc_id: u64,
    pub tf: u32,
}

#[derive(PartialEq, Eq)]
struct HeapEntry {
    term: String,
    doc_id: u64,
    tf: u32,
    file_idx: usize,
}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.term
            .cmp(&other.term)
            .then_with(|| self.doc_id.cmp(&other.doc_id))
            .then_with(|| self.file_idx.cmp(&other.file_idx))
    }
}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/*
 Multi-way merge over the sorted chunk files. Every `.txt` chunk in the
 postings directory is opened (file-name order, for determinism) and its
 first record seeds a min-heap keyed by (term, docID, file index). Each
 `next()` pops the smallest record and refills the heap from the same file,
 so the merged stream is produced lazily, one posting per consumer demand.
 Chunk files close when the merger is dropped.
*/
pub struct ChunkMerger {
    readers: Vec<Lines<BufReader<File>>>,
    heap: BinaryHeap<Reverse<HeapEntry>>,
}

impl ChunkMerger {
    pub fn new(postings_dir: &Path) -> Result<ChunkMerger> {
        let mut chunk_paths = Vec::new();
        for entry in fs::read_dir(postings_dir)? {
            let path = entry?.path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == "txt") {
                chunk_paths.push(path);
            }
        }
        chunk_paths.sort();

        let mut merger = ChunkMerger {
            readers: Vec::with_capacity(chunk_paths.len()),
            heap: BinaryHeap::with_capacity(chunk_paths.len()),
        };
        for path in &chunk_paths {
            let reader = BufReader::new(File::open(path)?);
            merger.readers.push(reader.lines());
            let file_idx = merger.readers.len() - 1;
            merger.refill(file_idx)?;
        }
        Ok(merger)
    }

    /// Number of chunk files under merge.
    pub fn chunk_count(&self) -> usize {
        self.readers.len()
    }

    // Pull lines from one file until a well-formed posting is found,
    // skipping malformed records.
    fn refill(&mut self, file_idx: usize) -> Result<()> {
        while let Some(line) = self.readers[file_idx].next() {
            let line = line?;
            if let Some((term, doc_id, tf)) = parse_posting_line(&line) {
                self.heap.push(Reverse(HeapEntry {
                    term,
                    doc_id,
                    tf,
                    file_idx,
                }));
                return Ok(());
            }
        }
        Ok(())
    }
}

fn parse_posting_line(line: &str) -> Option<(String, u64, u32)> {
    let mut fields = line.split_whitespace();
    let term = fields.next()?;
    let doc_id = fields.next()?.parse().ok()?;
    let tf = fields.next()?.parse().ok()?;
    if fields.next().is_some() {
        return None;
    }
    Some((term.to_string(), doc_id, tf))
}

impl Iterator for ChunkMerger {
    type Item = Result<Posting>;

    fn next(&mut self) -> Option<Self::Item> {
        let Reverse(entry) = self.heap.pop()?;
        if let Err(e) = self.refill(entry.file_idx) {
            return Some(Err(e));
        }
        Some(Ok(Posting {
            term: entry.term,
            doc_id: entry.doc_id,
            tf: entry.tf,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    fn write_chunk_file(dir: &Path, name: &str, lines: &[&str]) {
        let mut file = File::create(dir.join(name)).unwrap();
        for line in lines {
            writeln!(file, "{}", line).unwrap();
        }
    }

    fn collect_postings(dir: &Path) -> Vec<(String, u64, u32)> {
        ChunkMerger::new(dir)
            .unwrap()
            .map(|p| {
                let p = p.unwrap();
                (p.term, p.doc_id, p.tf)
            })
            .collect()
    }

    #[test]
    fn test_two_chunk_merge_order() {
        let dir = tempdir().unwrap();
        write_chunk_file(dir.path(), "chunk0.txt", &["a 1 1", "b 2 1"]);
        write_chunk_file(dir.path(), "chunk1.txt", &["a 3 1", "c 5 1"]);

        assert_eq!(
            collect_postings(dir.path()),
            vec![
                ("a".to_string(), 1, 1),
                ("a".to_string(), 3, 1),
                ("b".to_string(), 2, 1),
                ("c".to_string(), 5, 1),
            ]
        );
    }

    #[test]
    fn test_empty_directory() {
        let dir = tempdir().unwrap();
        let mut merger = ChunkMerger::new(dir.path()).unwrap();
        assert_eq!(merger.chunk_count(), 0);
        assert!(merger.next().is_none());
    }

    #[test]
    fn test_malformed_lines_are_skipped() {
        let dir = tempdir().unwrap();
        write_chunk_file(
            dir.path(),
            "chunk0.txt",
            &["a 1 1", "garbage", "b notanint 1", "b 2 too many fields", "c 3 2"],
        );

        assert_eq!(
            collect_postings(dir.path()),
            vec![("a".to_string(), 1, 1), ("c".to_string(), 3, 2)]
        );
    }

    #[test]
    fn test_stream_is_non_decreasing() {
        let dir = tempdir().unwrap();
        write_chunk_file(dir.path(), "chunk0.txt", &["ant 2 1", "bee 9 1", "cow 1 4"]);
        write_chunk_file(dir.path(), "chunk1.txt", &["ant 7 2", "bee 1 1"]);
        write_chunk_file(dir.path(), "chunk2.txt", &["ant 4 1", "zed 3 1"]);

        let merged = collect_postings(dir.path());
        assert_eq!(merged.len(), 7);
        for pair in merged.windows(2) {
            assert!((&pair[0].0, pair[0].1) <= (&pair[1].0, pair[1].1));
        }
    }

    #[test]
    fn test_ties_emitted_in_file_order() {
        let dir = tempdir().unwrap();
        write_chunk_file(dir.path(), "chunk0.txt", &["dup 5 1"]);
        write_chunk_file(dir.path(), "chunk1.txt", &["dup 5 3"]);

        assert_eq!(
            collect_postings(dir.path()),
            vec![("dup".to_string(), 5, 1), ("dup".to_string(), 5, 3)]
        );
    }
}
