use std::path::{Path, PathBuf};

// Parser configs
pub const CHUNK_SIZE: usize = 2_000_000; // postings buffered before a chunk is cut
pub const MAX_DOCS: Option<usize> = None; // for testing

// Indexer configs
pub const BLOCK_SIZE: usize = 128; // postings per compressed block

// Query processor configs
pub const DEFAULT_TOP_K: usize = 20;
pub const LIST_CACHE_CAPACITY: usize = 10; // open cursors kept across queries

// Top level data directory
pub const DATA_DIR: &str = "data";

// Raw dataset file (MS MARCO collection.tsv)
pub const RAW_DATA_PATH: &str = "data/raw/collection.tsv";

// Output directories
pub const POSTINGS_DIR: &str = "data/postings"; // intermediate postings
pub const INDEX_DIR: &str = "data/index"; // final index

pub fn get_inverted_index_path<P: AsRef<Path>>(dir: P) -> PathBuf {
    dir.as_ref().join("inverted_index.bin")
}

pub fn get_lexicon_path<P: AsRef<Path>>(dir: P) -> PathBuf {
    dir.as_ref().join("lexicon.json")
}

pub fn get_page_table_path<P: AsRef<Path>>(dir: P) -> PathBuf {
    dir.as_ref().join("page_table.json")
}

pub fn get_collection_stats_path<P: AsRef<Path>>(dir: P) -> PathBuf {
    dir.as_ref().join("collection_stats.json")
}
