use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
    sync::Arc,
};

use rustc_hash::FxHashMap;
use serde::de::DeserializeOwned;

use crate::{
    indexer::indexer::{CollectionStats, LexiconEntry, PageTableEntry},
    shared::{
        config::{
            get_collection_stats_path, get_inverted_index_path, get_lexicon_path,
            get_page_table_path,
        },
        error::{Result, SearchError},
    },
};

/// Holds immutable index-wide data loaded once per query session: the
/// lexicon, the page table (docID keys coerced to integers for the hot
/// path) and the collection stats.
pub struct QueryStartupContext {
    pub index_path: PathBuf,
    pub lexicon: FxHashMap<String, LexiconEntry>,
    pub page_table: Arc<FxHashMap<u64, u32>>,
    pub total_docs: u64,
    pub avg_len: f32,
}

impl QueryStartupContext {
    pub fn new(index_dir: &Path) -> Result<QueryStartupContext> {
        let lexicon: FxHashMap<String, LexiconEntry> = load_json(&get_lexicon_path(index_dir))?;
        let raw_page_table: FxHashMap<u64, PageTableEntry> =
            load_json(&get_page_table_path(index_dir))?;
        let stats: CollectionStats = load_json(&get_collection_stats_path(index_dir))?;

        let page_table = raw_page_table
            .into_iter()
            .map(|(doc_id, entry)| (doc_id, entry.length))
            .collect();

        Ok(QueryStartupContext {
            index_path: get_inverted_index_path(index_dir),
            lexicon,
            page_table: Arc::new(page_table),
            total_docs: stats.total_docs,
            avg_len: if stats.avg_len > 0.0 { stats.avg_len } else { 1.0 },
        })
    }
}

fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let file = File::open(path)?;
    serde_json::from_reader(BufReader::new(file))
        .map_err(|e| SearchError::Format(format!("{}: {}", path.display(), e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{indexer::indexer::run_indexer, parser::parser::run_parser};
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_loads_index_metadata() {
        let dir = tempdir().unwrap();
        let corpus = dir.path().join("collection.tsv");
        let mut file = File::create(&corpus).unwrap();
        writeln!(file, "1\talpha beta").unwrap();
        writeln!(file, "2\talpha").unwrap();
        drop(file);

        let postings_dir = dir.path().join("postings");
        let index_dir = dir.path().join("index");
        run_parser(&corpus, &postings_dir, 1_000, None, None).unwrap();
        run_indexer(&postings_dir, &index_dir, 128).unwrap();

        let ctx = QueryStartupContext::new(&index_dir).unwrap();
        assert_eq!(ctx.total_docs, 2);
        assert!((ctx.avg_len - 1.5).abs() < 1e-6);
        assert_eq!(ctx.lexicon["alpha"].df, 2);
        assert_eq!(ctx.lexicon["beta"].df, 1);
        assert_eq!(ctx.page_table[&1], 2);
        assert_eq!(ctx.page_table[&2], 1);
        assert!(ctx.index_path.ends_with("inverted_index.bin"));
    }

    #[test]
    fn test_missing_metadata_is_an_io_error() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            QueryStartupContext::new(dir.path()),
            Err(SearchError::Io(_))
        ));
    }

    #[test]
    fn test_unknown_json_keys_are_rejected() {
        let dir = tempdir().unwrap();
        std::fs::write(get_lexicon_path(dir.path()), "{}").unwrap();
        std::fs::write(
            get_page_table_path(dir.path()),
            r#"{"1": {"length": 3, "extra": 1}}"#,
        )
        .unwrap();
        std::fs::write(
            get_collection_stats_path(dir.path()),
            r#"{"total_docs": 1, "avg_len": 3.0}"#,
        )
        .unwrap();

        assert!(matches!(
            QueryStartupContext::new(dir.path()),
            Err(SearchError::Format(_))
        ));
    }
}
