pub mod indexer;
pub mod merge;
