use std::io;

use thiserror::Error;

/// Crate-wide error type. A term missing from the lexicon is not an error:
/// `InvertedList::open` returns `Ok(None)` and the query layer drops the term.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),

    /// Malformed chunk line, TSV record, or JSON metadata shape.
    #[error("malformed record: {0}")]
    Format(String),

    /// Truncated or over-width varbyte input.
    #[error("varbyte decode error: {0}")]
    Codec(String),

    /// Invalid user input, e.g. an unknown query mode in the REPL.
    #[error("{0}")]
    UserError(String),
}

pub type Result<T> = std::result::Result<T, SearchError>;
