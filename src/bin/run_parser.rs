use std::{path::PathBuf, process::ExitCode};

use clap::Parser;

use search_system::parser::parser::run_parser;
use search_system::shared::config::{CHUNK_SIZE, POSTINGS_DIR, RAW_DATA_PATH};

/// Parse the raw collection into sorted posting chunks.
#[derive(Parser)]
struct Args {
    /// Raw dataset file, one `docID<TAB>text` record per line
    #[arg(long, default_value = RAW_DATA_PATH)]
    input: PathBuf,

    /// Directory for the intermediate chunk files
    #[arg(long, default_value = POSTINGS_DIR)]
    output_dir: PathBuf,

    /// Postings buffered in memory before a chunk is written
    #[arg(long, default_value_t = CHUNK_SIZE)]
    chunk_size: usize,

    /// Stop after this many documents (for testing)
    #[arg(long)]
    max_docs: Option<usize>,

    /// Optional file of docIDs to include, one per line
    #[arg(long)]
    subset_ids_path: Option<PathBuf>,
}

fn main() -> ExitCode {
    let args = Args::parse();
    match run_parser(
        &args.input,
        &args.output_dir,
        args.chunk_size,
        args.max_docs,
        args.subset_ids_path.as_deref(),
    ) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("run_parser: {}", e);
            ExitCode::FAILURE
        }
    }
}
