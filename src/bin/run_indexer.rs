use std::{path::PathBuf, process::ExitCode};

use clap::Parser;

use search_system::indexer::indexer::run_indexer;
use search_system::shared::config::{BLOCK_SIZE, INDEX_DIR, POSTINGS_DIR};

/// Merge posting chunks into the compressed inverted index.
#[derive(Parser)]
struct Args {
    /// Directory holding the parser's chunk files
    #[arg(long, default_value = POSTINGS_DIR)]
    input_dir: PathBuf,

    /// Directory for the index, lexicon, page table and stats
    #[arg(long, default_value = INDEX_DIR)]
    output_dir: PathBuf,

    /// Postings per compressed block
    #[arg(long, default_value_t = BLOCK_SIZE)]
    block_size: usize,
}

fn main() -> ExitCode {
    let args = Args::parse();
    match run_indexer(&args.input_dir, &args.output_dir, args.block_size) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("run_indexer: {}", e);
            ExitCode::FAILURE
        }
    }
}
