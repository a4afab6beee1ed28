use std::{path::PathBuf, process::ExitCode};

use clap::Parser;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use search_system::query::{
    list_cache::InvertedListCache,
    query::{QueryMode, run_query},
    startup::QueryStartupContext,
};
use search_system::shared::config::{DEFAULT_TOP_K, INDEX_DIR, LIST_CACHE_CAPACITY};

/// Interactive ranked-retrieval REPL over a built index.
#[derive(Parser)]
struct Args {
    /// Directory holding the index, lexicon, page table and stats
    #[arg(long, default_value = INDEX_DIR)]
    index_dir: PathBuf,

    /// Number of results to return per query
    #[arg(long, default_value_t = DEFAULT_TOP_K)]
    top_k: usize,
}

fn main() -> ExitCode {
    let args = Args::parse();
    match repl(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("run_query: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn repl(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let startup_context = QueryStartupContext::new(&args.index_dir)?;
    let mut list_cache = InvertedListCache::new(LIST_CACHE_CAPACITY);
    let mut editor = DefaultEditor::new()?;

    println!("Type your query below, or '+exit' to quit.\n");

    loop {
        let query = match editor.readline("Enter query: ") {
            Ok(line) => line.trim().to_string(),
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        };
        if query.is_empty() {
            continue;
        }
        if query.eq_ignore_ascii_case("+exit") {
            println!("\nExiting search engine.");
            break;
        }
        let _ = editor.add_history_entry(&query);

        let mode_line = match editor.readline(
            "Conjunctive or Disjunctive [MaxScore: or, Block Max WAND: bwand-or]? [and/or/bwand-or]: ",
        ) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        };
        let mode = match mode_line.parse::<QueryMode>() {
            Ok(mode) => mode,
            Err(_) => {
                println!("Invalid choice. Please type 'and', 'or' or 'bwand-or'.\n");
                continue;
            }
        };

        // per-query failures are reported and the session continues
        match run_query(&startup_context, &mut list_cache, &query, mode, args.top_k) {
            Ok(results) if results.is_empty() => println!("\nNo results found.\n"),
            Ok(results) => {
                println!("\nResults:");
                for (rank, (doc_id, score)) in results.iter().enumerate() {
                    println!("{}) DocID: {}  Score: {:.6}", rank + 1, doc_id, score);
                }
                println!("\n{}\n", list_cache.stats());
            }
            Err(e) => println!("\nAn error occurred: {}\n", e),
        }
    }
    Ok(())
}
