use mimalloc::MiMalloc;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

pub mod indexer;
pub mod parser;
pub mod query;
pub mod scoring;
pub mod shared;
