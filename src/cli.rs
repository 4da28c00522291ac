//! Command line arguments and parameters management/parsing.
use std::path::PathBuf;

use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(
    name = "attercop",
    about = "Multilingual TF-IDF retrieval over line-delimited JSON corpora"
)]
/// Holds every command that is callable by the `attercop` command.
pub enum Attercop {
    #[structopt(about = "Build a block inverted index from a corpus")]
    Index(Index),
    #[structopt(about = "Run a ranked query against a built index")]
    Search(Search),
}

#[derive(Debug, StructOpt)]
/// Index command and parameters.
///
/// ```sh
/// USAGE:
///     attercop index [FLAGS] [OPTIONS] <corpus> <dst>
///
/// ARGS:
///     <corpus>    corpus file (one JSON document per line)
///     <dst>       index destination directory
/// ```
pub struct Index {
    #[structopt(parse(from_os_str), help = "corpus file (one JSON document per line)")]
    pub corpus: PathBuf,
    #[structopt(parse(from_os_str), help = "index destination directory")]
    pub dst: PathBuf,
    #[structopt(
        long = "language",
        default_value = "en",
        help = "fallback language when identification is inconclusive"
    )]
    pub language: String,
    #[structopt(
        long = "min-token-len",
        default_value = "2",
        help = "drop tokens shorter than this"
    )]
    pub min_token_len: usize,
    #[structopt(
        long = "min-df",
        default_value = "1",
        help = "prune terms with a lower document frequency"
    )]
    pub min_df: u64,
    #[structopt(
        long = "max-df-ratio",
        default_value = "1.0",
        help = "prune terms with df/N above this"
    )]
    pub max_df_ratio: f64,
    #[structopt(long = "workers", help = "worker pool size. Default is the core count.")]
    pub workers: Option<usize>,
    #[structopt(long = "block-docs", default_value = "1000", help = "documents per block")]
    pub block_docs: usize,
    #[structopt(
        long = "max-in-flight",
        default_value = "0",
        help = "bounded in-flight window. 0 means twice the worker count."
    )]
    pub max_in_flight: usize,
    #[structopt(
        long = "max-tasks-per-worker",
        default_value = "0",
        help = "retire a worker after this many blocks. 0 disables recycling."
    )]
    pub max_tasks_per_worker: usize,
    #[structopt(long = "keep-blocks", help = "keep scratch block directories after the build")]
    pub keep_blocks: bool,
}

#[derive(Debug, StructOpt)]
/// Search command and parameters.
///
/// ```sh
/// USAGE:
///     attercop search [OPTIONS] <index> <query>
///
/// ARGS:
///     <index>    index directory
///     <query>    query string
/// ```
pub struct Search {
    #[structopt(parse(from_os_str), help = "index directory")]
    pub index: PathBuf,
    #[structopt(help = "query string")]
    pub query: String,
    #[structopt(long = "top-k", default_value = "10", help = "maximum number of results")]
    pub top_k: usize,
    #[structopt(
        long = "min-token-len",
        default_value = "2",
        help = "drop query tokens shorter than this (must match the index build)"
    )]
    pub min_token_len: usize,
    #[structopt(
        long = "language",
        help = "language override when query identification is inconclusive"
    )]
    pub language: Option<String>,
    #[structopt(
        long = "query-language",
        default_value = "en",
        help = "default fallback language for queries"
    )]
    pub query_language: String,
}
