//! Build and query configuration.
//!
//! Every knob has a default so library users and the command line agree on
//! behavior. The same values back the corresponding CLI flags.
use crate::lang::Lang;

/// Configuration for one index build.
#[derive(Debug, Clone)]
pub struct IndexConfig {
    /// fallback language when identification is inconclusive at index time.
    pub language: Lang,
    /// tokens shorter than this are dropped.
    pub min_token_len: usize,
    /// terms with a lower document frequency are pruned at merge time.
    pub min_df: u64,
    /// terms with `df / N` above this are pruned at merge time.
    pub max_df_ratio: f64,
    /// worker pool size.
    pub workers: usize,
    /// documents per block.
    pub block_docs: usize,
    /// bounded in-flight window; 0 means `2 * workers`.
    pub max_in_flight: usize,
    /// retire a worker after this many blocks; 0 disables recycling.
    pub max_tasks_per_worker: usize,
    /// keep the scratch block/shard directories after a successful build.
    pub keep_blocks: bool,
    /// characters of original text stored as the document snippet.
    pub snippet_chars: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            language: Lang::En,
            min_token_len: 2,
            min_df: 1,
            max_df_ratio: 1.0,
            workers: default_workers(),
            block_docs: 1000,
            max_in_flight: 0,
            max_tasks_per_worker: 0,
            keep_blocks: false,
            snippet_chars: 200,
        }
    }
}

impl IndexConfig {
    /// effective in-flight window.
    pub fn in_flight_window(&self) -> usize {
        if self.max_in_flight == 0 {
            2 * self.workers
        } else {
            self.max_in_flight
        }
    }
}

/// Configuration for the searcher.
///
/// `min_token_len` must match the value the index was built with, otherwise
/// query tokens and indexed tokens diverge.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// fallback language when query identification is inconclusive.
    pub query_language: Lang,
    /// tokens shorter than this are dropped.
    pub min_token_len: usize,
    /// maximum number of results returned.
    pub top_k: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            query_language: Lang::En,
            min_token_len: 2,
            top_k: 10,
        }
    }
}

fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}
