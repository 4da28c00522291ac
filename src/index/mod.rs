/*! Block index construction.

`build` partitions the corpus into byte ranges, fans the ranges out to a
bounded worker pool, then merges the per-block outputs into the final
artifacts. Everything is written to a sibling staging directory and renamed
into place only after the merge fsyncs, so a failed build never disturbs a
previously published index.
!*/
pub mod block;
pub mod doc_index;
pub mod merge;
pub mod partition;
pub mod scheduler;
pub mod types;

use std::fs;
use std::path::{Path, PathBuf};

use log::{info, warn};
use serde::Serialize;

use crate::analysis::Analyzer;
use crate::config::IndexConfig;
use crate::error::Error;
use crate::index::block::BlockContext;
use crate::index::merge::MergeStats;
use crate::index::partition::Partitioner;

pub const POSTINGS_FILE: &str = "index.postings";
pub const TERMS_FILE: &str = "index.terms.json";
pub const META_FILE: &str = "index.meta.json";
pub const DOC_STORE_FILE: &str = "doc_store.jsonl";
pub const DOC_INDEX_FILE: &str = "doc_index.sqlite";
pub const BLOCKS_DIR: &str = "blocks";
pub const DOC_STORE_PARTS_DIR: &str = "doc_store_parts";

#[derive(Debug, Serialize)]
pub struct BuildSummary {
    pub indexed_docs: u64,
    pub rejected_docs: u64,
    pub vocab_size: u64,
    pub index_path: PathBuf,
}

/// Build a fresh index from `corpus` and publish it at `dst`.
pub fn build(corpus: &Path, dst: &Path, cfg: &IndexConfig) -> Result<BuildSummary, Error> {
    info!("building index from {:?} into {:?}", corpus, dst);

    let staging = sibling(dst, ".staging")?;
    if staging.exists() {
        warn!("removing stale staging directory {:?}", staging);
        fs::remove_dir_all(&staging)?;
    }
    fs::create_dir_all(staging.join(BLOCKS_DIR))?;
    fs::create_dir_all(staging.join(DOC_STORE_PARTS_DIR))?;

    let (stats, rejected_docs) = match build_into(corpus, &staging, cfg) {
        Ok(result) => result,
        Err(e) => {
            if cfg.keep_blocks {
                warn!("build failed, scratch kept at {:?}", staging);
            } else {
                let _ = fs::remove_dir_all(&staging);
            }
            return Err(e);
        }
    };

    if !cfg.keep_blocks {
        fs::remove_dir_all(staging.join(BLOCKS_DIR))?;
        fs::remove_dir_all(staging.join(DOC_STORE_PARTS_DIR))?;
    }
    publish(&staging, dst)?;

    info!(
        "index published at {:?} ({} documents, {} terms)",
        dst, stats.n_docs, stats.vocab_size
    );
    Ok(BuildSummary {
        indexed_docs: stats.n_docs,
        rejected_docs,
        vocab_size: stats.vocab_size,
        index_path: dst.to_path_buf(),
    })
}

fn build_into(corpus: &Path, staging: &Path, cfg: &IndexConfig) -> Result<(MergeStats, u64), Error> {
    let partitioner = Partitioner::open(corpus, cfg.block_docs)?;
    let ctx = BlockContext {
        corpus: corpus.to_path_buf(),
        blocks_dir: staging.join(BLOCKS_DIR),
        parts_dir: staging.join(DOC_STORE_PARTS_DIR),
        analyzer: Analyzer::new(cfg.min_token_len),
        language: cfg.language,
        block_docs: cfg.block_docs,
        snippet_chars: cfg.snippet_chars,
    };

    let outputs = scheduler::run_blocks(
        partitioner,
        |spec| ctx.process(spec),
        cfg.workers,
        cfg.in_flight_window(),
        cfg.max_tasks_per_worker,
    )?;

    let rejected = outputs.iter().map(|o| o.rejected).sum();
    let stats = merge::merge_blocks(&outputs, staging, cfg)?;
    Ok((stats, rejected))
}

/// Swap the staged artifacts into place. The previous index (if any) only
/// disappears after the new one has fully taken its name.
fn publish(staging: &Path, dst: &Path) -> Result<(), Error> {
    if dst.exists() {
        let retired = sibling(dst, ".old")?;
        if retired.exists() {
            fs::remove_dir_all(&retired)?;
        }
        fs::rename(dst, &retired)?;
        fs::rename(staging, dst)?;
        fs::remove_dir_all(&retired)?;
    } else {
        fs::rename(staging, dst)?;
    }
    Ok(())
}

fn sibling(dst: &Path, suffix: &str) -> Result<PathBuf, Error> {
    let name = dst
        .file_name()
        .ok_or_else(|| Error::Custom(format!("invalid index destination {:?}", dst)))?;
    let mut name = name.to_os_string();
    name.push(suffix);
    Ok(dst.with_file_name(name))
}

#[cfg(test)]
mod tests {
    use std::io::Write as _;

    use super::*;
    use crate::lang::Lang;

    fn spanish_corpus(dir: &Path) -> PathBuf {
        let path = dir.join("corpus.jsonl");
        let mut f = fs::File::create(&path).unwrap();
        writeln!(f, r#"{{"doc_id":"a","text":"el gato y el perro"}}"#).unwrap();
        writeln!(f, r#"{{"doc_id":"b","text":"el perro ladra"}}"#).unwrap();
        f.flush().unwrap();
        path
    }

    fn config() -> IndexConfig {
        IndexConfig {
            language: Lang::Es,
            workers: 2,
            block_docs: 1,
            ..Default::default()
        }
    }

    #[test]
    fn test_build_publishes_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let corpus = spanish_corpus(dir.path());
        let dst = dir.path().join("index");

        let summary = build(&corpus, &dst, &config()).unwrap();
        assert_eq!(summary.indexed_docs, 2);
        assert_eq!(summary.rejected_docs, 0);
        assert!(summary.vocab_size >= 3);

        for artifact in [POSTINGS_FILE, TERMS_FILE, META_FILE, DOC_STORE_FILE, DOC_INDEX_FILE] {
            assert!(dst.join(artifact).exists(), "missing {}", artifact);
        }
        // scratch cleaned up
        assert!(!dst.join(BLOCKS_DIR).exists());
        assert!(!sibling(&dst, ".staging").unwrap().exists());
    }

    #[test]
    fn test_keep_blocks() {
        let dir = tempfile::tempdir().unwrap();
        let corpus = spanish_corpus(dir.path());
        let dst = dir.path().join("index");

        let cfg = IndexConfig {
            keep_blocks: true,
            ..config()
        };
        build(&corpus, &dst, &cfg).unwrap();
        assert!(dst.join(BLOCKS_DIR).exists());
        assert!(dst.join(DOC_STORE_PARTS_DIR).exists());
    }

    #[test]
    fn test_rebuild_replaces_index() {
        let dir = tempfile::tempdir().unwrap();
        let corpus = spanish_corpus(dir.path());
        let dst = dir.path().join("index");

        build(&corpus, &dst, &config()).unwrap();
        let summary = build(&corpus, &dst, &config()).unwrap();
        assert_eq!(summary.indexed_docs, 2);
        assert!(!sibling(&dst, ".old").unwrap().exists());
    }

    #[test]
    fn test_empty_corpus_fails_and_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let corpus = dir.path().join("corpus.jsonl");
        fs::write(&corpus, "garbage line\nanother one\n").unwrap();
        let dst = dir.path().join("index");

        match build(&corpus, &dst, &config()) {
            Err(Error::EmptyCorpus) => {}
            other => panic!("expected EmptyCorpus, got {:?}", other),
        }
        assert!(!dst.exists());
        assert!(!sibling(&dst, ".staging").unwrap().exists());
    }

    #[test]
    fn test_missing_corpus() {
        let dir = tempfile::tempdir().unwrap();
        let dst = dir.path().join("index");
        assert!(build(&dir.path().join("absent.jsonl"), &dst, &config()).is_err());
    }
}
