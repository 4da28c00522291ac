/*! Block worker.

Given a byte range of the corpus, parses its records, runs the text pipeline
and writes two files: the block postings (`blocks/block_<id>.jsonl`, one
sorted `term<TAB>postings` line per term) and the document shard
(`doc_store_parts/doc_store_<id>.jsonl`, one JSON line per accepted record).

`doc_uid`s are assigned from `block_id * block_docs` in record order, so the
result is independent of which worker ran the block and when.
!*/
use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::PathBuf;

use log::{debug, warn};

use crate::analysis::Analyzer;
use crate::error::Error;
use crate::index::partition::BlockSpec;
use crate::index::types::{encode_postings_line, DocRecord, Posting, StoredDoc};
use crate::lang::Lang;

/// Everything a worker needs to process any block. Shared read-only across
/// the pool.
#[derive(Debug)]
pub struct BlockContext {
    pub corpus: PathBuf,
    pub blocks_dir: PathBuf,
    pub parts_dir: PathBuf,
    pub analyzer: Analyzer,
    /// fallback language for inconclusive identification.
    pub language: Lang,
    /// documents per full block; fixes the `doc_uid` base of each block.
    pub block_docs: usize,
    pub snippet_chars: usize,
}

/// What one processed block hands back to the coordinator.
#[derive(Debug)]
pub struct BlockOutput {
    pub block_id: usize,
    pub postings_path: PathBuf,
    pub doc_store_path: PathBuf,
    pub accepted: u64,
    pub rejected: u64,
}

impl BlockContext {
    pub fn process(&self, spec: BlockSpec) -> Result<BlockOutput, Error> {
        let base_doc_uid = spec.block_id as u64 * self.block_docs as u64;

        let mut corpus = File::open(&self.corpus)?;
        corpus.seek(SeekFrom::Start(spec.start))?;
        let mut reader = BufReader::new(corpus.take(spec.end - spec.start));

        let doc_store_path = self
            .parts_dir
            .join(format!("doc_store_{}.jsonl", spec.block_id));
        let mut store = BufWriter::new(File::create(&doc_store_path)?);

        let mut postings: BTreeMap<String, Vec<Posting>> = BTreeMap::new();
        let mut accepted = 0u64;
        let mut rejected = 0u64;

        let mut line = Vec::new();
        loop {
            line.clear();
            if reader.read_until(b'\n', &mut line)? == 0 {
                break;
            }
            let trimmed = trim_line(&line);
            if trimmed.is_empty() {
                rejected += 1;
                continue;
            }
            let record: DocRecord = match serde_json::from_slice(trimmed) {
                Ok(record) => record,
                Err(e) => {
                    warn!("block {}: skipping malformed line: {}", spec.block_id, e);
                    rejected += 1;
                    continue;
                }
            };
            if record.doc_id.is_empty() {
                warn!("block {}: skipping record with empty doc_id", spec.block_id);
                rejected += 1;
                continue;
            }

            let doc_uid = base_doc_uid + accepted;
            let full_text = if record.title.is_empty() {
                record.text.clone()
            } else {
                format!("{} {}", record.title, record.text)
            };
            let analyzed = self.analyzer.analyze(&full_text, self.language);

            let mut tf: HashMap<String, u64> = HashMap::new();
            for token in analyzed.tokens {
                *tf.entry(token).or_insert(0) += 1;
            }
            // doc_uids grow monotonically within the block, so each posting
            // list stays sorted by construction
            for (term, count) in tf {
                postings.entry(term).or_default().push((doc_uid, count));
            }

            let stored = StoredDoc {
                doc_uid,
                doc_id: record.doc_id,
                title: record.title,
                url: record.url,
                snippet: record.text.chars().take(self.snippet_chars).collect(),
                language: analyzed.language.to_string(),
            };
            serde_json::to_writer(&mut store, &stored)?;
            store.write_all(b"\n")?;
            accepted += 1;
        }
        store.flush()?;

        let postings_path = self
            .blocks_dir
            .join(format!("block_{}.jsonl", spec.block_id));
        let mut writer = BufWriter::new(File::create(&postings_path)?);
        for (term, plist) in &postings {
            writer.write_all(encode_postings_line(term, plist)?.as_bytes())?;
            writer.write_all(b"\n")?;
        }
        writer.flush()?;

        debug!(
            "block {}: {} docs accepted, {} rejected, {} terms",
            spec.block_id,
            accepted,
            rejected,
            postings.len()
        );

        Ok(BlockOutput {
            block_id: spec.block_id,
            postings_path,
            doc_store_path,
            accepted,
            rejected,
        })
    }
}

fn trim_line(line: &[u8]) -> &[u8] {
    let mut line = line;
    while let [rest @ .., b'\n' | b'\r' | b' ' | b'\t'] = line {
        line = rest;
    }
    line
}
