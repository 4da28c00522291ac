/*! Block merging.

Runs in the coordinator once every block has completed. Concatenates the
document shards (compacting `doc_uid`s if any block came up short), builds
the doc index, k-way merges the block postings through a min-heap of head
terms, applies document-frequency pruning and writes the term map and the
meta descriptor. Everything lands in the staging directory; publication is
the caller's concern.
!*/
use std::cmp::Reverse;
use std::collections::{BTreeMap, BinaryHeap};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use itertools::Itertools;
use log::{debug, info};

use crate::config::IndexConfig;
use crate::error::Error;
use crate::index::block::BlockOutput;
use crate::index::doc_index::DocIndex;
use crate::index::types::{decode_postings_line, encode_postings_line, IndexMeta, Posting, StoredDoc};
use crate::index::{DOC_INDEX_FILE, DOC_STORE_FILE, META_FILE, POSTINGS_FILE, TERMS_FILE};

pub struct MergeStats {
    pub n_docs: u64,
    pub vocab_size: u64,
}

/// Rewrites sparse block-local `doc_uid`s into the dense final range.
/// Only needed when some block accepted fewer than `block_docs` documents.
struct UidRemap {
    block_docs: u64,
    new_bases: Vec<u64>,
}

impl UidRemap {
    fn remap(&self, old: u64) -> u64 {
        let block = (old / self.block_docs) as usize;
        self.new_bases[block] + old % self.block_docs
    }
}

/// Merge all block outputs (ascending `block_id`) into final artifacts
/// inside `staging`.
pub fn merge_blocks(
    outputs: &[BlockOutput],
    staging: &Path,
    cfg: &IndexConfig,
) -> Result<MergeStats, Error> {
    info!("assembling document store from {} shards", outputs.len());
    let (n_docs, remap) = assemble_doc_store(outputs, staging, cfg.block_docs as u64)?;
    if n_docs == 0 {
        return Err(Error::EmptyCorpus);
    }
    if remap.is_some() {
        info!("short blocks present, compacting doc_uids");
    }

    info!("merging {} block postings files", outputs.len());
    let terms = merge_postings(outputs, staging, n_docs, remap.as_ref(), cfg)?;
    let vocab_size = terms.len() as u64;

    let mut terms_file = File::create(staging.join(TERMS_FILE))?;
    serde_json::to_writer(&mut terms_file, &terms)?;
    terms_file.sync_all()?;

    let meta = IndexMeta {
        format: "block".to_string(),
        n_docs,
        vocab_size,
        postings_path: POSTINGS_FILE.to_string(),
        terms_index_path: TERMS_FILE.to_string(),
        doc_store_path: DOC_STORE_FILE.to_string(),
        doc_index_path: DOC_INDEX_FILE.to_string(),
        doc_index_type: "sqlite".to_string(),
    };
    let mut meta_file = File::create(staging.join(META_FILE))?;
    serde_json::to_writer(&mut meta_file, &meta)?;
    meta_file.sync_all()?;

    File::open(staging)?.sync_all()?;

    info!("merge done: {} documents, {} terms", n_docs, vocab_size);
    Ok(MergeStats { n_docs, vocab_size })
}

/// Concatenate shards in block order, reassigning dense uids where blocks
/// were short, and fill the doc index with one offset per line.
fn assemble_doc_store(
    outputs: &[BlockOutput],
    staging: &Path,
    block_docs: u64,
) -> Result<(u64, Option<UidRemap>), Error> {
    let store_file = File::create(staging.join(DOC_STORE_FILE))?;
    let mut store = BufWriter::new(store_file);
    let mut doc_index = DocIndex::create(&staging.join(DOC_INDEX_FILE))?;

    let mut offset = 0u64;
    let mut next_uid = 0u64;
    let mut new_bases = Vec::with_capacity(outputs.len());
    let mut identity = true;

    for out in outputs {
        new_bases.push(next_uid);
        if out.block_id as u64 * block_docs != next_uid {
            identity = false;
        }
        let reader = BufReader::new(File::open(&out.doc_store_path)?);
        let mut entries = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if line.is_empty() {
                continue;
            }
            let uid = next_uid;
            let line = {
                let mut doc: StoredDoc = serde_json::from_str(&line)?;
                if doc.doc_uid == uid {
                    line
                } else {
                    doc.doc_uid = uid;
                    serde_json::to_string(&doc)?
                }
            };
            store.write_all(line.as_bytes())?;
            store.write_all(b"\n")?;
            entries.push((uid, offset));
            offset += line.len() as u64 + 1;
            next_uid += 1;
        }
        doc_index.insert_batch(&entries)?;
    }
    store.flush()?;
    store.get_ref().sync_all()?;

    let remap = if identity {
        None
    } else {
        Some(UidRemap { block_docs, new_bases })
    };
    Ok((next_uid, remap))
}

struct BlockCursor {
    reader: BufReader<File>,
    head: Option<Vec<Posting>>,
}

fn advance(
    cursor: &mut BlockCursor,
    heap: &mut BinaryHeap<Reverse<(String, usize)>>,
    idx: usize,
) -> Result<(), Error> {
    if let Some((term, postings)) = read_head(&mut cursor.reader)? {
        cursor.head = Some(postings);
        heap.push(Reverse((term, idx)));
    }
    Ok(())
}

fn read_head(reader: &mut BufReader<File>) -> Result<Option<(String, Vec<Posting>)>, Error> {
    let mut line = String::new();
    loop {
        line.clear();
        if reader.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        let trimmed = line.trim_end_matches(|c| c == '\n' || c == '\r');
        if trimmed.is_empty() {
            continue;
        }
        let (term, postings) = decode_postings_line(trimmed)?;
        return Ok(Some((term.to_string(), postings)));
    }
}

/// K-way merge of the block postings files into `index.postings`, returning
/// the term map. Terms failing the df bounds are dropped.
fn merge_postings(
    outputs: &[BlockOutput],
    staging: &Path,
    n_docs: u64,
    remap: Option<&UidRemap>,
    cfg: &IndexConfig,
) -> Result<BTreeMap<String, (u64, u64)>, Error> {
    let mut cursors = Vec::with_capacity(outputs.len());
    let mut heap: BinaryHeap<Reverse<(String, usize)>> = BinaryHeap::new();
    for (idx, out) in outputs.iter().enumerate() {
        let mut cursor = BlockCursor {
            reader: BufReader::new(File::open(&out.postings_path)?),
            head: None,
        };
        advance(&mut cursor, &mut heap, idx)?;
        cursors.push(cursor);
    }

    let postings_file = File::create(staging.join(POSTINGS_FILE))?;
    let mut writer = BufWriter::new(postings_file);
    let mut terms: BTreeMap<String, (u64, u64)> = BTreeMap::new();
    let mut offset = 0u64;
    let mut pruned = 0u64;

    while let Some(Reverse((term, idx))) = heap.pop() {
        let mut combined = cursors[idx].head.take().unwrap();
        advance(&mut cursors[idx], &mut heap, idx)?;

        while let Some(Reverse((next_term, _))) = heap.peek() {
            if *next_term != term {
                break;
            }
            let Reverse((_, other)) = heap.pop().unwrap();
            combined.extend(cursors[other].head.take().unwrap());
            advance(&mut cursors[other], &mut heap, other)?;
        }

        if let Some(remap) = remap {
            for posting in combined.iter_mut() {
                posting.0 = remap.remap(posting.0);
            }
        }
        combined.sort_unstable_by_key(|p| p.0);
        // duplicate uids cannot occur under correct partitioning; coalescing
        // them is the safety net the format demands
        let combined: Vec<Posting> = combined
            .into_iter()
            .coalesce(|a, b| {
                if a.0 == b.0 {
                    Ok((a.0, a.1 + b.1))
                } else {
                    Err((a, b))
                }
            })
            .collect();

        let df = combined.len() as u64;
        if df < cfg.min_df || df as f64 / n_docs as f64 > cfg.max_df_ratio {
            debug!("pruning {:?} (df = {})", term, df);
            pruned += 1;
            continue;
        }

        let line = encode_postings_line(&term, &combined)?;
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
        terms.insert(term, (offset, line.len() as u64));
        offset += line.len() as u64 + 1;
    }
    writer.flush()?;
    writer.get_ref().sync_all()?;

    if pruned > 0 {
        info!("pruned {} terms by document frequency", pruned);
    }
    Ok(terms)
}
