/*! TF-IDF searcher.

Loads the meta descriptor and the term map at startup, memory-maps the
postings and the document store, and reads the doc index once into a packed
`doc_uid → offset` table (uids are dense, so a plain vector indexes it).
A query touches only the postings slices of its own terms and `top_k` doc
store lines; neither file is ever read in full. All loaded state is
immutable and lock-free, so one `Searcher` serves concurrent queries.
!*/
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use itertools::Itertools;
use log::{debug, warn};
use memmap2::Mmap;
use serde::Serialize;

use crate::analysis::Analyzer;
use crate::config::SearchConfig;
use crate::error::Error;
use crate::index::doc_index::DocIndex;
use crate::index::types::{decode_postings_line, IndexMeta, Posting, StoredDoc};
use crate::index::META_FILE;
use crate::lang::Lang;

#[derive(Debug, Serialize)]
pub struct SearchHit {
    pub doc_id: String,
    pub score: f64,
    pub title: String,
    pub snippet: String,
    pub url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub results: Vec<SearchHit>,
}

pub struct Searcher {
    meta: IndexMeta,
    terms: HashMap<String, (u64, u64)>,
    postings: Option<Mmap>,
    doc_store: Option<Mmap>,
    doc_offsets: Vec<u64>,
    analyzer: Analyzer,
    cfg: SearchConfig,
}

impl Searcher {
    pub fn open(index_dir: &Path, cfg: SearchConfig) -> Result<Self, Error> {
        let meta_path = index_dir.join(META_FILE);
        if !meta_path.exists() {
            return Err(Error::IndexMissing(index_dir.to_path_buf()));
        }
        let meta: IndexMeta = serde_json::from_reader(BufReader::new(File::open(meta_path)?))?;
        let terms: HashMap<String, (u64, u64)> = serde_json::from_reader(BufReader::new(
            File::open(index_dir.join(&meta.terms_index_path))?,
        ))?;

        let postings = map_file(&index_dir.join(&meta.postings_path))?;
        let doc_store = map_file(&index_dir.join(&meta.doc_store_path))?;
        // the connection is only needed long enough to pull the offset table
        let doc_offsets = DocIndex::open_read_only(&index_dir.join(&meta.doc_index_path))?
            .offsets()?;
        if doc_offsets.len() as u64 != meta.n_docs {
            warn!(
                "doc index has {} entries but meta declares {} documents",
                doc_offsets.len(),
                meta.n_docs
            );
        }

        debug!(
            "opened index at {:?}: {} documents, {} terms",
            index_dir, meta.n_docs, meta.vocab_size
        );
        Ok(Self {
            meta,
            terms,
            postings,
            doc_store,
            doc_offsets,
            analyzer: Analyzer::new(cfg.min_token_len),
            cfg,
        })
    }

    pub fn n_docs(&self) -> u64 {
        self.meta.n_docs
    }

    pub fn vocab_size(&self) -> u64 {
        self.meta.vocab_size
    }

    /// Run a ranked query. `default_language` overrides the configured
    /// fallback when identification of the query is inconclusive.
    pub fn search(
        &self,
        query: &str,
        default_language: Option<Lang>,
    ) -> Result<SearchResponse, Error> {
        if query.trim().is_empty() {
            return Err(Error::BadRequest("empty query".to_string()));
        }
        let fallback = default_language.unwrap_or(self.cfg.query_language);
        let analyzed = self.analyzer.analyze(query, fallback);
        debug!(
            "query {:?} resolved as {} with terms {:?}",
            query, analyzed.language, analyzed.tokens
        );

        let mut qtf: HashMap<&str, u64> = HashMap::new();
        for token in &analyzed.tokens {
            *qtf.entry(token.as_str()).or_insert(0) += 1;
        }

        let n = self.meta.n_docs as f64;
        let mut scores: HashMap<u64, f64> = HashMap::new();
        for (term, &count) in &qtf {
            let postings = match self.read_postings(term) {
                Some(postings) if !postings.is_empty() => postings,
                _ => continue,
            };
            let idf = (n / postings.len() as f64).ln();
            for (doc_uid, tf) in postings {
                *scores.entry(doc_uid).or_insert(0.0) +=
                    (1.0 + (tf as f64).ln()) * idf * count as f64;
            }
        }

        let ranked = scores
            .into_iter()
            .sorted_unstable_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)))
            .take(self.cfg.top_k);

        let mut results = Vec::new();
        for (doc_uid, score) in ranked {
            match self.doc(doc_uid)? {
                Some(doc) => results.push(SearchHit {
                    doc_id: doc.doc_id,
                    score,
                    title: doc.title,
                    snippet: doc.snippet,
                    url: doc.url,
                }),
                None => warn!("doc_uid {} not present in the doc index", doc_uid),
            }
        }
        Ok(SearchResponse {
            query: query.to_string(),
            results,
        })
    }

    /// Random-access hydration of one document store line.
    pub fn doc(&self, doc_uid: u64) -> Result<Option<StoredDoc>, Error> {
        let offset = match self.doc_offsets.get(doc_uid as usize) {
            Some(&offset) => offset as usize,
            None => return Ok(None),
        };
        let data = match &self.doc_store {
            Some(mmap) => &mmap[..],
            None => return Ok(None),
        };
        if offset >= data.len() {
            return Ok(None);
        }
        let rest = &data[offset..];
        let line = match rest.iter().position(|&b| b == b'\n') {
            Some(end) => &rest[..end],
            None => rest,
        };
        Ok(Some(serde_json::from_slice(line)?))
    }

    /// Read one term's postings slice. Failures degrade the query instead of
    /// failing it: the term is skipped with a warning.
    fn read_postings(&self, term: &str) -> Option<Vec<Posting>> {
        let &(offset, len) = self.terms.get(term)?;
        let data = match &self.postings {
            Some(mmap) => &mmap[..],
            None => return None,
        };
        let start = offset as usize;
        let end = start + len as usize;
        if end > data.len() {
            warn!("postings slice for {:?} is out of bounds", term);
            return None;
        }
        let line = match std::str::from_utf8(&data[start..end]) {
            Ok(line) => line,
            Err(e) => {
                warn!("postings slice for {:?} is not utf-8: {}", term, e);
                return None;
            }
        };
        match decode_postings_line(line) {
            Ok((found, postings)) if found == term => Some(postings),
            Ok((found, _)) => {
                warn!("term map mismatch: wanted {:?}, found {:?}", term, found);
                None
            }
            Err(e) => {
                warn!("undecodable postings for {:?}: {:?}", term, e);
                None
            }
        }
    }
}

fn map_file(path: &Path) -> Result<Option<Mmap>, Error> {
    let file = File::open(path)?;
    if file.metadata()?.len() == 0 {
        return Ok(None);
    }
    // safe for the lifetime of the searcher: artifacts are immutable once
    // published
    Ok(Some(unsafe { Mmap::map(&file)? }))
}
