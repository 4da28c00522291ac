use std::collections::BTreeMap;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use attercop::config::{IndexConfig, SearchConfig};
use attercop::error::Error;
use attercop::index;
use attercop::index::types::{decode_postings_line, StoredDoc};
use attercop::lang::Lang;
use attercop::search::Searcher;

fn write_corpus(dir: &Path, lines: &[String]) -> PathBuf {
    let path = dir.join("corpus.jsonl");
    let mut f = File::create(&path).unwrap();
    for line in lines {
        writeln!(f, "{}", line).unwrap();
    }
    f.flush().unwrap();
    path
}

fn spanish_config() -> IndexConfig {
    IndexConfig {
        language: Lang::Es,
        workers: 3,
        block_docs: 10,
        ..Default::default()
    }
}

fn spanish_search_config() -> SearchConfig {
    SearchConfig {
        query_language: Lang::Es,
        ..Default::default()
    }
}

#[test]
fn spanish_corpus_retrieval() {
    let dir = tempfile::tempdir().unwrap();
    let corpus = write_corpus(
        dir.path(),
        &[
            r#"{"doc_id":"a","text":"el gato y el perro"}"#.to_string(),
            r#"{"doc_id":"b","text":"el perro ladra"}"#.to_string(),
        ],
    );
    let dst = dir.path().join("index");
    let summary = index::build(&corpus, &dst, &spanish_config()).unwrap();
    assert_eq!(summary.indexed_docs, 2);

    let searcher = Searcher::open(&dst, spanish_search_config()).unwrap();

    // stopwords "el" and "y" never made it into the vocabulary
    let terms: BTreeMap<String, (u64, u64)> =
        serde_json::from_reader(File::open(dst.join("index.terms.json")).unwrap()).unwrap();
    assert!(!terms.contains_key("el"));
    assert!(!terms.contains_key("y"));
    assert!(terms.contains_key("gat"));
    assert!(terms.contains_key("perr"));
    assert!(terms.contains_key("ladr"));

    let both = searcher.search("perro", Some(Lang::Es)).unwrap();
    let ids: Vec<_> = both.results.iter().map(|r| r.doc_id.as_str()).collect();
    assert_eq!(ids.len(), 2);
    assert!(ids.contains(&"a") && ids.contains(&"b"));

    let only_b = searcher.search("ladra", Some(Lang::Es)).unwrap();
    let ids: Vec<_> = only_b.results.iter().map(|r| r.doc_id.as_str()).collect();
    assert_eq!(ids, vec!["b"]);
}

#[test]
fn block_partitioning_and_dense_uids() {
    let dir = tempfile::tempdir().unwrap();
    let lines: Vec<String> = (0..25)
        .map(|i| format!(r#"{{"doc_id":"d{}","text":"documento numero {} sobre perros"}}"#, i, i))
        .collect();
    let corpus = write_corpus(dir.path(), &lines);
    let dst = dir.path().join("index");

    let cfg = IndexConfig {
        keep_blocks: true,
        ..spanish_config()
    };
    let summary = index::build(&corpus, &dst, &cfg).unwrap();
    assert_eq!(summary.indexed_docs, 25);

    // 25 documents in blocks of 10: 3 blocks (10, 10, 5)
    let blocks: Vec<_> = std::fs::read_dir(dst.join("blocks")).unwrap().collect();
    assert_eq!(blocks.len(), 3);

    // doc_uid on line k equals k, over the whole store
    let store = std::fs::read_to_string(dst.join("doc_store.jsonl")).unwrap();
    let docs: Vec<StoredDoc> = store
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(docs.len(), 25);
    for (k, doc) in docs.iter().enumerate() {
        assert_eq!(doc.doc_uid, k as u64);
    }
}

#[test]
fn postings_file_invariants() {
    let dir = tempfile::tempdir().unwrap();
    let lines: Vec<String> = (0..12)
        .map(|i| {
            format!(
                r#"{{"doc_id":"d{}","text":"perro gato libro numero {} palabras distintas aqui"}}"#,
                i, i
            )
        })
        .collect();
    let corpus = write_corpus(dir.path(), &lines);
    let dst = dir.path().join("index");
    index::build(&corpus, &dst, &spanish_config()).unwrap();

    let postings = std::fs::read(dst.join("index.postings")).unwrap();
    let text = std::str::from_utf8(&postings).unwrap();

    // term sortedness and postings sortedness
    let mut previous_term: Option<String> = None;
    for line in text.lines() {
        let (term, plist) = decode_postings_line(line).unwrap();
        if let Some(prev) = &previous_term {
            assert!(prev.as_str() < term, "terms out of order: {} then {}", prev, term);
        }
        previous_term = Some(term.to_string());
        for pair in plist.windows(2) {
            assert!(pair[0].0 < pair[1].0, "postings not strictly increasing for {}", term);
        }
        assert!(plist.iter().all(|&(_, tf)| tf >= 1));
    }

    // term-map exactness: every (offset, len) addresses its own line
    let terms: BTreeMap<String, (u64, u64)> =
        serde_json::from_reader(File::open(dst.join("index.terms.json")).unwrap()).unwrap();
    assert!(!terms.is_empty());
    for (term, (offset, len)) in &terms {
        let slice = &postings[*offset as usize..(*offset + *len) as usize];
        assert!(slice.starts_with(format!("{}\t", term).as_bytes()));
    }
}

#[test]
fn high_df_terms_pruned() {
    let dir = tempfile::tempdir().unwrap();
    let lines: Vec<String> = (0..5)
        .map(|i| format!(r#"{{"doc_id":"d{}","text":"palabra repetida siempre"}}"#, i))
        .collect();
    let corpus = write_corpus(dir.path(), &lines);
    let dst = dir.path().join("index");

    let cfg = IndexConfig {
        max_df_ratio: 0.9,
        ..spanish_config()
    };
    let summary = index::build(&corpus, &dst, &cfg).unwrap();
    assert_eq!(summary.indexed_docs, 5);
    // every term appears in all five identical documents: df/N = 1.0 > 0.9
    assert_eq!(summary.vocab_size, 0);

    let searcher = Searcher::open(&dst, spanish_search_config()).unwrap();
    let response = searcher.search("palabra", Some(Lang::Es)).unwrap();
    assert!(response.results.is_empty());
}

#[test]
fn unknown_word_returns_empty() {
    let dir = tempfile::tempdir().unwrap();
    let corpus = write_corpus(
        dir.path(),
        &[r#"{"doc_id":"a","text":"el perro ladra"}"#.to_string()],
    );
    let dst = dir.path().join("index");
    index::build(&corpus, &dst, &spanish_config()).unwrap();

    let searcher = Searcher::open(&dst, spanish_search_config()).unwrap();
    let response = searcher.search("xyzzynotaword", None).unwrap();
    assert!(response.results.is_empty());
}

#[test]
fn rebuild_is_byte_identical() {
    let dir = tempfile::tempdir().unwrap();
    let lines: Vec<String> = (0..30)
        .map(|i| {
            format!(
                r#"{{"doc_id":"d{}","text":"documento {} con perros gatos y libros variados"}}"#,
                i, i
            )
        })
        .collect();
    let corpus = write_corpus(dir.path(), &lines);

    let first = dir.path().join("index_a");
    let second = dir.path().join("index_b");
    index::build(&corpus, &first, &spanish_config()).unwrap();
    index::build(&corpus, &second, &spanish_config()).unwrap();

    for artifact in ["index.postings", "index.terms.json", "doc_store.jsonl"] {
        let a = std::fs::read(first.join(artifact)).unwrap();
        let b = std::fs::read(second.join(artifact)).unwrap();
        assert_eq!(a, b, "{} differs between identical builds", artifact);
    }
}

#[test]
fn rejected_lines_leave_dense_uids() {
    let dir = tempfile::tempdir().unwrap();
    // malformed lines inside a middle block force uid compaction
    let mut lines: Vec<String> = Vec::new();
    for i in 0..12 {
        lines.push(format!(r#"{{"doc_id":"d{}","text":"el perro numero {}"}}"#, i, i));
        if i % 4 == 1 {
            lines.push("{{ this is not json".to_string());
        }
    }
    let corpus = write_corpus(dir.path(), &lines);
    let dst = dir.path().join("index");

    let cfg = IndexConfig {
        block_docs: 5,
        ..spanish_config()
    };
    let summary = index::build(&corpus, &dst, &cfg).unwrap();
    assert_eq!(summary.indexed_docs, 12);
    assert_eq!(summary.rejected_docs, 3);

    let searcher = Searcher::open(&dst, spanish_search_config()).unwrap();
    for uid in 0..12 {
        let doc = searcher.doc(uid).unwrap().unwrap();
        assert_eq!(doc.doc_uid, uid);
    }

    // every document is still retrievable through its content
    let response = searcher.search("perro", Some(Lang::Es)).unwrap();
    assert_eq!(response.results.len(), spanish_search_config().top_k);
}

#[test]
fn failed_build_preserves_previous_index() {
    let dir = tempfile::tempdir().unwrap();
    let corpus = write_corpus(
        dir.path(),
        &[r#"{"doc_id":"a","text":"el perro ladra"}"#.to_string()],
    );
    let dst = dir.path().join("index");
    index::build(&corpus, &dst, &spanish_config()).unwrap();

    // a corpus of rejects only: the rebuild aborts with EmptyCorpus
    let bad_corpus = dir.path().join("bad.jsonl");
    std::fs::write(&bad_corpus, "not json\n").unwrap();
    match index::build(&bad_corpus, &dst, &spanish_config()) {
        Err(Error::EmptyCorpus) => {}
        other => panic!("expected EmptyCorpus, got {:?}", other.map(|s| s.indexed_docs)),
    }

    // a missing corpus aborts before anything is staged
    assert!(index::build(&dir.path().join("absent.jsonl"), &dst, &spanish_config()).is_err());

    // the first index is still fully queryable
    let searcher = Searcher::open(&dst, spanish_search_config()).unwrap();
    let response = searcher.search("ladra", Some(Lang::Es)).unwrap();
    assert_eq!(response.results.len(), 1);
    assert_eq!(response.results[0].doc_id, "a");
}

#[test]
fn duplicate_doc_ids_are_kept() {
    let dir = tempfile::tempdir().unwrap();
    let corpus = write_corpus(
        dir.path(),
        &[
            r#"{"doc_id":"same","text":"el perro ladra"}"#.to_string(),
            r#"{"doc_id":"same","text":"el perro duerme"}"#.to_string(),
        ],
    );
    let dst = dir.path().join("index");
    let summary = index::build(&corpus, &dst, &spanish_config()).unwrap();
    assert_eq!(summary.indexed_docs, 2);

    let searcher = Searcher::open(&dst, spanish_search_config()).unwrap();
    let response = searcher.search("perro", Some(Lang::Es)).unwrap();
    assert_eq!(response.results.len(), 2);
    assert!(response.results.iter().all(|r| r.doc_id == "same"));
}
