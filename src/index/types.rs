//! On-disk record shapes shared by the builder and the searcher.
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// One corpus record, parsed from one input line.
/// `doc_id` and `text` are required; `title` and `url` may be absent.
#[derive(Debug, Clone, Deserialize)]
pub struct DocRecord {
    pub doc_id: String,
    #[serde(default)]
    pub title: String,
    pub text: String,
    #[serde(default)]
    pub url: Option<String>,
}

/// One line of the document store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredDoc {
    pub doc_uid: u64,
    pub doc_id: String,
    pub title: String,
    pub url: Option<String>,
    pub snippet: String,
    pub language: String,
}

/// `(doc_uid, tf)`; serialized as a two-element array.
pub type Posting = (u64, u64);

/// Encode one postings line, newline excluded: `term<TAB>[[doc_uid,tf],…]`.
pub fn encode_postings_line(term: &str, postings: &[Posting]) -> Result<String, Error> {
    Ok(format!("{}\t{}", term, serde_json::to_string(postings)?))
}

/// Decode one postings line (newline excluded).
pub fn decode_postings_line(line: &str) -> Result<(&str, Vec<Posting>), Error> {
    let (term, payload) = line
        .split_once('\t')
        .ok_or_else(|| Error::Custom(format!("postings line without separator: {:?}", line)))?;
    Ok((term, serde_json::from_str(payload)?))
}

/// The index descriptor, stored as `index.meta.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexMeta {
    pub format: String,
    #[serde(rename = "n")]
    pub n_docs: u64,
    pub vocab_size: u64,
    pub postings_path: String,
    pub terms_index_path: String,
    pub doc_store_path: String,
    pub doc_index_path: String,
    pub doc_index_type: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_postings_roundtrip() {
        let postings = vec![(0u64, 3u64), (7, 1)];
        let line = encode_postings_line("perr", &postings).unwrap();
        assert_eq!(line, "perr\t[[0,3],[7,1]]");

        let (term, decoded) = decode_postings_line(&line).unwrap();
        assert_eq!(term, "perr");
        assert_eq!(decoded, postings);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(decode_postings_line("no-separator").is_err());
        assert!(decode_postings_line("term\tnot json").is_err());
    }

    #[test]
    fn test_record_optional_fields() {
        let record: DocRecord =
            serde_json::from_str(r#"{"doc_id":"a","text":"hola"}"#).unwrap();
        assert_eq!(record.doc_id, "a");
        assert!(record.title.is_empty());
        assert!(record.url.is_none());
    }

    #[test]
    fn test_record_requires_text() {
        assert!(serde_json::from_str::<DocRecord>(r#"{"doc_id":"a"}"#).is_err());
    }
}
