/*! Per-language text pipeline.

normalize → detect language → tokenize → remove stopwords → filter → stem.

The same pipeline runs at index time and at query time so that query terms
and indexed terms always agree. [Analyzer::analyze] is a pure function of
`(text, fallback)`: no I/O, no state, and malformed text yields an empty
token sequence rather than an error.
!*/
mod normalize;
mod tokenize;

pub use normalize::normalize;
pub use tokenize::tokenize;

use rust_stemmers::Stemmer;

use crate::identifiers::{Identifier, WhatLang};
use crate::lang::Lang;

#[derive(Debug, Clone)]
pub struct Analyzer {
    min_token_len: usize,
    identifier: WhatLang,
}

/// Pipeline output: the identified language (if any), the language actually
/// used for stopwords and stemming, and the resulting tokens in input order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyzedText {
    pub detected: Option<Lang>,
    pub language: Lang,
    pub tokens: Vec<String>,
}

impl Analyzer {
    pub fn new(min_token_len: usize) -> Self {
        Self {
            min_token_len,
            identifier: WhatLang::new(),
        }
    }

    /// Run the full pipeline on `text`. When identification is inconclusive,
    /// `fallback` decides the stopword set and stemmer.
    pub fn analyze(&self, text: &str, fallback: Lang) -> AnalyzedText {
        let normalized = normalize(text);
        let detected = self.identifier.identify(&normalized);
        let language = detected.unwrap_or(fallback);

        let stopwords = language.stopwords();
        let stemmer = language.stemmer_algorithm().map(Stemmer::create);

        let tokens = tokenize(&normalized)
            .into_iter()
            .filter(|t| !stopwords.contains(*t))
            .filter(|t| t.chars().count() >= self.min_token_len)
            .filter(|t| !t.chars().all(char::is_numeric))
            .map(|t| match &stemmer {
                Some(stemmer) => stemmer.stem(t).into_owned(),
                None => t.to_string(),
            })
            .collect();

        AnalyzedText {
            detected,
            language,
            tokens,
        }
    }
}
