//! Supported languages.
//!
//! This module holds the closed set of languages the engine preprocesses,
//! along with their stopword sets and stemming algorithms.
//! The set is the intersection of what the identifier can detect,
//! what [rust_stemmers] can stem and what the [stop_words] lists cover.
use std::{
    collections::{HashMap, HashSet},
    fmt::Display,
    str::FromStr,
};

use lazy_static::lazy_static;
use rust_stemmers::Algorithm;

use crate::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lang {
    Ar,
    Da,
    De,
    El,
    En,
    Es,
    Fi,
    Fr,
    Hu,
    It,
    Nl,
    No,
    Pt,
    Ro,
    Ru,
    Sv,
    Tr,
}

impl Lang {
    pub const ALL: [Lang; 17] = [
        Lang::Ar,
        Lang::Da,
        Lang::De,
        Lang::El,
        Lang::En,
        Lang::Es,
        Lang::Fi,
        Lang::Fr,
        Lang::Hu,
        Lang::It,
        Lang::Nl,
        Lang::No,
        Lang::Pt,
        Lang::Ro,
        Lang::Ru,
        Lang::Sv,
        Lang::Tr,
    ];

    /// Snowball algorithm for this language.
    /// Returns [None] for languages without a stemmer: their tokens pass through unchanged.
    pub fn stemmer_algorithm(&self) -> Option<Algorithm> {
        match self {
            Self::Ar => Some(Algorithm::Arabic),
            Self::Da => Some(Algorithm::Danish),
            Self::De => Some(Algorithm::German),
            Self::El => Some(Algorithm::Greek),
            Self::En => Some(Algorithm::English),
            Self::Es => Some(Algorithm::Spanish),
            Self::Fi => Some(Algorithm::Finnish),
            Self::Fr => Some(Algorithm::French),
            Self::Hu => Some(Algorithm::Hungarian),
            Self::It => Some(Algorithm::Italian),
            Self::Nl => Some(Algorithm::Dutch),
            Self::No => Some(Algorithm::Norwegian),
            Self::Pt => Some(Algorithm::Portuguese),
            Self::Ro => Some(Algorithm::Romanian),
            Self::Ru => Some(Algorithm::Russian),
            Self::Sv => Some(Algorithm::Swedish),
            Self::Tr => Some(Algorithm::Turkish),
        }
    }

    /// stopword set for this language.
    pub fn stopwords(&self) -> &'static HashSet<String> {
        &STOPWORDS[self]
    }
}

impl FromStr for Lang {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ar" => Ok(Self::Ar),
            "da" => Ok(Self::Da),
            "de" => Ok(Self::De),
            "el" => Ok(Self::El),
            "en" => Ok(Self::En),
            "es" => Ok(Self::Es),
            "fi" => Ok(Self::Fi),
            "fr" => Ok(Self::Fr),
            "hu" => Ok(Self::Hu),
            "it" => Ok(Self::It),
            "nl" => Ok(Self::Nl),
            "no" => Ok(Self::No),
            "pt" => Ok(Self::Pt),
            "ro" => Ok(Self::Ro),
            "ru" => Ok(Self::Ru),
            "sv" => Ok(Self::Sv),
            "tr" => Ok(Self::Tr),
            other => Err(Error::UnknownLang(other.to_string())),
        }
    }
}

impl Display for Lang {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let lang_str = match self {
            Self::Ar => "ar",
            Self::Da => "da",
            Self::De => "de",
            Self::El => "el",
            Self::En => "en",
            Self::Es => "es",
            Self::Fi => "fi",
            Self::Fr => "fr",
            Self::Hu => "hu",
            Self::It => "it",
            Self::Nl => "nl",
            Self::No => "no",
            Self::Pt => "pt",
            Self::Ro => "ro",
            Self::Ru => "ru",
            Self::Sv => "sv",
            Self::Tr => "tr",
        };

        write!(f, "{}", lang_str)
    }
}

fn stopword_list(lang: Lang) -> Vec<String> {
    use stop_words::LANGUAGE;
    let language = match lang {
        Lang::Ar => LANGUAGE::Arabic,
        Lang::Da => LANGUAGE::Danish,
        Lang::De => LANGUAGE::German,
        Lang::El => LANGUAGE::Greek,
        Lang::En => LANGUAGE::English,
        Lang::Es => LANGUAGE::Spanish,
        Lang::Fi => LANGUAGE::Finnish,
        Lang::Fr => LANGUAGE::French,
        Lang::Hu => LANGUAGE::Hungarian,
        Lang::It => LANGUAGE::Italian,
        Lang::Nl => LANGUAGE::Dutch,
        Lang::No => LANGUAGE::Norwegian,
        Lang::Pt => LANGUAGE::Portuguese,
        Lang::Ro => LANGUAGE::Romanian,
        Lang::Ru => LANGUAGE::Russian,
        Lang::Sv => LANGUAGE::Swedish,
        Lang::Tr => LANGUAGE::Turkish,
    };
    stop_words::get(language)
        .iter()
        .map(|s| s.to_string())
        .collect()
}

lazy_static! {
    /// One stopword set per supported language, loaded once.
    static ref STOPWORDS: HashMap<Lang, HashSet<String>> = {
        let mut m = HashMap::new();
        for lang in Lang::ALL {
            m.insert(lang, stopword_list(lang).into_iter().collect());
        }
        m
    };
}
