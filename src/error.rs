use std::path::PathBuf;

#[derive(Debug)]
pub enum Error {
    Io(std::io::Error),
    Serde(serde_json::Error),
    Db(rusqlite::Error),
    UnknownLang(String),
    /// every corpus line was rejected (or the corpus was empty).
    EmptyCorpus,
    /// no meta descriptor at the given location.
    IndexMissing(PathBuf),
    /// invalid query input.
    BadRequest(String),
    /// a block worker failed; the whole build is aborted.
    BuildAborted { block_id: usize, cause: Box<Error> },
    Custom(String),
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Error {
        Error::Io(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Error {
        Error::Serde(e)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(e: rusqlite::Error) -> Error {
        Error::Db(e)
    }
}

impl From<String> for Error {
    fn from(s: String) -> Error {
        Error::Custom(s)
    }
}
