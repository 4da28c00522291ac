/*! Ranked retrieval over a built index.
!*/
mod searcher;

pub use searcher::{SearchHit, SearchResponse, Searcher};
