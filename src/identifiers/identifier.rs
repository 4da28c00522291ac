/*! Identifier trait

All identifiers should implement [Identifier] to be useable in indexing and search.
!*/
use crate::lang::Lang;

pub trait Identifier {
    /// returns the identified language, or [None] when identification
    /// is inconclusive or outside the supported set.
    /// Must be deterministic and safe to call from parallel workers.
    fn identify(&self, text: &str) -> Option<Lang>;
}
