/*! Corpus partitioning.

Scans the corpus once in binary, counting line terminators, and lazily emits
byte ranges of `block_docs` complete lines each. Nothing is parsed and no
line content is retained; workers open the file themselves and seek to their
range.
!*/
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::Error;

/// A block of the corpus: `[start, end)` spans `block_docs` complete lines
/// (fewer for the final block).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockSpec {
    pub block_id: usize,
    pub start: u64,
    pub end: u64,
}

pub struct Partitioner {
    reader: BufReader<File>,
    offset: u64,
    block_docs: usize,
    next_block_id: usize,
    buf: Vec<u8>,
}

impl Partitioner {
    pub fn open(corpus: &Path, block_docs: usize) -> Result<Self, Error> {
        if block_docs == 0 {
            return Err(Error::Custom("block_docs must be at least 1".to_string()));
        }
        let reader = BufReader::new(File::open(corpus)?);
        Ok(Self {
            reader,
            offset: 0,
            block_docs,
            next_block_id: 0,
            buf: Vec::new(),
        })
    }
}

impl Iterator for Partitioner {
    type Item = Result<BlockSpec, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        let start = self.offset;
        let mut lines = 0usize;
        while lines < self.block_docs {
            self.buf.clear();
            // a final line without a terminator still counts as a line
            match self.reader.read_until(b'\n', &mut self.buf) {
                Ok(0) => break,
                Ok(n) => {
                    self.offset += n as u64;
                    lines += 1;
                }
                Err(e) => return Some(Err(Error::Io(e))),
            }
        }
        if lines == 0 {
            return None;
        }
        let spec = BlockSpec {
            block_id: self.next_block_id,
            start,
            end: self.offset,
        };
        self.next_block_id += 1;
        Some(Ok(spec))
    }
}
