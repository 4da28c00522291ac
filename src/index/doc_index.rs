/*! doc_uid → byte offset database.

A single-table sqlite file giving random access into `doc_store.jsonl`:
`doc_index(doc_uid INTEGER PRIMARY KEY, offset INTEGER NOT NULL)`.
!*/
use std::path::Path;

use rusqlite::{params, Connection, OpenFlags, OptionalExtension};

use crate::error::Error;

pub struct DocIndex {
    conn: Connection,
}

impl DocIndex {
    /// Create a fresh database (the merger's side).
    pub fn create(path: &Path) -> Result<Self, Error> {
        let conn = Connection::open(path)?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS doc_index (
                doc_uid INTEGER PRIMARY KEY,
                offset INTEGER NOT NULL
            );",
        )?;
        Ok(Self { conn })
    }

    /// Open an existing database for lookups (the searcher's side).
    pub fn open_read_only(path: &Path) -> Result<Self, Error> {
        let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)?;
        Ok(Self { conn })
    }

    /// Insert `(doc_uid, offset)` pairs in one transaction.
    pub fn insert_batch(&mut self, entries: &[(u64, u64)]) -> Result<(), Error> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt =
                tx.prepare_cached("INSERT INTO doc_index (doc_uid, offset) VALUES (?1, ?2)")?;
            for &(doc_uid, offset) in entries {
                stmt.execute(params![doc_uid as i64, offset as i64])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// Load every offset ordered by `doc_uid`. Because `doc_uid`s are dense,
    /// the returned vector is indexable by `doc_uid` directly, which lets
    /// readers drop the connection after startup and share the table without
    /// locking.
    pub fn offsets(&self) -> Result<Vec<u64>, Error> {
        let mut stmt = self
            .conn
            .prepare("SELECT offset FROM doc_index ORDER BY doc_uid")?;
        let rows = stmt.query_map([], |row| row.get::<_, i64>(0))?;
        let mut offsets = Vec::new();
        for row in rows {
            offsets.push(row? as u64);
        }
        Ok(offsets)
    }

    pub fn offset(&self, doc_uid: u64) -> Result<Option<u64>, Error> {
        let offset = self
            .conn
            .query_row(
                "SELECT offset FROM doc_index WHERE doc_uid = ?1",
                params![doc_uid as i64],
                |row| row.get::<_, i64>(0),
            )
            .optional()?;
        Ok(offset.map(|o| o as u64))
    }

    pub fn len(&self) -> Result<u64, Error> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM doc_index", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}
