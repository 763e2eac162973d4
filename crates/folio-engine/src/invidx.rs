//! Inverted index over token hashes.
//!
//! Each occurrence of a token in a source record becomes one posting: a
//! `HashKey { hash(token), id }` tree entry pointing at a `DocSpan` slot in
//! the record file. Multi-token queries intersect the per-token result sets.
//!
//! Hash collisions are not defended against: two distinct tokens with the
//! same 64-bit hash alias to the same postings, and the token text is never
//! re-checked.

use crate::{token_hash, FANOUT};
use folio_common::{DocSpan, Result};
use folio_storage::{HashKey, RecordStore};
use std::collections::BTreeSet;
use std::path::Path;

/// Token-hash B+ tree paired with a posting record file.
pub struct InvertedIndex {
    store: RecordStore<HashKey, DocSpan, FANOUT>,
}

impl InvertedIndex {
    /// Opens (or creates) the index/record file pair.
    pub fn open(
        index_path: impl AsRef<Path>,
        record_path: impl AsRef<Path>,
        create: bool,
    ) -> Result<Self> {
        Ok(Self {
            store: RecordStore::open(index_path, record_path, create)?,
        })
    }

    /// Indexes every token of one source record.
    ///
    /// Duplicate tokens are kept as independent postings; deduplication
    /// happens at query time through the set semantics of the result.
    pub fn build<'a>(
        &mut self,
        tokens: impl IntoIterator<Item = &'a str>,
        span: DocSpan,
    ) -> Result<()> {
        for token in tokens {
            let id = self.store.append(&span)?;
            self.store
                .tree_mut()
                .insert(HashKey::new(token_hash(token), id))?;
        }
        Ok(())
    }

    /// Result set for a single token.
    ///
    /// Seeks to `hash - 1` (routing below any run of equal-hash postings
    /// that spans leaves), then collects postings while the hash matches,
    /// stopping at the first mismatch.
    pub fn find_one(&self, token: &str) -> Result<BTreeSet<DocSpan>> {
        let hash = token_hash(token);
        let probe = HashKey::new(hash.wrapping_sub(1), -1);
        let mut cursor = self.store.tree().find_geq(&probe)?;

        let mut result = BTreeSet::new();
        while !cursor.is_end() && cursor.key().hash == hash {
            if let Some(span) = self.store.read(cursor.key().record_id)? {
                result.insert(span);
            }
            cursor.advance()?;
        }
        Ok(result)
    }

    /// Intersection of the result sets of all tokens.
    ///
    /// A single token returns its set as-is; an empty query returns empty.
    pub fn find(&self, tokens: &[String]) -> Result<Vec<DocSpan>> {
        let mut sets = Vec::with_capacity(tokens.len());
        for token in tokens {
            sets.push(self.find_one(token)?);
        }

        let mut iter = sets.into_iter();
        let first = match iter.next() {
            Some(set) => set,
            None => return Ok(Vec::new()),
        };
        let intersection = iter.fold(first, |acc, set| {
            acc.intersection(&set).copied().collect()
        });
        Ok(intersection.into_iter().collect())
    }

    /// Number of postings written so far.
    pub fn postings(&self) -> i64 {
        self.store.next_id()
    }
}
