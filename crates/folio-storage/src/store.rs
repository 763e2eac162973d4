//! RecordStore: the per-subdatabase pairing of an index file and a record
//! file.
//!
//! The index file holds B+ tree nodes keyed by `K`; the record file holds
//! the fixed-size payloads the tree's keys point at. The store seeds its
//! append counter from the record file length at open, so appends continue
//! where the previous process left off.

use crate::keys::IndexKey;
use crate::pager::{FixedRecord, Pager};
use crate::tree::BplusTree;
use bytes::{Buf, BufMut};
use folio_common::{DocSpan, Result};
use std::path::Path;
use std::sync::Arc;

impl FixedRecord for DocSpan {
    const DISK_SIZE: usize = 8;

    fn write_to(&self, mut buf: &mut [u8]) {
        buf.put_u32_le(self.pos);
        buf.put_u32_le(self.len);
    }

    fn read_from(mut buf: &[u8]) -> Self {
        Self {
            pos: buf.get_u32_le(),
            len: buf.get_u32_le(),
        }
    }
}

/// One subdatabase: a B+ tree over an index file plus a record file of
/// payloads, with an append-style id counter.
pub struct RecordStore<K: IndexKey, R: FixedRecord, const ORDER: usize> {
    tree: BplusTree<K, ORDER>,
    records: Arc<Pager>,
    next_id: i64,
    _marker: std::marker::PhantomData<R>,
}

impl<K: IndexKey, R: FixedRecord, const ORDER: usize> RecordStore<K, R, ORDER> {
    /// Opens (or creates) the index/record file pair.
    pub fn open(
        index_path: impl AsRef<Path>,
        record_path: impl AsRef<Path>,
        create: bool,
    ) -> Result<Self> {
        let index = Arc::new(Pager::open(index_path, create)?);
        let records = Arc::new(Pager::open(record_path, create)?);
        let tree = BplusTree::open(index)?;
        let next_id = records.next_id::<R>()?;
        Ok(Self {
            tree,
            records,
            next_id,
            _marker: std::marker::PhantomData,
        })
    }

    /// Writes `record` at the next free slot and returns its id.
    pub fn append(&mut self, record: &R) -> Result<i64> {
        let id = self.next_id;
        self.records.save(id, record)?;
        self.next_id += 1;
        Ok(id)
    }

    /// Reads the payload at `id`; `None` past the end of the record file.
    pub fn read(&self, id: i64) -> Result<Option<R>> {
        self.records.recover(id)
    }

    /// Rewrites the payload at `id` in place.
    pub fn write_at(&self, id: i64, record: &R) -> Result<()> {
        self.records.save(id, record)
    }

    /// The id the next appended record will get.
    pub fn next_id(&self) -> i64 {
        self.next_id
    }

    /// The tree over the index file.
    pub fn tree(&self) -> &BplusTree<K, ORDER> {
        &self.tree
    }

    /// Mutable access to the tree, for inserts.
    pub fn tree_mut(&mut self) -> &mut BplusTree<K, ORDER> {
        &mut self.tree
    }
}
