//! Top-K tally over author names.
//!
//! Every distinct name gets one `TallyRecord` in the record file, located
//! through a `HashKey` tree entry. Incrementing is collision-blind: the
//! first tree entry for a hash decides which payload is inspected, so two
//! names aliasing to one hash split their counts across separate records.

use crate::{token_hash, FANOUT};
use bytes::{Buf, BufMut};
use folio_common::{Result, KEY_WIDTH};
use folio_storage::{FixedRecord, HashKey, RecordStore};
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::path::Path;

/// One name's accumulated count. Ordered by count alone.
#[derive(Debug, Clone, Copy)]
pub struct TallyRecord {
    /// Number of times the name has been seen.
    pub count: u32,
    /// NUL-padded name bytes.
    pub name: [u8; KEY_WIDTH],
}

impl TallyRecord {
    /// Creates a tally, truncating the name to fit its fixed slot.
    pub fn new(count: u32, text: &str) -> Self {
        let mut name = [0u8; KEY_WIDTH];
        let bytes = text.as_bytes();
        let mut cut = bytes.len().min(KEY_WIDTH - 1);
        while !text.is_char_boundary(cut) {
            cut -= 1;
        }
        name[..cut].copy_from_slice(&bytes[..cut]);
        Self { count, name }
    }

    /// The stored name up to the first NUL.
    pub fn text(&self) -> String {
        let end = self.name.iter().position(|&b| b == 0).unwrap_or(KEY_WIDTH);
        String::from_utf8_lossy(&self.name[..end]).into_owned()
    }
}

impl PartialEq for TallyRecord {
    fn eq(&self, other: &Self) -> bool {
        self.count == other.count
    }
}

impl Eq for TallyRecord {}

impl PartialOrd for TallyRecord {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TallyRecord {
    fn cmp(&self, other: &Self) -> Ordering {
        self.count.cmp(&other.count)
    }
}

impl FixedRecord for TallyRecord {
    const DISK_SIZE: usize = 4 + KEY_WIDTH;

    fn write_to(&self, mut buf: &mut [u8]) {
        buf.put_u32_le(self.count);
        buf.put_slice(&self.name);
    }

    fn read_from(mut buf: &[u8]) -> Self {
        let count = buf.get_u32_le();
        let mut name = [0u8; KEY_WIDTH];
        buf.copy_to_slice(&mut name);
        Self { count, name }
    }
}

/// Name-hash B+ tree paired with a tally record file, plus the materialised
/// result of the last `make_topk`.
pub struct TopK {
    store: RecordStore<HashKey, TallyRecord, FANOUT>,
    results: Vec<TallyRecord>,
}

impl TopK {
    /// Opens (or creates) the index/record file pair.
    pub fn open(
        index_path: impl AsRef<Path>,
        record_path: impl AsRef<Path>,
        create: bool,
    ) -> Result<Self> {
        Ok(Self {
            store: RecordStore::open(index_path, record_path, create)?,
            results: Vec::new(),
        })
    }

    /// Counts one occurrence of `name`.
    ///
    /// The first tree entry for the name's hash is inspected; if its stored
    /// name differs (or no entry exists), a fresh tally is appended instead
    /// of scanning further equal-hash entries.
    pub fn insert(&mut self, name: &str) -> Result<()> {
        let hash = token_hash(name);
        if let Some(cursor) = self.store.tree().find(&HashKey::new(hash, -1))? {
            let id = cursor.key().record_id;
            if let Some(mut tally) = self.store.read(id)? {
                if tally.text() == name {
                    tally.count += 1;
                    return self.store.write_at(id, &tally);
                }
            }
        }
        let id = self.store.append(&TallyRecord::new(1, name))?;
        self.store.tree_mut().insert(HashKey::new(hash, id))?;
        Ok(())
    }

    /// Materialises the `n` highest-count tallies, unordered.
    ///
    /// Linear scan over the record file with a bounded min-heap, so memory
    /// stays at `n` records regardless of how many names exist.
    pub fn make_topk(&mut self, n: usize) -> Result<()> {
        let total = self.store.next_id();
        let mut heap: BinaryHeap<std::cmp::Reverse<TallyRecord>> = BinaryHeap::new();
        for id in 0..total {
            if let Some(tally) = self.store.read(id)? {
                heap.push(std::cmp::Reverse(tally));
                if heap.len() > n {
                    heap.pop();
                }
            }
        }
        self.results = heap.into_iter().map(|entry| entry.0).collect();
        Ok(())
    }

    /// The top `k` of the materialised tallies, highest count first.
    pub fn top(&mut self, k: usize) -> Vec<(String, u32)> {
        self.results.sort_by(|a, b| b.cmp(a));
        self.results
            .iter()
            .take(k)
            .map(|tally| (tally.text(), tally.count))
            .collect()
    }

    /// Number of distinct tallies written so far.
    pub fn tallies(&self) -> i64 {
        self.store.next_id()
    }
}
