//! Persistent B+ tree built on the pager.
//!
//! Every operation works on fresh node images read from disk; nothing is
//! cached. Writes replace the persisted copy of a node wholesale. The tree
//! supports exact lookup, lower-bound lookup, forward iteration across the
//! leaf chain, and insertion with recursive split propagation. There is no
//! deletion.

use crate::keys::IndexKey;
use crate::node::Node;
use crate::pager::{FixedRecord, Pager};
use bytes::{Buf, BufMut};
use folio_common::{FolioError, Result};
use std::cmp::Ordering;
use std::marker::PhantomData;
use std::sync::Arc;

/// Tree header, persisted as a typed record at file offset 0.
///
/// Node slots are addressed by the node record size with the root at slot 1,
/// so the header bytes never alias a live node.
#[derive(Debug, Clone, Copy)]
struct Header {
    /// Slot of the root node.
    root_id: i64,
    /// Number of allocated node slots; the high-water mark for allocation.
    count: i64,
}

impl FixedRecord for Header {
    const DISK_SIZE: usize = 16;

    fn write_to(&self, mut buf: &mut [u8]) {
        buf.put_i64_le(self.root_id);
        buf.put_i64_le(self.count);
    }

    fn read_from(mut buf: &[u8]) -> Self {
        Self {
            root_id: buf.get_i64_le(),
            count: buf.get_i64_le(),
        }
    }
}

/// Which half of an overflowing node a split copy targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Half {
    Lower,
    Upper,
}

/// A persistent B+ tree of fanout `ORDER` keyed by `K`.
pub struct BplusTree<K: IndexKey, const ORDER: usize> {
    pager: Arc<Pager>,
    header: Header,
    _marker: PhantomData<K>,
}

impl<K: IndexKey, const ORDER: usize> BplusTree<K, ORDER> {
    /// Opens the tree stored in `pager`, initialising a fresh root and
    /// header when the pager just created its file.
    pub fn open(pager: Arc<Pager>) -> Result<Self> {
        let header = if pager.created() {
            let header = Header { root_id: 1, count: 1 };
            let root: Node<K, ORDER> = Node::new(header.root_id);
            pager.save(root.page_id, &root)?;
            pager.save(0, &header)?;
            header
        } else {
            pager
                .recover::<Header>(0)?
                .ok_or_else(|| FolioError::FileCorrupt {
                    path: pager.path().to_path_buf(),
                })?
        };
        Ok(Self {
            pager,
            header,
            _marker: PhantomData,
        })
    }

    /// A cursor at the first key in order, or an ended cursor if the tree
    /// is empty.
    pub fn begin(&self) -> Result<Cursor<K, ORDER>> {
        let mut node = self.read_node(self.header.root_id)?;
        while !node.is_leaf() {
            node = self.read_node(node.children[0])?;
        }
        let mut cursor = Cursor {
            pager: Arc::clone(&self.pager),
            node,
            index: 0,
        };
        if cursor.node.count == 0 {
            cursor.advance()?;
        }
        Ok(cursor)
    }

    /// Finds a key order-equal to `value`.
    pub fn find(&self, value: &K) -> Result<Option<Cursor<K, ORDER>>> {
        let cursor = self.find_geq(value)?;
        if !cursor.is_end() && cursor.key().order_cmp(value) == Ordering::Equal {
            Ok(Some(cursor))
        } else {
            Ok(None)
        }
    }

    /// A cursor at the first key ≥ `value` in iteration order, or an ended
    /// cursor if every key is smaller.
    pub fn find_geq(&self, value: &K) -> Result<Cursor<K, ORDER>> {
        let root = self.read_node(self.header.root_id)?;
        self.find_from(root, value)
    }

    /// Inserts `value`, splitting overflowing nodes on the way back up.
    /// Duplicate keys are permitted.
    pub fn insert(&mut self, value: K) -> Result<()> {
        let mut root = self.read_node(self.header.root_id)?;
        let overflowed = self.insert_helper(&mut root, value)?;
        if overflowed {
            self.split_root()?;
        }
        Ok(())
    }

    fn find_from(&self, node: Node<K, ORDER>, value: &K) -> Result<Cursor<K, ORDER>> {
        if !node.is_leaf() {
            // Internal comparison is <=: duplicates of a separator are
            // routed right, and the leftmost match surfaces at the leaf.
            let mut pos = 0;
            while pos < node.count && node.data[pos].order_cmp(value) != Ordering::Greater {
                pos += 1;
            }
            let child = self.read_node(node.children[pos])?;
            self.find_from(child, value)
        } else {
            let mut pos = 0;
            while pos < node.count && node.data[pos].order_cmp(value) == Ordering::Less {
                pos += 1;
            }
            let past_leaf = pos == node.count;
            let mut cursor = Cursor {
                pager: Arc::clone(&self.pager),
                node,
                index: pos,
            };
            if past_leaf {
                cursor.advance()?;
            }
            Ok(cursor)
        }
    }

    fn insert_helper(&mut self, n: &mut Node<K, ORDER>, value: K) -> Result<bool> {
        let mut pos = 0;
        while pos < n.count && n.data[pos].order_cmp(&value) == Ordering::Less {
            pos += 1;
        }
        if n.children[pos] != 0 {
            let mut child = self.read_node(n.children[pos])?;
            let overflowed = self.insert_helper(&mut child, value)?;
            if overflowed {
                self.split_child(n, pos)?;
            }
        } else {
            n.insert_in_node(pos, value);
            self.write_node(n)?;
        }
        Ok(n.is_overflow())
    }

    /// Splits the overflowing child at `children[pos]` of `n`, promoting
    /// the separator into `n`.
    fn split_child(&mut self, n: &mut Node<K, ORDER>, pos: usize) -> Result<()> {
        // The overflow image was persisted by the recursive insert; reread
        // it and rebuild its slot as the left half.
        let overflow = self.read_node(n.children[pos])?;
        let mut left = overflow.clone();
        left.count = 0;
        let mut right = self.new_node()?;

        let mut cursor = 0;
        Self::copy_half(&overflow, &mut left, Half::Lower, &mut cursor);
        n.insert_in_node(pos, overflow.data[cursor]);
        if overflow.is_leaf() {
            // Leaf split: the separator is copied up and also retained at
            // the head of the right leaf; the leaf chain threads through.
            right.right = left.right;
            left.right = right.page_id;
        } else {
            // Internal split: the separator moves up and is skipped.
            cursor += 1;
        }
        Self::copy_half(&overflow, &mut right, Half::Upper, &mut cursor);

        n.children[pos] = left.page_id;
        n.children[pos + 1] = right.page_id;
        self.write_node(n)?;
        self.write_node(&left)?;
        self.write_node(&right)?;
        Ok(())
    }

    /// Splits an overflowing root into two fresh children, keeping the root
    /// at its slot with the median separator as its only key.
    fn split_root(&mut self) -> Result<()> {
        let mut overflow = self.read_node(self.header.root_id)?;
        let mut left = self.new_node()?;
        let mut right = self.new_node()?;

        let mut cursor = 0;
        Self::copy_half(&overflow, &mut left, Half::Lower, &mut cursor);
        overflow.data[0] = overflow.data[cursor];
        left.right = right.page_id;
        if !overflow.is_leaf() {
            cursor += 1;
        }
        Self::copy_half(&overflow, &mut right, Half::Upper, &mut cursor);

        overflow.count = 1;
        overflow.children[0] = left.page_id;
        overflow.children[1] = right.page_id;
        self.write_node(&overflow)?;
        self.write_node(&left)?;
        self.write_node(&right)?;
        Ok(())
    }

    /// Copies key/child pairs from `src` into `dst` starting at `*cursor`,
    /// up to the half boundary, plus the trailing child pointer. The cursor
    /// is shared across the lower/upper pair of calls.
    fn copy_half(src: &Node<K, ORDER>, dst: &mut Node<K, ORDER>, half: Half, cursor: &mut usize) {
        let stop = match half {
            Half::Lower => ORDER.div_ceil(2),
            Half::Upper => ORDER + 1,
        };
        let mut i = 0;
        while *cursor < stop {
            dst.children[i] = src.children[*cursor];
            dst.data[i] = src.data[*cursor];
            dst.count += 1;
            *cursor += 1;
            i += 1;
        }
        dst.children[i] = src.children[*cursor];
    }

    /// Allocates a fresh node slot. The header is persisted immediately;
    /// the node itself is not written until the caller does so.
    fn new_node(&mut self) -> Result<Node<K, ORDER>> {
        self.header.count += 1;
        let node = Node::new(self.header.count);
        self.pager.save(0, &self.header)?;
        Ok(node)
    }

    fn read_node(&self, id: i64) -> Result<Node<K, ORDER>> {
        self.pager
            .recover::<Node<K, ORDER>>(id)?
            .ok_or(FolioError::PageNotFound { page: id })
    }

    fn write_node(&self, node: &Node<K, ORDER>) -> Result<()> {
        self.pager.save(node.page_id, node)
    }
}

impl<K: IndexKey, const ORDER: usize> std::fmt::Debug for BplusTree<K, ORDER> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BplusTree")
            .field("root_id", &self.header.root_id)
            .field("nodes", &self.header.count)
            .finish()
    }
}

/// Forward-only cursor over the keys of a [`BplusTree`].
///
/// A cursor holds the image of one leaf and an index into it; advancing past
/// the last slot loads the next leaf through the `right` chain. The ended
/// cursor is a sentinel with a negative page id.
pub struct Cursor<K: IndexKey, const ORDER: usize> {
    pager: Arc<Pager>,
    node: Node<K, ORDER>,
    index: usize,
}

impl<K: IndexKey, const ORDER: usize> Cursor<K, ORDER> {
    /// Whether the cursor has run off the end of the leaf chain.
    pub fn is_end(&self) -> bool {
        self.node.page_id < 0
    }

    /// The key under the cursor. Must not be called on an ended cursor.
    pub fn key(&self) -> &K {
        &self.node.data[self.index]
    }

    /// Moves to the next key in order, following the leaf chain.
    pub fn advance(&mut self) -> Result<()> {
        if self.index + 1 < self.node.count {
            self.index += 1;
        } else {
            self.index = 0;
            if self.node.right == 0 {
                self.node = Node::new(-1);
            } else {
                self.node = match self.pager.recover::<Node<K, ORDER>>(self.node.right)? {
                    Some(node) => node,
                    None => Node::new(-1),
                };
            }
        }
        Ok(())
    }
}
