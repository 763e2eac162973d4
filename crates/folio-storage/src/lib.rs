//! Storage engine for folio.
//!
//! This crate provides:
//! - Pager for fixed-record file I/O
//! - On-disk B+ tree nodes and the tree itself
//! - Key types ordered on their sort field with an out-of-band payload id
//! - RecordStore pairing one index file with one record file

mod keys;
mod node;
mod pager;
mod store;
mod tree;

pub use keys::{HashKey, IndexKey, NameKey};
pub use node::Node;
pub use pager::{FixedRecord, Pager};
pub use store::RecordStore;
pub use tree::{BplusTree, Cursor};
