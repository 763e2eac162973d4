//! Database engine for folio.
//!
//! This crate provides:
//! - The `Database` facade with its title and author subdatabases
//! - An inverted index for fuzzy multi-word lookup
//! - A top-K tally over author names
//! - Streaming XML ingestion feeding all of the above

pub mod database;
pub mod ingest;
pub mod invidx;
pub mod topk;

pub use database::Database;
pub use ingest::{ingest_xml, IngestStats};
pub use invidx::InvertedIndex;
pub use topk::{TallyRecord, TopK};

use xxhash_rust::xxh64::xxh64;

/// Fanout of every production B+ tree.
pub const FANOUT: usize = 64;

/// Stable 64-bit hash of a token or author name.
///
/// The hash is persisted in index files, so it must not vary between
/// processes; a fixed-seed xxh64 satisfies that where a process-seeded
/// hasher would not.
pub fn token_hash(text: &str) -> u64 {
    xxh64(text.as_bytes(), 0)
}
