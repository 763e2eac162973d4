//! Configuration structures for folio.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for a folio database instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Base directory under which each database gets its own subdirectory.
    pub data_dir: PathBuf,
    /// Source XML corpus read by `read` and re-read for result display.
    pub source_xml: PathBuf,
    /// Number of author tallies materialised after a full ingest.
    pub topk_capacity: usize,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./database"),
            source_xml: PathBuf::from("./xml/corpus.xml"),
            topk_capacity: 1024,
        }
    }
}

impl DatabaseConfig {
    /// Returns the directory holding the files of the named database.
    pub fn database_dir(&self, name: &str) -> PathBuf {
        self.data_dir.join(name)
    }
}
