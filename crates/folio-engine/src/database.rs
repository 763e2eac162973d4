//! The database facade: one opened logical database and its subdatabases.
//!
//! A database named `n` owns eight files under `data_dir/n/`: an index and
//! a record file for each of the title tree, the author tree, the inverted
//! index, and the top-K tally. The four subdatabases are independent; they
//! share no file handles and no in-memory state.

use crate::invidx::InvertedIndex;
use crate::topk::TopK;
use crate::FANOUT;
use folio_common::{DatabaseConfig, DocSpan, Field, FolioError, Result};
use folio_storage::{NameKey, RecordStore};
use std::path::PathBuf;

type SubDatabase = RecordStore<NameKey, DocSpan, FANOUT>;

/// One opened logical database.
pub struct Database {
    name: String,
    title: SubDatabase,
    author: SubDatabase,
    invidx: InvertedIndex,
    topk: TopK,
}

impl Database {
    /// Opens the named database, creating it when `create` is set.
    ///
    /// Creating a database whose directory already exists is rejected with
    /// `AlreadyExists`; opening a database whose files are absent surfaces
    /// `FileMissing`.
    pub fn open(name: &str, create: bool, config: &DatabaseConfig) -> Result<Self> {
        let dir = config.database_dir(name);
        if create {
            if dir.exists() {
                return Err(FolioError::AlreadyExists(name.to_string()));
            }
            std::fs::create_dir_all(&dir)?;
        }

        let file = |kind: &str| -> PathBuf { dir.join(format!("{}_{}.bin", name, kind)) };

        let title = RecordStore::open(file("idx_title"), file("rec_title"), create)?;
        let author = RecordStore::open(file("idx_author"), file("rec_author"), create)?;
        let invidx = InvertedIndex::open(file("ii_idx"), file("ii_rec"), create)?;
        let topk = TopK::open(file("topk_idx"), file("topk_rec"), create)?;

        tracing::info!(
            name,
            create,
            titles = title.next_id(),
            authors = author.next_id(),
            "database opened"
        );

        Ok(Self {
            name: name.to_string(),
            title,
            author,
            invidx,
            topk,
        })
    }

    /// The database name.
    pub fn name(&self) -> &str {
        &self.name
    }

    fn subdatabase(&self, field: Field) -> &SubDatabase {
        match field {
            Field::Author => &self.author,
            Field::Title => &self.title,
        }
    }

    fn subdatabase_mut(&mut self, field: Field) -> &mut SubDatabase {
        match field {
            Field::Author => &mut self.author,
            Field::Title => &mut self.title,
        }
    }

    /// Stores one payload and indexes it under `key` in the given field.
    pub fn insert(&mut self, span: DocSpan, key: &str, field: Field) -> Result<()> {
        let sub = self.subdatabase_mut(field);
        let id = sub.append(&span)?;
        sub.tree_mut().insert(NameKey::new(key, id))
    }

    /// Ordered prefix lookup: every key starting with `prefix`, with its
    /// payload span, in key order.
    pub fn find(&self, prefix: &str, field: Field) -> Result<Vec<(DocSpan, String)>> {
        if prefix.is_empty() {
            return Err(FolioError::EmptyQuery);
        }

        let sub = self.subdatabase(field);
        let mut cursor = sub.tree().find_geq(&NameKey::new(prefix, -1))?;
        let mut results = Vec::new();
        while !cursor.is_end() && cursor.key().starts_with(prefix) {
            let id = cursor.key().record_id;
            let span = sub
                .read(id)?
                .ok_or(FolioError::PageNotFound { page: id })?;
            results.push((span, cursor.key().text()));
            cursor.advance()?;
        }
        Ok(results)
    }

    /// Fuzzy multi-word lookup through the inverted index.
    pub fn search(&self, tokens: &[String]) -> Result<Vec<DocSpan>> {
        if tokens.is_empty() || tokens.iter().all(|t| t.is_empty()) {
            return Err(FolioError::EmptyQuery);
        }
        self.invidx.find(tokens)
    }

    /// In-order key listing of a field, capped at `limit` entries.
    pub fn list(&self, field: Field, limit: usize) -> Result<Vec<String>> {
        let sub = self.subdatabase(field);
        let mut cursor = sub.tree().begin()?;
        let mut keys = Vec::new();
        while !cursor.is_end() && keys.len() < limit {
            keys.push(cursor.key().text());
            cursor.advance()?;
        }
        Ok(keys)
    }

    /// The inverted index, for ingestion.
    pub fn inverted_index(&mut self) -> &mut InvertedIndex {
        &mut self.invidx
    }

    /// The top-K tally, for ingestion and queries.
    pub fn topk(&mut self) -> &mut TopK {
        &mut self.topk
    }

    /// Number of payloads stored in a field's record file.
    pub fn record_count(&self, field: Field) -> i64 {
        self.subdatabase(field).next_id()
    }
}

impl Drop for Database {
    fn drop(&mut self) {
        tracing::info!(name = %self.name, "database closed");
    }
}
