//! Streaming XML ingestion.
//!
//! One pass over the corpus with a pull parser. Direct children of the root
//! element are records; each record's byte span runs from the end of the
//! previous record (initially the end of the root start tag) to the end of
//! its own end tag. `<author>` and `<title>` text becomes the keys fed into
//! the subdatabases, the inverted index, and (for authors) the top-K tally.

use crate::database::Database;
use folio_common::{DocSpan, Field, FolioError, Result};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Counters reported after an ingest pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestStats {
    /// Record elements flushed.
    pub records: u64,
    /// Keys inserted across both fields.
    pub keys: u64,
    /// Elements seen, for progress reporting.
    pub elements: u64,
}

/// Reads `path` and feeds every record into `db`.
pub fn ingest_xml(db: &mut Database, path: impl AsRef<Path>) -> Result<IngestStats> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let mut reader = Reader::from_reader(BufReader::new(file));

    let mut buf = Vec::new();
    let mut stats = IngestStats::default();
    let mut depth = 0usize;
    let mut span_start = 0usize;
    let mut capturing: Option<Field> = None;
    let mut text = String::new();
    let mut authors: Vec<String> = Vec::new();
    let mut titles: Vec<String> = Vec::new();

    tracing::info!(path = %path.display(), "ingest started");

    loop {
        match reader.read_event_into(&mut buf) {
            Err(e) => return Err(FolioError::Xml(e.to_string())),
            Ok(Event::Eof) => break,
            Ok(Event::Start(start)) => {
                depth += 1;
                text.clear();
                capturing = field_of(start.name().as_ref());
                if depth == 1 {
                    // Record spans begin after the root start tag.
                    span_start = reader.buffer_position();
                }
            }
            Ok(Event::End(end)) => {
                capturing = field_of(end.name().as_ref());
                depth = depth.saturating_sub(1);
                stats.elements += 1;
                if stats.elements % 100_000 == 0 {
                    tracing::info!(elements = stats.elements, "ingest progress");
                }

                if let Some(field) = capturing {
                    for key in split_keys(&text) {
                        match field {
                            Field::Author => authors.push(key),
                            Field::Title => titles.push(key),
                        }
                    }
                    text.clear();
                }

                if depth == 1 {
                    let end_pos = reader.buffer_position();
                    let span =
                        DocSpan::new(span_start as u32, (end_pos - span_start) as u32);
                    stats.keys += flush_record(db, &mut authors, &mut titles, span)?;
                    span_start = end_pos;
                    stats.records += 1;
                }
            }
            Ok(Event::Empty(_)) => {
                stats.elements += 1;
                text.clear();
                capturing = None;
            }
            Ok(Event::Text(t)) => {
                if capturing.is_some() {
                    let piece = t
                        .unescape()
                        .map_err(|e| FolioError::Xml(e.to_string()))?;
                    text.push_str(&piece);
                }
            }
            Ok(_) => {}
        }
        buf.clear();
    }

    tracing::info!(
        records = stats.records,
        keys = stats.keys,
        "ingest finished"
    );
    Ok(stats)
}

fn field_of(name: &[u8]) -> Option<Field> {
    match name {
        b"author" => Some(Field::Author),
        b"title" => Some(Field::Title),
        _ => None,
    }
}

/// Splits an element's text into individual keys on `" - "` and `"; "`,
/// whichever comes first, repeatedly. Blank pieces are dropped.
fn split_keys(text: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut rest = text;
    loop {
        let dash = rest.find(" - ");
        let semi = rest.find("; ");
        let (at, sep_len) = match (dash, semi) {
            (Some(d), Some(s)) if d < s => (d, 3),
            (Some(d), None) => (d, 3),
            (_, Some(s)) => (s, 2),
            (None, None) => break,
        };
        push_trimmed(&mut out, &rest[..at]);
        rest = &rest[at + sep_len..];
    }
    push_trimmed(&mut out, rest);
    out
}

fn push_trimmed(out: &mut Vec<String>, piece: &str) {
    let trimmed = piece.trim();
    if !trimmed.is_empty() {
        out.push(trimmed.to_string());
    }
}

fn flush_record(
    db: &mut Database,
    authors: &mut Vec<String>,
    titles: &mut Vec<String>,
    span: DocSpan,
) -> Result<u64> {
    let mut keys = 0;
    for name in authors.drain(..) {
        db.insert(span, &name, Field::Author)?;
        db.inverted_index().build(name.split_whitespace(), span)?;
        db.topk().insert(&name)?;
        keys += 1;
    }
    for title in titles.drain(..) {
        db.insert(span, &title, Field::Title)?;
        db.inverted_index().build(title.split_whitespace(), span)?;
        keys += 1;
    }
    Ok(keys)
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_common::DatabaseConfig;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_split_keys_single() {
        assert_eq!(split_keys("A Single Title"), vec!["A Single Title"]);
    }

    #[test]
    fn test_split_keys_separators() {
        assert_eq!(
            split_keys("Ann Smith; Bob Jones"),
            vec!["Ann Smith", "Bob Jones"]
        );
        assert_eq!(split_keys("Part One - Part Two"), vec!["Part One", "Part Two"]);
        assert_eq!(
            split_keys("A - B; C - D"),
            vec!["A", "B", "C", "D"]
        );
    }

    #[test]
    fn test_split_keys_drops_blanks() {
        assert!(split_keys("   ").is_empty());
        assert_eq!(split_keys("X;  "), vec!["X"]);
        assert_eq!(split_keys("A;  - B"), vec!["A", "B"]);
    }

    #[test]
    fn test_ingest_small_corpus() {
        let dir = tempdir().unwrap();
        let config = DatabaseConfig {
            data_dir: dir.path().join("db"),
            ..Default::default()
        };

        let xml_path = dir.path().join("corpus.xml");
        let mut file = File::create(&xml_path).unwrap();
        write!(
            file,
            "<dblp><article><author>Ann Smith</author>\
             <title>Red Fox Tales</title></article>\
             <article><author>Bob Jones; Ann Smith</author>\
             <title>Red Bird Song</title></article></dblp>"
        )
        .unwrap();

        let mut db = Database::open("t", true, &config).unwrap();
        let stats = ingest_xml(&mut db, &xml_path).unwrap();

        assert_eq!(stats.records, 2);
        // Record 1: one author + one title; record 2: two authors + one title.
        assert_eq!(stats.keys, 5);

        // Prefix lookup over ingested authors.
        let hits = db.find("Ann", Field::Author).unwrap();
        assert_eq!(hits.len(), 2);

        // Inverted index intersection over ingested tokens.
        let red = db.search(&["Red".to_string()]).unwrap();
        assert_eq!(red.len(), 2);
        let red_fox = db
            .search(&["Red".to_string(), "Fox".to_string()])
            .unwrap();
        assert_eq!(red_fox.len(), 1);

        // Tally over authors.
        db.topk().make_topk(10).unwrap();
        let top = db.topk().top(1);
        assert_eq!(top, vec![("Ann Smith".to_string(), 2)]);

        // Spans point back into the source file.
        let bytes = std::fs::read(&xml_path).unwrap();
        let span = red_fox[0];
        let excerpt =
            &bytes[span.pos as usize..(span.pos + span.len) as usize];
        let excerpt = String::from_utf8_lossy(excerpt);
        assert!(excerpt.contains("Red Fox Tales"), "excerpt: {}", excerpt);
    }
}
