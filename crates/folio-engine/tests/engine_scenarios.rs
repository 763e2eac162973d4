//! End-to-end engine scenarios: create, ingest, query, reopen.

use folio_common::{DatabaseConfig, DocSpan, Field, FolioError};
use folio_engine::{ingest_xml, Database};
use std::io::Write;
use tempfile::tempdir;

fn config(dir: &std::path::Path) -> DatabaseConfig {
    DatabaseConfig {
        data_dir: dir.to_path_buf(),
        ..Default::default()
    }
}

#[test]
fn titles_prefix_find_and_ordered_listing() {
    let dir = tempdir().unwrap();
    let config = config(dir.path());
    let mut db = Database::open("t", true, &config).unwrap();

    let titles = [
        ("alpha", DocSpan::new(10, 1)),
        ("beta", DocSpan::new(20, 1)),
        ("gamma", DocSpan::new(30, 1)),
        ("delta", DocSpan::new(40, 1)),
    ];
    for (title, span) in titles {
        db.insert(span, title, Field::Title).unwrap();
    }

    let hits = db.find("be", Field::Title).unwrap();
    assert_eq!(hits, vec![(DocSpan::new(20, 1), "beta".to_string())]);

    let listing = db.list(Field::Title, 64).unwrap();
    assert_eq!(listing, vec!["alpha", "beta", "delta", "gamma"]);
}

#[test]
fn reopened_database_answers_queries() {
    let dir = tempdir().unwrap();
    let config = config(dir.path());

    {
        let mut db = Database::open("t", true, &config).unwrap();
        for (title, span) in [
            ("alpha", DocSpan::new(10, 1)),
            ("beta", DocSpan::new(20, 1)),
            ("gamma", DocSpan::new(30, 1)),
            ("delta", DocSpan::new(40, 1)),
        ] {
            db.insert(span, title, Field::Title).unwrap();
        }
    }

    let db = Database::open("t", false, &config).unwrap();
    let hits = db.find("gamma", Field::Title).unwrap();
    assert_eq!(hits, vec![(DocSpan::new(30, 1), "gamma".to_string())]);
}

#[test]
fn inverted_index_intersection_scenario() {
    let dir = tempdir().unwrap();
    let config = config(dir.path());
    let mut db = Database::open("t", true, &config).unwrap();

    db.inverted_index()
        .build(["red", "fox"], DocSpan::new(100, 50))
        .unwrap();
    db.inverted_index()
        .build(["red", "bird"], DocSpan::new(200, 30))
        .unwrap();

    let red = db.search(&["red".to_string()]).unwrap();
    assert_eq!(red, vec![DocSpan::new(100, 50), DocSpan::new(200, 30)]);

    let red_fox = db.search(&["red".to_string(), "fox".to_string()]).unwrap();
    assert_eq!(red_fox, vec![DocSpan::new(100, 50)]);

    let cat = db.search(&["cat".to_string()]).unwrap();
    assert!(cat.is_empty());
}

#[test]
fn topk_name_stream_scenario() {
    let dir = tempdir().unwrap();
    let config = config(dir.path());
    let mut db = Database::open("t", true, &config).unwrap();

    for name in ["alice", "bob", "alice", "alice", "carol", "bob"] {
        db.topk().insert(name).unwrap();
    }
    db.topk().make_topk(2).unwrap();

    assert_eq!(
        db.topk().top(2),
        vec![("alice".to_string(), 3), ("bob".to_string(), 2)]
    );
}

#[test]
fn lifecycle_rejections() {
    let dir = tempdir().unwrap();
    let config = config(dir.path());

    drop(Database::open("t", true, &config).unwrap());

    // Creating an existing database is rejected.
    assert!(matches!(
        Database::open("t", true, &config),
        Err(FolioError::AlreadyExists(_))
    ));

    // Opening a missing one surfaces the missing file.
    assert!(matches!(
        Database::open("nowhere", false, &config),
        Err(FolioError::FileMissing { .. })
    ));
}

#[test]
fn full_ingest_round_trip_with_reopen() {
    let dir = tempdir().unwrap();
    let config = config(dir.path());

    let xml_path = dir.path().join("corpus.xml");
    let mut file = std::fs::File::create(&xml_path).unwrap();
    write!(
        file,
        "<dblp>\
         <article><author>Donald Knuth</author>\
         <title>The Art of Computer Programming</title></article>\
         <inproceedings><author>Edsger Dijkstra; Tony Hoare</author>\
         <title>Structured Programming</title></inproceedings>\
         <article><author>Donald Knuth</author>\
         <title>Literate Programming</title></article>\
         </dblp>"
    )
    .unwrap();

    {
        let mut db = Database::open("dblp", true, &config).unwrap();
        let stats = ingest_xml(&mut db, &xml_path).unwrap();
        assert_eq!(stats.records, 3);
        db.topk().make_topk(1024).unwrap();
    }

    let mut db = Database::open("dblp", false, &config).unwrap();

    // Prefix lookup on authors survives the reopen.
    let knuth = db.find("Donald", Field::Author).unwrap();
    assert_eq!(knuth.len(), 2);

    // Tokens from every title are searchable; "Programming" appears in all
    // three records.
    let programming = db.search(&["Programming".to_string()]).unwrap();
    assert_eq!(programming.len(), 3);
    let structured = db
        .search(&["Structured".to_string(), "Programming".to_string()])
        .unwrap();
    assert_eq!(structured.len(), 1);

    // The tally was persisted key by key; rebuilding it from the record
    // file yields Knuth on top.
    db.topk().make_topk(16).unwrap();
    let top = db.topk().top(1);
    assert_eq!(top, vec![("Donald Knuth".to_string(), 2)]);

    // Each span re-reads to a well-formed excerpt of the corpus.
    let bytes = std::fs::read(&xml_path).unwrap();
    let span = structured[0];
    let excerpt = &bytes[span.pos as usize..(span.pos + span.len) as usize];
    let excerpt = String::from_utf8_lossy(excerpt);
    assert!(excerpt.contains("<inproceedings>"));
    assert!(excerpt.contains("Structured Programming"));
}
