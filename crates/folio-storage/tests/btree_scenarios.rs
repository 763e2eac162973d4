//! Storage stack integration tests.
//!
//! Exercises the pager, B+ tree, and record store together across process
//! "restarts" (drop and reopen), at both a small test fanout and the
//! production fanout of 64.

use folio_common::DocSpan;
use folio_storage::{BplusTree, HashKey, NameKey, Pager, RecordStore};
use rand::seq::SliceRandom;
use std::sync::Arc;
use tempfile::tempdir;

fn collect_hashes<const ORDER: usize>(tree: &BplusTree<HashKey, ORDER>) -> Vec<u64> {
    let mut out = Vec::new();
    let mut cursor = tree.begin().unwrap();
    while !cursor.is_end() {
        out.push(cursor.key().hash);
        cursor.advance().unwrap();
    }
    out
}

#[test]
fn ordered_iteration_over_random_multiset() {
    let dir = tempdir().unwrap();
    let pager = Arc::new(Pager::open(dir.path().join("idx.bin"), true).unwrap());
    let mut tree: BplusTree<HashKey, 3> = BplusTree::open(pager).unwrap();

    // A multiset: every value twice, inserted in shuffled order.
    let mut values: Vec<u64> = (0..200).flat_map(|v| [v, v]).collect();
    values.shuffle(&mut rand::thread_rng());
    for &v in &values {
        tree.insert(HashKey::new(v, v as i64)).unwrap();
    }

    let collected = collect_hashes(&tree);
    assert_eq!(collected.len(), values.len());
    assert!(collected.windows(2).all(|w| w[0] <= w[1]));

    let mut expected = values.clone();
    expected.sort_unstable();
    assert_eq!(collected, expected);
}

#[test]
fn lower_bound_matches_linear_scan() {
    let dir = tempdir().unwrap();
    let pager = Arc::new(Pager::open(dir.path().join("idx.bin"), true).unwrap());
    let mut tree: BplusTree<HashKey, 3> = BplusTree::open(pager).unwrap();

    let values: Vec<u64> = (0..100).map(|v| v * 3).collect();
    for &v in &values {
        tree.insert(HashKey::new(v, 0)).unwrap();
    }

    for probe in 0..310u64 {
        let expected = values.iter().copied().find(|&v| v >= probe);
        let cursor = tree.find_geq(&HashKey::new(probe, -1)).unwrap();
        match expected {
            Some(v) => assert_eq!(cursor.key().hash, v, "probe {}", probe),
            None => assert!(cursor.is_end(), "probe {}", probe),
        }
    }
}

#[test]
fn contents_survive_reopen() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("idx.bin");

    {
        let pager = Arc::new(Pager::open(&path, true).unwrap());
        let mut tree: BplusTree<HashKey, 64> = BplusTree::open(pager).unwrap();
        for v in 0..1000u64 {
            tree.insert(HashKey::new(v, v as i64)).unwrap();
        }
    }

    let pager = Arc::new(Pager::open(&path, false).unwrap());
    let tree: BplusTree<HashKey, 64> = BplusTree::open(pager).unwrap();
    assert_eq!(collect_hashes(&tree), (0..1000).collect::<Vec<u64>>());
    for v in (0..1000u64).step_by(97) {
        let cursor = tree.find(&HashKey::new(v, -1)).unwrap().unwrap();
        assert_eq!(cursor.key().record_id, v as i64);
    }
}

#[test]
fn record_store_prefix_walk() {
    let dir = tempdir().unwrap();
    let mut store: RecordStore<NameKey, DocSpan, 64> = RecordStore::open(
        dir.path().join("idx.bin"),
        dir.path().join("rec.bin"),
        true,
    )
    .unwrap();

    let names = ["bach", "bartok", "beethoven", "berlioz", "brahms", "chopin"];
    for (i, name) in names.iter().enumerate() {
        let id = store.append(&DocSpan::new(i as u32 * 10, 5)).unwrap();
        store.tree_mut().insert(NameKey::new(name, id)).unwrap();
    }

    // All composers whose name starts with "b", in order.
    let mut cursor = store.tree().find_geq(&NameKey::new("b", -1)).unwrap();
    let mut matched = Vec::new();
    while !cursor.is_end() && cursor.key().starts_with("b") {
        let span = store.read(cursor.key().record_id).unwrap().unwrap();
        matched.push((cursor.key().text(), span.pos));
        cursor.advance().unwrap();
    }

    assert_eq!(
        matched,
        vec![
            ("bach".to_string(), 0),
            ("bartok".to_string(), 10),
            ("beethoven".to_string(), 20),
            ("berlioz".to_string(), 30),
            ("brahms".to_string(), 40),
        ]
    );
}
