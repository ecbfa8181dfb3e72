//! End-to-end runs over files on disk with a SQLite store

use std::fs;
use std::path::Path;

use chrono::Utc;
use filerec_core::config::RecommenderConfig;
use filerec_core::job::{Memberships, RecommendationJob};
use filerec_core::rating::RatingTuple;
use filerec_core::source::{scan_dir, FileSource, FsFile};
use filerec_core::store::{RecommendationStore, SqliteStore};
use tempfile::tempdir;

fn write_corpus(root: &Path) {
    fs::create_dir_all(root.join("alice")).unwrap();
    fs::create_dir_all(root.join("bob")).unwrap();
    fs::write(
        root.join("alice/budget.txt"),
        "budget report for the finance team budget",
    )
    .unwrap();
    fs::write(
        root.join("alice/forecast.html"),
        "<html><body><h1>Finance forecast</h1><p>budget planning</p></body></html>",
    )
    .unwrap();
    fs::write(root.join("bob/travel.txt"), "holiday travel plans and budget").unwrap();
    fs::write(root.join(".hidden"), "never scanned").unwrap();
}

fn id_of(root: &Path, relative: &str) -> u64 {
    FsFile::new(root.join(relative), "").id()
}

fn ratings(root: &Path) -> Vec<RatingTuple> {
    let rate = |user: &str, file: &str, rating: f64| RatingTuple {
        user_id: user.to_string(),
        item_id: id_of(root, file),
        rating,
    };
    vec![
        rate("alice", "alice/budget.txt", 5.0),
        rate("alice", "alice/forecast.html", 4.0),
        rate("bob", "alice/budget.txt", 5.0),
        rate("bob", "alice/forecast.html", 4.0),
        rate("bob", "bob/travel.txt", 5.0),
    ]
}

fn config() -> RecommenderConfig {
    RecommenderConfig {
        skip_rated_items: true,
        ..RecommenderConfig::default()
    }
}

#[test]
fn test_directory_run_persists_recommendations() {
    let dir = tempdir().unwrap();
    let root = dir.path().join("files");
    write_corpus(&root);
    let db = dir.path().join("state").join("filerec.db");
    let config = config();

    let files = scan_dir(&root, "admin").unwrap();
    assert_eq!(files.len(), 3);
    assert_eq!(files[0].owner_id(), "alice");
    assert_eq!(files[2].owner_id(), "bob");

    {
        let mut store = SqliteStore::open(&db).unwrap();
        let report = RecommendationJob::new(&config)
            .run(&files, &ratings(&root), &Memberships::new(), &mut store)
            .unwrap();
        assert_eq!(report.files_with_text, 3);
        assert_eq!(report.ratings, 5);
        assert_eq!(report.users, vec!["alice", "bob"]);
    }

    let store = SqliteStore::open(&db).unwrap();
    let alice = store.recommendations("alice").unwrap();
    assert_eq!(alice.len(), 1);
    assert_eq!(alice[0].item_id, id_of(&root, "bob/travel.txt"));
    assert_eq!(alice[0].name, "travel.txt");
    assert!(store.recommendations("bob").unwrap().is_empty());

    let html_keywords = store
        .item_keywords(id_of(&root, "alice/forecast.html"))
        .unwrap()
        .unwrap();
    assert!(!html_keywords.contains("html"));
    assert!(!html_keywords.contains("body"));
}

#[test]
fn test_rerun_respects_interval() {
    let dir = tempdir().unwrap();
    let root = dir.path().join("files");
    write_corpus(&root);
    let config = config();
    let job = RecommendationJob::new(&config);
    let mut store = SqliteStore::open(&dir.path().join("filerec.db")).unwrap();

    assert!(job.is_due(&store, Utc::now()).unwrap());
    let files = scan_dir(&root, "admin").unwrap();
    job.run(&files, &ratings(&root), &Memberships::new(), &mut store)
        .unwrap();
    let first = store.last_computed().unwrap().unwrap();
    assert!(!job.is_due(&store, Utc::now()).unwrap());

    // a new file and a second run replace the whole snapshot
    fs::write(root.join("bob/notes.txt"), "travel budget notes").unwrap();
    let files = scan_dir(&root, "admin").unwrap();
    let report = job
        .run(&files, &ratings(&root), &Memberships::new(), &mut store)
        .unwrap();
    assert_eq!(report.files, 4);
    assert!(store.last_computed().unwrap().unwrap() >= first);
    assert!(store
        .item_keywords(id_of(&root, "bob/notes.txt"))
        .unwrap()
        .is_some());
}
