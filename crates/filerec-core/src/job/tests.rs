use super::*;
use crate::rating::RatingTuple;
use crate::store::MemoryStore;
use std::io;
use std::path::{Path, PathBuf};

struct MemFile {
    id: ItemId,
    path: PathBuf,
    owner: String,
    content: String,
}

impl FileSource for MemFile {
    fn id(&self) -> ItemId {
        self.id
    }

    fn media_type(&self) -> &str {
        "text/plain"
    }

    fn read_bytes(&self) -> io::Result<Vec<u8>> {
        Ok(self.content.as_bytes().to_vec())
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn owner_id(&self) -> &str {
        &self.owner
    }
}

fn file(id: ItemId, owner: &str, content: &str) -> MemFile {
    MemFile {
        id,
        path: PathBuf::from(format!("/{owner}/file-{id}.txt")),
        owner: owner.to_string(),
        content: content.to_string(),
    }
}

fn corpus() -> Vec<MemFile> {
    vec![
        file(1, "alice", "budget report for the finance team budget"),
        file(2, "alice", "finance forecast and budget planning"),
        file(3, "bob", "holiday travel plans and budget"),
    ]
}

fn rating(user: &str, item_id: ItemId, rating: f64) -> RatingTuple {
    RatingTuple {
        user_id: user.to_string(),
        item_id,
        rating,
    }
}

fn ratings() -> Vec<RatingTuple> {
    vec![
        rating("alice", 1, 5.0),
        rating("alice", 2, 4.0),
        rating("bob", 1, 5.0),
        rating("bob", 2, 4.0),
        rating("bob", 3, 5.0),
    ]
}

fn config() -> RecommenderConfig {
    RecommenderConfig {
        skip_rated_items: true,
        ..RecommenderConfig::default()
    }
}

#[test]
fn test_run_commits_snapshot() {
    let config = config();
    let mut store = MemoryStore::new();

    let report = RecommendationJob::new(&config)
        .run(&corpus(), &ratings(), &Memberships::new(), &mut store)
        .unwrap();

    assert_eq!(report.files, 3);
    assert_eq!(report.files_with_text, 3);
    assert_eq!(report.extractions_timed_out, 0);
    assert_eq!(report.ratings, 5);
    assert_eq!(report.matrix_pairs, 3);
    assert_eq!(report.users, vec!["alice", "bob"]);
    assert!(!report.run_id.is_empty());

    // alice has not rated item 3; its neighbours predict (5 + 4) / 2
    let alice = store.recommendations("alice").unwrap();
    assert_eq!(alice.len(), 1);
    assert_eq!(alice[0].item_id, 3);
    assert_eq!(alice[0].name, "file-3.txt");
    assert!((alice[0].collaborative - 0.9).abs() < 1e-9);

    assert!(store.recommendations("bob").unwrap().is_empty());
    assert!(store.profile("alice").unwrap().is_some());
    assert!(store.item_keywords(1).unwrap().is_some());
    assert_eq!(store.load_matrix().unwrap().get(1, 3), 1.0);
    assert!(store.last_computed().unwrap().is_some());
}

#[test]
fn test_invalid_and_unknown_ratings_are_skipped() {
    let config = config();
    let mut input = ratings();
    input.push(rating("carol", 42, 3.0));
    input.push(rating("carol", 1, 7.5));

    let (_, report) = RecommendationJob::new(&config)
        .compute(&corpus(), &input, &Memberships::new(), &MemoryStore::new())
        .unwrap();

    assert_eq!(report.ratings, 5);
    assert_eq!(report.ratings_skipped, 2);
    assert!(!report.users.contains(&"carol".to_string()));
}

#[test]
fn test_duplicate_file_ids_are_skipped() {
    let config = config();
    let mut files = corpus();
    files.push(file(1, "alice", "a second copy"));

    let (snapshot, _) = RecommendationJob::new(&config)
        .compute(&files, &ratings(), &Memberships::new(), &MemoryStore::new())
        .unwrap();

    assert_eq!(snapshot.item_keywords.len(), 3);
}

#[test]
fn test_group_weights_scale_scores() {
    let config = config();
    let mut store = MemoryStore::new();
    store
        .put_group_weight(&crate::group::GroupWeight {
            source_group: "finance".into(),
            target_group: "sales".into(),
            weight: 0.5,
        })
        .unwrap();
    let memberships = Memberships::from([
        ("alice".to_string(), vec!["finance".to_string()]),
        ("bob".to_string(), vec!["sales".to_string()]),
    ]);

    RecommendationJob::new(&config)
        .run(&corpus(), &ratings(), &memberships, &mut store)
        .unwrap();

    let alice = store.recommendations("alice").unwrap();
    assert_eq!(alice[0].group_weight, 0.5);
}

#[test]
fn test_interrupt_leaves_previous_snapshot() {
    let config = config();
    let mut store = MemoryStore::new();
    RecommendationJob::new(&config)
        .run(&corpus(), &ratings(), &Memberships::new(), &mut store)
        .unwrap();
    let before = store.last_computed().unwrap();

    let flag = Arc::new(AtomicBool::new(true));
    let err = RecommendationJob::new(&config)
        .with_interrupt(flag)
        .run(&corpus(), &Vec::<RatingTuple>::new(), &Memberships::new(), &mut store)
        .unwrap_err();

    assert!(matches!(err, RecError::Interrupted));
    assert_eq!(store.last_computed().unwrap(), before);
    assert_eq!(store.recommendations("alice").unwrap().len(), 1);
}

#[test]
fn test_deadline_stops_before_commit() {
    let config = config();
    let mut store = MemoryStore::new();

    let err = RecommendationJob::new(&config)
        .with_deadline(Duration::ZERO)
        .run(&corpus(), &ratings(), &Memberships::new(), &mut store)
        .unwrap_err();

    assert!(matches!(err, RecError::DeadlineExceeded { .. }));
    assert_eq!(store.last_computed().unwrap(), None);
}

#[test]
fn test_is_due_follows_interval() {
    let config = config();
    let job = RecommendationJob::new(&config);
    let mut store = MemoryStore::new();
    assert!(job.is_due(&store, Utc::now()).unwrap());

    job.run(&corpus(), &ratings(), &Memberships::new(), &mut store)
        .unwrap();
    let now = Utc::now();
    assert!(!job.is_due(&store, now).unwrap());
    assert!(job.is_due(&store, now + chrono::Duration::days(2)).unwrap());
}

#[test]
fn test_empty_corpus() {
    let config = config();
    let mut store = MemoryStore::new();
    let files: Vec<MemFile> = Vec::new();

    let report = RecommendationJob::new(&config)
        .run(&files, &Vec::<RatingTuple>::new(), &Memberships::new(), &mut store)
        .unwrap();

    assert_eq!(report.matrix_pairs, 0);
    assert!(report.users.is_empty());
}

#[test]
fn test_dedicated_similarity_pool() {
    let config = RecommenderConfig {
        similarity_workers: 2,
        ..config()
    };
    let (snapshot, _) = RecommendationJob::new(&config)
        .compute(&corpus(), &ratings(), &Memberships::new(), &MemoryStore::new())
        .unwrap();
    assert_eq!(snapshot.matrix.len(), 3);
}

#[test]
fn test_interrupt_stops_matrix_build() {
    let config = config();
    let items: Vec<Item> = (1..=4).map(|id| Item::new(id, format!("file-{id}"))).collect();
    let interrupt = AtomicBool::new(true);
    let budget = Budget {
        started: Instant::now(),
        deadline: Duration::from_secs(60),
        interrupt: &interrupt,
    };

    let err = RecommendationJob::new(&config)
        .build_matrix(&items, &budget)
        .unwrap_err();
    assert!(matches!(err, RecError::Interrupted));
}

#[test]
fn test_deadline_stops_pooled_matrix_build() {
    let config = RecommenderConfig {
        similarity_workers: 2,
        ..config()
    };
    let items: Vec<Item> = (1..=4).map(|id| Item::new(id, format!("file-{id}"))).collect();
    let interrupt = AtomicBool::new(false);
    let budget = Budget {
        started: Instant::now(),
        deadline: Duration::ZERO,
        interrupt: &interrupt,
    };

    let err = RecommendationJob::new(&config)
        .build_matrix(&items, &budget)
        .unwrap_err();
    assert!(matches!(err, RecError::DeadlineExceeded { .. }));
}
