//! JSON inputs for the batch runner: ratings and groups
//!
//! Ratings reference files by their path relative to the files directory:
//!
//! ```json
//! [
//!   {"user_id": "alice", "file": "alice/budget.docx", "favorite": true},
//!   {"user_id": "bob", "file": "shared/plan.txt", "last_changed": "2024-03-01T09:00:00Z"},
//!   {"user_id": "bob", "file": "shared/notes.md", "rating": 4.5}
//! ]
//! ```
//!
//! An entry with an explicit `rating` is used as is. Otherwise the rating is
//! derived from the interaction signals on the configured scale.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use filerec_core::config::RecommenderConfig;
use filerec_core::error::{RecError, Result};
use filerec_core::group::GroupWeight;
use filerec_core::job::Memberships;
use filerec_core::rating::{Interaction, RatingTuple};
use filerec_core::source::{FileSource, FsFile};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct RatingEntry {
    user_id: String,
    file: PathBuf,
    #[serde(default)]
    rating: Option<f64>,
    #[serde(default)]
    favorite: bool,
    #[serde(default)]
    last_changed: Option<DateTime<Utc>>,
}

/// Group memberships plus stored group-to-group weights
#[derive(Debug, Default, Deserialize)]
pub struct GroupsInput {
    #[serde(default)]
    pub memberships: Memberships,
    #[serde(default)]
    pub weights: Vec<GroupWeight>,
}

fn read_input(kind: &str, path: &Path) -> Result<String> {
    if !path.is_file() {
        return Err(RecError::InputNotFound {
            path: path.to_path_buf(),
        });
    }
    fs::read_to_string(path).map_err(|e| RecError::io_operation(kind, path.display(), e))
}

/// Load rating tuples, resolving file paths against `files_root`
pub fn load_ratings(
    path: &Path,
    files_root: &Path,
    config: &RecommenderConfig,
    now: DateTime<Utc>,
) -> Result<Vec<RatingTuple>> {
    let content = read_input("read ratings", path)?;
    let entries: Vec<RatingEntry> = serde_json::from_str(&content)?;

    let tuples = entries
        .into_iter()
        .map(|entry| {
            let item_id = FsFile::new(files_root.join(&entry.file), entry.user_id.as_str()).id();
            let rating = entry.rating.unwrap_or_else(|| {
                Interaction {
                    user_id: entry.user_id.clone(),
                    item_id,
                    favorite: entry.favorite,
                    last_changed: entry.last_changed,
                }
                .rating(config.rating_scale, now, config.recency_decay_days)
            });
            RatingTuple {
                user_id: entry.user_id,
                item_id,
                rating,
            }
        })
        .collect();
    Ok(tuples)
}

/// Load memberships and weights; weights must be finite
pub fn load_groups(path: &Path) -> Result<GroupsInput> {
    let content = read_input("read groups", path)?;
    let groups: GroupsInput = serde_json::from_str(&content)?;
    for weight in &groups.weights {
        if !weight.weight.is_finite() {
            filerec_core::bail_invalid!(
                "group weight",
                format!("{} -> {}", weight.source_group, weight.target_group)
            );
        }
    }
    Ok(groups)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use filerec_core::rating::RatingScale;
    use tempfile::tempdir;

    #[test]
    fn test_ratings_derive_from_interactions() {
        let dir = tempdir().unwrap();
        let files = dir.path().join("files");
        fs::create_dir_all(files.join("alice")).unwrap();
        fs::write(files.join("alice/a.txt"), "budget").unwrap();
        let ratings = dir.path().join("ratings.json");
        fs::write(
            &ratings,
            r#"[
                {"user_id": "alice", "file": "alice/a.txt", "favorite": true},
                {"user_id": "bob", "file": "alice/a.txt", "rating": 0.0}
            ]"#,
        )
        .unwrap();

        let config = RecommenderConfig {
            rating_scale: RatingScale::Binary,
            ..RecommenderConfig::default()
        };
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let tuples = load_ratings(&ratings, &files, &config, now).unwrap();

        let expected_id = FsFile::new(files.join("alice/a.txt"), "alice").id();
        assert_eq!(tuples.len(), 2);
        assert_eq!(tuples[0].item_id, expected_id);
        assert_eq!(tuples[0].rating, 1.0);
        assert_eq!(tuples[1].rating, 0.0);
    }

    #[test]
    fn test_missing_ratings_file() {
        let dir = tempdir().unwrap();
        let err = load_ratings(
            &dir.path().join("absent.json"),
            dir.path(),
            &RecommenderConfig::default(),
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, RecError::InputNotFound { .. }));
    }

    #[test]
    fn test_groups_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("groups.json");
        fs::write(
            &path,
            r#"{
                "memberships": {"alice": ["finance"]},
                "weights": [{"source_group": "finance", "target_group": "sales", "weight": 0.5}]
            }"#,
        )
        .unwrap();

        let groups = load_groups(&path).unwrap();
        assert_eq!(groups.memberships["alice"], vec!["finance"]);
        assert_eq!(groups.weights[0].weight, 0.5);
    }
}
