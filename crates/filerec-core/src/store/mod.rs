//! Persistence sinks for computed recommendations
//!
//! A job reads nothing back from the store except group weights and the
//! time of the previous run. Everything it produces is written in one
//! [`RecommendationStore::commit_snapshot`] call so a reader never sees a
//! half-replaced matrix.

mod memory;
mod schema;
mod sqlite;

pub use memory::MemoryStore;
pub use schema::CURRENT_SCHEMA_VERSION;
pub use sqlite::SqliteStore;

use crate::error::Result;
use crate::group::{GroupWeight, GroupWeightLookup};
use crate::item::ItemId;
use crate::keywords::KeywordList;
use crate::predict::RankedItem;
use crate::similarity::ItemToItemMatrix;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// Everything one job run produces
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub computed_at: DateTime<Utc>,
    pub matrix: ItemToItemMatrix,
    pub item_keywords: BTreeMap<ItemId, KeywordList>,
    pub profiles: BTreeMap<String, KeywordList>,
    pub recommendations: BTreeMap<String, Vec<RankedItem>>,
}

/// Keyed storage for matrices, keyword lists, recommendations and group
/// weights
pub trait RecommendationStore: GroupWeightLookup {
    fn load_matrix(&self) -> Result<ItemToItemMatrix>;

    /// Drop every stored pair and store `matrix` in its place
    fn replace_matrix(&mut self, matrix: &ItemToItemMatrix) -> Result<()>;

    fn item_keywords(&self, item_id: ItemId) -> Result<Option<KeywordList>>;

    fn put_item_keywords(&mut self, item_id: ItemId, keywords: &KeywordList) -> Result<()>;

    fn profile(&self, user_id: &str) -> Result<Option<KeywordList>>;

    fn put_profile(&mut self, user_id: &str, profile: &KeywordList) -> Result<()>;

    fn delete_profile(&mut self, user_id: &str) -> Result<()>;

    /// Stored ranking for a user, best first; empty when none is stored
    fn recommendations(&self, user_id: &str) -> Result<Vec<RankedItem>>;

    fn put_recommendations(&mut self, user_id: &str, items: &[RankedItem]) -> Result<()>;

    fn delete_recommendations(&mut self, user_id: &str) -> Result<()>;

    fn put_group_weight(&mut self, weight: &GroupWeight) -> Result<()>;

    fn delete_group_weight(&mut self, source: &str, target: &str) -> Result<()>;

    /// All stored weights ordered by (source, target)
    fn group_weights(&self) -> Result<Vec<GroupWeight>>;

    /// When the last snapshot was committed
    fn last_computed(&self) -> Result<Option<DateTime<Utc>>>;

    /// Replace all derived data with `snapshot`, all or nothing
    fn commit_snapshot(&mut self, snapshot: &Snapshot) -> Result<()>;
}
