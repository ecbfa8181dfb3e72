use super::{RecommendationStore, Snapshot};
use crate::error::Result;
use crate::group::{GroupWeight, GroupWeightLookup};
use crate::item::ItemId;
use crate::keywords::KeywordList;
use crate::predict::RankedItem;
use crate::similarity::ItemToItemMatrix;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// In-process store; contents live as long as the value
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    matrix: ItemToItemMatrix,
    item_keywords: BTreeMap<ItemId, KeywordList>,
    profiles: BTreeMap<String, KeywordList>,
    recommendations: BTreeMap<String, Vec<RankedItem>>,
    group_weights: BTreeMap<(String, String), f64>,
    last_computed: Option<DateTime<Utc>>,
}

// empty keyword lists read back as absent, as they do from SQLite
fn non_empty<K: Ord + Clone>(lists: &BTreeMap<K, KeywordList>) -> BTreeMap<K, KeywordList> {
    lists
        .iter()
        .filter(|(_, list)| !list.is_empty())
        .map(|(key, list)| (key.clone(), list.clone()))
        .collect()
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl GroupWeightLookup for MemoryStore {
    fn group_weight(&self, source: &str, target: &str) -> Result<Option<f64>> {
        Ok(self
            .group_weights
            .get(&(source.to_string(), target.to_string()))
            .copied())
    }
}

impl RecommendationStore for MemoryStore {
    fn load_matrix(&self) -> Result<ItemToItemMatrix> {
        Ok(self.matrix.clone())
    }

    fn replace_matrix(&mut self, matrix: &ItemToItemMatrix) -> Result<()> {
        self.matrix = matrix.clone();
        Ok(())
    }

    fn item_keywords(&self, item_id: ItemId) -> Result<Option<KeywordList>> {
        Ok(self.item_keywords.get(&item_id).cloned())
    }

    fn put_item_keywords(&mut self, item_id: ItemId, keywords: &KeywordList) -> Result<()> {
        if keywords.is_empty() {
            self.item_keywords.remove(&item_id);
        } else {
            self.item_keywords.insert(item_id, keywords.clone());
        }
        Ok(())
    }

    fn profile(&self, user_id: &str) -> Result<Option<KeywordList>> {
        Ok(self.profiles.get(user_id).cloned())
    }

    fn put_profile(&mut self, user_id: &str, profile: &KeywordList) -> Result<()> {
        if profile.is_empty() {
            self.profiles.remove(user_id);
        } else {
            self.profiles.insert(user_id.to_string(), profile.clone());
        }
        Ok(())
    }

    fn delete_profile(&mut self, user_id: &str) -> Result<()> {
        self.profiles.remove(user_id);
        Ok(())
    }

    fn recommendations(&self, user_id: &str) -> Result<Vec<RankedItem>> {
        Ok(self
            .recommendations
            .get(user_id)
            .cloned()
            .unwrap_or_default())
    }

    fn put_recommendations(&mut self, user_id: &str, items: &[RankedItem]) -> Result<()> {
        self.recommendations
            .insert(user_id.to_string(), items.to_vec());
        Ok(())
    }

    fn delete_recommendations(&mut self, user_id: &str) -> Result<()> {
        self.recommendations.remove(user_id);
        Ok(())
    }

    fn put_group_weight(&mut self, weight: &GroupWeight) -> Result<()> {
        self.group_weights.insert(
            (weight.source_group.clone(), weight.target_group.clone()),
            weight.weight,
        );
        Ok(())
    }

    fn delete_group_weight(&mut self, source: &str, target: &str) -> Result<()> {
        self.group_weights
            .remove(&(source.to_string(), target.to_string()));
        Ok(())
    }

    fn group_weights(&self) -> Result<Vec<GroupWeight>> {
        Ok(self
            .group_weights
            .iter()
            .map(|((source, target), weight)| GroupWeight {
                source_group: source.clone(),
                target_group: target.clone(),
                weight: *weight,
            })
            .collect())
    }

    fn last_computed(&self) -> Result<Option<DateTime<Utc>>> {
        Ok(self.last_computed)
    }

    fn commit_snapshot(&mut self, snapshot: &Snapshot) -> Result<()> {
        self.matrix = snapshot.matrix.clone();
        self.item_keywords = non_empty(&snapshot.item_keywords);
        self.profiles = non_empty(&snapshot.profiles);
        self.recommendations = snapshot.recommendations.clone();
        self.last_computed = Some(snapshot.computed_at);
        Ok(())
    }
}
