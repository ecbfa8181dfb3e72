//! Group-to-group affinity weights

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Weight assumed for a pair with no stored entry ("fully similar")
pub const DEFAULT_GROUP_WEIGHT: f64 = 1.0;

/// One stored affinity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupWeight {
    pub source_group: String,
    pub target_group: String,
    pub weight: f64,
}

/// Read access to stored group weights
pub trait GroupWeightLookup {
    fn group_weight(&self, source: &str, target: &str) -> Result<Option<f64>>;
}

/// In-memory weight table
#[derive(Debug, Clone, Default)]
pub struct GroupWeightTable {
    weights: HashMap<(String, String), f64>,
}

impl GroupWeightTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, source: impl Into<String>, target: impl Into<String>, weight: f64) {
        self.weights.insert((source.into(), target.into()), weight);
    }
}

impl FromIterator<GroupWeight> for GroupWeightTable {
    fn from_iter<I: IntoIterator<Item = GroupWeight>>(iter: I) -> Self {
        let mut table = GroupWeightTable::new();
        for w in iter {
            table.insert(w.source_group, w.target_group, w.weight);
        }
        table
    }
}

impl GroupWeightLookup for GroupWeightTable {
    fn group_weight(&self, source: &str, target: &str) -> Result<Option<f64>> {
        Ok(self
            .weights
            .get(&(source.to_string(), target.to_string()))
            .copied())
    }
}

/// Averages stored weights over the source x target cross product
pub struct GroupWeightEngine<'a, L: GroupWeightLookup + ?Sized> {
    lookup: &'a L,
}

impl<'a, L: GroupWeightLookup + ?Sized> GroupWeightEngine<'a, L> {
    pub fn new(lookup: &'a L) -> Self {
        GroupWeightEngine { lookup }
    }

    /// Mean pairwise weight; missing pairs count as 1.0 and an empty side
    /// yields the neutral weight 1.0
    ///
    /// A failed lookup is logged and treated as a missing pair.
    pub fn weight<S, T>(&self, source_groups: &[S], target_groups: &[T]) -> f64
    where
        S: AsRef<str>,
        T: AsRef<str>,
    {
        if source_groups.is_empty() || target_groups.is_empty() {
            return DEFAULT_GROUP_WEIGHT;
        }

        let mut total = 0.0;
        for source in source_groups {
            for target in target_groups {
                let (source, target) = (source.as_ref(), target.as_ref());
                let weight = match self.lookup.group_weight(source, target) {
                    Ok(Some(w)) => w,
                    Ok(None) => DEFAULT_GROUP_WEIGHT,
                    Err(e) => {
                        tracing::warn!(source, target, error = %e, "Group weight lookup failed");
                        DEFAULT_GROUP_WEIGHT
                    }
                };
                total += weight;
            }
        }
        total / (source_groups.len() * target_groups.len()) as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RecError;

    struct Broken;

    impl GroupWeightLookup for Broken {
        fn group_weight(&self, _: &str, _: &str) -> Result<Option<f64>> {
            Err(RecError::Other("database unavailable".into()))
        }
    }

    #[test]
    fn test_empty_source_groups_is_neutral() {
        let mut table = GroupWeightTable::new();
        table.insert("staff", "students", 0.1);
        let engine = GroupWeightEngine::new(&table);
        let none: [&str; 0] = [];
        assert_eq!(engine.weight(&none, &["students"]), 1.0);
        assert_eq!(engine.weight(&none, &none), 1.0);
    }

    #[test]
    fn test_missing_pairs_default_to_one() {
        let table = GroupWeightTable::new();
        let engine = GroupWeightEngine::new(&table);
        assert_eq!(engine.weight(&["a", "b"], &["c"]), 1.0);
    }

    #[test]
    fn test_average_over_cross_product() {
        let mut table = GroupWeightTable::new();
        table.insert("staff", "students", 0.2);
        table.insert("staff", "alumni", 0.6);
        table.insert("admins", "students", 0.0);
        let engine = GroupWeightEngine::new(&table);

        // (0.2 + 0.6 + 0.0 + 1.0) / 4
        let weight = engine.weight(&["staff", "admins"], &["students", "alumni"]);
        assert!((weight - 0.45).abs() < 1e-12);
    }

    #[test]
    fn test_weights_are_directional() {
        let table: GroupWeightTable = [GroupWeight {
            source_group: "staff".into(),
            target_group: "students".into(),
            weight: 0.5,
        }]
        .into_iter()
        .collect();
        let engine = GroupWeightEngine::new(&table);
        assert_eq!(engine.weight(&["staff"], &["students"]), 0.5);
        assert_eq!(engine.weight(&["students"], &["staff"]), 1.0);
    }

    #[test]
    fn test_failed_lookup_falls_back_to_default() {
        let engine = GroupWeightEngine::new(&Broken);
        assert_eq!(engine.weight(&["a"], &["b"]), 1.0);
    }
}
