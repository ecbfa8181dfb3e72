//! Items (files) and the ratings users attach to them

use crate::error::Result;
use crate::keywords::KeywordList;
use crate::rating::RatingScale;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Stable numeric file id
pub type ItemId = u64;

/// A user's rating of an item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rater {
    pub user_id: String,
    pub rating: f64,
}

impl Rater {
    /// Build a rater whose rating lies on `scale`
    pub fn new(user_id: impl Into<String>, rating: f64, scale: RatingScale) -> Result<Self> {
        Ok(Self {
            user_id: user_id.into(),
            rating: scale.validate(rating)?,
        })
    }
}

/// One file with its keywords and raters
///
/// Raters are keyed by user id in sorted order, so any traversal over
/// shared raters visits them in the same sequence from either side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    /// Absent until content has been processed
    pub keywords: Option<KeywordList>,
    raters: BTreeMap<String, Rater>,
}

impl Item {
    pub fn new(id: ItemId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            keywords: None,
            raters: BTreeMap::new(),
        }
    }

    pub fn with_keywords(mut self, keywords: KeywordList) -> Self {
        self.keywords = Some(keywords);
        self
    }

    /// Attach a rater, replacing any earlier rating by the same user
    pub fn add_rater(&mut self, rater: Rater) {
        self.raters.insert(rater.user_id.clone(), rater);
    }

    pub fn set_keywords(&mut self, keywords: KeywordList) {
        self.keywords = Some(keywords);
    }

    pub fn rating_by(&self, user_id: &str) -> Option<f64> {
        self.raters.get(user_id).map(|r| r.rating)
    }

    pub fn raters(&self) -> impl Iterator<Item = &Rater> {
        self.raters.values()
    }

    pub fn rater_count(&self) -> usize {
        self.raters.len()
    }

    /// Mean rating over this item's own raters, 0 when unrated
    pub fn mean_rating(&self) -> f64 {
        if self.raters.is_empty() {
            return 0.0;
        }
        self.raters.values().map(|r| r.rating).sum::<f64>() / self.raters.len() as f64
    }

    /// Keyword texts, empty when content has not been processed
    pub fn keyword_words(&self) -> Vec<&str> {
        self.keywords
            .as_ref()
            .map(|k| k.words().collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RecError;

    #[test]
    fn test_re_adding_rater_replaces() {
        let mut item = Item::new(1, "report.pdf");
        item.add_rater(Rater::new("u1", 2.0, RatingScale::Recency).unwrap());
        item.add_rater(Rater::new("u1", 4.0, RatingScale::Recency).unwrap());
        assert_eq!(item.rater_count(), 1);
        assert_eq!(item.rating_by("u1"), Some(4.0));
    }

    #[test]
    fn test_rater_rejects_off_scale_rating() {
        let err = Rater::new("u1", 2.0, RatingScale::Binary).unwrap_err();
        assert!(matches!(err, RecError::RatingOutOfRange { .. }));
    }

    #[test]
    fn test_mean_rating() {
        let mut item = Item::new(1, "a.txt");
        assert_eq!(item.mean_rating(), 0.0);
        item.add_rater(Rater::new("u1", 5.0, RatingScale::Recency).unwrap());
        item.add_rater(Rater::new("u2", 3.0, RatingScale::Recency).unwrap());
        assert_eq!(item.mean_rating(), 4.0);
    }

    #[test]
    fn test_keywords_absent_until_processed() {
        let item = Item::new(1, "a.txt");
        assert!(item.keywords.is_none());
        assert!(item.keyword_words().is_empty());
    }
}
