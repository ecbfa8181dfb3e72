use super::Recommendation;
use crate::group::{GroupWeightEngine, GroupWeightLookup};
use crate::hybrid::HybridWeights;
use crate::item::{Item, ItemId};
use crate::keywords::KeywordList;
use crate::rating::RatingScale;
use crate::similarity::overlap_with_reference;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A candidate with every score that went into its final rank
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedItem {
    pub item_id: ItemId,
    pub name: String,
    /// Predicted rating normalized into [0, 1]
    pub collaborative: f64,
    /// Overlap of the item's keywords with the user's profile
    pub content_based: f64,
    pub group_weight: f64,
    pub score: f64,
}

/// Turns predicted candidates into the final ranked list
///
/// `score = hybrid(collaborative, content_based) * group_weight`, sorted
/// descending; ties keep the candidate order of the recommendation.
pub struct Ranker<'a, L: GroupWeightLookup + ?Sized> {
    weights: HybridWeights,
    scale: RatingScale,
    limit: usize,
    groups: GroupWeightEngine<'a, L>,
}

impl<'a, L: GroupWeightLookup + ?Sized> Ranker<'a, L> {
    pub fn new(weights: HybridWeights, scale: RatingScale, limit: usize, lookup: &'a L) -> Self {
        Self {
            weights,
            scale,
            limit,
            groups: GroupWeightEngine::new(lookup),
        }
    }

    /// Rank one user's candidates
    ///
    /// `item_groups` maps an item to its owner's groups; items without an
    /// entry get the neutral group weight.
    pub fn rank(
        &self,
        recommendation: &Recommendation,
        items: &[Item],
        profile: Option<&KeywordList>,
        user_groups: &[String],
        item_groups: &HashMap<ItemId, Vec<String>>,
    ) -> Vec<RankedItem> {
        let by_id: HashMap<ItemId, &Item> = items.iter().map(|i| (i.id, i)).collect();
        let no_groups: Vec<String> = Vec::new();

        let mut ranked: Vec<RankedItem> = recommendation
            .items
            .iter()
            .map(|prediction| {
                let item = by_id.get(&prediction.item_id);
                let content_based = match (item, profile) {
                    (Some(item), Some(profile)) => {
                        overlap_with_reference(item.keyword_words(), profile.words())
                    }
                    _ => 0.0,
                };
                let collaborative = self.scale.normalize(prediction.score);
                let owner_groups = item_groups.get(&prediction.item_id).unwrap_or(&no_groups);
                let group_weight = self.groups.weight(user_groups, owner_groups.as_slice());

                RankedItem {
                    item_id: prediction.item_id,
                    name: item.map(|i| i.name.clone()).unwrap_or_default(),
                    collaborative,
                    content_based,
                    group_weight,
                    score: self.weights.combine(collaborative, content_based) * group_weight,
                }
            })
            .collect();

        ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
        ranked.truncate(self.limit);
        ranked
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::group::GroupWeightTable;
    use crate::keywords::Keyword;
    use crate::predict::Prediction;

    fn keywords(words: &[&str]) -> KeywordList {
        words.iter().map(|w| Keyword::new(*w, 1.0)).collect()
    }

    fn recommendation(scores: &[(ItemId, f64)]) -> Recommendation {
        let mut rec = Recommendation::new("alice");
        for &(item_id, score) in scores {
            rec.push(Prediction { item_id, score });
        }
        rec
    }

    #[test]
    fn test_rank_by_collaborative_when_content_absent() {
        let table = GroupWeightTable::new();
        let ranker = Ranker::new(HybridWeights::BALANCED, RatingScale::Recency, 10, &table);
        let items = vec![Item::new(1, "a"), Item::new(2, "b")];
        let rec = recommendation(&[(1, 2.0), (2, 4.0)]);

        let ranked = ranker.rank(&rec, &items, None, &[], &HashMap::new());

        assert_eq!(ranked[0].item_id, 2);
        assert!((ranked[0].collaborative - 0.8).abs() < 1e-12);
        assert!((ranked[0].score - 0.4).abs() < 1e-12);
        assert_eq!(ranked[1].name, "a");
    }

    #[test]
    fn test_content_heavy_prefers_keyword_match() {
        let table = GroupWeightTable::new();
        let ranker = Ranker::new(HybridWeights::CONTENT_HEAVY, RatingScale::Recency, 10, &table);
        let items = vec![
            Item::new(1, "a").with_keywords(keywords(&["budget", "report"])),
            Item::new(2, "b").with_keywords(keywords(&["holiday"])),
        ];
        let profile = keywords(&["budget", "report", "finance"]);
        let rec = recommendation(&[(1, 3.0), (2, 5.0)]);

        let ranked = ranker.rank(&rec, &items, Some(&profile), &[], &HashMap::new());

        assert_eq!(ranked[0].item_id, 1);
        assert_eq!(ranked[0].content_based, 1.0);
        assert_eq!(ranked[1].content_based, 0.0);
    }

    #[test]
    fn test_ties_keep_candidate_order_and_limit_applies() {
        let table = GroupWeightTable::new();
        let ranker = Ranker::new(HybridWeights::BALANCED, RatingScale::Binary, 2, &table);
        let items = vec![Item::new(5, "e"), Item::new(3, "c"), Item::new(9, "i")];
        let rec = recommendation(&[(5, 1.0), (3, 1.0), (9, 1.0)]);

        let ranked = ranker.rank(&rec, &items, None, &[], &HashMap::new());

        let ids: Vec<_> = ranked.iter().map(|r| r.item_id).collect();
        assert_eq!(ids, vec![5, 3]);
    }

    #[test]
    fn test_group_weight_scales_score() {
        let mut table = GroupWeightTable::new();
        table.insert("staff", "students", 0.5);
        let ranker = Ranker::new(HybridWeights::BALANCED, RatingScale::Binary, 10, &table);
        let items = vec![Item::new(1, "a"), Item::new(2, "b")];
        let rec = recommendation(&[(1, 1.0), (2, 1.0)]);
        let item_groups = HashMap::from([(1, vec!["students".to_string()])]);

        let ranked = ranker.rank(&rec, &items, None, &["staff".to_string()], &item_groups);

        assert_eq!(ranked[0].item_id, 2);
        assert_eq!(ranked[0].group_weight, 1.0);
        assert_eq!(ranked[1].group_weight, 0.5);
        assert!((ranked[1].score - 0.25).abs() < 1e-12);
    }
}
