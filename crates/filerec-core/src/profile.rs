//! Per-user keyword profiles

use crate::item::Item;
use crate::keywords::KeywordList;
use crate::rating::RatingScale;
use std::collections::BTreeMap;

/// Merge the keywords of every item `user_id` rated above the scale minimum
///
/// The merged list is pruned with [`KeywordList::remove_stopwords`], which
/// also leaves it sorted by score.
pub fn build_profile(items: &[Item], user_id: &str, scale: RatingScale) -> KeywordList {
    let mut profile = KeywordList::new();
    for item in items {
        let liked = item
            .rating_by(user_id)
            .is_some_and(|rating| rating > scale.min());
        if !liked {
            continue;
        }
        if let Some(keywords) = &item.keywords {
            profile.merge(keywords);
        }
    }
    profile.remove_stopwords();
    profile
}

/// Profiles for every user that rated at least one item, keyed by user id
pub fn build_profiles(items: &[Item], scale: RatingScale) -> BTreeMap<String, KeywordList> {
    let mut users: Vec<&str> = items
        .iter()
        .flat_map(|item| item.raters().map(|r| r.user_id.as_str()))
        .collect();
    users.sort_unstable();
    users.dedup();

    users
        .into_iter()
        .map(|user| (user.to_string(), build_profile(items, user, scale)))
        .collect()
}
