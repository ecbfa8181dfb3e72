use crate::item::Item;
use std::collections::HashSet;

/// Overlap coefficient of two items' keyword sets
pub fn overlap_coefficient(a: &Item, b: &Item) -> f64 {
    overlap_with_reference(a.keyword_words(), b.keyword_words())
}

/// |A ∩ B| / min(|A|, |B|) over deduplicated word sets; 0 when either set
/// or the intersection is empty
pub fn overlap_with_reference<'a, A, B>(words: A, reference: B) -> f64
where
    A: IntoIterator<Item = &'a str>,
    B: IntoIterator<Item = &'a str>,
{
    let left: HashSet<&str> = words.into_iter().collect();
    let right: HashSet<&str> = reference.into_iter().collect();
    if left.is_empty() || right.is_empty() {
        return 0.0;
    }

    let shared = left.intersection(&right).count();
    if shared == 0 {
        return 0.0;
    }
    shared as f64 / left.len().min(right.len()) as f64
}
