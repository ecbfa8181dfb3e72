//! TF-IDF keyword scoring of one document against an item corpus

use crate::item::ItemId;
use crate::keywords::{prune_count, Keyword, KeywordList};
use std::collections::HashMap;

/// Fraction of the lowest-scoring keywords dropped after scoring
pub const TFIDF_PRUNE_FRACTION: f64 = 1.0 / 3.0;

/// Keyword bag of one item: term counts in first-occurrence order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TermBag {
    pub item_id: ItemId,
    terms: Vec<(String, usize)>,
    positions: HashMap<String, usize>,
}

impl TermBag {
    /// Count tokens, skipping empty and whitespace-only ones
    pub fn from_tokens<I, S>(item_id: ItemId, tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut bag = TermBag {
            item_id,
            ..Default::default()
        };
        for token in tokens {
            let token = token.as_ref();
            if token.trim().is_empty() {
                continue;
            }
            match bag.positions.get(token) {
                Some(&i) => bag.terms[i].1 += 1,
                None => {
                    bag.positions.insert(token.to_string(), bag.terms.len());
                    bag.terms.push((token.to_string(), 1));
                }
            }
        }
        bag
    }

    pub fn contains(&self, term: &str) -> bool {
        self.positions.contains_key(term)
    }

    pub fn count(&self, term: &str) -> usize {
        self.positions.get(term).map_or(0, |&i| self.terms[i].1)
    }

    pub fn terms(&self) -> impl Iterator<Item = (&str, usize)> {
        self.terms.iter().map(|(t, c)| (t.as_str(), *c))
    }

    pub fn distinct_terms(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

/// TF-IDF scorer
///
/// Pure: the same (document, corpus) pair always yields the same list.
#[derive(Debug, Clone, Copy, Default)]
pub struct TfIdfEngine;

impl TfIdfEngine {
    pub fn new() -> Self {
        TfIdfEngine
    }

    /// Score every distinct term of `document` against `corpus`
    ///
    /// Returns keywords sorted by score descending (ties in first-occurrence
    /// order) with the lowest-scoring third removed.
    pub fn compute(&self, document: &TermBag, corpus: &[TermBag]) -> KeywordList {
        let mut scored: Vec<Keyword> = document
            .terms()
            .map(|(term, tf)| {
                let score = tf as f64 * self.idf(term, corpus);
                Keyword::new(term, score).with_count(tf)
            })
            .collect();

        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        let keep = scored.len() - prune_count(scored.len(), TFIDF_PRUNE_FRACTION);
        scored.truncate(keep);
        scored.into_iter().collect()
    }

    /// Score every document of the corpus against the corpus itself
    pub fn compute_all(&self, corpus: &[TermBag]) -> Vec<(ItemId, KeywordList)> {
        corpus
            .iter()
            .map(|doc| (doc.item_id, self.compute(doc, corpus)))
            .collect()
    }

    /// ln(N / df), with df clamped to at least 1 and N to at least df
    fn idf(&self, term: &str, corpus: &[TermBag]) -> f64 {
        let df = corpus.iter().filter(|doc| doc.contains(term)).count().max(1);
        let n = corpus.len().max(df);
        (n as f64 / df as f64).ln()
    }
}
