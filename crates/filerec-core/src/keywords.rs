//! Scored, deduplicated keyword collections

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Fraction of the lowest-scoring entries dropped by [`KeywordList::remove_stopwords`]
pub const STOPWORD_PRUNE_FRACTION: f64 = 0.1;

/// A keyword with its score and occurrence count
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keyword {
    pub word: String,
    pub score: f64,
    pub count: usize,
}

impl Keyword {
    pub fn new(word: impl Into<String>, score: f64) -> Self {
        Self {
            word: word.into(),
            score,
            count: 1,
        }
    }

    pub fn with_count(mut self, count: usize) -> Self {
        self.count = count;
        self
    }
}

/// Number of entries to drop when pruning `fraction` of `len`, rounded half-up
pub(crate) fn prune_count(len: usize, fraction: f64) -> usize {
    ((len as f64) * fraction).round() as usize
}

/// Keywords deduplicated by text; on duplicates the higher score wins
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<Keyword>", into = "Vec<Keyword>")]
pub struct KeywordList {
    entries: Vec<Keyword>,
    #[serde(skip)]
    positions: HashMap<String, usize>,
}

impl From<Vec<Keyword>> for KeywordList {
    fn from(keywords: Vec<Keyword>) -> Self {
        let mut list = KeywordList::new();
        for keyword in keywords {
            list.add(keyword);
        }
        list
    }
}

impl From<KeywordList> for Vec<Keyword> {
    fn from(list: KeywordList) -> Self {
        list.entries
    }
}

impl FromIterator<Keyword> for KeywordList {
    fn from_iter<I: IntoIterator<Item = Keyword>>(iter: I) -> Self {
        let mut list = KeywordList::new();
        for keyword in iter {
            list.add(keyword);
        }
        list
    }
}

impl KeywordList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Keyword> {
        self.entries.iter()
    }

    pub fn get(&self, word: &str) -> Option<&Keyword> {
        self.positions.get(word).map(|&i| &self.entries[i])
    }

    pub fn contains(&self, word: &str) -> bool {
        self.positions.contains_key(word)
    }

    pub fn words(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|k| k.word.as_str())
    }

    /// Insert a keyword, keeping the existing entry unless the new score is higher
    pub fn add(&mut self, keyword: Keyword) {
        match self.positions.get(&keyword.word) {
            Some(&i) => {
                if keyword.score > self.entries[i].score {
                    self.entries[i] = keyword;
                }
            }
            None => {
                self.positions
                    .insert(keyword.word.clone(), self.entries.len());
                self.entries.push(keyword);
            }
        }
    }

    /// Union with max-wins scores
    pub fn merge(&mut self, other: &KeywordList) {
        for keyword in other.iter() {
            self.add(keyword.clone());
        }
    }

    /// Sort by score descending; equal scores keep insertion order
    pub fn sort(&mut self) {
        self.entries.sort_by(|a, b| b.score.total_cmp(&a.score));
        self.reindex();
    }

    /// Drop zero-score entries, then the lowest-scoring tenth of the rest
    pub fn remove_stopwords(&mut self) {
        self.entries.retain(|k| k.score != 0.0);
        self.sort();
        let drop = prune_count(self.entries.len(), STOPWORD_PRUNE_FRACTION);
        self.truncate(self.entries.len() - drop);
    }

    /// Keep only the first `len` entries
    pub fn truncate(&mut self, len: usize) {
        self.entries.truncate(len);
        self.reindex();
    }

    fn reindex(&mut self) {
        self.positions = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, k)| (k.word.clone(), i))
            .collect();
    }
}

impl<'a> IntoIterator for &'a KeywordList {
    type Item = &'a Keyword;
    type IntoIter = std::slice::Iter<'a, Keyword>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
