use super::Similarity;
use crate::error::Result;
use crate::item::ItemId;
use std::collections::BTreeMap;

/// Sparse symmetric item-to-item similarity matrix
///
/// Each unordered pair is stored once under its (low, high) key, so a value
/// written for (a, b) reads back identically for (b, a). Missing pairs read
/// as 0.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemToItemMatrix {
    values: BTreeMap<(ItemId, ItemId), Similarity>,
}

fn key(a: ItemId, b: ItemId) -> (ItemId, ItemId) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

impl ItemToItemMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a similarity for both orientations of the pair
    pub fn set(&mut self, a: ItemId, b: ItemId, value: f64) -> Result<()> {
        let similarity = Similarity::new(value)?;
        self.values.insert(key(a, b), similarity);
        Ok(())
    }

    pub fn get(&self, a: ItemId, b: ItemId) -> f64 {
        self.values.get(&key(a, b)).map_or(0.0, |s| s.value())
    }

    pub fn contains(&self, a: ItemId, b: ItemId) -> bool {
        self.values.contains_key(&key(a, b))
    }

    /// Number of stored pairs
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Stored pairs as (low id, high id, value)
    pub fn entries(&self) -> impl Iterator<Item = (ItemId, ItemId, f64)> + '_ {
        self.values.iter().map(|(&(a, b), s)| (a, b, s.value()))
    }

    /// Rebuild a matrix from stored rows, validating each value
    pub fn from_entries<I>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (ItemId, ItemId, f64)>,
    {
        let mut matrix = Self::new();
        for (a, b, v) in entries {
            matrix.set(a, b, v)?;
        }
        Ok(matrix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RecError;

    #[test]
    fn test_symmetric_read_back() {
        let mut matrix = ItemToItemMatrix::new();
        matrix.set(7, 3, 0.25).unwrap();
        assert_eq!(matrix.get(3, 7), 0.25);
        assert_eq!(matrix.get(7, 3), 0.25);
        assert_eq!(matrix.len(), 1);
    }

    #[test]
    fn test_missing_pair_defaults_to_zero() {
        let matrix = ItemToItemMatrix::new();
        assert_eq!(matrix.get(1, 2), 0.0);
        assert!(!matrix.contains(1, 2));
    }

    #[test]
    fn test_out_of_range_value_is_rejected() {
        let mut matrix = ItemToItemMatrix::new();
        let err = matrix.set(1, 2, 1.5).unwrap_err();
        assert!(matches!(err, RecError::SimilarityOutOfRange { .. }));
        assert!(matrix.is_empty());
    }

    #[test]
    fn test_from_entries() {
        let matrix = ItemToItemMatrix::from_entries([(1, 2, 0.5), (3, 1, -0.2), (2, 3, 0.9)]).unwrap();
        assert_eq!(matrix.get(1, 3), -0.2);
        assert_eq!(matrix.len(), 3);
    }
}
