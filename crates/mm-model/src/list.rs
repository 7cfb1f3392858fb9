//! Ordered, id-unique list of node keys

use crate::error::ModelError;
use crate::node::ModelKey;
use indexmap::IndexMap;

/// Ordered list of child keys, unique by model id
///
/// # Invariants
/// - No two entries share an id
/// - Insertion order is preserved; removals keep the order of the rest
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelList {
    items: IndexMap<String, ModelKey>,
}

impl ModelList {
    /// Create empty list
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a model
    ///
    /// # Errors
    /// `ModelError::DuplicateModelId` if the id is taken; the list is unchanged
    pub fn insert(&mut self, id: impl Into<String>, key: ModelKey) -> Result<(), ModelError> {
        let id = id.into();
        if self.items.contains_key(&id) {
            return Err(ModelError::DuplicateModelId { id });
        }
        self.items.insert(id, key);
        Ok(())
    }

    /// Insert a model at `index` (clamped to the list length)
    ///
    /// # Errors
    /// `ModelError::DuplicateModelId` if the id is taken; the list is unchanged
    pub fn insert_at(
        &mut self,
        index: usize,
        id: impl Into<String>,
        key: ModelKey,
    ) -> Result<(), ModelError> {
        let id = id.into();
        if self.items.contains_key(&id) {
            return Err(ModelError::DuplicateModelId { id });
        }
        let index = index.min(self.items.len());
        self.items.shift_insert(index, id, key);
        Ok(())
    }

    /// Remove by id, returning the former position and key
    pub fn remove(&mut self, id: &str) -> Option<(usize, ModelKey)> {
        self.items
            .shift_remove_full(id)
            .map(|(index, _, key)| (index, key))
    }

    /// Key by id
    #[inline]
    #[must_use]
    pub fn get(&self, id: &str) -> Option<ModelKey> {
        self.items.get(id).copied()
    }

    /// Check if an id is present
    #[inline]
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.items.contains_key(id)
    }

    /// Position of an id
    #[inline]
    #[must_use]
    pub fn position(&self, id: &str) -> Option<usize> {
        self.items.get_index_of(id)
    }

    /// Keys in list order
    #[must_use]
    pub fn keys(&self) -> Vec<ModelKey> {
        self.items.values().copied().collect()
    }

    /// Ids in list order
    #[must_use]
    pub fn ids(&self) -> Vec<&str> {
        self.items.keys().map(String::as_str).collect()
    }

    /// Iterate over `(id, key)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (&str, ModelKey)> {
        self.items.iter().map(|(id, key)| (id.as_str(), *key))
    }

    /// Number of entries
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    fn keys(n: usize) -> Vec<ModelKey> {
        let mut arena: SlotMap<ModelKey, ()> = SlotMap::with_key();
        (0..n).map(|_| arena.insert(())).collect()
    }

    #[test]
    fn insert_preserves_order() {
        let k = keys(3);
        let mut list = ModelList::new();
        list.insert("b", k[0]).unwrap();
        list.insert("a", k[1]).unwrap();
        list.insert("c", k[2]).unwrap();

        assert_eq!(list.ids(), vec!["b", "a", "c"]);
        assert_eq!(list.keys(), k);
        assert_eq!(list.position("a"), Some(1));
    }

    #[test]
    fn duplicate_leaves_list_unchanged() {
        let k = keys(2);
        let mut list = ModelList::new();
        list.insert("a", k[0]).unwrap();

        let err = list.insert("a", k[1]).unwrap_err();
        assert!(err.is_duplicate());
        assert_eq!(list.len(), 1);
        assert_eq!(list.get("a"), Some(k[0]));

        assert!(list.insert_at(0, "a", k[1]).is_err());
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn remove_reports_position_and_insert_at_restores_it() {
        let k = keys(3);
        let mut list = ModelList::new();
        for (id, key) in ["x", "y", "z"].into_iter().zip(&k) {
            list.insert(id, *key).unwrap();
        }

        let (index, key) = list.remove("y").unwrap();
        assert_eq!((index, key), (1, k[1]));
        assert_eq!(list.ids(), vec!["x", "z"]);
        assert!(list.remove("y").is_none());

        list.insert_at(index, "y", key).unwrap();
        assert_eq!(list.ids(), vec!["x", "y", "z"]);

        list.insert_at(99, "w", k[0]).unwrap();
        assert_eq!(list.ids(), vec!["x", "y", "z", "w"]);
    }
}
