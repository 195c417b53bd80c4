use std::fmt;

use crate::set::OrderedSet;

// A key with its payload. Only the key participates in ordering.
#[derive(Clone)]
struct Entry<K, V> {
    key: K,
    value: V,
}

/// A key-value map ordered by key, layered on [`OrderedSet`].
///
/// The set stores whole entries but compares them by key alone, so the set's
/// overwrite-on-equal `add` gives map insertion its replace-existing-value
/// semantics directly.
#[derive(Clone)]
pub struct OrderedMap<K, V> {
    tree: OrderedSet<Entry<K, V>>,
}

impl<K: Ord + 'static, V: 'static> OrderedMap<K, V> {
    /// Creates an empty map ordered by `K`'s natural ordering.
    pub fn new() -> Self {
        Self {
            tree: OrderedSet::with_comparator(|a: &Entry<K, V>, b: &Entry<K, V>| a.key.cmp(&b.key)),
        }
    }

    /// Creates a map and inserts every `(key, value)` pair in order, so a
    /// repeated key keeps the last value.
    pub fn from_items(items: impl IntoIterator<Item = (K, V)>) -> Self {
        let mut map = Self::new();
        for (key, value) in items {
            map.insert(key, value);
        }
        map
    }

    /// The number of entries. O(1).
    pub fn size(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Inserts `value` under `key`, replacing any existing value for that key.
    pub fn insert(&mut self, key: K, value: V) {
        self.tree.add(Entry { key, value });
    }

    /// The value stored under `key`, if any.
    pub fn get(&self, key: &K) -> Option<&V> {
        self.tree.get_by(|entry| key.cmp(&entry.key)).map(|entry| &entry.value)
    }

    /// Whether `key` is present.
    pub fn contains(&self, key: &K) -> bool {
        self.tree.get_by(|entry| key.cmp(&entry.key)).is_some()
    }

    /// Every `(key, value)` pair in ascending key order.
    pub fn to_vec(&self) -> Vec<(K, V)>
    where
        K: Clone,
        V: Clone,
    {
        self.tree
            .in_order()
            .into_iter()
            .map(|entry| (entry.key.clone(), entry.value.clone()))
            .collect()
    }

    /// Removes every entry. A no-op on an empty map.
    pub fn clear(&mut self) {
        self.tree.clear();
    }
}

impl<K: Ord + 'static, V: 'static> Default for OrderedMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Ord + 'static, V: 'static> FromIterator<(K, V)> for OrderedMap<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::from_items(iter)
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for OrderedMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.tree.in_order().into_iter().map(|e| (&e.key, &e.value)))
            .finish()
    }
}
