//! Geohash-partitioned element cache.
//!
//! Every mutating operation returns a [`GeohashCacheDifference`] so callers can
//! keep mirrored state (map annotations) in sync incrementally. Eviction is
//! never automatic: [`GeohashCache::discard_content_if_possible`] drops every
//! cell that is not in the active set, and nothing else removes entries.
//!
//! The cache is not synchronized. [`StopCache`](super::stop_cache::StopCache)
//! owns one inside its actor task.

use std::collections::{HashMap, HashSet};

use oba_transit::Geohash;

/// One tagged change inside a [`GeohashCacheDifference`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Change<T> {
    Removal(T),
    Insertion(T),
}

impl<T> Change<T> {
    pub fn value(&self) -> &T {
        match self {
            Change::Removal(value) | Change::Insertion(value) => value,
        }
    }

    pub fn into_value(self) -> T {
        match self {
            Change::Removal(value) | Change::Insertion(value) => value,
        }
    }

    pub fn is_insertion(&self) -> bool {
        matches!(self, Change::Insertion(_))
    }

    pub fn is_removal(&self) -> bool {
        matches!(self, Change::Removal(_))
    }
}

/// The effect of one cache mutation.
///
/// Changes are ordered and must be applied in sequence: a replaced element is
/// reported as a removal of the old value followed by an insertion of the new.
#[derive(Clone, Debug, PartialEq)]
pub struct GeohashCacheDifference<K, E> {
    key_changes: Vec<Change<K>>,
    element_changes: Vec<Change<E>>,
}

impl<K, E> GeohashCacheDifference<K, E> {
    pub(crate) fn new(key_changes: Vec<Change<K>>, element_changes: Vec<Change<E>>) -> Self {
        Self {
            key_changes,
            element_changes,
        }
    }

    pub fn key_changes(&self) -> &[Change<K>] {
        &self.key_changes
    }

    pub fn element_changes(&self) -> &[Change<E>] {
        &self.element_changes
    }

    pub fn is_empty(&self) -> bool {
        self.key_changes.is_empty() && self.element_changes.is_empty()
    }

    pub fn inserted_elements(&self) -> impl Iterator<Item = &E> {
        self.element_changes
            .iter()
            .filter(|change| change.is_insertion())
            .map(Change::value)
    }

    pub fn removed_elements(&self) -> impl Iterator<Item = &E> {
        self.element_changes
            .iter()
            .filter(|change| change.is_removal())
            .map(Change::value)
    }

    pub fn into_parts(self) -> (Vec<Change<K>>, Vec<Change<E>>) {
        (self.key_changes, self.element_changes)
    }
}

/// Panics if any geohash is not at `expected` precision.
///
/// Only checked in debug builds; release builds trust the caller, so this is
/// not a guard against production misuse.
pub fn assert_geohash_precision<'a>(
    geohashes: impl IntoIterator<Item = &'a Geohash>,
    expected: usize,
) {
    if cfg!(debug_assertions) {
        let mut illegal: Vec<&str> = geohashes
            .into_iter()
            .filter(|geohash| geohash.precision() != expected)
            .map(Geohash::as_str)
            .collect();
        illegal.sort_unstable();

        assert!(
            illegal.is_empty(),
            "Geohash precision mismatch (expected {expected}): {illegal:?}"
        );
    }
}

#[derive(Clone, Debug)]
pub struct GeohashCache<E> {
    entries: HashMap<Geohash, E>,
    active_geohashes: HashSet<Geohash>,
    expected_precision: Option<usize>,
}

impl<E> Default for GeohashCache<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> GeohashCache<E> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            active_geohashes: HashSet::new(),
            expected_precision: None,
        }
    }

    /// A cache whose active set must always be at `precision` (debug builds only).
    pub fn with_expected_precision(precision: usize) -> Self {
        Self {
            expected_precision: Some(precision),
            ..Self::new()
        }
    }

    pub fn expected_precision(&self) -> Option<usize> {
        self.expected_precision
    }

    pub fn get(&self, geohash: &Geohash) -> Option<&E> {
        self.entries.get(geohash)
    }

    /// Store `element` without producing a difference.
    pub fn insert(&mut self, geohash: Geohash, element: E) -> Option<E> {
        self.entries.insert(geohash, element)
    }

    /// Remove a cell without producing a difference.
    pub fn remove(&mut self, geohash: &Geohash) -> Option<E> {
        self.entries.remove(geohash)
    }

    pub fn contains(&self, geohash: &Geohash) -> bool {
        self.entries.contains_key(geohash)
    }

    /// Cells protected from [`discard_content_if_possible`](Self::discard_content_if_possible).
    ///
    /// May name cells that have no entry yet.
    pub fn active_geohashes(&self) -> &HashSet<Geohash> {
        &self.active_geohashes
    }

    /// # Panics
    ///
    /// In debug builds, if an expected precision is configured and any
    /// geohash does not match it.
    pub fn set_active_geohashes(&mut self, geohashes: HashSet<Geohash>) {
        if let Some(expected) = self.expected_precision {
            assert_geohash_precision(&geohashes, expected);
        }
        self.active_geohashes = geohashes;
    }

    pub fn geohashes(&self) -> impl Iterator<Item = &Geohash> {
        self.entries.keys()
    }

    pub fn elements(&self) -> impl Iterator<Item = &E> {
        self.entries.values()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Geohash, &E)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every cell that is not active.
    ///
    /// Only exact members of the active set survive; neighbours of active
    /// cells are discarded like any other inactive cell. Each discarded cell
    /// contributes one key removal and one element removal. Never inserts.
    pub fn discard_content_if_possible(&mut self) -> GeohashCacheDifference<Geohash, E> {
        let inactive: Vec<Geohash> = self
            .entries
            .keys()
            .filter(|geohash| !self.active_geohashes.contains(*geohash))
            .cloned()
            .collect();

        let mut key_changes = Vec::with_capacity(inactive.len());
        let mut element_changes = Vec::with_capacity(inactive.len());

        for geohash in inactive {
            if let Some(element) = self.entries.remove(&geohash) {
                element_changes.push(Change::Removal(element));
            }
            key_changes.push(Change::Removal(geohash));
        }

        GeohashCacheDifference::new(key_changes, element_changes)
    }
}

impl<E: Clone> GeohashCache<E> {
    /// Insert or replace the element for `geohash`.
    ///
    /// A new key yields `[Insertion(key)]` / `[Insertion(element)]`. An existing
    /// key yields no key change and `[Removal(old), Insertion(new)]`, in that
    /// order.
    pub fn upsert(&mut self, geohash: Geohash, element: E) -> GeohashCacheDifference<Geohash, E> {
        match self.entries.insert(geohash.clone(), element.clone()) {
            Some(previous) => GeohashCacheDifference::new(
                Vec::new(),
                vec![Change::Removal(previous), Change::Insertion(element)],
            ),
            None => GeohashCacheDifference::new(
                vec![Change::Insertion(geohash)],
                vec![Change::Insertion(element)],
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn geohash(hash: &str) -> Geohash {
        Geohash::new(hash).unwrap()
    }

    #[test]
    fn test_upsert_new_key() {
        let mut cache = GeohashCache::new();
        let diff = cache.upsert(geohash("c23nb"), "stops");

        assert_eq!(diff.key_changes(), &[Change::Insertion(geohash("c23nb"))]);
        assert_eq!(diff.element_changes(), &[Change::Insertion("stops")]);
        assert_eq!(cache.get(&geohash("c23nb")), Some(&"stops"));
    }

    #[test]
    fn test_upsert_existing_key_removes_then_inserts() {
        let mut cache = GeohashCache::new();
        cache.upsert(geohash("c23nb"), "old");

        let diff = cache.upsert(geohash("c23nb"), "new");

        assert!(diff.key_changes().is_empty());
        assert_eq!(
            diff.element_changes(),
            &[Change::Removal("old"), Change::Insertion("new")]
        );
        assert_eq!(diff.removed_elements().collect::<Vec<_>>(), vec![&"old"]);
        assert_eq!(diff.inserted_elements().collect::<Vec<_>>(), vec![&"new"]);
        assert_eq!(cache.get(&geohash("c23nb")), Some(&"new"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_insert_and_remove_bypass_diffs() {
        let mut cache = GeohashCache::new();

        assert_eq!(cache.insert(geohash("c23nb"), 1), None);
        assert_eq!(cache.insert(geohash("c23nb"), 2), Some(1));
        assert!(cache.contains(&geohash("c23nb")));
        assert_eq!(cache.remove(&geohash("c23nb")), Some(2));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_discard_keeps_active_cells() {
        let mut cache = GeohashCache::new();
        cache.upsert(geohash("c23nb"), 1);
        cache.upsert(geohash("c23nc"), 2);
        cache.upsert(geohash("c23p0"), 3);
        cache.set_active_geohashes(HashSet::from([geohash("c23nb"), geohash("c22zz")]));

        let diff = cache.discard_content_if_possible();

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&geohash("c23nb")), Some(&1));
        assert_eq!(diff.key_changes().len(), 2);
        assert!(diff.key_changes().iter().all(Change::is_removal));

        let mut removed: Vec<_> = diff.removed_elements().copied().collect();
        removed.sort();
        assert_eq!(removed, vec![2, 3]);

        // Active cells without entries are left alone
        assert!(cache.active_geohashes().contains(&geohash("c22zz")));
        assert!(!cache.contains(&geohash("c22zz")));
    }

    #[test]
    fn test_discard_does_not_protect_neighbors() {
        let active = geohash("c23nb");
        let neighbor = active.neighbors().unwrap().north;

        let mut cache = GeohashCache::new();
        cache.upsert(active.clone(), "active");
        cache.upsert(neighbor.clone(), "neighbor");
        cache.set_active_geohashes(HashSet::from([active.clone()]));

        let (keys, _) = cache.discard_content_if_possible().into_parts();

        assert_eq!(keys, vec![Change::Removal(neighbor)]);
        assert_eq!(cache.geohashes().collect::<Vec<_>>(), vec![&active]);
    }

    #[test]
    fn test_discard_twice_is_empty() {
        let mut cache = GeohashCache::new();
        cache.upsert(geohash("c23nb"), ());

        assert!(!cache.discard_content_if_possible().is_empty());
        assert!(cache.discard_content_if_possible().is_empty());
    }

    #[test]
    fn test_elements_project_current_entries() {
        let mut cache = GeohashCache::new();
        cache.upsert(geohash("c23nb"), 1);
        cache.upsert(geohash("c23nc"), 2);
        cache.upsert(geohash("c23nb"), 3);

        let mut elements: Vec<_> = cache.elements().copied().collect();
        elements.sort();
        assert_eq!(elements, vec![2, 3]);

        for (key, value) in cache.iter() {
            assert_eq!(cache.get(key), Some(value));
        }
    }

    #[test]
    fn test_matching_precision_is_accepted() {
        let mut cache: GeohashCache<()> = GeohashCache::with_expected_precision(5);
        cache.set_active_geohashes(HashSet::from([geohash("c23nb")]));

        assert_eq!(cache.active_geohashes().len(), 1);
    }

    #[cfg(debug_assertions)]
    #[test]
    #[should_panic(expected = "Geohash precision mismatch")]
    fn test_precision_mismatch_panics_in_debug() {
        let mut cache: GeohashCache<()> = GeohashCache::with_expected_precision(6);
        cache.set_active_geohashes(HashSet::from([geohash("c23nb")]));
    }

    fn cell_pool() -> Vec<Geohash> {
        geohash("c23nb").children().into_iter().take(16).collect()
    }

    proptest! {
        #[test]
        fn prop_discard_removes_exactly_inactive_cells(
            upserts in prop::collection::vec((0..16usize, any::<u32>()), 0..40),
            active in prop::collection::hash_set(0..16usize, 0..16),
        ) {
            let pool = cell_pool();
            let mut cache = GeohashCache::new();
            for (index, value) in upserts {
                cache.upsert(pool[index].clone(), value);
            }

            let active: HashSet<Geohash> = active.into_iter().map(|i| pool[i].clone()).collect();
            let before: HashMap<Geohash, u32> =
                cache.iter().map(|(k, v)| (k.clone(), *v)).collect();
            cache.set_active_geohashes(active.clone());

            let diff = cache.discard_content_if_possible();

            let expected_removed = before.keys().filter(|k| !active.contains(*k)).count();
            prop_assert_eq!(diff.key_changes().len(), expected_removed);
            prop_assert_eq!(diff.element_changes().len(), expected_removed);
            prop_assert!(diff.key_changes().iter().all(Change::is_removal));
            prop_assert!(diff.element_changes().iter().all(Change::is_removal));

            for (key, value) in &before {
                if active.contains(key) {
                    prop_assert_eq!(cache.get(key), Some(value));
                } else {
                    prop_assert!(!cache.contains(key));
                }
            }

            prop_assert!(cache.discard_content_if_possible().is_empty());
        }

        #[test]
        fn prop_upsert_always_stores_latest(
            upserts in prop::collection::vec((0..16usize, any::<u32>()), 1..40),
        ) {
            let pool = cell_pool();
            let mut cache = GeohashCache::new();
            let mut latest = HashMap::new();

            for (index, value) in upserts {
                let existed = cache.contains(&pool[index]);
                let diff = cache.upsert(pool[index].clone(), value);

                prop_assert_eq!(diff.key_changes().is_empty(), existed);
                prop_assert_eq!(diff.element_changes().len(), if existed { 2 } else { 1 });
                prop_assert_eq!(diff.element_changes().last(), Some(&Change::Insertion(value)));
                latest.insert(pool[index].clone(), value);
            }

            prop_assert_eq!(cache.len(), latest.len());
            for (key, value) in &latest {
                prop_assert_eq!(cache.get(key), Some(value));
            }
        }
    }
}
