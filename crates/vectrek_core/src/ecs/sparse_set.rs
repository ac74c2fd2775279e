//! # Sparse Set Storage
//!
//! Keyed component storage with O(1) insert, lookup and delete, and dense
//! iteration.
//!
//! The storage uses a tombstone strategy:
//! - `sparse` maps an entity id to a slot in `dense`
//! - `dense` holds the values in insertion order
//! - deleting a key tombstones its slot; the dense array never shrinks
//! - the next insert of a new key reuses a tombstoned slot before growing
//!
//! ## Slot stability
//!
//! A live key's dense index never changes until that key is deleted. Inserts
//! and deletes of *other* keys never move it, and overwriting the key keeps
//! it in place. Callers may rely on [`SparseSet::index_of`] being stable
//! under that rule; they must not rely on iteration order beyond "each live
//! key exactly once".

use crate::error::StoreError;
use std::collections::HashMap;
use vectrek_shared::EntityId;

/// One occupied dense slot.
#[derive(Clone, Debug)]
struct Slot<T> {
    key: EntityId,
    value: T,
}

/// Sparse-set storage for a single component type.
///
/// # Example
///
/// ```rust
/// use vectrek_core::SparseSet;
/// use vectrek_shared::EntityId;
///
/// let mut set: SparseSet<u32> = SparseSet::new();
/// set.insert(EntityId::new(7), 70);
/// assert_eq!(set.get(EntityId::new(7)), Some(&70));
/// set.remove(EntityId::new(7));
/// assert_eq!(set.get(EntityId::new(7)), None);
/// ```
#[derive(Clone, Debug)]
pub struct SparseSet<T> {
    /// Entity id to dense index, live keys only.
    sparse: HashMap<EntityId, usize>,
    /// Values; `None` marks a tombstone.
    dense: Vec<Option<Slot<T>>>,
    /// Tombstoned dense indices available for reuse.
    tombstones: Vec<usize>,
}

impl<T> SparseSet<T> {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(16)
    }

    /// Creates an empty set with room for `capacity` values before growing.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            sparse: HashMap::with_capacity(capacity),
            dense: Vec::with_capacity(capacity),
            tombstones: Vec::new(),
        }
    }

    /// Number of live values.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.sparse.len()
    }

    /// True when no key is live.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sparse.is_empty()
    }

    /// Number of dense slots, live or tombstoned.
    #[inline]
    #[must_use]
    pub fn slot_count(&self) -> usize {
        self.dense.len()
    }

    /// Number of tombstoned slots waiting for reuse.
    #[inline]
    #[must_use]
    pub fn tombstone_count(&self) -> usize {
        self.tombstones.len()
    }

    /// True if `key` is live.
    #[inline]
    #[must_use]
    pub fn contains(&self, key: EntityId) -> bool {
        self.sparse.contains_key(&key)
    }

    /// Dense index of a live key.
    #[inline]
    #[must_use]
    pub fn index_of(&self, key: EntityId) -> Option<usize> {
        self.sparse.get(&key).copied()
    }

    /// Inserts `value` under `key`.
    ///
    /// An existing key is overwritten in place and its previous value
    /// returned; no other key's slot moves. A new key takes a tombstoned
    /// slot if one exists, otherwise a fresh slot at the end.
    pub fn insert(&mut self, key: EntityId, value: T) -> Option<T> {
        if let Some(slot) = self.slot_mut(key) {
            return Some(std::mem::replace(&mut slot.value, value));
        }

        let slot = Some(Slot { key, value });
        let index = if let Some(index) = self.tombstones.pop() {
            self.dense[index] = slot;
            index
        } else {
            self.dense.push(slot);
            self.dense.len() - 1
        };
        self.sparse.insert(key, index);
        None
    }

    /// Gets the value for `key`, or `None` if absent or deleted.
    #[inline]
    #[must_use]
    pub fn get(&self, key: EntityId) -> Option<&T> {
        let index = *self.sparse.get(&key)?;
        self.dense.get(index)?.as_ref().map(|slot| &slot.value)
    }

    /// Gets a mutable reference to the value for `key`.
    #[inline]
    pub fn get_mut(&mut self, key: EntityId) -> Option<&mut T> {
        self.slot_mut(key).map(|slot| &mut slot.value)
    }

    /// Applies `f` to the value for `key` in place.
    ///
    /// # Errors
    ///
    /// [`StoreError::Missing`] if the key is absent or deleted; `f` is not
    /// called.
    pub fn update<F>(&mut self, key: EntityId, f: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut T),
    {
        let value = self.get_mut(key).ok_or(StoreError::Missing { key })?;
        f(value);
        Ok(())
    }

    /// Deletes `key`, returning its value.
    ///
    /// The slot is tombstoned, not freed. Unknown keys are a no-op.
    pub fn remove(&mut self, key: EntityId) -> Option<T> {
        let index = self.sparse.remove(&key)?;
        let slot = self.dense.get_mut(index)?.take()?;
        self.tombstones.push(index);
        Some(slot.value)
    }

    /// Runs `f` over every live value in place and collects its errors.
    ///
    /// Tombstones are skipped; an error from one value does not stop the
    /// pass over the rest. An empty set is a no-op.
    pub fn iterate<E, F>(&mut self, mut f: F) -> Vec<E>
    where
        F: FnMut(EntityId, &mut T) -> Result<(), E>,
    {
        let mut errors = Vec::new();
        for slot in self.dense.iter_mut().flatten() {
            if let Err(err) = f(slot.key, &mut slot.value) {
                errors.push(err);
            }
        }
        errors
    }

    /// Iterates over live `(key, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &T)> {
        self.dense
            .iter()
            .flatten()
            .map(|slot| (slot.key, &slot.value))
    }

    /// Iterates mutably over live `(key, value)` pairs.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (EntityId, &mut T)> {
        self.dense
            .iter_mut()
            .flatten()
            .map(|slot| (slot.key, &mut slot.value))
    }

    /// Iterates over live keys.
    pub fn keys(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.dense.iter().flatten().map(|slot| slot.key)
    }

    /// Removes everything, releasing no memory.
    pub fn clear(&mut self) {
        self.sparse.clear();
        self.dense.clear();
        self.tombstones.clear();
    }

    fn slot_mut(&mut self, key: EntityId) -> Option<&mut Slot<T>> {
        let index = *self.sparse.get(&key)?;
        self.dense.get_mut(index)?.as_mut()
    }
}

impl<T> Default for SparseSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;
    use std::collections::HashSet;

    fn id(raw: u64) -> EntityId {
        EntityId::new(raw)
    }

    #[test]
    fn test_insert_get_remove() {
        let mut set = SparseSet::new();
        assert!(set.is_empty());

        assert_eq!(set.insert(id(1), "one"), None);
        assert_eq!(set.insert(id(2), "two"), None);
        assert_eq!(set.len(), 2);
        assert_eq!(set.get(id(1)), Some(&"one"));

        assert_eq!(set.remove(id(1)), Some("one"));
        assert_eq!(set.get(id(1)), None);
        assert!(!set.contains(id(1)));
        assert_eq!(set.len(), 1);

        // Unknown keys never panic
        assert_eq!(set.remove(id(99)), None);
        assert_eq!(set.get(id(99)), None);
        assert_eq!(set.update(id(99), |_| {}), Err(StoreError::Missing { key: id(99) }));
    }

    #[test]
    fn test_overwrite_keeps_slots() {
        let mut set = SparseSet::new();
        set.insert(id(1), 10);
        set.insert(id(2), 20);
        set.insert(id(3), 30);
        let before: Vec<_> = [1, 2, 3].iter().map(|&k| set.index_of(id(k))).collect();

        assert_eq!(set.insert(id(2), 21), Some(20));
        let after: Vec<_> = [1, 2, 3].iter().map(|&k| set.index_of(id(k))).collect();

        assert_eq!(before, after);
        assert_eq!(set.get(id(2)), Some(&21));
        assert_eq!(set.slot_count(), 3);
    }

    #[test]
    fn test_delete_tombstones_and_reuses() {
        let mut set = SparseSet::new();
        set.insert(id(1), 10);
        set.insert(id(2), 20);
        set.insert(id(3), 30);

        let slot = set.index_of(id(2)).unwrap();
        set.remove(id(2));
        assert_eq!(set.slot_count(), 3, "delete must not shrink the dense array");
        assert_eq!(set.tombstone_count(), 1);

        set.insert(id(4), 40);
        assert_eq!(set.index_of(id(4)), Some(slot));
        assert_eq!(set.slot_count(), 3);
        assert_eq!(set.tombstone_count(), 0);
        assert_eq!(set.get(id(2)), None);
    }

    #[test]
    fn test_slot_stability_under_churn() {
        let mut set = SparseSet::new();
        set.insert(id(100), 0);
        let anchor = set.index_of(id(100)).unwrap();

        for round in 0..50u64 {
            set.insert(id(round), round);
            if round % 3 == 0 {
                set.remove(id(round));
            }
            set.insert(id(100), round);
            assert_eq!(set.index_of(id(100)), Some(anchor));
        }
    }

    #[test]
    fn test_iterate_skips_tombstones_and_writes_back() {
        let mut set = SparseSet::new();
        for k in 0..5 {
            set.insert(id(k), k * 10);
        }
        set.remove(id(1));
        set.remove(id(3));

        let errors: Vec<()> = set.iterate(|_, value| {
            *value += 1;
            Ok(())
        });
        assert!(errors.is_empty());

        let mut seen: Vec<_> = set.iter().map(|(k, v)| (k.raw(), *v)).collect();
        seen.sort_unstable();
        assert_eq!(seen, vec![(0, 1), (2, 21), (4, 41)]);
    }

    #[test]
    fn test_iterate_collects_errors_without_stopping() {
        let mut set = SparseSet::new();
        for k in 0..4 {
            set.insert(id(k), 0u32);
        }

        let errors = set.iterate(|key, value| {
            *value = 1;
            if key.raw() % 2 == 0 {
                Err(key)
            } else {
                Ok(())
            }
        });

        assert_eq!(errors.len(), 2);
        assert!(set.iter().all(|(_, v)| *v == 1));
    }

    #[test]
    fn test_iterate_empty_is_noop() {
        let mut set: SparseSet<u8> = SparseSet::new();
        let mut calls = 0;
        let errors: Vec<()> = set.iterate(|_, _| {
            calls += 1;
            Ok(())
        });
        assert!(errors.is_empty());
        assert_eq!(calls, 0);

        set.insert(id(1), 1);
        set.remove(id(1));
        let errors: Vec<()> = set.iterate(|_, _| {
            calls += 1;
            Ok(())
        });
        assert!(errors.is_empty());
        assert_eq!(calls, 0);
    }

    /// Random Add/Delete/Get sequences checked against a HashMap model.
    #[test]
    fn test_random_sequences_match_model() {
        for seed in 0..32 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let mut set = SparseSet::new();
            let mut model: HashMap<EntityId, u64> = HashMap::new();

            for step in 0..500u64 {
                let key = id(rng.gen_range(0..40));
                match rng.gen_range(0..3) {
                    0 => {
                        assert_eq!(set.insert(key, step), model.insert(key, step));
                    }
                    1 => {
                        assert_eq!(set.remove(key), model.remove(&key));
                    }
                    _ => {
                        assert_eq!(set.get(key), model.get(&key));
                    }
                }

                assert_eq!(set.len(), model.len());
                assert_eq!(set.slot_count(), set.len() + set.tombstone_count());

                let mut visited = HashSet::new();
                set.iterate::<(), _>(|key, _| {
                    assert!(visited.insert(key), "key {key} visited twice");
                    Ok(())
                });
                let live: HashSet<_> = model.keys().copied().collect();
                assert_eq!(visited, live, "seed {seed} step {step}");
            }
        }
    }
}
