//! Bounded SIEVE-eviction map with per-entry expiry.
//!
//! - On hit: set the entry's `visited` bit.
//! - On insert into a full map: sweep from `hand`, clearing `visited` bits,
//!   and evict the first entry that is unvisited or already expired.
//!
//! Slots live in a `Vec` used as a ring, with a `HashMap` from key to slot
//! and a stack of empty slot indices. Expired entries are dropped lazily on
//! lookup and preferentially on eviction.

use std::collections::HashMap;
use std::hash::Hash;
use std::num::NonZeroUsize;
use std::time::Instant;

#[derive(Debug)]
pub(crate) struct SieveMap<K, V> {
    slots: Vec<Option<Slot<K, V>>>,
    index: HashMap<K, usize>,
    /// Every empty slot, exactly once.
    free: Vec<usize>,
    hand: usize,
    len: usize,
}

#[derive(Debug)]
struct Slot<K, V> {
    key: K,
    value: V,
    expires_at: Instant,
    visited: bool,
}

impl<K, V> SieveMap<K, V>
where
    K: Eq + Hash + Clone,
{
    pub(crate) fn new(capacity: NonZeroUsize) -> Self {
        let capacity = capacity.get();
        Self {
            slots: (0..capacity).map(|_| None).collect(),
            index: HashMap::with_capacity(capacity),
            free: (0..capacity).rev().collect(),
            hand: 0,
            len: 0,
        }
    }

    fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Returns the live value for `key`, marking it visited.
    pub(crate) fn get(&mut self, key: &K, now: Instant) -> Option<&V> {
        let &idx = self.index.get(key)?;
        let expired = self.slots[idx]
            .as_ref()
            .is_none_or(|slot| slot.expires_at <= now);
        if expired {
            self.clear_slot(idx);
            return None;
        }
        let slot = self.slots[idx].as_mut()?;
        slot.visited = true;
        Some(&slot.value)
    }

    pub(crate) fn insert(&mut self, key: K, value: V, expires_at: Instant, now: Instant) {
        if let Some(&idx) = self.index.get(&key) {
            if let Some(slot) = &mut self.slots[idx] {
                slot.value = value;
                slot.expires_at = expires_at;
                slot.visited = true;
                return;
            }
        }

        let idx = match self.free.pop() {
            Some(free) => free,
            None => {
                let victim = self.find_victim(now);
                self.take_slot(victim);
                victim
            }
        };

        self.slots[idx] = Some(Slot {
            key: key.clone(),
            value,
            expires_at,
            visited: false,
        });
        self.index.insert(key, idx);
        self.len += 1;
    }

    pub(crate) fn remove(&mut self, key: &K) -> Option<V> {
        let &idx = self.index.get(key)?;
        self.clear_slot(idx).map(|slot| slot.value)
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    fn take_slot(&mut self, idx: usize) -> Option<Slot<K, V>> {
        let old = self.slots[idx].take()?;
        self.index.remove(&old.key);
        self.len -= 1;
        Some(old)
    }

    /// Empties a slot and returns it to the free stack.
    fn clear_slot(&mut self, idx: usize) -> Option<Slot<K, V>> {
        let old = self.take_slot(idx)?;
        self.free.push(idx);
        Some(old)
    }

    /// Sweeps from `hand` for an expired or unvisited slot.
    fn find_victim(&mut self, now: Instant) -> usize {
        let capacity = self.capacity();
        // Two sweeps at most: the first clears every visited bit.
        for _ in 0..capacity * 2 {
            let at = self.hand;
            self.hand = (self.hand + 1) % capacity;
            match &mut self.slots[at] {
                Some(slot) if slot.expires_at > now && slot.visited => slot.visited = false,
                _ => return at,
            }
        }
        let at = self.hand;
        self.hand = (self.hand + 1) % capacity;
        at
    }
}
