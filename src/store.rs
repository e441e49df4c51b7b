//! The Promise store (component C): a per-key map of ballots to Promises.
//!
//! Every agent keeps two instances of this store: `current` (in-progress promises, populated at
//! Prepare and cleared at Propose) and `completed` (learned rounds, populated at Learn, never
//! mutated once written).

use std::collections::BTreeMap;
use std::collections::HashMap;

use crate::message::{Ballot, Prepare, Promise};

#[derive(Debug, Default)]
pub struct PromiseStore {
    promises: HashMap<String, BTreeMap<Ballot, Promise>>,
}

impl PromiseStore {
    pub fn new() -> Self {
        PromiseStore::default()
    }

    /// Inserts `promise` at `store[key][id]`, where `key`/`id` come from its inner prepare.
    /// Overwriting the same id is idempotent.
    pub fn add(&mut self, promise: Promise) {
        let (key, id) = {
            let (key, id) = promise.slot();
            (key.to_string(), id)
        };
        self.promises.entry(key).or_default().insert(id, promise);
    }

    /// Deletes `store[prepare.key][prepare.id]`. Absence is logged, not an error; the inner map
    /// is pruned once empty so `highest_numbered` never iterates dead keys.
    pub fn remove(&mut self, prepare: &Prepare) {
        if let Some(by_id) = self.promises.get_mut(&prepare.key) {
            if by_id.remove(&prepare.id).is_none() {
                log::warn!("already removed promise for key={} id={}", prepare.key, prepare.id);
            }
            if by_id.is_empty() {
                self.promises.remove(&prepare.key);
            }
        } else {
            log::warn!("already removed promise for key={} id={}", prepare.key, prepare.id);
        }
    }

    /// The Promise with the maximum id for `key`, or `None` if there isn't one.
    pub fn get(&self, key: &str) -> Option<Promise> {
        self.promises
            .get(key)
            .and_then(|by_id| by_id.values().next_back())
            .cloned()
    }

    /// With `key`, identical to [`PromiseStore::get`]. Without one, the maximum-ballot Promise
    /// across all keys (ties cannot arise: ids are unique per store by construction).
    pub fn highest_numbered(&self, key: Option<&str>) -> Option<Promise> {
        if let Some(key) = key {
            return self.get(key);
        }
        self.promises
            .keys()
            .filter_map(|key| self.get(key))
            .max_by_key(|promise| promise.slot().1)
    }

    /// Membership by `(key, id)`.
    pub fn contains(&self, promise: &Promise) -> bool {
        let (key, id) = promise.slot();
        self.promises
            .get(key)
            .map(|by_id| by_id.contains_key(&id))
            .unwrap_or(false)
    }

    /// Empties the store. Used by tests to reset an `Agent` between scenarios.
    pub fn clear(&mut self) {
        self.promises.clear();
    }

    /// Drops `current[key]` if it has already been superseded by a learned round for the same
    /// key (its ballot is <= the highest completed ballot for `key`). Without this, a promise
    /// issued to one quorum whose Propose went to a disjoint quorum would linger forever and
    /// could be mistaken for a pending repair.
    pub fn evict_superseded(&mut self, key: &str, completed_highest: Option<Ballot>) {
        let Some(completed_highest) = completed_highest else {
            return;
        };
        let stale = self
            .get(key)
            .map(|promise| promise.slot().1 <= completed_highest)
            .unwrap_or(false);
        if stale {
            if let Some(by_id) = self.promises.get_mut(key) {
                by_id.retain(|id, _| *id > completed_highest);
                if by_id.is_empty() {
                    self.promises.remove(key);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn promise(key: &str, id: Ballot) -> Promise {
        Promise::of(Prepare::new(id, key, "set", serde_json::json!(null)))
    }

    #[test]
    fn add_then_remove_restores_prior_state() {
        let mut store = PromiseStore::new();
        assert!(store.get("foo").is_none());
        let p = promise("foo", 1);
        store.add(p.clone());
        assert_eq!(store.get("foo"), Some(p.clone()));
        store.remove(&p.prepare.clone().unwrap());
        assert!(store.get("foo").is_none());
    }

    #[test]
    fn get_returns_highest_id_for_key() {
        let mut store = PromiseStore::new();
        store.add(promise("foo", 1));
        store.add(promise("foo", 3));
        store.add(promise("foo", 2));
        assert_eq!(store.get("foo").unwrap().slot().1, 3);
    }

    #[test]
    fn highest_numbered_without_key_scans_all_keys() {
        let mut store = PromiseStore::new();
        store.add(promise("foo", 1));
        store.add(promise("bar", 5));
        store.add(promise("baz", 3));
        let highest = store.highest_numbered(None).unwrap();
        assert_eq!(highest.slot(), ("bar", 5));
    }

    #[test]
    fn highest_numbered_with_key_matches_get() {
        let mut store = PromiseStore::new();
        store.add(promise("foo", 1));
        store.add(promise("foo", 4));
        assert_eq!(
            store.highest_numbered(Some("foo")),
            store.get("foo")
        );
    }

    #[test]
    fn contains_checks_key_and_id_membership() {
        let mut store = PromiseStore::new();
        let p = promise("foo", 1);
        assert!(!store.contains(&p));
        store.add(p.clone());
        assert!(store.contains(&p));
        assert!(!store.contains(&promise("foo", 2)));
    }

    #[test]
    fn remove_of_absent_entry_is_not_fatal() {
        let mut store = PromiseStore::new();
        store.remove(&Prepare::new(9, "ghost", "set", serde_json::json!(null)));
    }

    #[test]
    fn clear_empties_the_store() {
        let mut store = PromiseStore::new();
        store.add(promise("foo", 1));
        store.clear();
        assert!(store.get("foo").is_none());
    }

    #[test]
    fn evict_superseded_drops_a_current_entry_already_learned() {
        let mut store = PromiseStore::new();
        store.add(promise("foo", 6));
        store.evict_superseded("foo", Some(6));
        assert!(store.get("foo").is_none());
    }

    #[test]
    fn evict_superseded_keeps_a_current_entry_still_ahead_of_completed() {
        let mut store = PromiseStore::new();
        store.add(promise("foo", 10));
        store.evict_superseded("foo", Some(6));
        assert!(store.get("foo").is_some());
    }
}
