//! The idle-worker set: an ordered collection of worker identifiers
//! currently ready to accept work.
//!
//! Backed by a [`BTreeSet`], which gives logarithmic insert,
//! logarithmic remove-by-key, logarithmic take-smallest (`pop_first`),
//! and O(1) size/emptiness — everything the dispatch loop needs from
//! this structure. The smallest-element tie-break is a functional
//! requirement, not an artifact of this choice; any ordered-set
//! implementation would do.

use std::collections::BTreeSet;

use crate::worker_id::WorkerId;

#[derive(Debug, Default)]
pub struct IdleWorkers {
    ids: BTreeSet<WorkerId>,
}

impl IdleWorkers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `id` into the idle set. Returns `true` if it was not
    /// already present.
    pub fn insert(&mut self, id: WorkerId) -> bool {
        self.ids.insert(id)
    }

    /// Remove `id` from the idle set, if present. Idempotent: removing
    /// an absent id is a no-op that returns `false`.
    pub fn remove(&mut self, id: &WorkerId) -> bool {
        self.ids.remove(id)
    }

    /// Remove and return the smallest idle worker, if any.
    pub fn take_smallest(&mut self) -> Option<WorkerId> {
        self.ids.pop_first()
    }

    pub fn contains(&self, id: &WorkerId) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn take_smallest_is_deterministic() {
        let mut set = IdleWorkers::new();
        set.insert(WorkerId::from("w2"));
        set.insert(WorkerId::from("w1"));
        set.insert(WorkerId::from("w3"));
        assert_eq!(set.take_smallest(), Some(WorkerId::from("w1")));
        assert_eq!(set.take_smallest(), Some(WorkerId::from("w2")));
        assert_eq!(set.take_smallest(), Some(WorkerId::from("w3")));
        assert_eq!(set.take_smallest(), None);
    }

    #[test]
    fn remove_unknown_is_noop() {
        let mut set = IdleWorkers::new();
        assert!(!set.remove(&WorkerId::from("ghost")));
    }

    #[test]
    fn insert_is_idempotent_for_size() {
        let mut set = IdleWorkers::new();
        set.insert(WorkerId::from("w1"));
        set.insert(WorkerId::from("w1"));
        assert_eq!(set.len(), 1);
    }
}
