//! Least Recently Used (LRU) Replacement Policy.
//!
//! This policy evicts the slot that has not been accessed for the longest time.
//! It maintains a usage stack over all slots. When a slot is accessed or filled, it is
//! moved to the top (Most Recently Used position). The bottom of the stack is the victim.
//!
//! # Performance
//!
//! - `touch()` / `insert()`: O(N) where N is the number of slots
//! - `victim()`: O(1)

use super::ReplacementPolicy;

/// LRU Policy state.
#[derive(Clone, Debug)]
pub struct LruPolicy {
    /// Usage stack; index 0 is MRU, the last index is LRU.
    usage: Vec<usize>,
}

impl LruPolicy {
    /// Creates a new LRU policy over `slots` slots, slot 0 being the first victim.
    pub fn new(slots: usize) -> Self {
        Self {
            usage: (0..slots).rev().collect(),
        }
    }

    fn promote(&mut self, slot: usize) {
        if let Some(pos) = self.usage.iter().position(|&x| x == slot) {
            let _ = self.usage.remove(pos);
        }
        self.usage.insert(0, slot);
    }
}

impl ReplacementPolicy for LruPolicy {
    fn touch(&mut self, slot: usize) {
        self.promote(slot);
    }

    fn insert(&mut self, slot: usize) {
        self.promote(slot);
    }

    /// Returns the slot at the bottom of the usage stack.
    fn victim(&self) -> usize {
        self.usage.last().copied().unwrap_or(0)
    }
}
