//! First-In, First-Out (FIFO) Replacement Policy.
//!
//! This policy evicts the slot that was filled longest ago, regardless of how recently
//! it was accessed. Hits do not change the order.
//!
//! # Performance
//!
//! - `touch()`: O(1)
//! - `insert()`: O(N) where N is the number of slots
//! - `victim()`: O(1)

use std::collections::VecDeque;

use super::ReplacementPolicy;

/// FIFO Policy state.
#[derive(Clone, Debug)]
pub struct FifoPolicy {
    /// Slots in fill order; the front is the oldest fill.
    order: VecDeque<usize>,
}

impl FifoPolicy {
    /// Creates a new FIFO policy over `slots` slots, slot 0 being the first victim.
    pub fn new(slots: usize) -> Self {
        Self {
            order: (0..slots).collect(),
        }
    }
}

impl ReplacementPolicy for FifoPolicy {
    fn touch(&mut self, _slot: usize) {}

    /// Moves the refilled slot to the back of the queue.
    fn insert(&mut self, slot: usize) {
        if let Some(pos) = self.order.iter().position(|&x| x == slot) {
            let _ = self.order.remove(pos);
        }
        self.order.push_back(slot);
    }

    fn victim(&self) -> usize {
        self.order.front().copied().unwrap_or(0)
    }
}
