//! Cache Replacement Policies.
//!
//! Implements the algorithms that pick a victim slot when an agent's cache is full
//! and a fill needs room. Agent caches are fully associative, so each policy tracks
//! a single ordering over all slots.
//!
//! # Policies
//!
//! - `Fifo`: First-In, First-Out (evicts the oldest fill).
//! - `Lru`: Least Recently Used (evicts the oldest access).

/// First-In, First-Out replacement policy.
pub mod fifo;

/// Least Recently Used replacement policy.
pub mod lru;

use std::fmt;

pub use fifo::FifoPolicy;
pub use lru::LruPolicy;

use crate::config::ReplacementPolicy as PolicyType;

/// Trait for cache replacement policies.
///
/// Defines the interface for updating usage state and selecting victim slots.
pub trait ReplacementPolicy: fmt::Debug + Send + Sync {
    /// Records a hit on `slot`.
    fn touch(&mut self, slot: usize);

    /// Records that `slot` was just filled with a new line.
    fn insert(&mut self, slot: usize);

    /// Selects the slot to evict when every slot holds a valid line.
    fn victim(&self) -> usize;
}

/// Builds the policy selected in the configuration.
///
/// # Arguments
///
/// * `kind` - Configured policy.
/// * `slots` - Number of slots in the cache.
pub fn build(kind: PolicyType, slots: usize) -> Box<dyn ReplacementPolicy> {
    match kind {
        PolicyType::Lru => Box::new(LruPolicy::new(slots)),
        PolicyType::Fifo => Box::new(FifoPolicy::new(slots)),
    }
}
