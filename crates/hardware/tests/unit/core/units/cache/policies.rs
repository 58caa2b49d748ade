//! Replacement policy tests.

use moesim_core::config::ReplacementPolicy as PolicyType;
use moesim_core::core::units::cache::policies::{FifoPolicy, LruPolicy, ReplacementPolicy, build};
use rstest::rstest;

#[test]
fn fresh_lru_evicts_slot_zero_first() {
    let lru = LruPolicy::new(4);
    assert_eq!(lru.victim(), 0);
}

#[test]
fn lru_orders_by_last_access() {
    let mut lru = LruPolicy::new(3);
    for slot in 0..3 {
        lru.insert(slot);
    }
    lru.touch(0);
    lru.touch(1);
    assert_eq!(lru.victim(), 2);
    lru.touch(2);
    assert_eq!(lru.victim(), 0);
}

#[test]
fn fifo_ignores_hits() {
    let mut fifo = FifoPolicy::new(3);
    for slot in [2, 0, 1] {
        fifo.insert(slot);
    }
    fifo.touch(2);
    assert_eq!(fifo.victim(), 2);
    fifo.insert(2);
    assert_eq!(fifo.victim(), 0);
}

#[rstest]
#[case(PolicyType::Lru)]
#[case(PolicyType::Fifo)]
fn single_slot_always_evicts_itself(#[case] kind: PolicyType) {
    let mut policy = build(kind, 1);
    policy.insert(0);
    policy.touch(0);
    assert_eq!(policy.victim(), 0);
}
