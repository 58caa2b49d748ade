//! Coherence bus tests.
//!
//! Each test drives the bus directly with a small set of agents and checks states,
//! data placement, counters and trace records.

use moesim_core::LineState;
use moesim_core::common::addr::{LineAddr, WordAddr};
use moesim_core::config::{CacheConfig, ReplacementPolicy};
use moesim_core::core::Agent;
use moesim_core::soc::CoherenceBus;
use moesim_core::stats::{DataSource, TransactionKind};
use pretty_assertions::assert_eq;

struct Rig {
    agents: Vec<Agent>,
    bus: CoherenceBus,
}

impl Rig {
    fn new(agents: usize, lines: usize) -> Self {
        Self::with_trace(agents, lines, 64)
    }

    fn with_trace(agents: usize, lines: usize, trace: usize) -> Self {
        let config = CacheConfig {
            lines,
            policy: ReplacementPolicy::Lru,
        };
        Self {
            agents: (0..agents).map(|id| Agent::new(id, &config)).collect(),
            bus: CoherenceBus::new(trace),
        }
    }

    fn load(&mut self, id: usize, addr: u32) -> u32 {
        self.bus
            .load(&mut self.agents, id, WordAddr::new(addr).unwrap())
            .unwrap()
    }

    fn store(&mut self, id: usize, addr: u32, val: u32) {
        self.bus
            .store(&mut self.agents, id, WordAddr::new(addr).unwrap(), val)
            .unwrap();
    }

    fn state(&self, id: usize, addr: u32) -> LineState {
        self.agents[id]
            .cache
            .state_of(WordAddr::new(addr).unwrap().line())
    }

    fn states(&self, addr: u32) -> Vec<LineState> {
        (0..self.agents.len()).map(|id| self.state(id, addr)).collect()
    }

    fn memory_word(&self, addr: u32) -> u32 {
        self.bus.memory().read_u32(WordAddr::new(addr).unwrap())
    }
}

use LineState::{Exclusive as E, Invalid as I, Modified as M, Owned as O, Shared as S};

#[test]
fn first_reader_gets_exclusive_second_shares() {
    let mut rig = Rig::new(2, 4);
    assert_eq!(rig.load(0, 0), 0);
    assert_eq!(rig.states(0), vec![E, I]);
    assert_eq!(rig.load(1, 4), 0);
    assert_eq!(rig.states(0), vec![S, S]);

    let trace: Vec<_> = rig.bus.trace().iter().collect();
    assert_eq!(trace.len(), 2);
    assert_eq!(trace[0].supplier, DataSource::Memory);
    assert_eq!(trace[0].result, E);
    assert_eq!(trace[1].downgraded, vec![0]);
    assert_eq!(trace[1].result, S);
    assert_eq!(rig.bus.stats.reads, 2);
}

#[test]
fn dirty_owner_supplies_readers_without_touching_memory() {
    let mut rig = Rig::new(3, 4);
    rig.store(0, 64, 5);
    assert_eq!(rig.load(1, 64), 5);
    assert_eq!(rig.load(2, 64), 5);
    assert_eq!(rig.states(64), vec![O, S, S]);
    assert_eq!(rig.memory_word(64), 0);

    let line = LineAddr::from_index(1).unwrap();
    assert_eq!(rig.bus.coherent_line(&rig.agents, line)[0], 5);
    let suppliers: Vec<DataSource> = rig.bus.trace().iter().map(|t| t.supplier).collect();
    assert_eq!(
        suppliers,
        vec![DataSource::Memory, DataSource::Agent(0), DataSource::Agent(0)]
    );
    assert_eq!(rig.bus.stats.cache_to_cache, 2);
}

#[test]
fn write_miss_on_a_dirty_line_flushes_the_owner() {
    let mut rig = Rig::new(2, 4);
    rig.store(0, 128, 11);
    rig.store(1, 132, 22);
    assert_eq!(rig.states(128), vec![I, M]);
    assert_eq!(rig.memory_word(128), 11, "the previous owner flushed");
    assert_eq!(rig.load(1, 128), 11);

    let last = rig.bus.trace().back().unwrap();
    assert_eq!(last.kind, TransactionKind::ReadExclusive);
    assert_eq!(last.invalidated, vec![0]);
    assert!(last.flushed);
    assert_eq!(last.supplier, DataSource::Agent(0));
    assert_eq!(rig.bus.stats.writebacks, 1);
}

#[test]
fn shared_writer_upgrades_and_invalidates_peers() {
    let mut rig = Rig::new(3, 4);
    for id in 0..3 {
        let _ = rig.load(id, 192);
    }
    rig.store(1, 196, 3);
    assert_eq!(rig.states(192), vec![I, M, I]);

    let last = rig.bus.trace().back().unwrap();
    assert_eq!(last.kind, TransactionKind::Upgrade);
    assert_eq!(last.supplier, DataSource::None);
    assert_eq!(last.invalidated, vec![0, 2]);
    assert_eq!(last.result, M);
    assert_eq!(rig.bus.stats.upgrades, 1);
    assert_eq!(rig.bus.stats.invalidations, 2);
}

#[test]
fn owner_upgrade_keeps_its_dirty_data() {
    let mut rig = Rig::new(2, 4);
    rig.store(0, 0, 1);
    let _ = rig.load(1, 0);
    assert_eq!(rig.states(0), vec![O, S]);
    rig.store(0, 4, 2);
    assert_eq!(rig.states(0), vec![M, I]);
    assert_eq!(rig.memory_word(0), 0);
    let line = rig.bus.coherent_line(&rig.agents, LineAddr::from_index(0).unwrap());
    assert_eq!(&line[..2], &[1, 2]);
}

#[test]
fn exclusive_write_is_silent() {
    let mut rig = Rig::new(2, 4);
    let _ = rig.load(0, 0);
    rig.store(0, 0, 9);
    assert_eq!(rig.states(0), vec![M, I]);
    assert_eq!(rig.bus.transactions(), 1);
    assert_eq!(rig.agents[0].cache.hits, 1);
}

#[test]
fn dirty_victim_is_written_back() {
    let mut rig = Rig::new(1, 1);
    rig.store(0, 0, 42);
    let _ = rig.load(0, 64);
    assert_eq!(rig.state(0, 0), I);
    assert_eq!(rig.memory_word(0), 42);

    let kinds: Vec<TransactionKind> = rig.bus.trace().iter().map(|t| t.kind).collect();
    assert_eq!(
        kinds,
        vec![
            TransactionKind::ReadExclusive,
            TransactionKind::WriteBack,
            TransactionKind::Read
        ]
    );
    assert_eq!(rig.bus.stats.writebacks, 1);
}

#[test]
fn clean_victim_is_dropped_silently() {
    let mut rig = Rig::new(1, 1);
    let _ = rig.load(0, 0);
    let _ = rig.load(0, 64);
    assert_eq!(rig.bus.transactions(), 2);
    assert_eq!(rig.bus.stats.writebacks, 0);
}

#[test]
fn trace_keeps_only_the_newest_records() {
    let mut rig = Rig::with_trace(1, 1, 2);
    for line in 0..3 {
        let _ = rig.load(0, line * 64);
    }
    let seqs: Vec<u64> = rig.bus.trace().iter().map(|t| t.seq).collect();
    assert_eq!(seqs, vec![1, 2]);
    assert_eq!(rig.bus.transactions(), 3);
}

#[test]
fn zero_capacity_disables_the_trace() {
    let mut rig = Rig::with_trace(2, 4, 0);
    rig.store(0, 0, 1);
    let _ = rig.load(1, 0);
    assert!(rig.bus.trace().is_empty());
    assert_eq!(rig.bus.transactions(), 2);
}

#[test]
fn trace_record_renders_compactly() {
    let mut rig = Rig::new(2, 4);
    rig.store(0, 64, 1);
    let _ = rig.load(1, 64);
    let text = rig.bus.trace().back().unwrap().to_string();
    assert!(text.starts_with("#1"), "{text}");
    assert!(text.ends_with("agent1 Read 0x040 -> S from agent0 down[0]"), "{text}");
}

#[test]
fn every_line_verifies_after_mixed_traffic() {
    let mut rig = Rig::new(4, 2);
    for (i, addr) in [0u32, 64, 128, 0, 192, 64, 256, 0].into_iter().enumerate() {
        let id = i % 4;
        if i % 3 == 0 {
            rig.store(id, addr, i as u32);
        } else {
            let _ = rig.load(id, addr);
        }
    }
    assert!(rig.bus.verify_all(&rig.agents).is_ok());
}
