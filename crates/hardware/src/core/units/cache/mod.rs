//! Per-Agent Coherent Cache.
//!
//! This module implements the private cache of one agent. It provides:
//! 1. **Storage:** A small fully-associative array of line slots holding MOESI state and data.
//! 2. **Local Hits:** Word reads and writes that complete without bus traffic.
//! 3. **Snooping:** Application of remote events delivered by the coherence bus.
//! 4. **Replacement:** Victim selection for fills through a configurable policy.
//!
//! The cache never talks to other caches. Misses and upgrades are resolved by
//! [`CoherenceBus`](crate::soc::interconnect::CoherenceBus), which is the only caller of
//! [`AgentCache::snoop`].

/// MOESI state machine.
pub mod moesi;

/// Cache replacement policy implementations (FIFO, LRU).
pub mod policies;

use self::moesi::{LineState, SnoopEvent, SnoopOutcome};
use self::policies::ReplacementPolicy;
use crate::common::addr::{LineAddr, WordAddr};
use crate::config::CacheConfig;
use crate::soc::memory::LineData;

/// A valid line held in a cache slot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CacheLine {
    /// Which memory line this slot holds.
    pub line: LineAddr,
    /// Coherence state; never [`LineState::Invalid`] while stored.
    pub state: LineState,
    /// Cached copy of the sixteen words of the line.
    pub data: LineData,
}

/// What a snooped remote event did to this cache's copy of a line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SnoopReply {
    /// State before the event.
    pub prior: LineState,
    /// Protocol outcome (next state, supply, flush).
    pub outcome: SnoopOutcome,
    /// Line data, present when the outcome requires this copy to supply it.
    pub data: Option<LineData>,
}

/// Private cache of one agent.
#[derive(Debug)]
pub struct AgentCache {
    slots: Vec<Option<CacheLine>>,
    policy: Box<dyn ReplacementPolicy>,
    /// Local accesses that completed without a bus transaction.
    pub hits: u64,
    /// Local accesses that needed a bus transaction.
    pub misses: u64,
}

impl AgentCache {
    /// Creates an empty (all-Invalid) cache.
    ///
    /// # Arguments
    ///
    /// * `config` - Cache configuration specifying the slot count and replacement policy.
    pub fn new(config: &CacheConfig) -> Self {
        let slots = config.lines.max(1);
        Self {
            slots: vec![None; slots],
            policy: policies::build(config.policy, slots),
            hits: 0,
            misses: 0,
        }
    }

    fn slot_of(&self, line: LineAddr) -> Option<usize> {
        self.slots
            .iter()
            .position(|slot| slot.as_ref().is_some_and(|l| l.line == line))
    }

    /// Returns the cached copy of `line`, if valid.
    pub fn line(&self, line: LineAddr) -> Option<&CacheLine> {
        self.slot_of(line).and_then(|slot| self.slots[slot].as_ref())
    }

    /// Returns the coherence state of `line` (Invalid when not cached).
    pub fn state_of(&self, line: LineAddr) -> LineState {
        self.line(line).map_or(LineState::Invalid, |l| l.state)
    }

    /// Iterates over every valid line in slot order.
    pub fn lines(&self) -> impl Iterator<Item = &CacheLine> {
        self.slots.iter().flatten()
    }

    /// Reads a word from a valid copy.
    ///
    /// # Returns
    ///
    /// The word, or `None` if the line is not cached.
    pub fn read_word(&mut self, addr: WordAddr) -> Option<u32> {
        let slot = self.slot_of(addr.line())?;
        self.policy.touch(slot);
        self.slots[slot]
            .as_ref()
            .map(|l| l.data[addr.word_in_line()])
    }

    /// Writes a word into a copy this agent may write, leaving it Modified.
    ///
    /// # Returns
    ///
    /// `false` if the line is not cached in M or E; nothing is written in that case.
    pub fn write_word(&mut self, addr: WordAddr, val: u32) -> bool {
        let Some(slot) = self.slot_of(addr.line()) else {
            return false;
        };
        let Some(line) = self.slots[slot].as_mut() else {
            return false;
        };
        if !line.state.is_exclusive() {
            return false;
        }
        line.state = LineState::Modified;
        line.data[addr.word_in_line()] = val;
        self.policy.touch(slot);
        true
    }

    /// Changes the state of a cached line after a completed bus transaction.
    ///
    /// # Returns
    ///
    /// `false` if the line is not cached.
    pub fn set_state(&mut self, line: LineAddr, state: LineState) -> bool {
        match self.slot_of(line) {
            Some(slot) if state.is_valid() => {
                if let Some(l) = self.slots[slot].as_mut() {
                    l.state = state;
                }
                true
            }
            Some(slot) => {
                self.slots[slot] = None;
                true
            }
            None => false,
        }
    }

    /// Applies a remote event delivered by the bus to this cache's copy of `line`.
    ///
    /// Invalidated copies free their slot.
    pub fn snoop(&mut self, line: LineAddr, event: SnoopEvent) -> SnoopReply {
        let mut reply = SnoopReply {
            prior: LineState::Invalid,
            outcome: LineState::Invalid.on_snoop(event),
            data: None,
        };
        let Some(slot) = self.slot_of(line) else {
            return reply;
        };
        if let Some(copy) = self.slots[slot].as_mut() {
            let outcome = copy.state.on_snoop(event);
            reply = SnoopReply {
                prior: copy.state,
                outcome,
                data: outcome.supply.then_some(copy.data),
            };
            copy.state = outcome.next;
        }
        if !reply.outcome.next.is_valid() {
            self.slots[slot] = None;
        }
        reply
    }

    /// Frees a slot for a fill.
    ///
    /// # Returns
    ///
    /// The slot to fill and, if every slot was in use, the evicted line. The caller
    /// must write an evicted dirty line back before anyone can read it from memory.
    pub fn make_room(&mut self) -> (usize, Option<CacheLine>) {
        if let Some(free) = self.slots.iter().position(Option::is_none) {
            return (free, None);
        }
        let victim = self.policy.victim();
        (victim, self.slots[victim].take())
    }

    /// Installs a filled line into a slot returned by [`make_room`](Self::make_room).
    pub fn install(&mut self, slot: usize, line: LineAddr, state: LineState, data: LineData) {
        self.slots[slot] = Some(CacheLine { line, state, data });
        self.policy.insert(slot);
    }
}
