//! Coherence bus connecting the agent caches to the memory image.
//!
//! This module implements the snooping bus that keeps every agent's cache coherent. It provides:
//! 1. **Serialization:** One transaction at a time, giving a single global order.
//! 2. **Snooping:** Remote events broadcast to every other agent in ascending id order.
//! 3. **Data movement:** Fills from the dirty owner or memory, flushes and eviction write-backs.
//! 4. **Checking:** The line invariant (states and data) verified after every access.
//! 5. **Tracing:** A bounded ring of [`BusTransaction`] records and transaction counters.
//!
//! The bus owns the [`MemoryImage`]; agents only ever see memory through it.

use std::collections::VecDeque;

use tracing::trace;

use crate::common::addr::{LineAddr, WordAddr};
use crate::common::error::SimError;
use crate::core::agent::Agent;
use crate::core::units::cache::CacheLine;
use crate::core::units::cache::moesi::{
    self, BusRequest, LineState, LocalEvent, LocalOutcome,
};
use crate::soc::memory::{LineData, MemoryImage};
use crate::stats::{BusStats, BusTransaction, DataSource, TransactionKind};

/// What a completed request hands back to the requester.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct BusReply {
    /// Fill data, for requests that need it.
    data: Option<LineData>,
    /// Another agent held a valid copy when the request was snooped.
    shared: bool,
}

/// Snooping coherence bus; owns the memory image.
#[derive(Debug)]
pub struct CoherenceBus {
    memory: MemoryImage,
    /// `(agent, line)` of the transaction in progress.
    in_flight: Option<(usize, LineAddr)>,
    seq: u64,
    trace: VecDeque<BusTransaction>,
    trace_capacity: usize,
    /// Transaction counters.
    pub stats: BusStats,
}

impl CoherenceBus {
    /// Creates a bus over a zeroed memory image.
    ///
    /// # Arguments
    ///
    /// * `trace_capacity` - Number of transactions the trace keeps; 0 disables it.
    pub fn new(trace_capacity: usize) -> Self {
        Self {
            memory: MemoryImage::new(),
            in_flight: None,
            seq: 0,
            trace: VecDeque::with_capacity(trace_capacity),
            trace_capacity,
            stats: BusStats::default(),
        }
    }

    /// Returns the raw memory image (without dirty cached data).
    pub const fn memory(&self) -> &MemoryImage {
        &self.memory
    }

    /// Returns the most recent transactions, oldest first.
    pub const fn trace(&self) -> &VecDeque<BusTransaction> {
        &self.trace
    }

    /// Number of transactions issued since creation, including those dropped from the trace.
    pub const fn transactions(&self) -> u64 {
        self.seq
    }

    /// Returns the current value of `line`: the dirty owner's copy if any, else memory.
    pub fn coherent_line(&self, agents: &[Agent], line: LineAddr) -> LineData {
        agents
            .iter()
            .find_map(|a| a.cache.line(line).filter(|l| l.state.is_dirty()))
            .map_or_else(|| self.memory.read_line(line), |l| l.data)
    }

    /// Loads a word on behalf of agent `id`, filling its cache on a miss.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::ProtocolViolation`] if the protocol breaks an invariant.
    pub fn load(&mut self, agents: &mut [Agent], id: usize, addr: WordAddr) -> Result<u32, SimError> {
        let line = addr.line();
        let state = agents[id].cache.state_of(line);
        match state.on_local(LocalEvent::Read) {
            LocalOutcome::Hit(_) => agents[id].cache.hits += 1,
            LocalOutcome::Bus(request) => {
                agents[id].cache.misses += 1;
                self.fill(agents, id, request, line)?;
            }
        }
        let value = agents[id]
            .cache
            .read_word(addr)
            .ok_or_else(|| SimError::violation(line, format!("agent {id} lost the line it just filled")))?;
        self.verify_line(agents, line)?;
        Ok(value)
    }

    /// Stores a word on behalf of agent `id`, gaining write permission first.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::ProtocolViolation`] if the protocol breaks an invariant.
    pub fn store(
        &mut self,
        agents: &mut [Agent],
        id: usize,
        addr: WordAddr,
        val: u32,
    ) -> Result<(), SimError> {
        let line = addr.line();
        let state = agents[id].cache.state_of(line);
        match state.on_local(LocalEvent::Write) {
            LocalOutcome::Hit(_) => agents[id].cache.hits += 1,
            LocalOutcome::Bus(BusRequest::Upgrade) => {
                agents[id].cache.misses += 1;
                let _ = self.transact(agents, id, BusRequest::Upgrade, line)?;
                if !agents[id].cache.set_state(line, LineState::Modified) {
                    return Err(SimError::violation(
                        line,
                        format!("agent {id} lost its copy during an upgrade"),
                    ));
                }
                self.record_result(agents, id, line);
            }
            LocalOutcome::Bus(request) => {
                agents[id].cache.misses += 1;
                self.fill(agents, id, request, line)?;
            }
        }
        if !agents[id].cache.write_word(addr, val) {
            return Err(SimError::violation(
                line,
                format!("agent {id} has no write permission after its request"),
            ));
        }
        self.verify_line(agents, line)
    }

    /// Brings `line` into agent `id`'s cache, evicting a victim if needed.
    fn fill(
        &mut self,
        agents: &mut [Agent],
        id: usize,
        request: BusRequest,
        line: LineAddr,
    ) -> Result<(), SimError> {
        let (slot, evicted) = agents[id].cache.make_room();
        if let Some(victim) = evicted {
            self.evict(agents, id, &victim)?;
        }
        let reply = self.transact(agents, id, request, line)?;
        let data = reply
            .data
            .ok_or_else(|| SimError::violation(line, "fill completed without data"))?;
        agents[id]
            .cache
            .install(slot, line, request.fill_state(reply.shared), data);
        self.record_result(agents, id, line);
        Ok(())
    }

    /// Disposes of a line evicted from agent `id`: dirty data goes back to memory.
    fn evict(&mut self, agents: &[Agent], id: usize, victim: &CacheLine) -> Result<(), SimError> {
        if !victim.state.is_dirty() {
            trace!(agent = id, line = %victim.line, state = %victim.state, "silent eviction");
            return self.verify_line(agents, victim.line);
        }
        self.begin(id, victim.line)?;
        self.memory.write_line(victim.line, &victim.data);
        self.stats.writebacks += 1;
        self.push_trace(BusTransaction {
            seq: 0,
            agent: id,
            kind: TransactionKind::WriteBack,
            line: victim.line,
            supplier: DataSource::None,
            invalidated: Vec::new(),
            downgraded: Vec::new(),
            flushed: true,
            result: LineState::Invalid,
        });
        self.in_flight = None;
        self.verify_line(agents, victim.line)
    }

    /// Runs one request: snoops every other agent and gathers the line data.
    ///
    /// The requester's own state is updated by the caller once this returns.
    fn transact(
        &mut self,
        agents: &mut [Agent],
        id: usize,
        request: BusRequest,
        line: LineAddr,
    ) -> Result<BusReply, SimError> {
        self.begin(id, line)?;
        let result = self.snoop_all(agents, id, request, line);
        self.in_flight = None;
        result
    }

    fn snoop_all(
        &mut self,
        agents: &mut [Agent],
        id: usize,
        request: BusRequest,
        line: LineAddr,
    ) -> Result<BusReply, SimError> {
        let event = request.snoop_event();
        self.stats.record(request);

        let mut shared = false;
        let mut flushed = false;
        let mut supplied: Option<(usize, LineData)> = None;
        let mut invalidated = Vec::new();
        let mut downgraded = Vec::new();

        for peer in agents.iter_mut().filter(|a| a.id != id) {
            let reply = peer.cache.snoop(line, event);
            if !reply.prior.is_valid() {
                continue;
            }
            shared = true;
            if !reply.outcome.next.is_valid() {
                invalidated.push(peer.id);
            } else if reply.outcome.next != reply.prior {
                downgraded.push(peer.id);
            }
            if let Some(data) = reply.data {
                if let Some((first, _)) = supplied {
                    return Err(SimError::violation(
                        line,
                        format!("agents {first} and {} both supplied data", peer.id),
                    ));
                }
                if reply.outcome.flush {
                    self.memory.write_line(line, &data);
                    self.stats.writebacks += 1;
                    flushed = true;
                }
                supplied = Some((peer.id, data));
            }
        }
        self.stats.invalidations += invalidated.len() as u64;

        let (supplier, data) = if !request.needs_data() {
            (DataSource::None, None)
        } else if let Some((peer, data)) = supplied {
            self.stats.cache_to_cache += 1;
            (DataSource::Agent(peer), Some(data))
        } else {
            (DataSource::Memory, Some(self.memory.read_line(line)))
        };

        trace!(
            agent = id,
            %line,
            ?request,
            ?supplier,
            ?invalidated,
            ?downgraded,
            "bus transaction"
        );
        self.push_trace(BusTransaction {
            seq: 0,
            agent: id,
            kind: request.into(),
            line,
            supplier,
            invalidated,
            downgraded,
            flushed,
            result: LineState::Invalid,
        });
        Ok(BusReply { data, shared })
    }

    fn begin(&mut self, id: usize, line: LineAddr) -> Result<(), SimError> {
        if let Some((agent, busy)) = self.in_flight {
            return Err(SimError::violation(
                line,
                format!("agent {id} issued a request while agent {agent}'s request on {busy} was in flight"),
            ));
        }
        self.in_flight = Some((id, line));
        Ok(())
    }

    fn push_trace(&mut self, mut record: BusTransaction) {
        record.seq = self.seq;
        self.seq += 1;
        if self.trace_capacity == 0 {
            return;
        }
        if self.trace.len() == self.trace_capacity {
            let _ = self.trace.pop_front();
        }
        self.trace.push_back(record);
    }

    /// Stamps the requester's final state onto the newest trace record.
    fn record_result(&mut self, agents: &[Agent], id: usize, line: LineAddr) {
        let state = agents[id].cache.state_of(line);
        if let Some(last) = self.trace.back_mut()
            && last.agent == id
            && last.line == line
        {
            last.result = state;
        }
    }

    /// Checks the coherence invariant for one line across all agents.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::ProtocolViolation`] if the states are incompatible or a valid
    /// copy differs from the line's current value.
    pub fn verify_line(&self, agents: &[Agent], line: LineAddr) -> Result<(), SimError> {
        moesi::check_states(agents.iter().map(|a| a.cache.state_of(line)))
            .map_err(|detail| SimError::violation(line, detail))?;
        let current = self.coherent_line(agents, line);
        for agent in agents {
            if let Some(copy) = agent.cache.line(line)
                && copy.data != current
            {
                return Err(SimError::violation(
                    line,
                    format!("agent {} holds a stale {} copy", agent.id, copy.state),
                ));
            }
        }
        Ok(())
    }

    /// Checks the invariant for every line.
    ///
    /// # Errors
    ///
    /// Returns the first violation, lowest line first.
    pub fn verify_all(&self, agents: &[Agent]) -> Result<(), SimError> {
        LineAddr::all().try_for_each(|line| self.verify_line(agents, line))
    }
}
