//! Simulator: owns the agents, the coherence bus and the debug state side-by-side.
//!
//! The simulator is the single owner of everything a session mutates. It provides:
//! 1. **Lifecycle:** Creation from a [`Config`], program loading and reset.
//! 2. **Stepping:** Round-robin scheduling rounds, bounded runs and run-to-breakpoint.
//! 3. **Breakpoints:** A set of source lines checked after every round.
//! 4. **Introspection:** Register, memory and cache-state snapshots, the last error,
//!    statistics and the coherence trace.
//!
//! Every operation that can fail records its error instead of returning it, so the
//! browser boundary can poll [`Simulator::last_error`] after a `false` result.

use std::collections::{BTreeSet, VecDeque};

use serde::Serialize;
use tracing::{debug, trace, warn};

use crate::common::addr::LineAddr;
use crate::common::constants::{
    MAX_AGENTS, MAX_CACHE_LINES, MEM_WORDS, NUM_LINES, NUM_REGS, WORDS_PER_LINE,
};
use crate::common::error::{ErrorKind, SimError};
use crate::config::Config;
use crate::core::agent::Agent;
use crate::core::execute;
use crate::core::units::cache::moesi::LineState;
use crate::isa::instruction::Instruction;
use crate::sim::loader::{self, Program};
use crate::soc::interconnect::CoherenceBus;
use crate::soc::memory::MemoryImage;
use crate::stats::{BusTransaction, SimStats};

/// Line states of every agent's cache: `table[agent][line]`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CacheStateTable(pub Vec<[LineState; NUM_LINES]>);

impl CacheStateTable {
    /// State of `line` in `agent`'s cache.
    pub fn get(&self, agent: usize, line: LineAddr) -> Option<LineState> {
        self.0.get(agent).map(|row| row[line.index()])
    }
}

/// How a step ended when it did not fail.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum RoundOutcome {
    /// Nothing noteworthy; a run may continue.
    Continue,
    /// Some agent executed `HALT`.
    Halted,
}

/// Top-level simulator: agents, bus and debug state.
#[derive(Debug)]
pub struct Simulator {
    config: Config,
    program: Program,
    agents: Vec<Agent>,
    bus: CoherenceBus,
    breakpoints: BTreeSet<usize>,
    error: Option<SimError>,
    poisoned: Option<SimError>,
    stats: SimStats,
}

impl Default for Simulator {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl Simulator {
    /// Creates a zeroed machine with an empty program.
    ///
    /// # Arguments
    ///
    /// * `config` - Machine shape; out-of-range counts are clamped to the machine limits.
    pub fn new(mut config: Config) -> Self {
        config.system.agents = config.system.agents.clamp(1, MAX_AGENTS);
        config.cache.lines = config.cache.lines.clamp(1, MAX_CACHE_LINES);
        let agents = Self::fresh_agents(&config);
        let bus = CoherenceBus::new(config.general.trace_capacity);
        let stats = SimStats::new(config.system.agents);
        Self {
            config,
            program: Program::default(),
            agents,
            bus,
            breakpoints: BTreeSet::new(),
            error: None,
            poisoned: None,
            stats,
        }
    }

    fn fresh_agents(config: &Config) -> Vec<Agent> {
        (0..config.system.agents)
            .map(|id| Agent::new(id, &config.cache))
            .collect()
    }

    /// Configuration the machine was built with.
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Number of agents.
    pub fn agents(&self) -> usize {
        self.agents.len()
    }

    /// Currently loaded program.
    pub const fn program(&self) -> &Program {
        &self.program
    }

    fn fail(&mut self, err: SimError) -> bool {
        match err.kind() {
            ErrorKind::ProtocolViolation => {
                warn!(error = %err, "coherence protocol violated; simulator poisoned until reset");
                self.poisoned = Some(err.clone());
            }
            kind if kind.is_recoverable() => debug!(error = %err, "operation failed"),
            _ => warn!(error = %err, "operation refused"),
        }
        self.error = Some(err);
        false
    }

    /// Decodes and installs a new program.
    ///
    /// On success every program counter returns to line 0, the halted flags and the
    /// error are cleared; registers, memory and caches are kept. On failure nothing
    /// changes except the recorded error. A poisoned simulator refuses every program
    /// until [`reset`](Self::reset).
    ///
    /// # Returns
    ///
    /// `true` if the program was installed.
    pub fn set_code_text(&mut self, text: &str) -> bool {
        if let Some(err) = self.poisoned.clone() {
            return self.fail(err);
        }
        match loader::load(text) {
            Ok(program) => {
                debug!(lines = program.len(), "program installed");
                self.program = program;
                for agent in &mut self.agents {
                    agent.regs.pc = 0;
                    agent.halted = false;
                }
                self.error = None;
                true
            }
            Err(err) => self.fail(err.into()),
        }
    }

    /// Executes one scheduling round: each running agent retires one instruction,
    /// lowest id first.
    ///
    /// # Returns
    ///
    /// `true` on success; `false` with [`last_error`](Self::last_error) set otherwise.
    pub fn step(&mut self) -> bool {
        match self.round() {
            Ok(_) => {
                self.error = None;
                true
            }
            Err(err) => self.fail(err),
        }
    }

    fn round(&mut self) -> Result<RoundOutcome, SimError> {
        if let Some(err) = &self.poisoned {
            return Err(err.clone());
        }
        if self.agents.iter().all(|a| a.halted) {
            return Err(SimError::Halted);
        }
        let mut outcome = RoundOutcome::Continue;
        for id in 0..self.agents.len() {
            if self.agents[id].halted {
                continue;
            }
            let pc = self.agents[id].regs.pc;
            let inst = execute::execute(
                &mut self.agents,
                id,
                self.program.instructions(),
                &mut self.bus,
            )
            .map_err(|err| err.with_source(self.program.source_line(pc).unwrap_or_default()))?;
            if self.config.general.trace_instructions {
                trace!(agent = id, pc, %inst, "retired");
            }
            self.stats.retire(id, inst.class());
            if inst == Instruction::Halt {
                debug!(agent = id, pc, "agent halted");
                outcome = RoundOutcome::Halted;
            }
        }
        self.stats.rounds += 1;
        Ok(outcome)
    }

    fn at_breakpoint(&self) -> bool {
        self.agents
            .iter()
            .any(|a| !a.halted && self.breakpoints.contains(&a.regs.pc))
    }

    /// Steps up to `n` rounds, stopping early after a round that leaves some running
    /// agent on a breakpoint or executes `HALT`.
    ///
    /// # Returns
    ///
    /// `false` only if a step failed; the error is kept and the rest of the budget dropped.
    pub fn run_amount(&mut self, n: u32) -> bool {
        if n == 0 {
            return true;
        }
        for _ in 0..n {
            match self.round() {
                Ok(RoundOutcome::Halted) => break,
                Ok(RoundOutcome::Continue) if self.at_breakpoint() => break,
                Ok(RoundOutcome::Continue) => {}
                Err(err) => return self.fail(err),
            }
        }
        self.error = None;
        true
    }

    /// Steps until a breakpoint is reached, `HALT` executes or a step fails.
    ///
    /// There is no loop detection; a program that never reaches either runs forever.
    pub fn run_to_break(&mut self) -> bool {
        loop {
            match self.round() {
                Ok(RoundOutcome::Halted) => break,
                Ok(RoundOutcome::Continue) if self.at_breakpoint() => break,
                Ok(RoundOutcome::Continue) => {}
                Err(err) => return self.fail(err),
            }
        }
        self.error = None;
        true
    }

    /// Sets a breakpoint on 0-based source `line`.
    ///
    /// # Returns
    ///
    /// `true` if the breakpoint was not already set.
    pub fn add_breakpoint(&mut self, line: usize) -> bool {
        self.breakpoints.insert(line)
    }

    /// Clears the breakpoint on `line`.
    ///
    /// # Returns
    ///
    /// `true` if there was one.
    pub fn remove_breakpoint(&mut self, line: usize) -> bool {
        self.breakpoints.remove(&line)
    }

    /// Clears every breakpoint.
    pub fn clear_breakpoints(&mut self) {
        self.breakpoints.clear();
    }

    /// Breakpoint lines, ascending.
    pub const fn breakpoints(&self) -> &BTreeSet<usize> {
        &self.breakpoints
    }

    /// Replaces the whole machine with a fresh one built from the same configuration:
    /// empty program, no breakpoints, no error.
    pub fn reset(&mut self) {
        *self = Self::new(self.config.clone());
        debug!(agents = self.agents.len(), "simulator reset");
    }

    /// Registers of agent 0, index `i` holding `xi`.
    pub fn registers(&self) -> [u32; NUM_REGS] {
        self.registers_of(0).unwrap_or([0; NUM_REGS])
    }

    /// Registers of `agent`, or `None` if there is no such agent.
    pub fn registers_of(&self, agent: usize) -> Option<[u32; NUM_REGS]> {
        self.agents.get(agent).map(|a| a.regs.snapshot())
    }

    /// Program counter of agent 0.
    pub fn pc(&self) -> usize {
        self.pc_of(0).unwrap_or(0)
    }

    /// Program counter of `agent`.
    pub fn pc_of(&self, agent: usize) -> Option<usize> {
        self.agents.get(agent).map(|a| a.regs.pc)
    }

    /// Register dump of `agent`, two registers per line.
    pub fn register_dump(&self, agent: usize) -> Option<String> {
        self.agents.get(agent).map(|a| a.regs.dump())
    }

    /// Whether `agent` has executed `HALT` since the last load or reset.
    pub fn is_halted(&self, agent: usize) -> bool {
        self.agents.get(agent).is_some_and(|a| a.halted)
    }

    /// Whether every agent has halted.
    pub fn all_halted(&self) -> bool {
        self.agents.iter().all(|a| a.halted)
    }

    /// Coherent memory as 128 words: each line from its dirty owner if any, else memory.
    pub fn memory(&self) -> [u32; MEM_WORDS] {
        let mut out = [0u32; MEM_WORDS];
        for line in LineAddr::all() {
            let start = line.index() * WORDS_PER_LINE;
            out[start..start + WORDS_PER_LINE]
                .copy_from_slice(&self.bus.coherent_line(&self.agents, line));
        }
        out
    }

    /// The memory image beneath the caches, ignoring dirty cached data.
    pub const fn backing_store(&self) -> &MemoryImage {
        self.bus.memory()
    }

    /// State of every line in every agent's cache.
    pub fn cache_states(&self) -> CacheStateTable {
        CacheStateTable(
            self.agents
                .iter()
                .map(|a| {
                    let mut row = [LineState::Invalid; NUM_LINES];
                    for copy in a.cache.lines() {
                        row[copy.line.index()] = copy.state;
                    }
                    row
                })
                .collect(),
        )
    }

    /// The most recent error, cleared by the next successful operation or a reset.
    pub const fn last_error(&self) -> Option<&SimError> {
        self.error.as_ref()
    }

    /// The most recent error as text; empty when there is none.
    pub fn error_message(&self) -> String {
        self.error.as_ref().map(ToString::to_string).unwrap_or_default()
    }

    /// Numeric code of the most recent error; 0 when there is none.
    pub fn error_code(&self) -> u32 {
        self.error.as_ref().map_or(0, |e| e.kind().code())
    }

    /// Whether a protocol violation has poisoned the simulator.
    pub const fn is_poisoned(&self) -> bool {
        self.poisoned.is_some()
    }

    /// Verifies the coherence invariant for every line.
    ///
    /// # Errors
    ///
    /// Returns the first [`SimError::ProtocolViolation`] found.
    pub fn check_coherence(&self) -> Result<(), SimError> {
        self.bus.verify_all(&self.agents)
    }

    /// Statistics collected since the last reset.
    pub fn stats(&self) -> SimStats {
        let mut stats = self.stats.clone();
        stats.bus = self.bus.stats;
        for (slot, agent) in stats.agents.iter_mut().zip(&self.agents) {
            slot.hits = agent.cache.hits;
            slot.misses = agent.cache.misses;
        }
        stats
    }

    /// The most recent bus transactions, oldest first.
    pub const fn trace(&self) -> &VecDeque<BusTransaction> {
        self.bus.trace()
    }
}
