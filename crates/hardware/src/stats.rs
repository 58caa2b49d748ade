//! Simulation statistics and coherence trace records.
//!
//! This module tracks what a run did to the machine. It provides:
//! 1. **Rounds and retirement:** Scheduling rounds and retired instructions.
//! 2. **Instruction mix:** Counts by class (ALU, load, store, branch, other).
//! 3. **Caches:** Per-agent hit and miss counts.
//! 4. **Bus:** Request counts, cache-to-cache transfers, write-backs and invalidations.
//! 5. **Trace:** One [`BusTransaction`] record per bus transaction, in global order.

use std::fmt::{self, Write as _};

use serde::Serialize;

use crate::common::addr::LineAddr;
use crate::core::units::cache::moesi::{BusRequest, LineState};
use crate::isa::InstClass;

/// Counters kept by the coherence bus.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct BusStats {
    /// Read fills.
    pub reads: u64,
    /// Write fills.
    pub read_exclusives: u64,
    /// Shared-to-Modified upgrades.
    pub upgrades: u64,
    /// Fills served by another agent's dirty copy instead of memory.
    pub cache_to_cache: u64,
    /// Dirty lines written to memory (evictions and snoop flushes).
    pub writebacks: u64,
    /// Remote copies invalidated.
    pub invalidations: u64,
}

impl BusStats {
    /// Counts one request of the given kind.
    pub const fn record(&mut self, request: BusRequest) {
        match request {
            BusRequest::Read => self.reads += 1,
            BusRequest::ReadExclusive => self.read_exclusives += 1,
            BusRequest::Upgrade => self.upgrades += 1,
        }
    }

    /// Total requests of every kind.
    pub const fn transactions(&self) -> u64 {
        self.reads + self.read_exclusives + self.upgrades
    }
}

/// Per-agent counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct AgentStats {
    /// Instructions this agent retired.
    pub retired: u64,
    /// Accesses served by the agent's cache without the bus.
    pub hits: u64,
    /// Accesses that needed a bus transaction.
    pub misses: u64,
}

/// Simulation statistics structure tracking all counters.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SimStats {
    /// Completed scheduling rounds (successful steps).
    pub rounds: u64,
    /// Number of instructions retired by all agents.
    pub instructions_retired: u64,

    /// Count of ALU instructions retired (register, immediate, moves).
    pub inst_alu: u64,
    /// Count of load instructions retired.
    pub inst_load: u64,
    /// Count of store instructions retired.
    pub inst_store: u64,
    /// Count of branch and jump instructions retired.
    pub inst_branch: u64,
    /// Count of everything else (NOP, HALT).
    pub inst_other: u64,

    /// Per-agent counters, indexed by agent id.
    pub agents: Vec<AgentStats>,
    /// Coherence bus counters.
    pub bus: BusStats,
}

impl SimStats {
    /// Creates zeroed statistics for `agents` agents.
    pub fn new(agents: usize) -> Self {
        Self {
            agents: vec![AgentStats::default(); agents],
            ..Self::default()
        }
    }

    /// Counts one retired instruction.
    ///
    /// # Arguments
    ///
    /// * `agent` - Id of the retiring agent.
    /// * `class` - Instruction class for the mix breakdown.
    pub fn retire(&mut self, agent: usize, class: InstClass) {
        self.instructions_retired += 1;
        match class {
            InstClass::Alu => self.inst_alu += 1,
            InstClass::Load => self.inst_load += 1,
            InstClass::Store => self.inst_store += 1,
            InstClass::Branch => self.inst_branch += 1,
            InstClass::Other => self.inst_other += 1,
        }
        if let Some(a) = self.agents.get_mut(agent) {
            a.retired += 1;
        }
    }
}

/// Section names for selective stats output.
///
/// Pass an empty slice to [`SimStats::render_sections`] to render all sections.
pub const STATS_SECTIONS: &[&str] = &["summary", "instruction_mix", "caches", "bus"];

#[allow(clippy::cast_precision_loss)]
fn percent(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        (part as f64 / whole as f64) * 100.0
    }
}

impl SimStats {
    /// Renders only the requested statistics sections.
    ///
    /// Each element of `sections` should be one of [`STATS_SECTIONS`]; unknown names
    /// are ignored.
    ///
    /// # Arguments
    ///
    /// * `sections` - Section names to render, or empty for all.
    pub fn render_sections(&self, sections: &[String]) -> String {
        let want = |s: &str| sections.is_empty() || sections.iter().any(|x| x == s);
        let total = self.instructions_retired;
        let mut out = String::new();
        let _ = writeln!(out, "==========================================================");
        let _ = writeln!(out, "MOESI COHERENCE SIMULATION STATISTICS");
        let _ = writeln!(out, "==========================================================");
        if want("summary") {
            let _ = writeln!(out, "sim_rounds               {}", self.rounds);
            let _ = writeln!(out, "sim_insts                {total}");
            let _ = writeln!(out, "sim_agents               {}", self.agents.len());
            let _ = writeln!(out, "----------------------------------------------------------");
        }
        if want("instruction_mix") {
            let _ = writeln!(out, "INSTRUCTION MIX");
            for (name, count) in [
                ("op.alu", self.inst_alu),
                ("op.load", self.inst_load),
                ("op.store", self.inst_store),
                ("op.branch", self.inst_branch),
                ("op.other", self.inst_other),
            ] {
                let _ = writeln!(
                    out,
                    "  {name:<22} {count} ({:.2}%)",
                    percent(count, total)
                );
            }
            let _ = writeln!(out, "----------------------------------------------------------");
        }
        if want("caches") {
            let _ = writeln!(out, "AGENT CACHES");
            for (id, a) in self.agents.iter().enumerate() {
                let accesses = a.hits + a.misses;
                let _ = writeln!(
                    out,
                    "  agent{id:<2} accesses: {accesses:<8} | hits: {:<8} | miss_rate: {:.2}%",
                    a.hits,
                    percent(a.misses, accesses)
                );
            }
            let _ = writeln!(out, "----------------------------------------------------------");
        }
        if want("bus") {
            let b = &self.bus;
            let _ = writeln!(out, "COHERENCE BUS");
            let _ = writeln!(out, "  bus.reads              {}", b.reads);
            let _ = writeln!(out, "  bus.read_exclusives    {}", b.read_exclusives);
            let _ = writeln!(out, "  bus.upgrades           {}", b.upgrades);
            let _ = writeln!(out, "  bus.cache_to_cache     {}", b.cache_to_cache);
            let _ = writeln!(out, "  bus.writebacks         {}", b.writebacks);
            let _ = writeln!(out, "  bus.invalidations      {}", b.invalidations);
        }
        let _ = writeln!(out, "==========================================================");
        out
    }
}

impl fmt::Display for SimStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render_sections(&[]))
    }
}

/// Kind of a recorded bus transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum TransactionKind {
    /// Read fill.
    Read,
    /// Write fill.
    ReadExclusive,
    /// Invalidate-only upgrade.
    Upgrade,
    /// Eviction of a dirty line.
    WriteBack,
}

impl From<BusRequest> for TransactionKind {
    fn from(request: BusRequest) -> Self {
        match request {
            BusRequest::Read => Self::Read,
            BusRequest::ReadExclusive => Self::ReadExclusive,
            BusRequest::Upgrade => Self::Upgrade,
        }
    }
}

/// Where a transaction's line data came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum DataSource {
    /// No data moved to the requester.
    None,
    /// The memory image.
    Memory,
    /// Another agent's dirty copy.
    Agent(usize),
}

/// One entry of the coherence trace.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BusTransaction {
    /// Position in the global transaction order (starts at 0, never reused).
    pub seq: u64,
    /// Requesting agent.
    pub agent: usize,
    /// What was requested.
    pub kind: TransactionKind,
    /// Line the transaction was about.
    pub line: LineAddr,
    /// Origin of the fill data.
    pub supplier: DataSource,
    /// Agents whose copy was invalidated, ascending.
    pub invalidated: Vec<usize>,
    /// Agents whose copy was downgraded (E→S, M→O), ascending.
    pub downgraded: Vec<usize>,
    /// Whether dirty data reached memory during the transaction.
    pub flushed: bool,
    /// Requester's state for the line afterwards.
    pub result: LineState,
}

impl fmt::Display for BusTransaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{:<4} agent{} {:?} {} -> {}",
            self.seq, self.agent, self.kind, self.line, self.result
        )?;
        match self.supplier {
            DataSource::None => {}
            DataSource::Memory => write!(f, " from mem")?,
            DataSource::Agent(a) => write!(f, " from agent{a}")?,
        }
        if !self.invalidated.is_empty() {
            write!(f, " inv{:?}", self.invalidated)?;
        }
        if !self.downgraded.is_empty() {
            write!(f, " down{:?}", self.downgraded)?;
        }
        if self.flushed {
            write!(f, " flush")?;
        }
        Ok(())
    }
}
