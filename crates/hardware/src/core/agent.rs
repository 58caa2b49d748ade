//! Agent context: one logical core.

use crate::common::reg::RegisterFile;
use crate::config::CacheConfig;
use crate::core::units::cache::AgentCache;

/// One agent: register file, private cache and run state.
///
/// Agents never reach into each other; the only cross-agent path is the
/// coherence bus delivering snoop events to [`Agent::cache`].
#[derive(Debug)]
pub struct Agent {
    /// Agent id, also its index in the simulator and its snoop order.
    pub id: usize,
    /// General-purpose registers and program counter.
    pub regs: RegisterFile,
    /// Private MOESI cache.
    pub cache: AgentCache,
    /// Set by `HALT`; a halted agent is skipped by the scheduler.
    pub halted: bool,
}

impl Agent {
    /// Creates a zeroed agent with an all-Invalid cache.
    pub fn new(id: usize, cache: &CacheConfig) -> Self {
        Self {
            id,
            regs: RegisterFile::new(),
            cache: AgentCache::new(cache),
            halted: false,
        }
    }
}
