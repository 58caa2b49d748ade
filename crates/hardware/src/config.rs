//! Configuration system for the coherence simulator.
//!
//! This module defines the configuration structures used to parameterize a
//! simulation. It provides:
//! 1. **Defaults:** Baseline machine constants (agent count, cache slots, trace depth).
//! 2. **Structures:** Hierarchical config for general, system, and cache settings.
//! 3. **Validation:** Range checks reported as [`ConfigError`] values.
//!
//! Configuration is supplied as JSON (from the browser boundary or `--config` on the
//! command line), or use `Config::default()` for the single-agent machine.

use serde::Deserialize;
use thiserror::Error;

use crate::common::constants::{MAX_AGENTS, MAX_CACHE_LINES};

/// Default configuration constants for the simulator.
mod defaults {
    /// Number of agents (one reproduces the single-core machine).
    pub const AGENTS: usize = 1;

    /// Line slots per agent cache.
    pub const CACHE_LINES: usize = 4;

    /// Coherence trace ring depth.
    pub const TRACE_CAPACITY: usize = 256;
}

/// Cache replacement policy algorithms.
///
/// Specifies the algorithm used to select which line to evict when a fill finds
/// every slot of the agent's cache occupied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ReplacementPolicy {
    /// Least Recently Used replacement policy.
    ///
    /// Evicts the line that was accessed least recently.
    #[default]
    #[serde(alias = "Lru")]
    Lru,
    /// First In First Out replacement policy.
    ///
    /// Evicts the line that was filled longest ago.
    #[serde(alias = "Fifo")]
    Fifo,
}

/// Errors raised while reading or validating a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The text is not valid JSON for [`Config`].
    #[error("malformed configuration: {0}")]
    Parse(#[from] serde_json::Error),

    /// A numeric setting is outside its allowed range.
    #[error("{field} = {value} is out of range (expected {min}..={max})")]
    OutOfRange {
        /// Dotted path of the offending field.
        field: &'static str,
        /// Value found.
        value: usize,
        /// Smallest allowed value.
        min: usize,
        /// Largest allowed value.
        max: usize,
    },
}

/// Root configuration structure containing all simulator settings.
///
/// # Examples
///
/// Creating a default configuration:
///
/// ```
/// use moesim_core::config::Config;
///
/// let config = Config::default();
/// assert_eq!(config.system.agents, 1);
/// assert_eq!(config.cache.lines, 4);
/// ```
///
/// Deserializing from JSON:
///
/// ```
/// use moesim_core::config::{Config, ReplacementPolicy};
///
/// let json = r#"{
///     "general": { "trace_instructions": true, "trace_capacity": 64 },
///     "system": { "agents": 4 },
///     "cache": { "lines": 2, "policy": "Fifo" }
/// }"#;
///
/// let config = Config::from_json(json).unwrap();
/// assert_eq!(config.system.agents, 4);
/// assert_eq!(config.cache.policy, ReplacementPolicy::Fifo);
/// assert_eq!(config.general.trace_capacity, 64);
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// General simulation settings
    #[serde(default)]
    pub general: GeneralConfig,
    /// Machine shape
    #[serde(default)]
    pub system: SystemConfig,
    /// Per-agent cache configuration
    #[serde(default)]
    pub cache: CacheConfig,
}

impl Config {
    /// Parses and validates a JSON configuration.
    ///
    /// Missing sections and fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed JSON and
    /// [`ConfigError::OutOfRange`] for values the machine cannot model.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks every numeric setting against the machine limits.
    ///
    /// # Errors
    ///
    /// Returns the first out-of-range field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check("system.agents", self.system.agents, 1, MAX_AGENTS)?;
        check("cache.lines", self.cache.lines, 1, MAX_CACHE_LINES)?;
        Ok(())
    }
}

fn check(field: &'static str, value: usize, min: usize, max: usize) -> Result<(), ConfigError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            value,
            min,
            max,
        })
    }
}

/// General simulation settings and options.
#[derive(Debug, Clone, Deserialize)]
pub struct GeneralConfig {
    /// Log every retired instruction at `trace` level
    #[serde(default)]
    pub trace_instructions: bool,

    /// Bus transactions kept in the coherence trace; 0 disables the trace
    #[serde(default = "GeneralConfig::default_trace_capacity")]
    pub trace_capacity: usize,
}

impl GeneralConfig {
    /// Returns the default coherence trace depth.
    fn default_trace_capacity() -> usize {
        defaults::TRACE_CAPACITY
    }
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            trace_instructions: false,
            trace_capacity: defaults::TRACE_CAPACITY,
        }
    }
}

/// Shape of the simulated machine.
#[derive(Debug, Clone, Deserialize)]
pub struct SystemConfig {
    /// Number of agents sharing memory through the coherence bus
    #[serde(default = "SystemConfig::default_agents")]
    pub agents: usize,
}

impl SystemConfig {
    /// Returns the default agent count.
    fn default_agents() -> usize {
        defaults::AGENTS
    }
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            agents: defaults::AGENTS,
        }
    }
}

/// Configuration of each agent's private cache.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Line slots per cache (fully associative)
    #[serde(default = "CacheConfig::default_lines")]
    pub lines: usize,

    /// Victim selection when every slot is occupied
    #[serde(default)]
    pub policy: ReplacementPolicy,
}

impl CacheConfig {
    /// Returns the default slot count.
    fn default_lines() -> usize {
        defaults::CACHE_LINES
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            lines: defaults::CACHE_LINES,
            policy: ReplacementPolicy::default(),
        }
    }
}
