//! MOESI Line State Machine.
//!
//! This module is the coherence protocol itself, expressed as data plus two pure
//! dispatch functions keyed by (state, event):
//!
//! | Current | LocalRead        | LocalWrite         | RemoteRead          | RemoteWrite             |
//! |---------|------------------|--------------------|---------------------|-------------------------|
//! | I       | Read fill, S/E   | ReadExclusive, M   | I                   | I                       |
//! | S       | S                | Upgrade, M         | S                   | I                       |
//! | E       | E                | M (silent)         | S                   | I                       |
//! | O       | O                | Upgrade, M         | O, supplies data    | I, supplies and flushes |
//! | M       | M                | M                  | O, supplies data    | I, supplies and flushes |
//!
//! Nothing here touches cache storage; [`AgentCache`](super::AgentCache) applies the
//! outcomes and the coherence bus decides fill states.

use std::fmt;

use serde::Serialize;

/// Coherence state of one cached line.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
pub enum LineState {
    /// Dirty and exclusive; memory is stale.
    Modified,
    /// Dirty and possibly shared; this copy is responsible for the write-back.
    Owned,
    /// Clean and exclusive; equal to memory.
    Exclusive,
    /// Clean with respect to the owner; other copies may exist.
    Shared,
    /// Not present.
    #[default]
    Invalid,
}

/// Access issued by the agent that owns the cache.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LocalEvent {
    /// Load.
    Read,
    /// Store.
    Write,
}

/// Event delivered by the bus on behalf of another agent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum SnoopEvent {
    /// Another agent is filling the line for reading.
    RemoteRead,
    /// Another agent wants the line exclusively for writing.
    RemoteWrite,
}

/// Bus transaction a local access needs before it can complete.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum BusRequest {
    /// Read miss: fetch the line, others downgrade.
    Read,
    /// Write miss: fetch the line and invalidate every other copy.
    ReadExclusive,
    /// Write hit on a shared copy: invalidate every other copy, no data needed.
    Upgrade,
}

/// Result of a local access against the current line state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LocalOutcome {
    /// Completes in the cache; the line moves to the given state.
    Hit(LineState),
    /// Needs the given bus transaction first.
    Bus(BusRequest),
}

/// Result of a snooped remote event against the current line state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SnoopOutcome {
    /// State after the event.
    pub next: LineState,
    /// This copy must supply the line data to the requester.
    pub supply: bool,
    /// This copy must write its dirty data back to memory.
    pub flush: bool,
}

impl LineState {
    /// Every state, most to least privileged.
    pub const ALL: [Self; 5] = [
        Self::Modified,
        Self::Owned,
        Self::Exclusive,
        Self::Shared,
        Self::Invalid,
    ];

    /// Returns true unless the line is Invalid.
    #[inline]
    pub const fn is_valid(self) -> bool {
        !matches!(self, Self::Invalid)
    }

    /// Returns true if this copy is newer than memory (Modified or Owned).
    #[inline]
    pub const fn is_dirty(self) -> bool {
        matches!(self, Self::Modified | Self::Owned)
    }

    /// Returns true if no other agent may hold a valid copy (Modified or Exclusive).
    #[inline]
    pub const fn is_exclusive(self) -> bool {
        matches!(self, Self::Modified | Self::Exclusive)
    }

    /// One-letter protocol name.
    pub const fn letter(self) -> char {
        match self {
            Self::Modified => 'M',
            Self::Owned => 'O',
            Self::Exclusive => 'E',
            Self::Shared => 'S',
            Self::Invalid => 'I',
        }
    }

    /// Stable numeric code used across the foreign-function boundary.
    pub const fn code(self) -> u8 {
        match self {
            Self::Invalid => 0,
            Self::Shared => 1,
            Self::Exclusive => 2,
            Self::Owned => 3,
            Self::Modified => 4,
        }
    }

    /// Transition for an access by the owning agent.
    pub const fn on_local(self, event: LocalEvent) -> LocalOutcome {
        match (self, event) {
            (Self::Invalid, LocalEvent::Read) => LocalOutcome::Bus(BusRequest::Read),
            (Self::Invalid, LocalEvent::Write) => LocalOutcome::Bus(BusRequest::ReadExclusive),
            (Self::Shared | Self::Owned, LocalEvent::Write) => LocalOutcome::Bus(BusRequest::Upgrade),
            (Self::Exclusive | Self::Modified, LocalEvent::Write) => {
                LocalOutcome::Hit(Self::Modified)
            }
            (state, LocalEvent::Read) => LocalOutcome::Hit(state),
        }
    }

    /// Transition for an event snooped from the bus.
    pub const fn on_snoop(self, event: SnoopEvent) -> SnoopOutcome {
        let (next, supply, flush) = match (self, event) {
            (Self::Invalid, _) => (Self::Invalid, false, false),
            (Self::Shared | Self::Exclusive, SnoopEvent::RemoteRead) => (Self::Shared, false, false),
            (Self::Owned | Self::Modified, SnoopEvent::RemoteRead) => (Self::Owned, true, false),
            (Self::Shared | Self::Exclusive, SnoopEvent::RemoteWrite) => {
                (Self::Invalid, false, false)
            }
            (Self::Owned | Self::Modified, SnoopEvent::RemoteWrite) => (Self::Invalid, true, true),
        };
        SnoopOutcome { next, supply, flush }
    }
}

impl fmt::Display for LineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

impl BusRequest {
    /// Remote event the request broadcasts to every other agent.
    pub const fn snoop_event(self) -> SnoopEvent {
        match self {
            Self::Read => SnoopEvent::RemoteRead,
            Self::ReadExclusive | Self::Upgrade => SnoopEvent::RemoteWrite,
        }
    }

    /// State the requester's line ends in.
    ///
    /// # Arguments
    ///
    /// * `shared` - Whether another agent held a valid copy when the request was snooped.
    pub const fn fill_state(self, shared: bool) -> LineState {
        match self {
            Self::Read if shared => LineState::Shared,
            Self::Read => LineState::Exclusive,
            Self::ReadExclusive | Self::Upgrade => LineState::Modified,
        }
    }

    /// Returns true if the requester needs line data from the bus.
    pub const fn needs_data(self) -> bool {
        !matches!(self, Self::Upgrade)
    }
}

/// Checks the single-writer/multiple-reader invariant for one line.
///
/// Exactly one of these must hold: nobody caches the line; one agent holds it in
/// M or E and nobody else holds a valid copy; one agent holds it in O and the rest
/// are S or I; every valid copy is S.
///
/// # Arguments
///
/// * `states` - The line's state in every agent's cache.
///
/// # Returns
///
/// A description of the breach, if any.
pub fn check_states(states: impl IntoIterator<Item = LineState>) -> Result<(), String> {
    let (mut exclusive, mut owned, mut shared) = (0usize, 0usize, 0usize);
    for state in states {
        match state {
            LineState::Modified | LineState::Exclusive => exclusive += 1,
            LineState::Owned => owned += 1,
            LineState::Shared => shared += 1,
            LineState::Invalid => {}
        }
    }
    if exclusive > 1 {
        return Err(format!("{exclusive} agents hold the line in M/E"));
    }
    if exclusive == 1 && (owned + shared) > 0 {
        return Err(format!(
            "an M/E copy coexists with {owned} O and {shared} S copies"
        ));
    }
    if owned > 1 {
        return Err(format!("{owned} agents hold the line in O"));
    }
    Ok(())
}
