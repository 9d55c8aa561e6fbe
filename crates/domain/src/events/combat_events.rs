//! Combat session events
//!
//! Return types from `CombatSession` mutations, telling the caller what the
//! message or action actually did so it can schedule refreshes and advisories.

use crate::ids::DungeonId;
use crate::value_objects::CompletionRewards;

/// Outcome of a normal encounter tick message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// Session is active; the encounter view should be re-fetched
    RefreshNeeded,
    /// Session left `Blocked` and is active again; re-fetch as well
    Unblocked,
    /// Rewards are pending acknowledgement; ticks are frozen
    Frozen,
    /// No session to refresh
    Ignored,
}

impl TickOutcome {
    pub fn wants_refresh(&self) -> bool {
        matches!(self, Self::RefreshNeeded | Self::Unblocked)
    }
}

/// Outcome of a blocked message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockOutcome {
    Blocked { reason: String },
    /// Already blocked; the reason is refreshed but nothing else changes
    StillBlocked { reason: String },
    Ignored,
}

/// Outcome of a completion message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionOutcome {
    Completed { rewards: CompletionRewards },
    /// A completion was already recorded; the first payload is kept
    AlreadyCompleted,
    Ignored,
}

/// Outcome of reconciling with a freshly fetched encounter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecoveryOutcome {
    /// An encounter exists on the authority and the session adopted it
    Resumed { dungeon_id: DungeonId, level: u32 },
    /// No encounter on the authority; the session was cleared
    Cleared,
    /// Local state already agrees
    Unchanged,
}
