//! ActiveEncounter - the authority's view of the running dungeon fight

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::ids::DungeonId;
use crate::value_objects::Pool;

/// Entries kept in the trailing combat log.
pub const ENCOUNTER_LOG_CAPACITY: usize = 20;

/// Status tag reported alongside the encounter snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EncounterStatus {
    #[default]
    None,
    Active,
    Blocked,
    Completed,
    Error,
}

/// Snapshot of an in-progress encounter.
///
/// Replaced wholesale on every fetch; the log is the only part that can grow
/// locally, and it never exceeds `ENCOUNTER_LOG_CAPACITY` entries.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveEncounter {
    dungeon_id: DungeonId,
    level: u32,
    opponent_name: String,
    opponent_health: Pool,
    player_health: Pool,
    player_energy: Pool,
    log: VecDeque<String>,
    status: EncounterStatus,
}

impl ActiveEncounter {
    pub fn new(dungeon_id: DungeonId, level: u32, opponent_name: impl Into<String>) -> Self {
        Self {
            dungeon_id,
            level,
            opponent_name: opponent_name.into(),
            opponent_health: Pool::default(),
            player_health: Pool::default(),
            player_energy: Pool::default(),
            log: VecDeque::with_capacity(ENCOUNTER_LOG_CAPACITY),
            status: EncounterStatus::Active,
        }
    }

    // Builder methods

    pub fn with_opponent_health(mut self, pool: Pool) -> Self {
        self.opponent_health = pool;
        self
    }

    pub fn with_player_health(mut self, pool: Pool) -> Self {
        self.player_health = pool;
        self
    }

    pub fn with_player_energy(mut self, pool: Pool) -> Self {
        self.player_energy = pool;
        self
    }

    pub fn with_status(mut self, status: EncounterStatus) -> Self {
        self.status = status;
        self
    }

    /// Seed the log, keeping only the newest entries.
    pub fn with_log(mut self, entries: impl IntoIterator<Item = String>) -> Self {
        for entry in entries {
            self.push_log(entry);
        }
        self
    }

    // Accessors

    pub fn dungeon_id(&self) -> DungeonId {
        self.dungeon_id
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn opponent_name(&self) -> &str {
        &self.opponent_name
    }

    pub fn opponent_health(&self) -> Pool {
        self.opponent_health
    }

    pub fn player_health(&self) -> Pool {
        self.player_health
    }

    pub fn player_energy(&self) -> Pool {
        self.player_energy
    }

    pub fn status(&self) -> EncounterStatus {
        self.status
    }

    /// Log entries, oldest first.
    pub fn log(&self) -> impl Iterator<Item = &str> {
        self.log.iter().map(String::as_str)
    }

    pub fn log_len(&self) -> usize {
        self.log.len()
    }

    /// Append an entry, dropping the oldest when full. Returns the dropped entry.
    pub fn push_log(&mut self, entry: impl Into<String>) -> Option<String> {
        let dropped = if self.log.len() == ENCOUNTER_LOG_CAPACITY {
            self.log.pop_front()
        } else {
            None
        };
        self.log.push_back(entry.into());
        dropped
    }
}
