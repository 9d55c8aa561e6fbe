//! Difficulty ladder gating
//!
//! Two sources of truth disagree on purpose: the level picker is built from the
//! highest level unlocked in *any* dungeon, while entry is checked against the
//! chosen dungeon's own unlocked level. A level can therefore be offered and
//! still be refused; `EntryRejection::LevelLocked` carries both numbers so the
//! caller can say why.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ids::DungeonId;

/// Per-dungeon ladder progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DungeonUnlock {
    /// Highest enterable plus-level; 0 means base difficulty only.
    pub unlocked_level: u32,
    /// Highest plus-level cleared, if any.
    pub best_completed_level: Option<u32>,
}

/// Session-wide difficulty unlock status.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DifficultyUnlocks {
    ladder_visible: bool,
    dungeons: BTreeMap<DungeonId, DungeonUnlock>,
}

impl DifficultyUnlocks {
    pub fn new(ladder_visible: bool) -> Self {
        Self {
            ladder_visible,
            dungeons: BTreeMap::new(),
        }
    }

    pub fn with_dungeon(mut self, dungeon_id: DungeonId, unlock: DungeonUnlock) -> Self {
        self.dungeons.insert(dungeon_id, unlock);
        self
    }

    pub fn ladder_visible(&self) -> bool {
        self.ladder_visible
    }

    /// Unlocked level for a dungeon; unknown dungeons are at base difficulty.
    pub fn unlocked_level(&self, dungeon_id: DungeonId) -> u32 {
        self.dungeons
            .get(&dungeon_id)
            .map(|d| d.unlocked_level)
            .unwrap_or(0)
    }

    pub fn dungeon(&self, dungeon_id: DungeonId) -> Option<&DungeonUnlock> {
        self.dungeons.get(&dungeon_id)
    }

    pub fn max_unlocked_level(&self) -> u32 {
        self.dungeons
            .values()
            .map(|d| d.unlocked_level)
            .max()
            .unwrap_or(0)
    }
}

/// Why a (dungeon, level) pair cannot be entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EntryRejection {
    #[error("the difficulty ladder is not unlocked yet")]
    LadderLocked,
    #[error("difficulty level {requested} is locked; this dungeon is unlocked up to {unlocked}")]
    LevelLocked { requested: u32, unlocked: u32 },
}

/// Read-only view over `DifficultyUnlocks` answering what may be selected.
#[derive(Debug, Clone, Copy)]
pub struct ProgressionGate<'a> {
    unlocks: &'a DifficultyUnlocks,
}

impl<'a> ProgressionGate<'a> {
    pub fn new(unlocks: &'a DifficultyUnlocks) -> Self {
        Self { unlocks }
    }

    /// Levels offered by the picker, ascending.
    ///
    /// `[0]` while the ladder is hidden. Once visible the picker always offers
    /// at least level 1, even before any dungeon has unlocked it.
    pub fn selectable_levels(&self) -> Vec<u32> {
        if !self.unlocks.ladder_visible() {
            return vec![0];
        }
        let top = self.unlocks.max_unlocked_level().max(1);
        (0..=top).collect()
    }

    pub fn can_enter(&self, dungeon_id: DungeonId, level: u32) -> Result<(), EntryRejection> {
        if level == 0 {
            return Ok(());
        }
        if !self.unlocks.ladder_visible() {
            return Err(EntryRejection::LadderLocked);
        }
        let unlocked = self.unlocks.unlocked_level(dungeon_id);
        if level > unlocked {
            return Err(EntryRejection::LevelLocked {
                requested: level,
                unlocked,
            });
        }
        Ok(())
    }
}
