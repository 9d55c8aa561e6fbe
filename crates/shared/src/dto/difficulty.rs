use serde::{Deserialize, Serialize};

use delver_domain::{DifficultyUnlocks, DungeonId, DungeonUnlock};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DungeonPlusData {
    pub dungeon_id: i64,
    #[serde(default)]
    pub unlocked_plus_level: u32,
    #[serde(default)]
    pub best_completed_plus_level: Option<u32>,
}

/// Body of `/dungeons/plus/status`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DifficultyStatusData {
    /// Whether the plus ladder is visible at all
    #[serde(default)]
    pub plus_unlocked: bool,
    #[serde(default)]
    pub dungeons: Vec<DungeonPlusData>,
}

impl DifficultyStatusData {
    pub fn to_unlocks(&self) -> DifficultyUnlocks {
        self.dungeons
            .iter()
            .fold(DifficultyUnlocks::new(self.plus_unlocked), |acc, d| {
                acc.with_dungeon(
                    DungeonId::new(d.dungeon_id),
                    DungeonUnlock {
                        unlocked_level: d.unlocked_plus_level,
                        best_completed_level: d.best_completed_plus_level,
                    },
                )
            })
    }
}
