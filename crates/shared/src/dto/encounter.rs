use serde::{Deserialize, Serialize};

use delver_domain::{ActiveEncounter, DungeonId, EncounterStatus, Pool};

/// Body of `/dungeons/active` (the authority sends `null` when idle).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncounterData {
    pub dungeon_id: i64,
    #[serde(default)]
    pub dungeon_name: Option<String>,
    #[serde(default)]
    pub plus_level: u32,
    #[serde(default)]
    pub current_monster: Option<String>,
    #[serde(default)]
    pub monster_hp: Option<i64>,
    #[serde(default)]
    pub monster_max_hp: Option<i64>,
    #[serde(default)]
    pub player_hp: Option<i64>,
    #[serde(default)]
    pub player_max_hp: Option<i64>,
    #[serde(default)]
    pub energy: Option<i64>,
    #[serde(default)]
    pub max_energy: Option<i64>,
    #[serde(default)]
    pub log: Vec<String>,
    #[serde(default)]
    pub status: Option<String>,
}

fn pool(current: Option<i64>, max: Option<i64>) -> Pool {
    let max = max.or(current).unwrap_or(0);
    Pool::new(current.unwrap_or(max), max)
}

impl EncounterData {
    pub fn to_encounter(&self) -> ActiveEncounter {
        ActiveEncounter::new(
            DungeonId::new(self.dungeon_id),
            self.plus_level,
            self.current_monster.clone().unwrap_or_default(),
        )
        .with_opponent_health(pool(self.monster_hp, self.monster_max_hp))
        .with_player_health(pool(self.player_hp, self.player_max_hp))
        .with_player_energy(pool(self.energy, self.max_energy))
        .with_log(self.log.iter().cloned())
        .with_status(self.status())
    }

    /// Status tag; missing or unrecognised values read as active.
    pub fn status(&self) -> EncounterStatus {
        match self.status.as_deref() {
            Some("blocked") => EncounterStatus::Blocked,
            Some("completed") => EncounterStatus::Completed,
            Some("error") => EncounterStatus::Error,
            Some("none") => EncounterStatus::None,
            _ => EncounterStatus::Active,
        }
    }
}
