use serde::{Deserialize, Serialize};

use delver_domain::{DomainError, Loadout};

use super::inventory::{loadout_from, InventoryItemData};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MainCharacterData {
    #[serde(default)]
    pub name: Option<String>,
    pub level: u32,
    #[serde(default)]
    pub energy: i64,
    #[serde(default)]
    pub max_energy: i64,
    #[serde(default)]
    pub current_hp: Option<i64>,
    #[serde(default)]
    pub max_hp: Option<i64>,
    #[serde(default, rename = "class")]
    pub class_id: Option<i64>,
    #[serde(default)]
    pub race: Option<i64>,
    #[serde(default)]
    pub equipment: Vec<InventoryItemData>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileData {
    #[serde(default)]
    pub act: u32,
    #[serde(default)]
    pub gold: i64,
    /// Absent until the player has created a character
    #[serde(default)]
    pub main_waifu: Option<MainCharacterData>,
}

impl ProfileData {
    pub fn has_character(&self) -> bool {
        self.main_waifu.is_some()
    }

    /// Equipped items as a loadout; empty without a character.
    pub fn loadout(&self) -> Result<Loadout, DomainError> {
        match &self.main_waifu {
            Some(character) => loadout_from(&character.equipment),
            None => Ok(Loadout::empty()),
        }
    }
}
