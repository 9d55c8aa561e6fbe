use serde::{Deserialize, Serialize};

use crate::entities::SlotCategory;
use crate::ids::ItemId;

/// Item granted on dungeon completion, as summarised by the authority.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DroppedItem {
    #[serde(rename = "inventory_item_id")]
    pub item_id: ItemId,
    pub name: String,
    pub rarity: u8,
    pub level: u32,
    #[serde(default)]
    pub tier: Option<u32>,
    #[serde(rename = "slot_type", default)]
    pub slot_category: Option<SlotCategory>,
}

/// Reward payload delivered with a completion message.
///
/// Kept verbatim until the player acknowledges it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CompletionRewards {
    #[serde(rename = "experience_gained", default)]
    pub experience: i64,
    #[serde(rename = "gold_gained", default)]
    pub gold: i64,
    #[serde(rename = "total_experience_gained", default)]
    pub total_experience: Option<i64>,
    #[serde(rename = "total_gold_gained", default)]
    pub total_gold: Option<i64>,
    #[serde(rename = "item_dropped", default)]
    pub item: Option<DroppedItem>,
}
