use serde::{Deserialize, Serialize};
use serde_json::json;

use super::Route;

/// Largest page `/inventory` serves.
pub const INVENTORY_PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum InventoryRequest {
    /// One page of the listing, equipped and unequipped items alike
    GetInventory { offset: u32, limit: u32 },
    Sell { item_ids: Vec<i64> },
    /// `slot` is the equipment slot index (1-6)
    Equip { item_id: i64, slot: u8 },
    Unequip { slot: u8 },
}

impl InventoryRequest {
    pub fn page(offset: u32) -> Self {
        Self::GetInventory {
            offset,
            limit: INVENTORY_PAGE_SIZE,
        }
    }


    pub fn route(&self) -> Route {
        match self {
            Self::GetInventory { offset, limit } => Route::get("/inventory")
                .query("limit", limit)
                .query("offset", offset),
            Self::Sell { item_ids } => {
                Route::post("/inventory/sell").body(json!({ "inventory_item_ids": item_ids }))
            }
            Self::Equip { item_id, slot } => {
                Route::post(format!("/inventory/{}/equip", item_id)).body(json!({ "slot": slot }))
            }
            Self::Unequip { slot } => Route::post("/inventory/unequip").body(json!({ "slot": slot })),
        }
    }
}
