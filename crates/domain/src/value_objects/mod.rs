//! Value objects for the loadout and encounter model

mod equipment_slot;
mod health;
mod rarity;
mod rewards;

pub use equipment_slot::EquipmentSlot;
pub use health::Pool;
pub use rarity::Rarity;
pub use rewards::{CompletionRewards, DroppedItem};
