//! Wire-format DTOs for authority responses
//!
//! Field names follow the authority's JSON. Conversions into domain types live
//! next to each DTO and fail with `DomainError` when the data breaks a domain
//! invariant.

mod difficulty;
mod encounter;
mod expedition;
mod inventory;
mod profile;
mod roster;
mod shop;

pub use difficulty::{DifficultyStatusData, DungeonPlusData};
pub use encounter::EncounterData;
pub use expedition::{
    ActiveExpeditionData, ActiveExpeditionsData, ExpeditionRewardData, ExpeditionSlotData,
    ExpeditionSlotsData, ExpeditionsData,
};
pub use inventory::{loadout_from, AffixData, InventoryData, InventoryItemData};
pub use profile::{MainCharacterData, ProfileData};
pub use roster::{HireCandidateData, RosterData};
pub use shop::{GambleData, PurchaseData, SaleData, ShopData, ShopOfferData};
