//! Delver domain - items, loadouts, the difficulty ladder and the encounter
//! state machine.
//!
//! Pure and synchronous: no runtime, transport or clock lives here. The
//! `xtask arch-check` command keeps it that way.

pub mod aggregates;
pub mod entities;
pub mod error;
pub mod events;
pub mod ids;
pub mod progression;
pub mod slot_resolver;
pub mod value_objects;

pub use aggregates::{
    ActiveEncounter, CombatSession, EncounterStatus, Loadout, SessionPhase, SessionState,
    ENCOUNTER_LOG_CAPACITY,
};
pub use entities::{Affix, AffixKind, Item, SlotCategory, WeaponProfile};
pub use error::DomainError;
pub use events::{BlockOutcome, CompletionOutcome, RecoveryOutcome, TickOutcome};
pub use ids::{DungeonId, ExpeditionId, HireId, ItemId, PlayerId};
pub use progression::{DifficultyUnlocks, DungeonUnlock, EntryRejection, ProgressionGate};
pub use slot_resolver::{CompatibleSlots, EquipOutcome, UnequipOutcome};
pub use value_objects::{CompletionRewards, DroppedItem, EquipmentSlot, Pool, Rarity};
