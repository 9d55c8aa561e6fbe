//! Aggregate roots - domain objects that own their related data
//!
//! Each aggregate keeps its fields private, exposes behavior through methods
//! and returns outcome enums from mutations (see `events`).

pub mod combat_session;
pub mod encounter;
pub mod loadout;

pub use combat_session::{CombatSession, SessionPhase, SessionState};
pub use encounter::{ActiveEncounter, EncounterStatus, ENCOUNTER_LOG_CAPACITY};
pub use loadout::Loadout;
