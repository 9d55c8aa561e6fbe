//! Application services
//!
//! One service per game area. Each talks to the authority through the
//! `AuthorityPort` and reads cached state through the shared `DomainFetcher`.

mod difficulty_service;
mod expedition_service;
mod loadout_service;
mod profile_service;
mod roster_service;
mod shop_service;

pub use difficulty_service::DifficultyService;
pub use expedition_service::{ExpeditionPlan, ExpeditionService};
pub use loadout_service::{LoadoutService, UpgradeCandidate};
pub use profile_service::ProfileService;
pub use roster_service::RosterService;
pub use shop_service::ShopService;
