//! Delver player client.
//!
//! Keeps a local cache of the player's game state consistent with the
//! authority: equipment placement, per-domain snapshots, the combat session
//! and the push-channel reconciler that drives it.

pub mod application;
pub mod infrastructure;
pub mod ports;
pub mod runner;
