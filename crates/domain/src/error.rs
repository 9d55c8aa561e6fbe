//! Unified error types for the domain layer
//!
//! Provides a common error type for loadout, ladder and encounter operations,
//! so callers never have to fall back to String or anyhow.

use thiserror::Error;

use crate::entities::SlotCategory;
use crate::value_objects::EquipmentSlot;

/// Unified error type for domain operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Validation failed (e.g., invalid field values)
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Item cannot be placed into the requested slot
    #[error("{category} cannot be equipped in {slot}")]
    IncompatibleSlot {
        category: SlotCategory,
        slot: EquipmentSlot,
    },

    /// Slot index outside the six fixed equipment slots
    #[error("Unknown equipment slot index: {0}")]
    UnknownSlot(u8),

    /// Loadout data breaks the one-item-per-slot / two-handed pairing rules
    #[error("Inconsistent loadout: {0}")]
    InconsistentLoadout(String),

    /// State transition not allowed
    #[error("Invalid state transition: {0}")]
    InvalidStateTransition(String),
}

impl DomainError {
    /// Creates a validation error for business rule violations.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create an inconsistent loadout error
    pub fn inconsistent_loadout(msg: impl Into<String>) -> Self {
        Self::InconsistentLoadout(msg.into())
    }

    /// Create an invalid state transition error
    pub fn invalid_state_transition(msg: impl Into<String>) -> Self {
        Self::InvalidStateTransition(msg.into())
    }
}
