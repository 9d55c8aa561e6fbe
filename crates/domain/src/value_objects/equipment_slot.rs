//! Equipment slot value object
//!
//! Six fixed slots. Indices 1-2 form the weapon pair, 4-5 the ring pair,
//! 3 (armor) and 6 (amulet) are singletons.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum EquipmentSlot {
    Weapon1,
    Weapon2,
    Armor,
    Ring1,
    Ring2,
    Amulet,
}

impl EquipmentSlot {
    /// All slots in ascending index order.
    pub const ALL: [EquipmentSlot; 6] = [
        EquipmentSlot::Weapon1,
        EquipmentSlot::Weapon2,
        EquipmentSlot::Armor,
        EquipmentSlot::Ring1,
        EquipmentSlot::Ring2,
        EquipmentSlot::Amulet,
    ];

    pub const WEAPON_PAIR: [EquipmentSlot; 2] = [EquipmentSlot::Weapon1, EquipmentSlot::Weapon2];
    pub const RING_PAIR: [EquipmentSlot; 2] = [EquipmentSlot::Ring1, EquipmentSlot::Ring2];

    /// Wire index (1-6).
    pub fn index(self) -> u8 {
        match self {
            Self::Weapon1 => 1,
            Self::Weapon2 => 2,
            Self::Armor => 3,
            Self::Ring1 => 4,
            Self::Ring2 => 5,
            Self::Amulet => 6,
        }
    }

    pub fn from_index(index: u8) -> Result<Self, DomainError> {
        match index {
            1 => Ok(Self::Weapon1),
            2 => Ok(Self::Weapon2),
            3 => Ok(Self::Armor),
            4 => Ok(Self::Ring1),
            5 => Ok(Self::Ring2),
            6 => Ok(Self::Amulet),
            other => Err(DomainError::UnknownSlot(other)),
        }
    }

    /// Profile key used by the authority's equipment listing.
    pub fn key(self) -> &'static str {
        match self {
            Self::Weapon1 => "weapon_1",
            Self::Weapon2 => "weapon_2",
            Self::Armor => "costume",
            Self::Ring1 => "ring_1",
            Self::Ring2 => "ring_2",
            Self::Amulet => "amulet",
        }
    }

    /// The other half of a paired slot, if this slot is paired.
    pub fn partner(self) -> Option<Self> {
        match self {
            Self::Weapon1 => Some(Self::Weapon2),
            Self::Weapon2 => Some(Self::Weapon1),
            Self::Ring1 => Some(Self::Ring2),
            Self::Ring2 => Some(Self::Ring1),
            Self::Armor | Self::Amulet => None,
        }
    }

    pub fn is_weapon_pair(self) -> bool {
        matches!(self, Self::Weapon1 | Self::Weapon2)
    }
}

impl fmt::Display for EquipmentSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (slot {})", self.key(), self.index())
    }
}

impl FromStr for EquipmentSlot {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "weapon_1" => Ok(Self::Weapon1),
            "weapon_2" => Ok(Self::Weapon2),
            "costume" | "armor" => Ok(Self::Armor),
            "ring_1" => Ok(Self::Ring1),
            "ring_2" => Ok(Self::Ring2),
            "amulet" => Ok(Self::Amulet),
            other => other
                .parse::<u8>()
                .map_err(|_| DomainError::validation(format!("Unknown equipment slot: {}", s)))
                .and_then(Self::from_index),
        }
    }
}

impl TryFrom<u8> for EquipmentSlot {
    type Error = DomainError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::from_index(value)
    }
}

impl From<EquipmentSlot> for u8 {
    fn from(value: EquipmentSlot) -> Self {
        value.index()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indices_are_one_based_and_ordered() {
        let indices: Vec<u8> = EquipmentSlot::ALL.iter().map(|s| s.index()).collect();
        assert_eq!(indices, vec![1, 2, 3, 4, 5, 6]);
        assert!(EquipmentSlot::Weapon1 < EquipmentSlot::Amulet);
    }

    #[test]
    fn zero_and_seven_are_rejected() {
        assert_eq!(EquipmentSlot::from_index(0), Err(DomainError::UnknownSlot(0)));
        assert_eq!(EquipmentSlot::from_index(7), Err(DomainError::UnknownSlot(7)));
    }

    #[test]
    fn partners_are_symmetric() {
        assert_eq!(EquipmentSlot::Ring1.partner(), Some(EquipmentSlot::Ring2));
        assert_eq!(EquipmentSlot::Weapon2.partner(), Some(EquipmentSlot::Weapon1));
        assert_eq!(EquipmentSlot::Armor.partner(), None);
    }

    #[test]
    fn parses_profile_keys_and_indices() {
        assert_eq!("costume".parse::<EquipmentSlot>(), Ok(EquipmentSlot::Armor));
        assert_eq!("RING_2".parse::<EquipmentSlot>(), Ok(EquipmentSlot::Ring2));
        assert_eq!("6".parse::<EquipmentSlot>(), Ok(EquipmentSlot::Amulet));
        assert!("belt".parse::<EquipmentSlot>().is_err());
    }

    #[test]
    fn serializes_as_index() {
        let json = serde_json::to_string(&EquipmentSlot::Ring1).unwrap();
        assert_eq!(json, "4");
        let back: EquipmentSlot = serde_json::from_str("2").unwrap();
        assert_eq!(back, EquipmentSlot::Weapon2);
        assert!(serde_json::from_str::<EquipmentSlot>("9").is_err());
    }
}
