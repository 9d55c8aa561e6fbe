//! Item entity - a piece of equipment owned by the player
//!
//! Items are immutable once received from the authority. A changed item is a
//! new value that replaces the old one wholesale; nothing here patches fields.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::ids::ItemId;
use crate::value_objects::Rarity;

/// Which class of equipment an item belongs to.
///
/// Decides the equipment slots the item may occupy (see `slot_resolver`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotCategory {
    #[serde(rename = "weapon_1h")]
    OneHandedWeapon,
    #[serde(rename = "weapon_2h")]
    TwoHandedWeapon,
    #[serde(rename = "offhand")]
    OffHand,
    #[serde(rename = "costume", alias = "armor")]
    Armor,
    Ring,
    Amulet,
    /// Unrecognised wire value; compatible with no slot.
    #[serde(other)]
    Unknown,
}

impl SlotCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OneHandedWeapon => "weapon_1h",
            Self::TwoHandedWeapon => "weapon_2h",
            Self::OffHand => "offhand",
            Self::Armor => "costume",
            Self::Ring => "ring",
            Self::Amulet => "amulet",
            Self::Unknown => "unknown",
        }
    }

    pub fn is_weapon(&self) -> bool {
        matches!(self, Self::OneHandedWeapon | Self::TwoHandedWeapon)
    }
}

impl fmt::Display for SlotCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SlotCategory {
    type Err = DomainError;

    /// Lenient parse: never fails, unknown strings become `Unknown`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        Ok(match normalized.as_str() {
            "weapon_1h" | "one_handed" | "weapon" => Self::OneHandedWeapon,
            "weapon_2h" | "two_handed" => Self::TwoHandedWeapon,
            "offhand" | "off_hand" | "shield" => Self::OffHand,
            "costume" | "armor" => Self::Armor,
            "ring" => Self::Ring,
            "amulet" => Self::Amulet,
            _ => Self::Unknown,
        })
    }
}

/// Prefix/suffix marker on an affix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AffixKind {
    /// Named `affix` on the wire; rendered before the base name.
    #[serde(rename = "affix", alias = "prefix")]
    Prefix,
    Suffix,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Affix {
    pub stat: String,
    pub value: i64,
    pub is_percent: bool,
    pub kind: Option<AffixKind>,
    pub name: Option<String>,
}

impl Affix {
    pub fn flat(stat: impl Into<String>, value: i64) -> Self {
        Self {
            stat: stat.into(),
            value,
            is_percent: false,
            kind: None,
            name: None,
        }
    }

    pub fn percent(stat: impl Into<String>, value: i64) -> Self {
        Self {
            is_percent: true,
            ..Self::flat(stat, value)
        }
    }
}

/// Weapon sub-type and damage range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeaponProfile {
    pub weapon_type: Option<String>,
    pub damage_min: i64,
    pub damage_max: i64,
}

/// A piece of equipment.
///
/// # Invariants
///
/// - `level` is at least 1 (checked by `new`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    pub slot_category: SlotCategory,
    pub level: u32,
    pub rarity: Rarity,
    /// Primary attribute and its magnitude, e.g. ("strength", 12)
    pub primary: Option<(String, i64)>,
    pub affixes: Vec<Affix>,
    pub weapon: Option<WeaponProfile>,
}

impl Item {
    pub fn new(
        id: ItemId,
        name: impl Into<String>,
        slot_category: SlotCategory,
        level: u32,
    ) -> Result<Self, DomainError> {
        if level == 0 {
            return Err(DomainError::validation(format!(
                "Item {} has level 0; levels start at 1",
                id
            )));
        }
        Ok(Self {
            id,
            name: name.into(),
            slot_category,
            level,
            rarity: Rarity::common(),
            primary: None,
            affixes: Vec::new(),
            weapon: None,
        })
    }

    pub fn with_rarity(mut self, rarity: Rarity) -> Self {
        self.rarity = rarity;
        self
    }

    pub fn with_primary(mut self, attribute: impl Into<String>, magnitude: i64) -> Self {
        self.primary = Some((attribute.into(), magnitude));
        self
    }

    pub fn with_affix(mut self, affix: Affix) -> Self {
        self.affixes.push(affix);
        self
    }

    pub fn with_weapon(mut self, weapon: WeaponProfile) -> Self {
        self.weapon = Some(weapon);
        self
    }

    /// Name with prefix and suffix affix names applied.
    pub fn display_name(&self) -> String {
        let named = |kind: AffixKind| {
            self.affixes
                .iter()
                .find(|a| a.kind == Some(kind))
                .and_then(|a| a.name.as_deref())
        };
        let mut parts = Vec::with_capacity(3);
        if let Some(prefix) = named(AffixKind::Prefix) {
            parts.push(prefix);
        }
        parts.push(self.name.as_str());
        if let Some(suffix) = named(AffixKind::Suffix) {
            parts.push(suffix);
        }
        parts.join(" ")
    }
}
