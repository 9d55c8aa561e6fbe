use serde::{Deserialize, Serialize};

use delver_domain::{
    Affix, AffixKind, DomainError, EquipmentSlot, Item, ItemId, Loadout, Rarity, SlotCategory,
    WeaponProfile,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AffixData {
    #[serde(default)]
    pub name: Option<String>,
    pub stat: String,
    pub value: i64,
    #[serde(default)]
    pub is_percent: bool,
    #[serde(default)]
    pub kind: Option<AffixKind>,
    #[serde(default)]
    pub tier: Option<u32>,
}

/// One inventory item as listed by `/inventory` and embedded in profile and shop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryItemData {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    /// Legacy rows may carry `null`; treated as common
    #[serde(default)]
    pub rarity: Option<u8>,
    /// Legacy rows may carry `null`; treated as level 1
    #[serde(default)]
    pub level: Option<u32>,
    #[serde(default)]
    pub tier: Option<u32>,
    /// Slot index (1-6) when equipped
    #[serde(default)]
    pub equipment_slot: Option<u8>,
    /// Slot key (`weapon_1`, `ring_2`, ...) used by the profile equipment list
    #[serde(default)]
    pub slot: Option<String>,
    #[serde(default)]
    pub slot_type: Option<String>,
    #[serde(default)]
    pub weapon_type: Option<String>,
    #[serde(default)]
    pub damage_min: Option<i64>,
    #[serde(default)]
    pub damage_max: Option<i64>,
    #[serde(default)]
    pub base_stat: Option<String>,
    #[serde(default)]
    pub base_stat_value: Option<i64>,
    #[serde(default)]
    pub affixes: Vec<AffixData>,
}

const DEFAULT_LEVEL: u32 = 1;

impl InventoryItemData {
    pub fn level(&self) -> u32 {
        self.level.unwrap_or(DEFAULT_LEVEL)
    }

    pub fn rarity(&self) -> u8 {
        self.rarity.unwrap_or(Rarity::MIN)
    }

    pub fn to_item(&self) -> Result<Item, DomainError> {
        let category = self
            .slot_type
            .as_deref()
            .map(|s| s.parse::<SlotCategory>())
            .transpose()?
            .unwrap_or(SlotCategory::Unknown);

        let level = self.level();
        let mut item = Item::new(ItemId::new(self.id), self.name.clone(), category, level)?
            .with_rarity(Rarity::new(self.rarity())?);

        if let (Some(stat), Some(value)) = (&self.base_stat, self.base_stat_value) {
            item = item.with_primary(stat.clone(), value);
        }
        if let (Some(min), Some(max)) = (self.damage_min, self.damage_max) {
            item = item.with_weapon(WeaponProfile {
                weapon_type: self.weapon_type.clone(),
                damage_min: min,
                damage_max: max,
            });
        }
        for affix in &self.affixes {
            item = item.with_affix(Affix {
                stat: affix.stat.clone(),
                value: affix.value,
                is_percent: affix.is_percent,
                kind: affix.kind,
                name: affix.name.clone(),
            });
        }
        Ok(item)
    }

    /// Slot this item is equipped in, from either the index or the key.
    pub fn equipped_slot(&self) -> Result<Option<EquipmentSlot>, DomainError> {
        let index = self.equipment_slot.filter(|i| *i != 0);
        let key = self.slot.as_deref().filter(|k| !k.is_empty());
        match (index, key) {
            (Some(index), _) => EquipmentSlot::from_index(index).map(Some),
            (None, Some(key)) => key.parse().map(Some),
            (None, None) => Ok(None),
        }
    }
}

/// Build a loadout from the equipped entries of an item listing.
pub fn loadout_from(items: &[InventoryItemData]) -> Result<Loadout, DomainError> {
    let mut equipped = Vec::new();
    for data in items {
        if let Some(slot) = data.equipped_slot()? {
            equipped.push((slot, data.to_item()?));
        }
    }
    Loadout::from_equipped(equipped)
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct InventoryData {
    #[serde(default)]
    pub items: Vec<InventoryItemData>,
    #[serde(default)]
    pub count: usize,
}

impl InventoryData {
    pub fn loadout(&self) -> Result<Loadout, DomainError> {
        loadout_from(&self.items)
    }

    /// Items not currently equipped.
    pub fn unequipped(&self) -> impl Iterator<Item = &InventoryItemData> {
        self.items
            .iter()
            .filter(|i| matches!(i.equipped_slot(), Ok(None)))
    }

    pub fn find(&self, item_id: i64) -> Option<&InventoryItemData> {
        self.items.iter().find(|i| i.id == item_id)
    }
}
