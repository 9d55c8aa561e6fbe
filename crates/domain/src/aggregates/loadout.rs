//! Loadout aggregate - the six equipment slots and their occupants
//!
//! # Invariants
//!
//! - At most one item per slot.
//! - A two-handed weapon sits under both weapon slots as the same shared
//!   `Arc`, and is never present under only one of them.
//! - Every occupant is compatible with its slot.
//!
//! Mutation goes through `slot_resolver::equip` / `unequip`, which return a new
//! loadout; the crate-private `place`/`vacate` helpers never leave a
//! half-removed two-handed weapon behind.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::entities::{Item, SlotCategory};
use crate::error::DomainError;
use crate::ids::ItemId;
use crate::slot_resolver;
use crate::value_objects::EquipmentSlot;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Loadout {
    slots: BTreeMap<EquipmentSlot, Arc<Item>>,
}

impl Loadout {
    // =========================================================================
    // Constructors
    // =========================================================================

    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a loadout from an explicit slot map.
    ///
    /// Rejects incompatible placements, a two-handed weapon present under only
    /// one weapon slot, and one item claiming two slots it cannot span.
    pub fn from_slots(
        slots: impl IntoIterator<Item = (EquipmentSlot, Arc<Item>)>,
    ) -> Result<Self, DomainError> {
        let slots: BTreeMap<EquipmentSlot, Arc<Item>> = slots.into_iter().collect();

        for (slot, item) in &slots {
            if !slot_resolver::slots_for(item.slot_category).contains(*slot) {
                return Err(DomainError::IncompatibleSlot {
                    category: item.slot_category,
                    slot: *slot,
                });
            }
        }

        let first = slots.get(&EquipmentSlot::Weapon1);
        let second = slots.get(&EquipmentSlot::Weapon2);
        let two_handed = |item: Option<&Arc<Item>>| {
            item.is_some_and(|i| i.slot_category == SlotCategory::TwoHandedWeapon)
        };
        if two_handed(first) || two_handed(second) {
            match (first, second) {
                (Some(a), Some(b)) if a.id == b.id => {}
                _ => {
                    return Err(DomainError::inconsistent_loadout(
                        "two-handed weapon must occupy both weapon slots",
                    ))
                }
            }
        }

        let mut seen: BTreeMap<ItemId, EquipmentSlot> = BTreeMap::new();
        for (slot, item) in &slots {
            if let Some(previous) = seen.insert(item.id, *slot) {
                let spans_pair = item.slot_category == SlotCategory::TwoHandedWeapon
                    && previous.partner() == Some(*slot);
                if !spans_pair {
                    return Err(DomainError::inconsistent_loadout(format!(
                        "item {} equipped in both {} and {}",
                        item.id, previous, slot
                    )));
                }
            }
        }

        // Share one allocation between both weapon slots for a two-handed item.
        let mut slots = slots;
        if let (Some(a), Some(b)) = (
            slots.get(&EquipmentSlot::Weapon1),
            slots.get(&EquipmentSlot::Weapon2),
        ) {
            if a.id == b.id && !Arc::ptr_eq(a, b) {
                let shared = Arc::clone(a);
                slots.insert(EquipmentSlot::Weapon2, shared);
            }
        }

        Ok(Self { slots })
    }

    /// Build a loadout from the authority's equipment listing, where every
    /// equipped item appears once with the slot index it was equipped through.
    ///
    /// A two-handed weapon listed under either weapon slot is expanded to both.
    pub fn from_equipped(
        equipped: impl IntoIterator<Item = (EquipmentSlot, Item)>,
    ) -> Result<Self, DomainError> {
        let mut expanded: Vec<(EquipmentSlot, Arc<Item>)> = Vec::new();
        for (slot, item) in equipped {
            let item = Arc::new(item);
            if item.slot_category == SlotCategory::TwoHandedWeapon && slot.is_weapon_pair() {
                for weapon_slot in EquipmentSlot::WEAPON_PAIR {
                    expanded.push((weapon_slot, Arc::clone(&item)));
                }
            } else {
                expanded.push((slot, item));
            }
        }

        let mut map: BTreeMap<EquipmentSlot, Arc<Item>> = BTreeMap::new();
        for (slot, item) in expanded {
            if let Some(existing) = map.get(&slot) {
                if existing.id != item.id {
                    return Err(DomainError::inconsistent_loadout(format!(
                        "{} claimed by items {} and {}",
                        slot, existing.id, item.id
                    )));
                }
                continue;
            }
            map.insert(slot, item);
        }
        Self::from_slots(map)
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn occupant(&self, slot: EquipmentSlot) -> Option<&Arc<Item>> {
        self.slots.get(&slot)
    }

    pub fn is_vacant(&self, slot: EquipmentSlot) -> bool {
        !self.slots.contains_key(&slot)
    }

    /// Occupied slots in ascending index order.
    pub fn occupied(&self) -> impl Iterator<Item = (EquipmentSlot, &Arc<Item>)> {
        self.slots.iter().map(|(slot, item)| (*slot, item))
    }

    /// Each equipped item once, a two-handed weapon included only once.
    pub fn items(&self) -> Vec<Arc<Item>> {
        let mut out: Vec<Arc<Item>> = Vec::new();
        for item in self.slots.values() {
            if !out.iter().any(|seen| seen.id == item.id) {
                out.push(Arc::clone(item));
            }
        }
        out
    }

    pub fn slot_of(&self, item_id: ItemId) -> Option<EquipmentSlot> {
        self.slots
            .iter()
            .find(|(_, item)| item.id == item_id)
            .map(|(slot, _)| *slot)
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    // =========================================================================
    // Crate-private mutation
    // =========================================================================

    /// Remove whatever occupies `slot`. A two-handed occupant is removed from
    /// both weapon slots.
    pub(crate) fn vacate(&mut self, slot: EquipmentSlot) -> Option<Arc<Item>> {
        let removed = self.slots.remove(&slot)?;
        if removed.slot_category == SlotCategory::TwoHandedWeapon {
            if let Some(partner) = slot.partner() {
                self.slots.remove(&partner);
            }
        }
        Some(removed)
    }

    /// Remove `item_id` from wherever it is equipped.
    pub(crate) fn remove_item(&mut self, item_id: ItemId) {
        self.slots.retain(|_, item| item.id != item_id);
    }

    pub(crate) fn place(&mut self, slot: EquipmentSlot, item: Arc<Item>) {
        self.slots.insert(slot, item);
    }
}
