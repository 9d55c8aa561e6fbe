//! Slot resolution - which slots an item may occupy and what equipping it does
//!
//! Everything here is a pure function over `Item` and `Loadout`. Nothing is
//! applied optimistically; callers use the results to pre-filter placements
//! and to label upgrades, and the authority's answer replaces the loadout.

use std::sync::Arc;

use crate::aggregates::Loadout;
use crate::entities::{Item, SlotCategory};
use crate::error::DomainError;
use crate::value_objects::EquipmentSlot;

/// Slots an item category may occupy.
///
/// When `indivisible` is set the slots are taken together as one unit
/// (two-handed weapons); otherwise each slot is individually selectable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompatibleSlots {
    slots: Vec<EquipmentSlot>,
    indivisible: bool,
}

impl CompatibleSlots {
    fn selectable(slots: &[EquipmentSlot]) -> Self {
        Self {
            slots: slots.to_vec(),
            indivisible: false,
        }
    }

    pub fn slots(&self) -> &[EquipmentSlot] {
        &self.slots
    }

    pub fn indivisible(&self) -> bool {
        self.indivisible
    }

    pub fn contains(&self, slot: EquipmentSlot) -> bool {
        self.slots.contains(&slot)
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// Compatible slots for a category.
pub fn slots_for(category: SlotCategory) -> CompatibleSlots {
    match category {
        SlotCategory::OneHandedWeapon => CompatibleSlots::selectable(&EquipmentSlot::WEAPON_PAIR),
        SlotCategory::TwoHandedWeapon => CompatibleSlots {
            slots: EquipmentSlot::WEAPON_PAIR.to_vec(),
            indivisible: true,
        },
        SlotCategory::OffHand => CompatibleSlots::selectable(&[EquipmentSlot::Weapon2]),
        SlotCategory::Armor => CompatibleSlots::selectable(&[EquipmentSlot::Armor]),
        SlotCategory::Ring => CompatibleSlots::selectable(&EquipmentSlot::RING_PAIR),
        SlotCategory::Amulet => CompatibleSlots::selectable(&[EquipmentSlot::Amulet]),
        SlotCategory::Unknown => CompatibleSlots::selectable(&[]),
    }
}

pub fn compatible_slots(item: &Item) -> CompatibleSlots {
    slots_for(item.slot_category)
}

/// Slot an equip action should target when the caller did not pick one.
///
/// First vacant compatible slot in ascending order, else the lowest compatible
/// slot (the caller must confirm the replacement). Two-handed weapons always
/// target slot 1.
pub fn default_slot(item: &Item, loadout: &Loadout) -> Option<EquipmentSlot> {
    let compatible = compatible_slots(item);
    if compatible.indivisible() {
        return compatible.slots().first().copied();
    }
    compatible
        .slots()
        .iter()
        .copied()
        .find(|slot| loadout.is_vacant(*slot))
        .or_else(|| compatible.slots().first().copied())
}

/// Levels of the distinct items currently in `slots`.
fn occupant_levels(slots: &[EquipmentSlot], loadout: &Loadout) -> Vec<u32> {
    let mut seen = Vec::new();
    let mut levels = Vec::new();
    for slot in slots {
        if let Some(occupant) = loadout.occupant(*slot) {
            if !seen.contains(&occupant.id) {
                seen.push(occupant.id);
                levels.push(occupant.level);
            }
        }
    }
    levels
}

/// Whether `item` is strictly better than what it would replace.
///
/// Empty compatible slots never count as an upgrade. A two-handed weapon must
/// beat the strongest weapon it would displace; rings and one-handed weapons
/// only need to beat the weakest occupant of their pair.
pub fn is_upgrade(item: &Item, loadout: &Loadout) -> bool {
    let compatible = compatible_slots(item);
    let levels = occupant_levels(compatible.slots(), loadout);

    let threshold = match item.slot_category {
        SlotCategory::TwoHandedWeapon => levels.iter().max(),
        _ => levels.iter().min(),
    };
    threshold.is_some_and(|level| item.level > *level)
}

/// Whether `item` beats the occupant of a caller-chosen slot.
///
/// A two-handed occupant counts once. For a two-handed candidate the choice of
/// slot does not matter and this defers to `is_upgrade`.
pub fn is_upgrade_in(
    item: &Item,
    slot: EquipmentSlot,
    loadout: &Loadout,
) -> Result<bool, DomainError> {
    let compatible = compatible_slots(item);
    if !compatible.contains(slot) {
        return Err(DomainError::IncompatibleSlot {
            category: item.slot_category,
            slot,
        });
    }
    if compatible.indivisible() {
        return Ok(is_upgrade(item, loadout));
    }
    Ok(loadout
        .occupant(slot)
        .is_some_and(|occupant| item.level > occupant.level))
}

/// Result of an equip: the new loadout and the items it pushed out.
#[derive(Debug, Clone, PartialEq)]
pub struct EquipOutcome {
    pub loadout: Loadout,
    /// Items returned to the unequipped pool, each listed once.
    pub displaced: Vec<Arc<Item>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnequipOutcome {
    pub loadout: Loadout,
    pub removed: Option<Arc<Item>>,
}

/// Place `item` into `slot`, returning the resulting loadout.
///
/// A two-handed weapon vacates and fills both weapon slots. Any other item
/// vacates only its chosen slot, unless that slot holds a two-handed weapon,
/// in which case both weapon slots are vacated. An item already equipped
/// elsewhere is moved rather than duplicated.
pub fn equip(
    item: Arc<Item>,
    slot: EquipmentSlot,
    loadout: &Loadout,
) -> Result<EquipOutcome, DomainError> {
    let compatible = compatible_slots(&item);
    if !compatible.contains(slot) {
        return Err(DomainError::IncompatibleSlot {
            category: item.slot_category,
            slot,
        });
    }

    let mut next = loadout.clone();
    next.remove_item(item.id);

    let targets: Vec<EquipmentSlot> = if compatible.indivisible() {
        compatible.slots().to_vec()
    } else {
        vec![slot]
    };

    let mut displaced: Vec<Arc<Item>> = Vec::new();
    for target in &targets {
        if let Some(removed) = next.vacate(*target) {
            if !displaced.iter().any(|d| d.id == removed.id) {
                displaced.push(removed);
            }
        }
    }
    for target in targets {
        next.place(target, Arc::clone(&item));
    }

    Ok(EquipOutcome {
        loadout: next,
        displaced,
    })
}

/// Clear `slot` (both weapon slots if it holds a two-handed weapon).
pub fn unequip(slot: EquipmentSlot, loadout: &Loadout) -> UnequipOutcome {
    let mut next = loadout.clone();
    let removed = next.vacate(slot);
    UnequipOutcome {
        loadout: next,
        removed,
    }
}
