//! Entities received from the authority

mod item;

pub use item::{Affix, AffixKind, Item, SlotCategory, WeaponProfile};
