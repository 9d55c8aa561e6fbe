//! Loadout Service - equip and unequip round trips
//!
//! Placements are checked with the slot resolver first so an impossible move
//! never reaches the authority. The resolver's result is not applied: after
//! the authority accepts, inventory and profile are invalidated and re-fetched
//! and the returned loadout is the authority's.

use std::sync::Arc;

use delver_domain::{
    slot_resolver, DomainError, EquipmentSlot, Item, ItemId, Loadout,
};
use delver_shared::dto::InventoryData;
use delver_shared::InventoryRequest;

use crate::application::fetcher::DomainFetcher;
use crate::application::store::{DomainPayload, StateDomain};
use crate::application::{ParseResponse, ServiceError};
use crate::ports::outbound::AuthorityPort;

/// An unequipped item that beats what it would replace.
#[derive(Debug, Clone, PartialEq)]
pub struct UpgradeCandidate {
    pub item: Arc<Item>,
    /// Slot the item would go to by default
    pub slot: Option<EquipmentSlot>,
}

#[derive(Clone)]
pub struct LoadoutService {
    connection: Arc<dyn AuthorityPort>,
    fetcher: DomainFetcher,
}

impl LoadoutService {
    pub fn new(connection: Arc<dyn AuthorityPort>, fetcher: DomainFetcher) -> Self {
        Self {
            connection,
            fetcher,
        }
    }

    pub async fn loadout(&self) -> Result<Loadout, ServiceError> {
        let payload = self.fetcher.ensure(StateDomain::Inventory).await?;
        Ok(inventory_of(&payload)?.loadout()?)
    }

    /// Equip an inventory item into `slot`.
    pub async fn equip(&self, item_id: ItemId, slot: EquipmentSlot) -> Result<Loadout, ServiceError> {
        let payload = self.fetcher.ensure(StateDomain::Inventory).await?;
        let inventory = inventory_of(&payload)?;
        let item = find_item(inventory, item_id)?;

        let planned = slot_resolver::equip(Arc::new(item), slot, &inventory.loadout()?)?;
        tracing::debug!(
            item_id = %item_id,
            slot = %slot,
            displaced = planned.displaced.len(),
            "Equip accepted locally"
        );

        self.connection
            .request_with_timeout(
                InventoryRequest::Equip {
                    item_id: item_id.get(),
                    slot: slot.index(),
                }
                .into(),
                self.fetcher.timeout_ms(),
            )
            .await?
            .parse_empty()?;

        self.reload().await
    }

    /// Equip into the resolver's default slot.
    pub async fn equip_default(&self, item_id: ItemId) -> Result<Loadout, ServiceError> {
        let payload = self.fetcher.ensure(StateDomain::Inventory).await?;
        let inventory = inventory_of(&payload)?;
        let item = find_item(inventory, item_id)?;

        let slot = slot_resolver::default_slot(&item, &inventory.loadout()?).ok_or_else(|| {
            DomainError::validation(format!("{} cannot be equipped", item.display_name()))
        })?;
        self.equip(item_id, slot).await
    }

    pub async fn unequip(&self, slot: EquipmentSlot) -> Result<Loadout, ServiceError> {
        let current = self.loadout().await?;
        if slot_resolver::unequip(slot, &current).removed.is_none() {
            return Err(DomainError::validation(format!("slot {} is empty", slot)).into());
        }

        self.connection
            .request_with_timeout(
                InventoryRequest::Unequip { slot: slot.index() }.into(),
                self.fetcher.timeout_ms(),
            )
            .await?
            .parse_empty()?;

        self.reload().await
    }

    /// Unequipped items that are strict upgrades over the current loadout.
    pub async fn upgrade_candidates(&self) -> Result<Vec<UpgradeCandidate>, ServiceError> {
        let payload = self.fetcher.ensure(StateDomain::Inventory).await?;
        let inventory = inventory_of(&payload)?;
        let loadout = inventory.loadout()?;

        let mut candidates = Vec::new();
        for data in inventory.unequipped() {
            let item = match data.to_item() {
                Ok(item) => item,
                Err(e) => {
                    tracing::debug!(item_id = data.id, error = %e, "Skipping unreadable item");
                    continue;
                }
            };
            if slot_resolver::is_upgrade(&item, &loadout) {
                candidates.push(UpgradeCandidate {
                    slot: slot_resolver::default_slot(&item, &loadout),
                    item: Arc::new(item),
                });
            }
        }
        Ok(candidates)
    }

    async fn reload(&self) -> Result<Loadout, ServiceError> {
        let store = self.fetcher.store();
        store
            .invalidate_all(&[StateDomain::Inventory, StateDomain::Profile])
            .await;
        self.fetcher
            .fetch_all(&[StateDomain::Inventory, StateDomain::Profile])
            .await?;
        self.loadout().await
    }
}

fn inventory_of(payload: &DomainPayload) -> Result<&InventoryData, ServiceError> {
    payload
        .as_inventory()
        .ok_or_else(|| ServiceError::ParseError("inventory snapshot holds another domain".into()))
}

fn find_item(inventory: &InventoryData, item_id: ItemId) -> Result<Item, ServiceError> {
    let data = inventory
        .find(item_id.get())
        .ok_or_else(|| DomainError::validation(format!("item {} is not in the inventory", item_id)))?;
    Ok(data.to_item()?)
}
