//! Domain fetcher - the only path from an authority read into the store
//!
//! Each fetch stamps a ticket before the request goes out and applies the
//! response through the store, so overlapping fetches of the same domain
//! resolve to the newest one.

use std::sync::Arc;

use delver_shared::dto::{
    ActiveExpeditionsData, ExpeditionSlotsData, ExpeditionsData, InventoryData,
};
use delver_shared::{
    AuthorityRequest, DungeonRequest, ExpeditionRequest, InventoryRequest, ProfileRequest,
    ResponseResult, RosterRequest, ShopRequest, INVENTORY_PAGE_SIZE,
};

use crate::application::store::{ApplyOutcome, DomainPayload, SessionStateStore, StateDomain};
use crate::application::{get_request_timeout_ms, ParseResponse, ServiceError};
use crate::ports::outbound::AuthorityPort;

/// Upper bound on inventory pages read in one fetch.
const MAX_INVENTORY_PAGES: u32 = 50;

#[derive(Clone)]
pub struct DomainFetcher {
    connection: Arc<dyn AuthorityPort>,
    store: Arc<SessionStateStore>,
    act: u32,
    timeout_ms: u64,
}

impl DomainFetcher {
    pub fn new(connection: Arc<dyn AuthorityPort>, store: Arc<SessionStateStore>, act: u32) -> Self {
        Self {
            connection,
            store,
            act,
            timeout_ms: get_request_timeout_ms(),
        }
    }

    /// Per-request timeout for every authority call made through this fetcher
    /// and the services sharing it.
    pub fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn timeout_ms(&self) -> u64 {
        self.timeout_ms
    }

    pub fn store(&self) -> &Arc<SessionStateStore> {
        &self.store
    }

    pub fn act(&self) -> u32 {
        self.act
    }

    /// Cached payload when fresh, otherwise fetch it.
    pub async fn ensure(&self, domain: StateDomain) -> Result<Arc<DomainPayload>, ServiceError> {
        let lookup = self.store.get(domain).await;
        match lookup.snapshot() {
            Some(snapshot) if !lookup.needs_fetch() => Ok(Arc::clone(snapshot.payload())),
            _ => self.fetch(domain).await,
        }
    }

    /// Fetch a domain and apply it; returns whatever the store holds afterwards.
    pub async fn fetch(&self, domain: StateDomain) -> Result<Arc<DomainPayload>, ServiceError> {
        let ticket = self.store.begin_fetch(domain).await;
        let payload = self.load(domain).await?;

        match self.store.apply_fetched(ticket, payload.clone()).await? {
            ApplyOutcome::Applied(snapshot) => Ok(Arc::clone(snapshot.payload())),
            ApplyOutcome::Superseded { .. } => {
                let lookup = self.store.get(domain).await;
                Ok(lookup
                    .snapshot()
                    .map(|s| Arc::clone(s.payload()))
                    .unwrap_or_else(|| Arc::new(payload)))
            }
        }
    }

    /// Fetch several domains concurrently; the first error wins.
    pub async fn fetch_all(&self, domains: &[StateDomain]) -> Result<(), ServiceError> {
        let results =
            futures_util::future::join_all(domains.iter().map(|domain| self.fetch(*domain))).await;
        results.into_iter().try_for_each(|r| r.map(|_| ()))
    }

    async fn call(&self, request: AuthorityRequest) -> Result<ResponseResult, ServiceError> {
        Ok(self
            .connection
            .request_with_timeout(request, self.timeout_ms)
            .await?)
    }

    /// Read `/inventory` page by page until a short page comes back.
    async fn load_inventory(&self) -> Result<InventoryData, ServiceError> {
        let mut items = Vec::new();
        for page in 0..MAX_INVENTORY_PAGES {
            let data: InventoryData = self
                .call(InventoryRequest::page(page * INVENTORY_PAGE_SIZE).into())
                .await?
                .parse()?;
            let last = data.items.len() < INVENTORY_PAGE_SIZE as usize;
            items.extend(data.items);
            if last {
                break;
            }
        }
        tracing::debug!(items = items.len(), "Inventory loaded");
        Ok(InventoryData {
            count: items.len(),
            items,
        })
    }

    async fn load(&self, domain: StateDomain) -> Result<DomainPayload, ServiceError> {
        let payload = match domain {
            StateDomain::Profile => {
                DomainPayload::Profile(self.call(ProfileRequest::GetProfile.into()).await?.parse()?)
            }
            StateDomain::Inventory => DomainPayload::Inventory(self.load_inventory().await?),
            StateDomain::Shop => DomainPayload::Shop(
                self.call(ShopRequest::GetOffers { act: self.act }.into())
                    .await?
                    .parse()?,
            ),
            StateDomain::Roster => DomainPayload::Roster(
                self.call(RosterRequest::GetAvailable.into())
                    .await?
                    .parse()?,
            ),
            StateDomain::Expeditions => {
                let slots: ExpeditionSlotsData = self
                    .call(ExpeditionRequest::GetSlots.into())
                    .await?
                    .parse()?;
                let active: ActiveExpeditionsData = self
                    .call(ExpeditionRequest::GetActive.into())
                    .await?
                    .parse()?;
                DomainPayload::Expeditions(ExpeditionsData {
                    slots: slots.slots,
                    active: active.active,
                })
            }
            StateDomain::Difficulty => DomainPayload::Difficulty(
                self.call(DungeonRequest::GetDifficultyStatus.into())
                    .await?
                    .parse()?,
            ),
            StateDomain::Encounter => DomainPayload::Encounter(
                self.call(DungeonRequest::GetActive.into())
                    .await?
                    .parse_optional()?,
            ),
        };
        Ok(payload)
    }
}
