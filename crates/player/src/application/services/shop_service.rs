//! Shop Service - offers, purchases, gambling and selling

use std::sync::Arc;

use delver_domain::{DomainError, ItemId};
use delver_shared::dto::{GambleData, PurchaseData, SaleData, ShopData};
use delver_shared::{InventoryRequest, ShopRequest};

use crate::application::fetcher::DomainFetcher;
use crate::application::store::StateDomain;
use crate::application::{ParseResponse, ServiceError};
use crate::ports::outbound::AuthorityPort;

#[derive(Clone)]
pub struct ShopService {
    connection: Arc<dyn AuthorityPort>,
    fetcher: DomainFetcher,
}

impl ShopService {
    pub fn new(connection: Arc<dyn AuthorityPort>, fetcher: DomainFetcher) -> Self {
        Self {
            connection,
            fetcher,
        }
    }

    /// Current offers for the configured act.
    pub async fn offers(&self) -> Result<ShopData, ServiceError> {
        let payload = self.fetcher.ensure(StateDomain::Shop).await?;
        payload
            .as_shop()
            .cloned()
            .ok_or_else(|| ServiceError::ParseError("shop snapshot holds another domain".into()))
    }

    pub async fn buy(&self, slot: u32) -> Result<PurchaseData, ServiceError> {
        let purchase: PurchaseData = self
            .connection
            .request_with_timeout(
                ShopRequest::Buy {
                    act: self.fetcher.act(),
                    slot,
                }
                .into(),
                self.fetcher.timeout_ms(),
            )
            .await?
            .parse()?;

        tracing::info!(
            slot,
            item_id = purchase.inventory_item_id,
            price = purchase.price_paid,
            "Bought shop offer"
        );
        self.fetcher
            .store()
            .invalidate_all(&[StateDomain::Shop, StateDomain::Profile, StateDomain::Inventory])
            .await;
        Ok(purchase)
    }

    pub async fn gamble(&self) -> Result<GambleData, ServiceError> {
        let rolled: GambleData = self
            .connection
            .request_with_timeout(
                ShopRequest::Gamble {
                    act: self.fetcher.act(),
                }
                .into(),
                self.fetcher.timeout_ms(),
            )
            .await?
            .parse()?;

        tracing::info!(item = ?rolled.item_name, rarity = ?rolled.item_rarity, "Gambled");
        self.fetcher
            .store()
            .invalidate_all(&[StateDomain::Profile, StateDomain::Inventory])
            .await;
        Ok(rolled)
    }

    /// Pay for a new set of offers and return them.
    pub async fn refresh_offers(&self) -> Result<ShopData, ServiceError> {
        self.connection
            .request_with_timeout(
                ShopRequest::Refresh {
                    act: self.fetcher.act(),
                }
                .into(),
                self.fetcher.timeout_ms(),
            )
            .await?
            .parse_empty()?;

        self.fetcher
            .store()
            .invalidate_all(&[StateDomain::Shop, StateDomain::Profile])
            .await;
        self.fetcher.fetch(StateDomain::Shop).await?;
        self.offers().await
    }

    pub async fn sell(&self, item_ids: &[ItemId]) -> Result<SaleData, ServiceError> {
        if item_ids.is_empty() {
            return Err(DomainError::validation("nothing selected to sell").into());
        }

        let sale: SaleData = self
            .connection
            .request_with_timeout(
                InventoryRequest::Sell {
                    item_ids: item_ids.iter().map(|id| id.get()).collect(),
                }
                .into(),
                self.fetcher.timeout_ms(),
            )
            .await?
            .parse()?;

        tracing::info!(count = item_ids.len(), gold = sale.gold_received, "Sold items");
        self.fetcher
            .store()
            .invalidate_all(&[StateDomain::Profile, StateDomain::Inventory])
            .await;
        Ok(sale)
    }
}
