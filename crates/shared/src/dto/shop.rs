use serde::{Deserialize, Serialize};

use super::inventory::InventoryItemData;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShopOfferData {
    #[serde(default)]
    pub offer_id: Option<i64>,
    pub slot: u32,
    #[serde(default)]
    pub price: i64,
    #[serde(default)]
    pub sold: bool,
    #[serde(flatten)]
    pub item: InventoryItemData,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ShopData {
    #[serde(default)]
    pub items: Vec<ShopOfferData>,
}

impl ShopData {
    pub fn available(&self) -> impl Iterator<Item = &ShopOfferData> {
        self.items.iter().filter(|o| !o.sold)
    }
}

/// Result of a purchase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseData {
    pub inventory_item_id: i64,
    #[serde(default)]
    pub item_name: Option<String>,
    #[serde(default)]
    pub price_paid: i64,
    #[serde(default)]
    pub gold_remaining: i64,
}

/// Body of `/shop/gamble`; the item is rolled by the authority.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GambleData {
    #[serde(default)]
    pub inventory_item_id: Option<i64>,
    #[serde(default)]
    pub item_name: Option<String>,
    #[serde(default)]
    pub item_rarity: Option<u8>,
    #[serde(default)]
    pub gold_remaining: Option<i64>,
}

/// Body of `/inventory/sell`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SaleData {
    #[serde(default)]
    pub gold_received: i64,
    #[serde(default)]
    pub gold_remaining: Option<i64>,
}
