use serde::{Deserialize, Serialize};

use super::Route;

/// Shop calls are scoped to an act.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ShopRequest {
    GetOffers { act: u32 },
    Buy { act: u32, slot: u32 },
    Gamble { act: u32 },
    Refresh { act: u32 },
}

impl ShopRequest {
    pub fn route(&self) -> Route {
        match self {
            Self::GetOffers { act } => Route::get("/shop/inventory").query("act", act),
            Self::Buy { act, slot } => Route::post("/shop/buy").query("act", act).query("slot", slot),
            Self::Gamble { act } => Route::post("/shop/gamble").query("act", act),
            Self::Refresh { act } => Route::post("/shop/refresh").query("act", act),
        }
    }
}
