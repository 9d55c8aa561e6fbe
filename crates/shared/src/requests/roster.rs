use serde::{Deserialize, Serialize};

use super::Route;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RosterRequest {
    GetAvailable,
    Hire { slot: u32 },
}

impl RosterRequest {
    pub fn route(&self) -> Route {
        match self {
            Self::GetAvailable => Route::get("/tavern/available"),
            Self::Hire { slot } => Route::post("/tavern/hire").query("slot", slot),
        }
    }
}
