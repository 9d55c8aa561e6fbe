use serde::{Deserialize, Serialize};

use super::Route;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ExpeditionRequest {
    GetSlots,
    GetActive,
    Start {
        slot_id: i64,
        duration_minutes: u32,
        squad_ids: Vec<i64>,
    },
    Cancel { expedition_id: i64 },
    Claim { expedition_id: i64 },
}

impl ExpeditionRequest {
    pub fn route(&self) -> Route {
        match self {
            Self::GetSlots => Route::get("/expeditions/slots"),
            Self::GetActive => Route::get("/expeditions/active"),
            Self::Start {
                slot_id,
                duration_minutes,
                squad_ids,
            } => squad_ids.iter().fold(
                Route::post("/expeditions/start")
                    .query("slot_id", slot_id)
                    .query("duration_minutes", duration_minutes),
                |route, id| route.query("squad_ids", id),
            ),
            Self::Cancel { expedition_id } => {
                Route::post("/expeditions/cancel").query("expedition_id", expedition_id)
            }
            Self::Claim { expedition_id } => {
                Route::post("/expeditions/claim").query("expedition_id", expedition_id)
            }
        }
    }
}
