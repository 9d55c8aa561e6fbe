use serde::{Deserialize, Serialize};
use serde_json::json;

use super::Route;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DungeonRequest {
    /// Difficulty ladder unlock status for every dungeon
    GetDifficultyStatus,
    /// The running encounter, `null` when there is none
    GetActive,
    Start { dungeon_id: i64, plus_level: u32 },
    Exit,
    /// Dismiss the completion rewards
    Acknowledge,
}

impl DungeonRequest {
    pub fn route(&self) -> Route {
        match self {
            Self::GetDifficultyStatus => Route::get("/dungeons/plus/status"),
            Self::GetActive => Route::get("/dungeons/active"),
            Self::Start {
                dungeon_id,
                plus_level,
            } => Route::post(format!("/dungeons/{}/start", dungeon_id))
                .body(json!({ "plus_level": plus_level })),
            Self::Exit => Route::post("/dungeons/active/exit"),
            Self::Acknowledge => Route::post("/dungeons/active/ack"),
        }
    }
}
