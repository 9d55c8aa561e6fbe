use serde::{Deserialize, Serialize};

use super::Route;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ProfileRequest {
    GetProfile,
}

impl ProfileRequest {
    pub fn route(&self) -> Route {
        match self {
            Self::GetProfile => Route::get("/profile"),
        }
    }
}
