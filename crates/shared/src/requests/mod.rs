//! Requests to the game authority
//!
//! One enum per area, wrapped by `AuthorityRequest`. Each request knows its
//! HTTP route; transports only need `AuthorityRequest::route()`.

mod dungeon;
mod expedition;
mod inventory;
mod profile;
mod roster;
mod shop;

pub use dungeon::DungeonRequest;
pub use expedition::ExpeditionRequest;
pub use inventory::{InventoryRequest, INVENTORY_PAGE_SIZE};
pub use profile::ProfileRequest;
pub use roster::RosterRequest;
pub use shop::ShopRequest;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// Resolved HTTP route for a request, relative to the API base.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    pub method: Method,
    pub path: String,
    /// Query pairs; a key may repeat (list parameters).
    pub query: Vec<(&'static str, String)>,
    pub body: Option<serde_json::Value>,
}

impl Route {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self {
            method: Method::Post,
            ..Self::get(path)
        }
    }

    pub fn query(mut self, key: &'static str, value: impl ToString) -> Self {
        self.query.push((key, value.to_string()));
        self
    }

    pub fn body(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// Every call the player client makes to the authority.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "area", content = "request", rename_all = "snake_case")]
pub enum AuthorityRequest {
    Profile(ProfileRequest),
    Inventory(InventoryRequest),
    Shop(ShopRequest),
    Roster(RosterRequest),
    Expedition(ExpeditionRequest),
    Dungeon(DungeonRequest),
}

impl AuthorityRequest {
    pub fn route(&self) -> Route {
        match self {
            Self::Profile(r) => r.route(),
            Self::Inventory(r) => r.route(),
            Self::Shop(r) => r.route(),
            Self::Roster(r) => r.route(),
            Self::Expedition(r) => r.route(),
            Self::Dungeon(r) => r.route(),
        }
    }

    /// Whether the request only reads state.
    pub fn is_fetch(&self) -> bool {
        self.route().method == Method::Get
    }
}

impl From<ProfileRequest> for AuthorityRequest {
    fn from(r: ProfileRequest) -> Self {
        Self::Profile(r)
    }
}

impl From<InventoryRequest> for AuthorityRequest {
    fn from(r: InventoryRequest) -> Self {
        Self::Inventory(r)
    }
}

impl From<ShopRequest> for AuthorityRequest {
    fn from(r: ShopRequest) -> Self {
        Self::Shop(r)
    }
}

impl From<RosterRequest> for AuthorityRequest {
    fn from(r: RosterRequest) -> Self {
        Self::Roster(r)
    }
}

impl From<ExpeditionRequest> for AuthorityRequest {
    fn from(r: ExpeditionRequest) -> Self {
        Self::Expedition(r)
    }
}

impl From<DungeonRequest> for AuthorityRequest {
    fn from(r: DungeonRequest) -> Self {
        Self::Dungeon(r)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn routes_match_authority_api() {
        let cases: Vec<(AuthorityRequest, Method, &str)> = vec![
            (ProfileRequest::GetProfile.into(), Method::Get, "/profile"),
            (InventoryRequest::page(0).into(), Method::Get, "/inventory"),
            (ShopRequest::GetOffers { act: 2 }.into(), Method::Get, "/shop/inventory"),
            (RosterRequest::GetAvailable.into(), Method::Get, "/tavern/available"),
            (ExpeditionRequest::GetSlots.into(), Method::Get, "/expeditions/slots"),
            (DungeonRequest::GetActive.into(), Method::Get, "/dungeons/active"),
            (DungeonRequest::GetDifficultyStatus.into(), Method::Get, "/dungeons/plus/status"),
            (DungeonRequest::Exit.into(), Method::Post, "/dungeons/active/exit"),
            (DungeonRequest::Acknowledge.into(), Method::Post, "/dungeons/active/ack"),
        ];
        for (request, method, path) in cases {
            let route = request.route();
            assert_eq!(route.method, method, "{:?}", request);
            assert_eq!(route.path, path);
        }
    }

    #[test]
    fn start_carries_plus_level_body() {
        let route = AuthorityRequest::from(DungeonRequest::Start {
            dungeon_id: 7,
            plus_level: 2,
        })
        .route();
        assert_eq!(route.method, Method::Post);
        assert_eq!(route.path, "/dungeons/7/start");
        assert_eq!(route.body, Some(json!({ "plus_level": 2 })));
    }

    #[test]
    fn expedition_start_repeats_squad_ids() {
        let route = ExpeditionRequest::Start {
            slot_id: 3,
            duration_minutes: 60,
            squad_ids: vec![10, 11],
        }
        .route();
        assert_eq!(
            route.query,
            vec![
                ("slot_id", "3".to_string()),
                ("duration_minutes", "60".to_string()),
                ("squad_ids", "10".to_string()),
                ("squad_ids", "11".to_string()),
            ]
        );
    }

    #[test]
    fn inventory_pages_carry_limit_and_offset() {
        let route = InventoryRequest::page(200).route();
        assert_eq!(
            route.query,
            vec![("limit", "100".to_string()), ("offset", "200".to_string())]
        );
    }

    #[test]
    fn fetches_are_gets() {
        assert!(AuthorityRequest::from(ProfileRequest::GetProfile).is_fetch());
        assert!(!AuthorityRequest::from(ShopRequest::Gamble { act: 1 }).is_fetch());
    }
}
