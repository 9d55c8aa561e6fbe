//! Delver Shared - wire contracts between the player client and the authority
//!
//! - `requests`: every authority call and its HTTP route
//! - `responses`: normalised response envelope and client-side request errors
//! - `failure`: classification of game-rule refusals
//! - `notifications`: push-channel messages
//! - `dto`: response bodies and their conversions into domain types
//!
//! No transport or runtime code lives here.

pub mod dto;
pub mod failure;
pub mod notifications;
pub mod requests;
pub mod responses;

pub use failure::AuthorityFailure;
pub use notifications::{Envelope, Notification, NotificationError};
pub use requests::{
    AuthorityRequest, DungeonRequest, ExpeditionRequest, InventoryRequest, Method,
    ProfileRequest, RosterRequest, Route, ShopRequest, INVENTORY_PAGE_SIZE,
};
pub use responses::{ErrorCode, RequestError, ResponseResult};
