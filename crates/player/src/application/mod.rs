pub mod activity;
pub mod combat;
pub mod error;
pub mod fetcher;
pub mod reconciler;
pub mod services;
pub mod store;

pub use error::{
    get_request_timeout_ms, CombatAction, ControllerError, ParseResponse, ServiceError,
    DEFAULT_REQUEST_TIMEOUT_MS,
};
