pub mod clock;
pub mod config;
pub mod http_client;
pub mod sse;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use clock::SystemClock;
pub use config::PlayerConfig;
pub use http_client::HttpAuthority;
pub use sse::{SseDecoder, SseNotificationChannel};
