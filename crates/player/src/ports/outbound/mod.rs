//! Outbound ports - Interfaces for external services
//!
//! These ports define the contracts that infrastructure adapters must implement,
//! allowing application services to talk to the authority and the push channel
//! without depending on concrete implementations.

pub mod authority_port;
pub mod clock_port;
pub mod notification_port;

pub use authority_port::AuthorityPort;
pub use clock_port::ClockPort;
pub use notification_port::{ChannelError, FrameStream, NotificationChannelPort};

#[cfg(any(test, feature = "testing"))]
pub use authority_port::MockAuthorityPort;
