//! Notification Channel Port - the long-lived push subscription
//!
//! A subscription yields raw `data:` payloads as text. Framing and heartbeat
//! frames are the adapter's concern; classification happens in the reconciler.

use std::pin::Pin;

use async_trait::async_trait;
use futures_util::Stream;
use thiserror::Error;

/// Push-channel failures. All of them are recovered by resubscribing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChannelError {
    #[error("failed to open notification stream: {0}")]
    Connect(String),
    #[error("notification stream rejected with HTTP {0}")]
    Status(u16),
    #[error("notification stream failed: {0}")]
    Transport(String),
    /// Nothing arrived, not even a heartbeat, for this many milliseconds
    #[error("notification stream silent for {0} ms")]
    Idle(u64),
}

/// Stream of raw message payloads; ends when the server closes the stream.
pub type FrameStream = Pin<Box<dyn Stream<Item = Result<String, ChannelError>> + Send>>;

#[async_trait]
pub trait NotificationChannelPort: Send + Sync {
    /// Open a new subscription.
    async fn subscribe(&self) -> Result<FrameStream, ChannelError>;
}
