//! Domain error types
//!
//! These errors separate port-level failures (a channel triggered before
//! wiring completed) from setup-chain failures (SDK load/init). Using
//! thiserror for ergonomic error handling with proper Display implementations.

use crate::ports::ChannelName;
use thiserror::Error;

/// Errors raised by port subscription and delivery
#[derive(Debug, Error)]
pub enum PortError {
    /// A stub handler was triggered before real wiring replaced it
    #[error("No handler registered for channel '{0}'")]
    Unwired(ChannelName),

    /// The channel was triggered with no subscriber at all
    #[error("No subscriber on channel '{0}'")]
    NoSubscriber(ChannelName),

    /// Unsubscribe was called with a handler id that is not subscribed
    #[error("Handler {id} is not subscribed to channel '{channel}'")]
    UnknownHandler { channel: ChannelName, id: u64 },

    /// The application side of an outbound channel was dropped
    #[error("Receiver for channel '{0}' is closed")]
    Closed(ChannelName),
}

/// Errors in the load -> init -> wire setup chain
///
/// A failed stage is terminal: later stages never run and no retry is
/// attempted. The bootstrap logs each failure at its checkpoint before
/// returning it.
#[derive(Debug, Error)]
pub enum SetupError {
    /// The identity SDK failed to load
    #[error("Identity SDK load failed: {0}")]
    SdkLoad(anyhow::Error),

    /// The identity SDK loaded but failed to initialize
    #[error("Identity SDK init failed: {0}")]
    SdkInit(anyhow::Error),

    /// Stub replacement failed during bridge wiring
    #[error("Port wiring failed: {0}")]
    Wiring(String),
}
