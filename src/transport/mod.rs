//! Real-time channel transports.
//!
//! A transport joins named channels and hands back a receiver of the raw
//! events published on them. It knows nothing about auctions; mapping events
//! to auction updates is the channel manager's job.

pub mod local;
pub mod pusher;
pub mod router;

pub use local::LocalTransport;
pub use pusher::PusherTransport;
pub use router::ChannelRouter;

use crate::error::AppResult;
use serde_json::Value;
use tokio::sync::mpsc;

/// One event delivered on a channel
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelEvent {
    pub channel: String,
    pub event: String,
    pub data: Value,
}

impl ChannelEvent {
    pub fn new(channel: impl Into<String>, event: impl Into<String>, data: Value) -> Self {
        Self {
            channel: channel.into(),
            event: event.into(),
            data,
        }
    }
}

/// Receiving half of a joined channel. Closes when the channel is left or
/// the underlying connection drops.
pub type ChannelReceiver = mpsc::UnboundedReceiver<ChannelEvent>;

/// A real-time transport able to join and leave named channels.
///
/// Implementations never retry or buffer across disconnects: once the
/// connection is gone every receiver simply closes.
pub trait RealtimeTransport: Send + Sync {
    /// Join `channel`. Fails if the channel is already joined or the
    /// connection is closed.
    fn join(&self, channel: &str) -> AppResult<ChannelReceiver>;

    /// Leave `channel`. Leaving a channel that is not joined is a no-op.
    fn leave(&self, channel: &str);
}
