use super::{ChannelEvent, ChannelReceiver};
use crate::error::{AppError, AppResult};
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Routing table: channel name -> sender feeding that channel's receiver
#[derive(Clone, Default)]
pub struct ChannelRouter {
    routes: Arc<DashMap<String, mpsc::UnboundedSender<ChannelEvent>>>,
}

impl ChannelRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a channel and return its receiver
    pub fn register(&self, channel: &str) -> AppResult<ChannelReceiver> {
        if self.routes.contains_key(channel) {
            return Err(AppError::Transport(format!(
                "channel {} is already joined",
                channel
            )));
        }

        let (tx, rx) = mpsc::unbounded_channel();
        self.routes.insert(channel.to_string(), tx);
        Ok(rx)
    }

    /// Remove a channel. Dropping the sender closes the receiver.
    pub fn unregister(&self, channel: &str) -> bool {
        self.routes.remove(channel).is_some()
    }

    /// Deliver an event to its channel. Returns false if nobody listens.
    pub fn dispatch(&self, event: ChannelEvent) -> bool {
        let channel = event.channel.clone();
        let delivered = match self.routes.get(&channel) {
            Some(tx) => tx.send(event).is_ok(),
            None => {
                debug!("Dropping event {} for unjoined channel {}", event.event, channel);
                return false;
            }
        };

        if !delivered {
            // Receiver dropped without leaving; forget the route.
            warn!("Receiver for channel {} is gone, removing route", channel);
            self.routes.remove(&channel);
        }
        delivered
    }

    pub fn channels(&self) -> Vec<String> {
        let mut channels: Vec<String> = self.routes.iter().map(|e| e.key().clone()).collect();
        channels.sort();
        channels
    }

    /// Drop every route, closing all receivers
    pub fn clear(&self) {
        self.routes.clear();
    }
}
