use super::{ChannelEvent, ChannelReceiver, ChannelRouter, RealtimeTransport};
use crate::error::AppResult;
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::debug;

/// In-process transport: events are published directly by the embedding code.
#[derive(Default)]
pub struct LocalTransport {
    router: ChannelRouter,
    joins: AtomicUsize,
    leaves: AtomicUsize,
}

impl LocalTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish an event; returns whether a joined channel received it
    pub fn publish(&self, channel: &str, event: &str, data: Value) -> bool {
        self.router.dispatch(ChannelEvent::new(channel, event, data))
    }

    /// Currently joined channels, sorted
    pub fn joined_channels(&self) -> Vec<String> {
        self.router.channels()
    }

    pub fn join_count(&self) -> usize {
        self.joins.load(Ordering::SeqCst)
    }

    pub fn leave_count(&self) -> usize {
        self.leaves.load(Ordering::SeqCst)
    }

    /// Simulate a dropped connection: every receiver closes
    pub fn disconnect(&self) {
        self.router.clear();
    }
}

impl RealtimeTransport for LocalTransport {
    fn join(&self, channel: &str) -> AppResult<ChannelReceiver> {
        let rx = self.router.register(channel)?;
        self.joins.fetch_add(1, Ordering::SeqCst);
        debug!("Local transport joined {}", channel);
        Ok(rx)
    }

    fn leave(&self, channel: &str) {
        if self.router.unregister(channel) {
            self.leaves.fetch_add(1, Ordering::SeqCst);
            debug!("Local transport left {}", channel);
        }
    }
}
