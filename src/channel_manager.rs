//! Per-auction real-time subscriptions.
//!
//! The manager keeps exactly one open channel per tracked auction id, maps the
//! three auction events to partial updates, and forwards them to a single
//! update callback. It holds no auction state of its own.

use crate::error::AppResult;
use crate::models::auction::{
    AuctionEndedAuction, AuctionEnvelope, AuctionStartedAuction, BidPlacedAuction,
};
use crate::models::{AuctionEventKind, AuctionId, AuctionStatus, AuctionUpdate};
use crate::transport::{ChannelEvent, ChannelReceiver, RealtimeTransport};
use arc_swap::ArcSwap;
use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Map a raw channel event to a partial auction update.
///
/// Returns `Ok(None)` for events that are not one of the three auction events.
pub fn map_event(event: &ChannelEvent) -> AppResult<Option<AuctionUpdate>> {
    let kind = match AuctionEventKind::from_event_name(&event.event) {
        Some(kind) => kind,
        None => return Ok(None),
    };

    let update = match kind {
        AuctionEventKind::BidPlaced => {
            let payload: AuctionEnvelope<BidPlacedAuction> =
                serde_json::from_value(event.data.clone())?;
            AuctionUpdate {
                current_bid: Some(payload.auction.current_bid),
                bid_count: Some(payload.auction.bid_count),
                minimum_bid: Some(payload.auction.minimum_bid),
                ..Default::default()
            }
        }
        AuctionEventKind::AuctionStarted => {
            let payload: AuctionEnvelope<AuctionStartedAuction> =
                serde_json::from_value(event.data.clone())?;
            AuctionUpdate {
                status: Some(AuctionStatus::Live),
                is_live: Some(true),
                actual_start: Some(payload.auction.actual_start),
                ..Default::default()
            }
        }
        AuctionEventKind::AuctionEnded => {
            let payload: AuctionEnvelope<AuctionEndedAuction> =
                serde_json::from_value(event.data.clone())?;
            AuctionUpdate {
                status: Some(AuctionStatus::Ended),
                is_live: Some(false),
                winner_name: Some(payload.auction.winner_name),
                final_price: Some(payload.auction.final_price),
                ..Default::default()
            }
        }
    };

    Ok(Some(update))
}

struct Dispatch {
    callback: Box<dyn Fn(AuctionId, AuctionUpdate) + Send + Sync>,
}

/// An open channel for one auction id
pub struct ChannelSubscription {
    auction_id: AuctionId,
    channel: String,
    active: Arc<AtomicBool>,
    task: JoinHandle<()>,
}

impl ChannelSubscription {
    pub fn auction_id(&self) -> &AuctionId {
        &self.auction_id
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Leave the channel. No callback fires for this subscription afterwards,
    /// including for events already queued but not yet delivered.
    pub fn close(self, transport: &dyn RealtimeTransport) {
        self.active.store(false, Ordering::SeqCst);
        self.task.abort();
        transport.leave(&self.channel);
        info!("Left channel {} for auction {}", self.channel, self.auction_id);
    }
}

/// Maintains one subscription per tracked auction id.
///
/// Must be used from within a Tokio runtime: each subscription forwards its
/// events on a spawned task.
pub struct ChannelManager {
    transport: Arc<dyn RealtimeTransport>,
    dispatch: Arc<ArcSwap<Dispatch>>,
    subscriptions: HashMap<AuctionId, ChannelSubscription>,
}

impl ChannelManager {
    pub fn new<F>(transport: Arc<dyn RealtimeTransport>, callback: F) -> Self
    where
        F: Fn(AuctionId, AuctionUpdate) + Send + Sync + 'static,
    {
        Self {
            transport,
            dispatch: Arc::new(ArcSwap::from_pointee(Dispatch {
                callback: Box::new(callback),
            })),
            subscriptions: HashMap::new(),
        }
    }

    /// Replace the update callback. Open channels are kept and dispatch to
    /// the new callback from their next event on.
    pub fn set_callback<F>(&self, callback: F)
    where
        F: Fn(AuctionId, AuctionUpdate) + Send + Sync + 'static,
    {
        self.dispatch.store(Arc::new(Dispatch {
            callback: Box::new(callback),
        }));
    }

    /// Bring the open channels in line with `ids`.
    ///
    /// Channels for ids no longer present are left, channels for new ids are
    /// opened, and channels for ids present in both sets are untouched.
    pub fn sync<I>(&mut self, ids: I) -> AppResult<()>
    where
        I: IntoIterator<Item = AuctionId>,
    {
        let wanted: BTreeSet<AuctionId> = ids.into_iter().collect();

        let stale: Vec<AuctionId> = self
            .subscriptions
            .keys()
            .filter(|id| !wanted.contains(*id))
            .cloned()
            .collect();

        for id in stale {
            if let Some(subscription) = self.subscriptions.remove(&id) {
                subscription.close(self.transport.as_ref());
            }
        }

        for id in wanted {
            if self.subscriptions.contains_key(&id) {
                continue;
            }
            let subscription = self.open(id.clone())?;
            self.subscriptions.insert(id, subscription);
        }

        Ok(())
    }

    fn open(&self, auction_id: AuctionId) -> AppResult<ChannelSubscription> {
        let channel = auction_id.channel_name();
        let rx = self.transport.join(&channel).map_err(|e| {
            error!("Failed to join {}: {}", channel, e);
            e
        })?;

        let active = Arc::new(AtomicBool::new(true));
        let task = tokio::spawn(forward_events(
            auction_id.clone(),
            rx,
            Arc::clone(&active),
            Arc::clone(&self.dispatch),
        ));

        info!("Joined channel {} for auction {}", channel, auction_id);

        Ok(ChannelSubscription {
            auction_id,
            channel,
            active,
            task,
        })
    }

    /// Ids with an open channel, sorted
    pub fn tracked_ids(&self) -> Vec<AuctionId> {
        let mut ids: Vec<AuctionId> = self.subscriptions.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn is_tracking(&self, id: &AuctionId) -> bool {
        self.subscriptions.contains_key(id)
    }

    pub fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }

    /// Leave every open channel
    pub fn teardown(&mut self) {
        if self.subscriptions.is_empty() {
            return;
        }
        info!("Tearing down {} channel subscriptions", self.subscriptions.len());
        for (_, subscription) in self.subscriptions.drain() {
            subscription.close(self.transport.as_ref());
        }
    }
}

impl Drop for ChannelManager {
    fn drop(&mut self) {
        self.teardown();
    }
}

async fn forward_events(
    auction_id: AuctionId,
    mut rx: ChannelReceiver,
    active: Arc<AtomicBool>,
    dispatch: Arc<ArcSwap<Dispatch>>,
) {
    while let Some(event) = rx.recv().await {
        if !active.load(Ordering::SeqCst) {
            break;
        }

        match map_event(&event) {
            Ok(Some(update)) => {
                debug!("{} for auction {}", event.event, auction_id);
                let current = dispatch.load();
                (current.callback)(auction_id.clone(), update);
            }
            Ok(None) => {
                debug!("Ignoring event {} on {}", event.event, event.channel);
            }
            Err(e) => {
                warn!(
                    "Malformed {} payload for auction {}: {}",
                    event.event, auction_id, e
                );
            }
        }
    }

    if active.load(Ordering::SeqCst) {
        warn!("Channel for auction {} closed by transport", auction_id);
    }
}
