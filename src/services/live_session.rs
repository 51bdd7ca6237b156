use crate::announcer::{Announcer, SpeechEngine};
use crate::channel_manager::ChannelManager;
use crate::countdown::{spawn_countdown, time_until};
use crate::error::AppResult;
use crate::models::{Auction, AuctionId, AuctionStatus, AuctionUpdate};
use crate::reconciler::AuctionStore;
use crate::transport::RealtimeTransport;
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::time::Instant;
use tracing::{debug, info};

const DEFAULT_BIDDER_LABEL: &str = "مزايد";

/// Everything the session loop reacts to
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Update(AuctionId, AuctionUpdate),
    Tick(AuctionId, u64),
}

/// Live view over a set of tracked auctions.
///
/// Channel events flow manager -> store; announcements and countdowns are a
/// side channel driven by the reconciled state and never gate it.
pub struct LiveSession<E: SpeechEngine> {
    manager: ChannelManager,
    store: AuctionStore,
    announcer: Announcer<E>,
    events_tx: mpsc::UnboundedSender<SessionEvent>,
    events_rx: mpsc::UnboundedReceiver<SessionEvent>,
    countdowns: HashMap<AuctionId, watch::Sender<AuctionStatus>>,
    bidder_label: String,
}

impl<E: SpeechEngine> LiveSession<E> {
    pub fn new(transport: Arc<dyn RealtimeTransport>, announcer: Announcer<E>) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        let updates_tx = events_tx.clone();
        let manager = ChannelManager::new(transport, move |id, update| {
            let _ = updates_tx.send(SessionEvent::Update(id, update));
        });

        Self {
            manager,
            store: AuctionStore::new(),
            announcer,
            events_tx,
            events_rx,
            countdowns: HashMap::new(),
            bidder_label: DEFAULT_BIDDER_LABEL.to_string(),
        }
    }

    /// Name spoken for bidders, since bid events carry amounts only
    pub fn with_bidder_label(mut self, label: &str) -> Self {
        self.bidder_label = label.to_string();
        self
    }

    /// Replace the tracked set with `auctions`.
    ///
    /// Records for auctions that stay tracked are refreshed; channels are
    /// only opened or left for ids entering or leaving the set.
    pub fn track(&mut self, auctions: Vec<Auction>) -> AppResult<()> {
        let wanted: HashSet<AuctionId> = auctions.iter().map(|a| a.id.clone()).collect();

        for id in self.store.ids() {
            if !wanted.contains(&id) {
                self.store.untrack(&id);
                self.countdowns.remove(&id);
                info!("Stopped tracking auction {}", id);
            }
        }

        for auction in auctions {
            let live = auction.status.is_live();
            let id = auction.id.clone();
            self.store.track(auction);
            if live {
                self.start_countdown(&id);
            } else if self.countdowns.remove(&id).is_some() {
                debug!("Countdown stopped for auction {}", id);
            }
        }

        self.manager.sync(wanted)
    }

    /// Process one event. Returns false once the event stream has ended.
    pub async fn step(&mut self) -> bool {
        match self.events_rx.recv().await {
            Some(event) => {
                self.handle_event(event);
                true
            }
            None => false,
        }
    }

    /// Process events until `shutdown` resolves, then leave every channel
    pub async fn run_until<F>(&mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                running = self.step() => {
                    if !running {
                        break;
                    }
                }
            }
        }
        self.teardown();
    }

    pub fn handle_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::Update(id, update) => self.handle_update(&id, &update),
            SessionEvent::Tick(id, seconds) => {
                if self.store.get(&id).map(|a| a.is_live).unwrap_or(false) {
                    self.announcer.announce_timer(seconds);
                }
            }
        }
    }

    fn handle_update(&mut self, id: &AuctionId, update: &AuctionUpdate) {
        let before = match self.store.get(id) {
            Some(auction) => auction.clone(),
            None => {
                debug!("Update for untracked auction {} dropped", id);
                return;
            }
        };

        let after = match self.store.apply(id, update) {
            Ok(auction) => auction.clone(),
            Err(e) => {
                debug!("{}", e);
                return;
            }
        };

        if update.bid_count.is_some() && after.bid_count > before.bid_count {
            info!(
                "Auction {}: bid {} ({} bids)",
                id, after.current_bid, after.bid_count
            );
            self.announcer
                .announce_bid(after.current_bid, &self.bidder_label);
        }

        if before.status == after.status {
            return;
        }

        info!(
            "Auction {}: {} -> {}",
            id,
            before.status.as_str(),
            after.status.as_str()
        );

        if let Some(status_tx) = self.countdowns.get(id) {
            let _ = status_tx.send(after.status);
        }

        match after.status {
            AuctionStatus::Live => self.start_countdown(id),
            AuctionStatus::Ended => {
                self.countdowns.remove(id);
                match (&after.winner_name, after.final_price) {
                    (Some(winner), Some(price)) => self.announcer.announce_sold(price, winner),
                    _ => self.announcer.announce_ended_without_sale(),
                }
            }
            _ => {}
        }
    }

    fn start_countdown(&mut self, id: &AuctionId) {
        let ends_at = match self.store.get(id).and_then(|a| a.ends_at) {
            Some(ends_at) => ends_at,
            None => return,
        };

        let deadline = Instant::now() + time_until(ends_at, Utc::now());
        let (status_tx, status_rx) = watch::channel(AuctionStatus::Live);
        let mut ticks = spawn_countdown(deadline, status_rx);

        let events_tx = self.events_tx.clone();
        let auction_id = id.clone();
        tokio::spawn(async move {
            while let Some(seconds) = ticks.recv().await {
                if events_tx
                    .send(SessionEvent::Tick(auction_id.clone(), seconds))
                    .is_err()
                {
                    break;
                }
            }
        });

        // Replacing an older sender stops that countdown.
        self.countdowns.insert(id.clone(), status_tx);
        debug!("Countdown started for auction {}", id);
    }

    pub fn store(&self) -> &AuctionStore {
        &self.store
    }

    pub fn announcer(&self) -> &Announcer<E> {
        &self.announcer
    }

    pub fn manager(&self) -> &ChannelManager {
        &self.manager
    }

    pub fn has_countdown(&self, id: &AuctionId) -> bool {
        self.countdowns.contains_key(id)
    }

    /// Leave every channel and stop all countdowns
    pub fn teardown(&mut self) {
        self.manager.teardown();
        self.countdowns.clear();
    }
}
