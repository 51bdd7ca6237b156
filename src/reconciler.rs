//! Auction state reconciliation.
//!
//! Updates are merged field by field, last writer wins. Event order is
//! trusted: nothing here checks that bids only ever grow.

use crate::error::{AppError, AppResult};
use crate::models::{Auction, AuctionId, AuctionUpdate};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Merge `update` into `current`. Fields present in the update replace the
/// current value; absent fields are left untouched.
pub fn reconcile(mut current: Auction, update: &AuctionUpdate) -> Auction {
    apply_update(&mut current, update);
    current
}

/// In-place form of [`reconcile`]
pub fn apply_update(auction: &mut Auction, update: &AuctionUpdate) {
    if let Some(status) = update.status {
        auction.status = status;
    }
    if let Some(is_live) = update.is_live {
        auction.is_live = is_live;
    }
    if let Some(current_bid) = update.current_bid {
        auction.current_bid = current_bid;
    }
    if let Some(minimum_bid) = update.minimum_bid {
        auction.minimum_bid = minimum_bid;
    }
    if let Some(bid_count) = update.bid_count {
        auction.bid_count = bid_count;
    }
    if let Some(actual_start) = update.actual_start {
        auction.actual_start = actual_start;
    }
    if let Some(winner_name) = &update.winner_name {
        auction.winner_name = winner_name.clone();
    }
    if let Some(final_price) = update.final_price {
        auction.final_price = final_price;
    }
}

/// Tracked auctions, one record per id.
///
/// Records are created only through [`AuctionStore::track`]; an update for an
/// id that is not tracked is rejected rather than materialising a partial
/// auction.
#[derive(Debug, Default)]
pub struct AuctionStore {
    auctions: HashMap<AuctionId, Auction>,
}

impl AuctionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking an auction, replacing any previous record
    pub fn track(&mut self, auction: Auction) {
        debug!("Tracking auction {}", auction.id);
        self.auctions.insert(auction.id.clone(), auction);
    }

    /// Stop tracking an auction and discard its record
    pub fn untrack(&mut self, id: &AuctionId) -> Option<Auction> {
        self.auctions.remove(id)
    }

    /// Reconcile an update into a tracked auction
    pub fn apply(&mut self, id: &AuctionId, update: &AuctionUpdate) -> AppResult<&Auction> {
        match self.auctions.get_mut(id) {
            Some(auction) => {
                apply_update(auction, update);
                Ok(auction)
            }
            None => {
                warn!("Dropping update for untracked auction {}", id);
                Err(AppError::NotFound(format!("auction {} is not tracked", id)))
            }
        }
    }

    pub fn get(&self, id: &AuctionId) -> Option<&Auction> {
        self.auctions.get(id)
    }

    pub fn contains(&self, id: &AuctionId) -> bool {
        self.auctions.contains_key(id)
    }

    /// Tracked ids, sorted
    pub fn ids(&self) -> Vec<AuctionId> {
        let mut ids: Vec<AuctionId> = self.auctions.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.auctions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.auctions.is_empty()
    }
}
