//! Countdown ticks for a live auction.
//!
//! Ticks are remaining whole seconds, strictly decreasing by one, each value
//! exactly once, and they stop as soon as the auction leaves `live`.

use crate::models::AuctionStatus;
use chrono::{DateTime, Utc};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::{self, Instant};
use tracing::debug;

/// Whole seconds left at the start of a countdown. Later values are counted
/// down from this one rather than read off the clock, so timer jitter around
/// a second boundary cannot skip or repeat a value.
pub fn start_seconds(deadline: Instant, now: Instant) -> u64 {
    deadline.saturating_duration_since(now).as_secs()
}

/// Time left until `ends_at`, zero if already past
pub fn time_until(ends_at: DateTime<Utc>, now: DateTime<Utc>) -> Duration {
    (ends_at - now).to_std().unwrap_or(Duration::ZERO)
}

/// Spawn a countdown toward `deadline`. The receiver yields remaining
/// seconds once per second and closes after zero or when `status` leaves live.
pub fn spawn_countdown(
    deadline: Instant,
    mut status: watch::Receiver<AuctionStatus>,
) -> mpsc::Receiver<u64> {
    let (tx, rx) = mpsc::channel(16);

    tokio::spawn(async move {
        let mut remaining = start_seconds(deadline, Instant::now());
        let mut interval = time::interval(Duration::from_secs(1));

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if !status.borrow().is_live() {
                        break;
                    }
                    if tx.send(remaining).await.is_err() || remaining == 0 {
                        break;
                    }
                    remaining -= 1;
                }
                changed = status.changed() => {
                    if changed.is_err() || !status.borrow().is_live() {
                        break;
                    }
                }
            }
        }

        debug!("Countdown stopped");
    });

    rx
}
