#![allow(dead_code)]

use async_trait::async_trait;
use ramouse_live::announcer::{SpeechEngine, Utterance, Voice};
use ramouse_live::error::{AppError, AppResult};
use ramouse_live::models::{Auction, AuctionId, AuctionStatus, Notification};
use ramouse_live::notifications::{WindowClient, WorkerHost};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use url::Url;
use uuid::Uuid;

/// Speech engine that records every call, shared through an Arc so tests can
/// inspect it after handing the engine to an announcer
#[derive(Clone, Default)]
pub struct RecordingEngine {
    pub calls: Arc<Mutex<Vec<String>>>,
}

impl RecordingEngine {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn spoken(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| c.strip_prefix("speak:").map(str::to_string))
            .collect()
    }
}

impl SpeechEngine for RecordingEngine {
    fn voices(&self) -> Vec<Voice> {
        vec![Voice::new("Maged", "ar-SA")]
    }

    fn speak(&mut self, utterance: Utterance) -> AppResult<()> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("speak:{}", utterance.text));
        Ok(())
    }

    fn cancel(&mut self) {
        self.calls.lock().unwrap().push("cancel".to_string());
    }
}

/// Side effects requested by the notification worker
#[derive(Debug, Clone, PartialEq)]
pub enum HostCall {
    SkipWaiting,
    Claim,
    Show(String),
    Close(Uuid),
    Badge,
    MatchAll(bool),
    Navigate(String, String),
    Focus(String),
    Open(String),
}

/// Worker host modelling a notification tray keyed by tag
#[derive(Default)]
pub struct RecordingHost {
    pub permission: bool,
    pub fail_badge: bool,
    pub windows: Vec<WindowClient>,
    pub calls: Mutex<Vec<HostCall>>,
    pub tray: Mutex<HashMap<String, Notification>>,
    pub alerts: Mutex<u32>,
    pub badge: Mutex<u32>,
}

impl RecordingHost {
    pub fn granted() -> Self {
        Self {
            permission: true,
            ..Default::default()
        }
    }

    pub fn with_windows(windows: Vec<WindowClient>) -> Self {
        Self {
            permission: true,
            windows,
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<HostCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn visible(&self) -> Vec<Notification> {
        self.tray.lock().unwrap().values().cloned().collect()
    }

    pub fn alerts(&self) -> u32 {
        *self.alerts.lock().unwrap()
    }

    pub fn badge(&self) -> u32 {
        *self.badge.lock().unwrap()
    }

    pub fn navigation_calls(&self) -> Vec<HostCall> {
        self.calls()
            .into_iter()
            .filter(|c| {
                matches!(
                    c,
                    HostCall::Navigate(..) | HostCall::Focus(_) | HostCall::Open(_)
                )
            })
            .collect()
    }

    fn record(&self, call: HostCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl WorkerHost for RecordingHost {
    async fn skip_waiting(&self) -> AppResult<()> {
        self.record(HostCall::SkipWaiting);
        Ok(())
    }

    async fn claim_clients(&self) -> AppResult<()> {
        self.record(HostCall::Claim);
        Ok(())
    }

    fn permission_granted(&self) -> bool {
        self.permission
    }

    async fn show_notification(&self, notification: &Notification) -> AppResult<()> {
        self.record(HostCall::Show(notification.tag.clone()));
        let replaced = self
            .tray
            .lock()
            .unwrap()
            .insert(notification.tag.clone(), notification.clone())
            .is_some();
        if !replaced || notification.renotify {
            *self.alerts.lock().unwrap() += 1;
        }
        Ok(())
    }

    async fn close_notification(&self, id: Uuid) {
        self.record(HostCall::Close(id));
        self.tray.lock().unwrap().retain(|_, n| n.id != id);
    }

    async fn increment_badge(&self) -> AppResult<()> {
        self.record(HostCall::Badge);
        if self.fail_badge {
            return Err(AppError::Message("badging unsupported".to_string()));
        }
        *self.badge.lock().unwrap() += 1;
        Ok(())
    }

    async fn match_all_windows(&self, include_uncontrolled: bool) -> AppResult<Vec<WindowClient>> {
        self.record(HostCall::MatchAll(include_uncontrolled));
        Ok(self.windows.clone())
    }

    async fn navigate(&self, window_id: &str, url: &Url) -> AppResult<()> {
        self.record(HostCall::Navigate(window_id.to_string(), url.to_string()));
        Ok(())
    }

    async fn focus(&self, window_id: &str) -> AppResult<()> {
        self.record(HostCall::Focus(window_id.to_string()));
        Ok(())
    }

    async fn open_window(&self, url: &Url) -> AppResult<()> {
        self.record(HostCall::Open(url.to_string()));
        Ok(())
    }
}

pub fn window(id: &str, url: &str, can_navigate: bool) -> WindowClient {
    WindowClient {
        id: id.to_string(),
        url: url.to_string(),
        focused: false,
        can_navigate,
        controlled: false,
    }
}

/// Tracked auction stub in the given status
pub fn auction(id: &str, status: AuctionStatus) -> Auction {
    let mut auction = Auction::new(AuctionId::from(id));
    auction.status = status;
    auction.is_live = status.is_live();
    auction.current_bid = Decimal::new(10000, 0);
    auction.minimum_bid = Decimal::new(500, 0);
    auction
}

pub fn bid_placed(current_bid: i64, bid_count: u64, minimum_bid: i64) -> Value {
    json!({"auction": {
        "currentBid": current_bid,
        "bidCount": bid_count,
        "minimumBid": minimum_bid
    }})
}

pub fn auction_started() -> Value {
    json!({"auction": {"actualStart": "2026-03-01T18:00:00Z"}})
}

pub fn auction_ended(winner: Option<&str>, final_price: Option<i64>) -> Value {
    json!({"auction": {"winnerName": winner, "finalPrice": final_price}})
}

/// Let spawned tasks run until they are all parked
pub async fn settle() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
}
