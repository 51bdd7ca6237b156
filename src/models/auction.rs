use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque auction identifier, stable for the auction's lifetime
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuctionId(String);

impl AuctionId {
    /// Name of the real-time channel carrying this auction's events
    pub fn channel_name(&self) -> String {
        format!("auction-updates.{}", self.0)
    }
}

impl fmt::Display for AuctionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AuctionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for AuctionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<u64> for AuctionId {
    fn from(n: u64) -> Self {
        Self(n.to_string())
    }
}

/// Auction status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuctionStatus {
    Scheduled,
    Live,
    Ended,
    Extended,
    Cancelled,
    Paused,
}

impl AuctionStatus {
    pub fn from_str(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "scheduled" => Ok(AuctionStatus::Scheduled),
            "live" => Ok(AuctionStatus::Live),
            "ended" => Ok(AuctionStatus::Ended),
            "extended" => Ok(AuctionStatus::Extended),
            "cancelled" => Ok(AuctionStatus::Cancelled),
            "paused" => Ok(AuctionStatus::Paused),
            _ => Err(format!("Invalid auction status: {}", s)),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AuctionStatus::Scheduled => "scheduled",
            AuctionStatus::Live => "live",
            AuctionStatus::Ended => "ended",
            AuctionStatus::Extended => "extended",
            AuctionStatus::Cancelled => "cancelled",
            AuctionStatus::Paused => "paused",
        }
    }

    /// Whether an auction in this status accepts bids right now
    pub fn is_live(&self) -> bool {
        matches!(self, AuctionStatus::Live)
    }
}

/// In-memory auction record owned by the reconciler
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Auction {
    pub id: AuctionId,
    pub status: AuctionStatus,
    pub is_live: bool,
    pub current_bid: Decimal,
    /// Increment required for the next bid
    pub minimum_bid: Decimal,
    pub bid_count: u64,
    pub actual_start: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub winner_name: Option<String>,
    pub final_price: Option<Decimal>,
}

impl Auction {
    /// Create a scheduled stub with no bids
    pub fn new(id: AuctionId) -> Self {
        Self {
            id,
            status: AuctionStatus::Scheduled,
            is_live: false,
            current_bid: Decimal::ZERO,
            minimum_bid: Decimal::ZERO,
            bid_count: 0,
            actual_start: None,
            ends_at: None,
            winner_name: None,
            final_price: None,
        }
    }

    /// Amount the next bid must reach
    pub fn next_bid_amount(&self) -> Decimal {
        self.current_bid + self.minimum_bid
    }
}

/// Partial update produced from one channel event.
///
/// `None` means "field absent". `winner_name` and `final_price` are doubly
/// optional so an `auction.ended` event without a winner still clears them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuctionUpdate {
    pub status: Option<AuctionStatus>,
    pub is_live: Option<bool>,
    pub current_bid: Option<Decimal>,
    pub minimum_bid: Option<Decimal>,
    pub bid_count: Option<u64>,
    pub actual_start: Option<Option<DateTime<Utc>>>,
    pub winner_name: Option<Option<String>>,
    pub final_price: Option<Option<Decimal>>,
}

/// Auction fields carried by `bid.placed`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BidPlacedAuction {
    pub current_bid: Decimal,
    pub bid_count: u64,
    pub minimum_bid: Decimal,
}

/// Auction fields carried by `auction.started`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuctionStartedAuction {
    #[serde(default)]
    pub actual_start: Option<DateTime<Utc>>,
}

/// Auction fields carried by `auction.ended`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuctionEndedAuction {
    #[serde(default)]
    pub winner_name: Option<String>,
    #[serde(default)]
    pub final_price: Option<Decimal>,
}

/// Envelope shared by all three channel events: `{ "auction": { ... } }`
#[derive(Debug, Clone, Deserialize)]
pub struct AuctionEnvelope<T> {
    pub auction: T,
}

/// The three server events an auction channel carries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuctionEventKind {
    BidPlaced,
    AuctionStarted,
    AuctionEnded,
}

impl AuctionEventKind {
    /// Parse an event name; the Echo-style leading `.` is optional
    pub fn from_event_name(name: &str) -> Option<Self> {
        match name.strip_prefix('.').unwrap_or(name) {
            "bid.placed" => Some(AuctionEventKind::BidPlaced),
            "auction.started" => Some(AuctionEventKind::AuctionStarted),
            "auction.ended" => Some(AuctionEventKind::AuctionEnded),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_name() {
        assert_eq!(AuctionId::from(42u64).channel_name(), "auction-updates.42");
    }

    #[test]
    fn test_status_conversion() {
        assert_eq!(AuctionStatus::from_str("LIVE").unwrap(), AuctionStatus::Live);
        assert_eq!(AuctionStatus::Paused.as_str(), "paused");
        assert!(AuctionStatus::from_str("sold").is_err());
        assert!(AuctionStatus::Live.is_live());
        assert!(!AuctionStatus::Extended.is_live());
    }

    #[test]
    fn test_event_kind_names() {
        assert_eq!(
            AuctionEventKind::from_event_name(".bid.placed"),
            Some(AuctionEventKind::BidPlaced)
        );
        assert_eq!(
            AuctionEventKind::from_event_name("auction.ended"),
            Some(AuctionEventKind::AuctionEnded)
        );
        assert_eq!(AuctionEventKind::from_event_name("pusher:ping"), None);
    }

    #[test]
    fn test_next_bid_amount() {
        let mut auction = Auction::new(AuctionId::from("7"));
        auction.current_bid = Decimal::new(15000, 0);
        auction.minimum_bid = Decimal::new(500, 0);
        assert_eq!(auction.next_bid_amount(), Decimal::new(15500, 0));
    }
}
