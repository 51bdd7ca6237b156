//! Domain models for the live auction engine.
//!
//! Auction records and their partial updates, push notification payloads and
//! the reminder request body.

pub mod auction;
pub mod notification;
pub mod reminder;

// Re-export all models for convenient access
pub use auction::{Auction, AuctionEventKind, AuctionId, AuctionStatus, AuctionUpdate};
pub use notification::{
    Notification, NotificationAction, NotificationData, NotificationPayload, PayloadData,
    TextDirection,
};
pub use reminder::{ReminderChannel, ReminderRequest};
