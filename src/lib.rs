//! Ramouse Live Library
//!
//! Live auction synchronization and notification delivery: per-auction
//! real-time channels, state reconciliation, spoken announcements, and the
//! background notification worker.

pub mod announcer;
pub mod channel_manager;
pub mod config;
pub mod countdown;
pub mod error;
pub mod models;
pub mod notifications;
pub mod reconciler;
pub mod services;
pub mod transport;

// Re-export commonly used types
pub use announcer::{Announcer, Priority, SpeechEngine};
pub use channel_manager::ChannelManager;
pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use reconciler::{reconcile, AuctionStore};
pub use services::LiveSession;
