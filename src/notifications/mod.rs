//! Background notification delivery.
//!
//! Push payloads become platform notifications; clicks are routed back into
//! the application through deep links.

pub mod deep_link;
pub mod render;
pub mod worker;

pub use deep_link::{auction_path, DeepLinkResolver};
pub use render::{render, RenderDefaults};
pub use worker::{
    handle_push, route_click, ClickOutcome, NotificationWorker, WindowClient, WorkerHandle,
    WorkerHost, WorkerMessage, WorkerPhase,
};
