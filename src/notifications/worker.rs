use super::deep_link::DeepLinkResolver;
use super::render::{parse_push_data, render, RenderDefaults};
use crate::error::{AppError, AppResult};
use crate::models::notification::ACTION_DISMISS;
use crate::models::Notification;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, warn};
use url::Url;
use uuid::Uuid;

/// An open application window as seen by the worker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowClient {
    pub id: String,
    pub url: String,
    pub focused: bool,
    /// Whether the window supports in-place navigation
    pub can_navigate: bool,
    /// Whether this worker instance controls the window
    pub controlled: bool,
}

/// Platform side of the worker: notification display, badge, and windows.
///
/// The worker shares no memory with the application; everything it does
/// goes through this interface.
#[async_trait]
pub trait WorkerHost: Send + Sync {
    /// Activate without waiting for older worker instances to finish
    async fn skip_waiting(&self) -> AppResult<()>;

    /// Take control of every open application window
    async fn claim_clients(&self) -> AppResult<()>;

    fn permission_granted(&self) -> bool;

    /// Display a notification; one with the same tag is replaced
    async fn show_notification(&self, notification: &Notification) -> AppResult<()>;

    async fn close_notification(&self, id: Uuid);

    async fn increment_badge(&self) -> AppResult<()>;

    async fn match_all_windows(&self, include_uncontrolled: bool) -> AppResult<Vec<WindowClient>>;

    async fn navigate(&self, window_id: &str, url: &Url) -> AppResult<()>;

    async fn focus(&self, window_id: &str) -> AppResult<()>;

    async fn open_window(&self, url: &Url) -> AppResult<()>;
}

/// Inbound messages of the worker actor
#[derive(Debug, Clone)]
pub enum WorkerMessage {
    Install,
    Activate,
    Push {
        data: Option<Vec<u8>>,
    },
    Click {
        notification: Notification,
        action: Option<String>,
    },
    Close {
        notification: Notification,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerPhase {
    Parsed,
    Installed,
    Activated,
}

/// What a notification click resulted in
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickOutcome {
    Dismissed,
    Focused { window_id: String, url: String },
    Opened { url: String },
    Failed,
}

/// Handle a push: check permission, render, show, then bump the badge.
///
/// Returns `Ok(None)` when notification permission is not granted. A
/// malformed payload fails this push only.
pub async fn handle_push(
    host: &dyn WorkerHost,
    defaults: &RenderDefaults,
    data: Option<&[u8]>,
) -> AppResult<Option<Notification>> {
    if !host.permission_granted() {
        debug!("Notification permission not granted, ignoring push");
        return Ok(None);
    }

    let payload = parse_push_data(data)?;
    let notification = render(payload.as_ref(), defaults);

    host.show_notification(&notification).await?;
    info!(
        "Showed notification {} (tag {}, type {})",
        notification.id, notification.tag, notification.data.kind
    );

    if let Err(e) = host.increment_badge().await {
        warn!("Failed to update app badge: {}", e);
    }

    Ok(Some(notification))
}

/// Route a notification click back into the application.
///
/// The notification is always closed. `dismiss` stops there; any other
/// action, or a bare click, navigates the first in-scope window that can
/// navigate, or opens a new one.
pub async fn route_click(
    host: &dyn WorkerHost,
    resolver: &DeepLinkResolver,
    notification: &Notification,
    action: Option<&str>,
) -> ClickOutcome {
    host.close_notification(notification.id).await;

    if action == Some(ACTION_DISMISS) {
        info!("Notification {} dismissed", notification.id);
        return ClickOutcome::Dismissed;
    }

    let url = match resolver.resolve(&notification.data.url) {
        Ok(url) => url,
        Err(e) => {
            warn!("Bad deep link {}: {}", notification.data.url, e);
            return ClickOutcome::Failed;
        }
    };

    let windows = match host.match_all_windows(true).await {
        Ok(windows) => windows,
        Err(e) => {
            warn!("Failed to list application windows: {}", e);
            Vec::new()
        }
    };

    let target = windows
        .into_iter()
        .find(|w| w.can_navigate && resolver.in_scope_str(&w.url));

    if let Some(window) = target {
        if let Err(e) = host.navigate(&window.id, &url).await {
            warn!("Failed to navigate window {} to {}: {}", window.id, url, e);
            return ClickOutcome::Failed;
        }
        if let Err(e) = host.focus(&window.id).await {
            warn!("Failed to focus window {}: {}", window.id, e);
        }
        info!("Navigated window {} to {}", window.id, url);
        return ClickOutcome::Focused {
            window_id: window.id,
            url: url.to_string(),
        };
    }

    match host.open_window(&url).await {
        Ok(()) => {
            info!("Opened new window at {}", url);
            ClickOutcome::Opened {
                url: url.to_string(),
            }
        }
        Err(e) => {
            warn!("Failed to open window at {}: {}", url, e);
            ClickOutcome::Failed
        }
    }
}

/// Background notification worker.
///
/// Lifecycle messages are handled in order. Each push and click is spawned
/// as its own task on a tracker so slow work never blocks the next event.
pub struct NotificationWorker {
    host: Arc<dyn WorkerHost>,
    resolver: DeepLinkResolver,
    defaults: RenderDefaults,
    phase: WorkerPhase,
    tracker: TaskTracker,
}

impl NotificationWorker {
    pub fn new(host: Arc<dyn WorkerHost>, resolver: DeepLinkResolver, defaults: RenderDefaults) -> Self {
        Self {
            host,
            resolver,
            defaults,
            phase: WorkerPhase::Parsed,
            tracker: TaskTracker::new(),
        }
    }

    pub fn phase(&self) -> WorkerPhase {
        self.phase
    }

    pub async fn handle(&mut self, message: WorkerMessage) {
        match message {
            WorkerMessage::Install => {
                self.phase = WorkerPhase::Installed;
                if let Err(e) = self.host.skip_waiting().await {
                    warn!("skip_waiting failed: {}", e);
                }
                info!("Notification worker installed");
            }
            WorkerMessage::Activate => {
                self.phase = WorkerPhase::Activated;
                if let Err(e) = self.host.claim_clients().await {
                    warn!("Failed to claim clients: {}", e);
                }
                info!("Notification worker activated");
            }
            other if self.phase != WorkerPhase::Activated => {
                warn!("Dropping {} received before activation", kind_of(&other));
                // A clicked notification is closed even when the click is dropped.
                if let WorkerMessage::Click { notification, .. } = other {
                    self.host.close_notification(notification.id).await;
                }
            }
            WorkerMessage::Push { data } => {
                let host = Arc::clone(&self.host);
                let defaults = self.defaults.clone();
                self.tracker.spawn(async move {
                    if let Err(e) = handle_push(host.as_ref(), &defaults, data.as_deref()).await {
                        error!("Push handling failed: {}", e);
                    }
                });
            }
            WorkerMessage::Click {
                notification,
                action,
            } => {
                let host = Arc::clone(&self.host);
                let resolver = self.resolver.clone();
                self.tracker.spawn(async move {
                    route_click(host.as_ref(), &resolver, &notification, action.as_deref()).await;
                });
            }
            WorkerMessage::Close { notification } => {
                info!(
                    "Notification {} (tag {}) closed without action",
                    notification.id, notification.tag
                );
            }
        }
    }

    /// Run as an actor until every sender is dropped, then wait for
    /// in-flight work to finish.
    pub async fn run(mut self, mut rx: mpsc::Receiver<WorkerMessage>) {
        while let Some(message) = rx.recv().await {
            self.handle(message).await;
        }
        self.shutdown().await;
    }

    /// Wait for every spawned task to complete
    pub async fn shutdown(&self) {
        self.tracker.close();
        self.tracker.wait().await;
        debug!("Notification worker drained");
    }

    /// Spawn the actor and return a handle to talk to it
    pub fn spawn(self) -> WorkerHandle {
        let (tx, rx) = mpsc::channel(64);
        let task = tokio::spawn(self.run(rx));
        WorkerHandle { tx, task }
    }
}

fn kind_of(message: &WorkerMessage) -> &'static str {
    match message {
        WorkerMessage::Install => "install",
        WorkerMessage::Activate => "activate",
        WorkerMessage::Push { .. } => "push",
        WorkerMessage::Click { .. } => "notificationclick",
        WorkerMessage::Close { .. } => "notificationclose",
    }
}

/// Sending side of a spawned [`NotificationWorker`]
pub struct WorkerHandle {
    tx: mpsc::Sender<WorkerMessage>,
    task: JoinHandle<()>,
}

impl WorkerHandle {
    pub async fn send(&self, message: WorkerMessage) -> AppResult<()> {
        self.tx
            .send(message)
            .await
            .map_err(|_| AppError::Message("notification worker has stopped".to_string()))
    }

    /// Stop accepting messages and wait for in-flight work
    pub async fn shutdown(self) -> AppResult<()> {
        drop(self.tx);
        self.task
            .await
            .map_err(|e| AppError::Message(format!("notification worker panicked: {}", e)))
    }
}
