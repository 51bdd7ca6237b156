use crate::config::NotificationConfig;
use crate::error::AppResult;
use crate::models::notification::{
    ACTION_DISMISS, ACTION_VIEW, DEFAULT_TYPE, DEFAULT_URL, FALLBACK_TAG,
};
use crate::models::{Notification, NotificationAction, NotificationData, NotificationPayload, TextDirection};
use uuid::Uuid;

/// Values used wherever a payload leaves a field out
#[derive(Debug, Clone)]
pub struct RenderDefaults {
    pub title: String,
    pub icon: String,
    pub badge: String,
    pub view_title: String,
    pub dismiss_title: String,
    pub lang: String,
    pub vibrate: Vec<u32>,
}

impl Default for RenderDefaults {
    fn default() -> Self {
        Self::from(&NotificationConfig::default())
    }
}

impl From<&NotificationConfig> for RenderDefaults {
    fn from(config: &NotificationConfig) -> Self {
        Self {
            title: config.default_title.clone(),
            icon: config.icon.clone(),
            badge: config.badge_icon.clone(),
            view_title: "عرض".to_string(),
            dismiss_title: "إغلاق".to_string(),
            lang: "ar".to_string(),
            vibrate: vec![200, 100, 200],
        }
    }
}

impl RenderDefaults {
    pub fn default_actions(&self) -> Vec<NotificationAction> {
        vec![
            NotificationAction::new(ACTION_VIEW, &self.view_title),
            NotificationAction::new(ACTION_DISMISS, &self.dismiss_title),
        ]
    }
}

/// Parse the body of a push event. No body means no payload.
pub fn parse_push_data(data: Option<&[u8]>) -> AppResult<Option<NotificationPayload>> {
    match data {
        Some(bytes) => Ok(Some(NotificationPayload::from_slice(bytes)?)),
        None => Ok(None),
    }
}

/// Grouping tag: explicit tag, else the payload's type, else the fallback
pub fn notification_tag(payload: &NotificationPayload) -> String {
    payload
        .tag
        .clone()
        .or_else(|| payload.data.as_ref().and_then(|d| d.kind.clone()))
        .unwrap_or_else(|| FALLBACK_TAG.to_string())
}

/// Build the platform notification for a push. `renotify` is always set so
/// a notification replacing one with the same tag alerts again.
pub fn render(payload: Option<&NotificationPayload>, defaults: &RenderDefaults) -> Notification {
    let payload = match payload {
        Some(payload) => payload,
        None => {
            return Notification {
                id: Uuid::new_v4(),
                title: defaults.title.clone(),
                body: String::new(),
                icon: defaults.icon.clone(),
                badge: defaults.badge.clone(),
                tag: FALLBACK_TAG.to_string(),
                renotify: true,
                require_interaction: false,
                actions: defaults.default_actions(),
                data: NotificationData::default(),
                vibrate: defaults.vibrate.clone(),
                dir: TextDirection::Rtl,
                lang: defaults.lang.clone(),
            }
        }
    };

    let data = payload.data.clone().unwrap_or_default();

    Notification {
        id: Uuid::new_v4(),
        title: payload.title.clone(),
        body: payload.body.clone().unwrap_or_default(),
        icon: payload.icon.clone().unwrap_or_else(|| defaults.icon.clone()),
        badge: defaults.badge.clone(),
        tag: notification_tag(payload),
        renotify: true,
        require_interaction: payload.require_interaction.unwrap_or(false),
        actions: payload
            .actions
            .clone()
            .unwrap_or_else(|| defaults.default_actions()),
        data: NotificationData {
            url: data.url.unwrap_or_else(|| DEFAULT_URL.to_string()),
            kind: data.kind.unwrap_or_else(|| DEFAULT_TYPE.to_string()),
        },
        vibrate: defaults.vibrate.clone(),
        dir: TextDirection::Rtl,
        lang: defaults.lang.clone(),
    }
}
