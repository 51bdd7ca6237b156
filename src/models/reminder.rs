use serde::{Deserialize, Serialize};

/// Delivery channel for a reminder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReminderChannel {
    Push,
}

/// Body of `POST /auctions/{id}/remind`. Write-only; nothing is kept client side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderRequest {
    pub minutes_before: u32,
    pub channels: Vec<ReminderChannel>,
}

impl ReminderRequest {
    pub fn push(minutes_before: u32) -> Self {
        Self {
            minutes_before,
            channels: vec![ReminderChannel::Push],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reminder_body() {
        let body = serde_json::to_value(ReminderRequest::push(15)).unwrap();
        assert_eq!(
            body,
            serde_json::json!({"minutes_before": 15, "channels": ["push"]})
        );
    }
}
