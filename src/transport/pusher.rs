use super::{ChannelEvent, ChannelReceiver, ChannelRouter, RealtimeTransport};
use crate::error::{AppError, AppResult};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, error, info, warn};

/// Frame of the Pusher channels protocol (used by Laravel Reverb / Echo)
#[derive(Debug, Clone, Deserialize)]
pub struct PusherFrame {
    pub event: String,
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub data: Option<Value>,
}

impl PusherFrame {
    /// Event payload. Pusher sends `data` as a JSON-encoded string; decode it
    /// when possible and keep the raw value otherwise.
    pub fn decoded_data(&self) -> Value {
        match &self.data {
            Some(Value::String(raw)) => {
                serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.clone()))
            }
            Some(other) => other.clone(),
            None => Value::Null,
        }
    }
}

pub fn parse_frame(text: &str) -> AppResult<PusherFrame> {
    Ok(serde_json::from_str(text)?)
}

pub fn subscribe_frame(channel: &str) -> String {
    json!({"event": "pusher:subscribe", "data": {"channel": channel}}).to_string()
}

pub fn unsubscribe_frame(channel: &str) -> String {
    json!({"event": "pusher:unsubscribe", "data": {"channel": channel}}).to_string()
}

fn pong_frame() -> String {
    json!({"event": "pusher:pong", "data": {}}).to_string()
}

/// WebSocket transport speaking the Pusher protocol.
///
/// One connection is shared by every joined channel. There is no reconnect:
/// when the socket drops all channel receivers close.
pub struct PusherTransport {
    router: ChannelRouter,
    outbound: mpsc::UnboundedSender<Message>,
}

impl PusherTransport {
    /// Connect to `url` and spawn the reader and writer tasks
    pub async fn connect(url: &str) -> AppResult<Self> {
        let (ws_stream, _) = connect_async(url).await?;
        info!("Connected to realtime server at {}", url);

        let (mut ws_sender, mut ws_receiver) = ws_stream.split();
        let (outbound, mut outbound_rx) = mpsc::unbounded_channel::<Message>();
        let router = ChannelRouter::new();

        tokio::spawn(async move {
            while let Some(msg) = outbound_rx.recv().await {
                if let Err(e) = ws_sender.send(msg).await {
                    warn!("Failed to send frame to realtime server: {}", e);
                    break;
                }
            }
        });

        let reader_router = router.clone();
        let reader_outbound = outbound.clone();
        tokio::spawn(async move {
            while let Some(msg) = ws_receiver.next().await {
                match msg {
                    Ok(Message::Text(text)) => {
                        handle_text_frame(&reader_router, &reader_outbound, &text);
                    }
                    Ok(Message::Close(_)) => {
                        info!("Realtime connection closed by server");
                        break;
                    }
                    Err(e) => {
                        error!("Realtime connection error: {}", e);
                        break;
                    }
                    _ => {}
                }
            }

            // No reconnect: close every channel receiver.
            reader_router.clear();
        });

        Ok(Self { router, outbound })
    }

    pub fn joined_channels(&self) -> Vec<String> {
        self.router.channels()
    }
}

fn handle_text_frame(router: &ChannelRouter, outbound: &mpsc::UnboundedSender<Message>, text: &str) {
    let frame = match parse_frame(text) {
        Ok(frame) => frame,
        Err(e) => {
            warn!("Ignoring malformed realtime frame: {}", e);
            return;
        }
    };

    match frame.event.as_str() {
        "pusher:connection_established" => {
            let socket_id = frame
                .decoded_data()
                .get("socket_id")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_default();
            info!("Realtime connection established, socket id {}", socket_id);
        }
        "pusher:ping" => {
            let _ = outbound.send(Message::Text(pong_frame()));
        }
        "pusher:error" => {
            warn!("Realtime server error: {}", frame.decoded_data());
        }
        "pusher_internal:subscription_succeeded" => {
            debug!("Subscribed to {}", frame.channel.as_deref().unwrap_or("?"));
        }
        _ => {
            if let Some(channel) = frame.channel.clone() {
                let data = frame.decoded_data();
                router.dispatch(ChannelEvent::new(channel, frame.event.clone(), data));
            }
        }
    }
}

impl RealtimeTransport for PusherTransport {
    fn join(&self, channel: &str) -> AppResult<ChannelReceiver> {
        let rx = self.router.register(channel)?;
        if self.outbound.send(Message::Text(subscribe_frame(channel))).is_err() {
            self.router.unregister(channel);
            return Err(AppError::Transport(
                "realtime connection is closed".to_string(),
            ));
        }
        debug!("Sent subscribe for {}", channel);
        Ok(rx)
    }

    fn leave(&self, channel: &str) {
        if self.router.unregister(channel) {
            let _ = self.outbound.send(Message::Text(unsubscribe_frame(channel)));
            debug!("Sent unsubscribe for {}", channel);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_string_data() {
        let frame = parse_frame(
            r#"{"event":".bid.placed","channel":"auction-updates.3","data":"{\"auction\":{\"bidCount\":4}}"}"#,
        )
        .unwrap();
        assert_eq!(frame.channel.as_deref(), Some("auction-updates.3"));
        assert_eq!(frame.decoded_data()["auction"]["bidCount"], 4);
    }

    #[test]
    fn test_decode_object_and_missing_data() {
        let frame = parse_frame(r#"{"event":"x","data":{"a":1}}"#).unwrap();
        assert_eq!(frame.decoded_data(), json!({"a": 1}));

        let frame = parse_frame(r#"{"event":"pusher:ping"}"#).unwrap();
        assert_eq!(frame.decoded_data(), Value::Null);
    }

    #[test]
    fn test_subscribe_frames() {
        let sub: Value = serde_json::from_str(&subscribe_frame("auction-updates.1")).unwrap();
        assert_eq!(sub["event"], "pusher:subscribe");
        assert_eq!(sub["data"]["channel"], "auction-updates.1");

        let unsub: Value = serde_json::from_str(&unsubscribe_frame("auction-updates.1")).unwrap();
        assert_eq!(unsub["event"], "pusher:unsubscribe");
    }

    #[tokio::test]
    async fn test_text_frame_routing() {
        let router = ChannelRouter::new();
        let (outbound, mut outbound_rx) = mpsc::unbounded_channel();
        let mut rx = router.register("auction-updates.3").unwrap();

        handle_text_frame(
            &router,
            &outbound,
            r#"{"event":".auction.started","channel":"auction-updates.3","data":"{}"}"#,
        );
        let event = rx.recv().await.unwrap();
        assert_eq!(event.event, ".auction.started");

        handle_text_frame(&router, &outbound, r#"{"event":"pusher:ping","data":{}}"#);
        match outbound_rx.recv().await.unwrap() {
            Message::Text(text) => assert!(text.contains("pusher:pong")),
            other => panic!("unexpected frame {:?}", other),
        }
    }
}
