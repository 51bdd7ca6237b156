mod helpers;

use chrono::{Duration as ChronoDuration, Utc};
use helpers::*;
use ramouse_live::announcer::Announcer;
use ramouse_live::config::SpeechConfig;
use ramouse_live::models::{AuctionId, AuctionStatus, AuctionUpdate};
use ramouse_live::services::{LiveSession, SessionEvent};
use ramouse_live::transport::LocalTransport;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tokio_test::assert_ok;

const TEN_SECONDS_LEFT: &str = "تبقى عشر ثوانٍ";
const FINAL_COUNTDOWN: &str = "خمسة، أربعة، ثلاثة، اثنان، واحد";

fn session() -> (LiveSession<RecordingEngine>, Arc<LocalTransport>, RecordingEngine) {
    let transport = Arc::new(LocalTransport::new());
    let engine = RecordingEngine::default();
    let announcer = Announcer::with_seed(Some(engine.clone()), SpeechConfig::default(), 7);
    let session = LiveSession::new(transport.clone(), announcer);
    (session, transport, engine)
}

/// Process queued events until none arrive for `idle`
async fn drain(session: &mut LiveSession<RecordingEngine>, idle: Duration) {
    while let Ok(true) = tokio::time::timeout(idle, session.step()).await {}
}

#[tokio::test]
async fn test_bids_update_store_and_announce() {
    let (mut session, transport, engine) = session();
    assert_ok!(session.track(vec![auction("42", AuctionStatus::Live)]));

    transport.publish("auction-updates.42", ".bid.placed", bid_placed(11000, 1, 500));
    transport.publish("auction-updates.42", ".bid.placed", bid_placed(12000, 2, 1000));
    assert!(session.step().await);
    assert!(session.step().await);

    let auction = session.store().get(&AuctionId::from("42")).unwrap();
    assert_eq!(auction.current_bid, Decimal::new(12000, 0));
    assert_eq!(auction.bid_count, 2);
    assert_eq!(auction.minimum_bid, Decimal::new(1000, 0));
    assert_eq!(auction.next_bid_amount(), Decimal::new(13000, 0));

    let spoken = engine.spoken();
    assert_eq!(spoken.len(), 2);
    assert!(spoken[0].contains("11000"));
    assert!(spoken[1].contains("12000"));
    assert!(spoken.iter().all(|s| s.contains("مزايد")));
    // Bids are normal priority and never interrupt
    assert!(!engine.calls().contains(&"cancel".to_string()));
}

#[tokio::test]
async fn test_auction_sold_is_announced() {
    let (mut session, transport, engine) = session();
    assert_ok!(session.track(vec![auction("5", AuctionStatus::Live)]));

    transport.publish(
        "auction-updates.5",
        ".auction.ended",
        auction_ended(Some("Khaled"), Some(52000)),
    );
    assert!(session.step().await);

    let auction = session.store().get(&AuctionId::from("5")).unwrap();
    assert_eq!(auction.status, AuctionStatus::Ended);
    assert!(!auction.is_live);
    assert_eq!(auction.winner_name.as_deref(), Some("Khaled"));
    assert_eq!(auction.final_price, Some(Decimal::new(52000, 0)));

    assert_eq!(
        engine.calls(),
        vec![
            "cancel".to_string(),
            "speak:تم البيع بمبلغ 52000 إلى Khaled".to_string()
        ]
    );
}

#[tokio::test]
async fn test_auction_ended_without_winner() {
    let (mut session, transport, engine) = session();
    assert_ok!(session.track(vec![auction("6", AuctionStatus::Live)]));

    transport.publish("auction-updates.6", ".auction.ended", auction_ended(None, None));
    assert!(session.step().await);

    assert_eq!(engine.spoken(), vec!["انتهى المزاد دون بيع".to_string()]);
}

#[tokio::test]
async fn test_started_auction_begins_countdown() {
    let (mut session, transport, _engine) = session();
    let mut scheduled = auction("8", AuctionStatus::Scheduled);
    scheduled.ends_at = Some(Utc::now() + ChronoDuration::minutes(5));
    assert_ok!(session.track(vec![scheduled]));

    let id = AuctionId::from("8");
    assert!(!session.has_countdown(&id));

    transport.publish("auction-updates.8", ".auction.started", auction_started());
    assert!(session.step().await);

    let auction = session.store().get(&id).unwrap();
    assert_eq!(auction.status, AuctionStatus::Live);
    assert!(auction.is_live);
    assert!(auction.actual_start.is_some());
    assert!(session.has_countdown(&id));
}

#[tokio::test]
async fn test_ended_auction_stops_countdown() {
    let (mut session, transport, _engine) = session();
    let mut live = auction("9", AuctionStatus::Live);
    live.ends_at = Some(Utc::now() + ChronoDuration::minutes(5));
    assert_ok!(session.track(vec![live]));

    let id = AuctionId::from("9");
    assert!(session.has_countdown(&id));

    transport.publish("auction-updates.9", ".auction.ended", auction_ended(None, None));
    while session.store().get(&id).map(|a| a.is_live).unwrap_or(false) {
        assert!(session.step().await);
    }

    assert!(!session.has_countdown(&id));
}

#[tokio::test(start_paused = true)]
async fn test_retracking_as_ended_stops_countdown() {
    let (mut session, _transport, engine) = session();
    let id = AuctionId::from("10");

    let mut live = auction("10", AuctionStatus::Live);
    live.ends_at = Some(Utc::now() + ChronoDuration::seconds(15));
    assert_ok!(session.track(vec![live.clone()]));
    assert!(session.has_countdown(&id));

    let mut ended = live;
    ended.status = AuctionStatus::Ended;
    ended.is_live = false;
    assert_ok!(session.track(vec![ended]));
    assert!(!session.has_countdown(&id));

    drain(&mut session, Duration::from_secs(30)).await;
    assert!(engine.calls().is_empty());
    assert_eq!(session.store().get(&id).unwrap().status, AuctionStatus::Ended);
}

/// Timer phrases fire once each at 10 and 5 seconds, interrupting speech
#[tokio::test(start_paused = true)]
async fn test_countdown_announces_ten_and_five_once() {
    let (mut session, _transport, engine) = session();
    let mut live = auction("11", AuctionStatus::Live);
    live.ends_at = Some(Utc::now() + ChronoDuration::milliseconds(12_500));
    assert_ok!(session.track(vec![live]));

    drain(&mut session, Duration::from_secs(30)).await;

    assert_eq!(
        engine.calls(),
        vec![
            "cancel".to_string(),
            format!("speak:{}", TEN_SECONDS_LEFT),
            "cancel".to_string(),
            format!("speak:{}", FINAL_COUNTDOWN),
        ]
    );
}

#[tokio::test]
async fn test_tick_for_auction_not_live_is_ignored() {
    let (mut session, _transport, engine) = session();
    assert_ok!(session.track(vec![auction("12", AuctionStatus::Scheduled)]));

    session.handle_event(SessionEvent::Tick(AuctionId::from("12"), 10));
    session.handle_event(SessionEvent::Tick(AuctionId::from("unknown"), 5));

    assert!(engine.calls().is_empty());
}

#[tokio::test]
async fn test_update_for_untracked_auction_is_dropped() {
    let (mut session, _transport, engine) = session();
    assert_ok!(session.track(vec![auction("1", AuctionStatus::Live)]));

    let update = AuctionUpdate {
        current_bid: Some(Decimal::new(99999, 0)),
        bid_count: Some(50),
        ..Default::default()
    };
    session.handle_event(SessionEvent::Update(AuctionId::from("2"), update));

    assert_eq!(session.store().len(), 1);
    assert!(!session.store().contains(&AuctionId::from("2")));
    assert!(engine.calls().is_empty());
}

#[tokio::test]
async fn test_retracking_only_touches_changed_ids() {
    let (mut session, transport, _engine) = session();
    assert_ok!(session.track(vec![
        auction("1", AuctionStatus::Live),
        auction("2", AuctionStatus::Live),
    ]));
    assert_ok!(session.track(vec![
        auction("2", AuctionStatus::Live),
        auction("3", AuctionStatus::Scheduled),
    ]));

    assert_eq!(
        session.store().ids(),
        vec![AuctionId::from("2"), AuctionId::from("3")]
    );
    assert_eq!(
        transport.joined_channels(),
        vec!["auction-updates.2", "auction-updates.3"]
    );
    assert_eq!(transport.join_count(), 3);
    assert_eq!(transport.leave_count(), 1);
}

#[tokio::test]
async fn test_run_until_tears_down_channels() {
    let (mut session, transport, _engine) = session();
    assert_ok!(session.track(vec![
        auction("1", AuctionStatus::Live),
        auction("2", AuctionStatus::Scheduled),
    ]));
    assert_eq!(transport.joined_channels().len(), 2);

    session.run_until(async {}).await;

    assert!(transport.joined_channels().is_empty());
    assert_eq!(session.manager().subscription_count(), 0);
}

#[tokio::test]
async fn test_disabled_speech_still_reconciles() {
    let transport = Arc::new(LocalTransport::new());
    let engine = RecordingEngine::default();
    let config = SpeechConfig {
        enabled: false,
        ..Default::default()
    };
    let mut session = LiveSession::new(
        transport.clone(),
        Announcer::with_seed(Some(engine.clone()), config, 1),
    );
    assert_ok!(session.track(vec![auction("4", AuctionStatus::Live)]));

    transport.publish("auction-updates.4", ".bid.placed", bid_placed(20000, 3, 500));
    assert!(session.step().await);

    let auction = session.store().get(&AuctionId::from("4")).unwrap();
    assert_eq!(auction.current_bid, Decimal::new(20000, 0));
    assert!(engine.calls().is_empty());
}

#[tokio::test]
async fn test_custom_bidder_label_is_spoken() {
    let transport = Arc::new(LocalTransport::new());
    let engine = RecordingEngine::default();
    let announcer = Announcer::with_seed(Some(engine.clone()), SpeechConfig::default(), 3);
    let mut session = LiveSession::new(transport.clone(), announcer).with_bidder_label("Omar");
    assert_ok!(session.track(vec![auction("13", AuctionStatus::Live)]));

    transport.publish("auction-updates.13", ".bid.placed", bid_placed(15500, 1, 500));
    assert!(session.step().await);

    let spoken = engine.spoken();
    assert_eq!(spoken.len(), 1);
    assert!(spoken[0].contains("Omar"));
    assert!(spoken[0].contains("15500"));
}
