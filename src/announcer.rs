//! Spoken announcements for live auctions.
//!
//! A single-slot cooperative queue in front of a speech engine. High priority
//! announcements cancel whatever is speaking; normal ones are handed to the
//! engine as-is, so bursts of bids may be dropped by the engine.

use crate::config::SpeechConfig;
use crate::error::AppResult;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

/// A voice offered by the speech engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Voice {
    pub name: String,
    /// BCP 47 language tag, e.g. `ar-SA`
    pub lang: String,
}

impl Voice {
    pub fn new(name: &str, lang: &str) -> Self {
        Self {
            name: name.to_string(),
            lang: lang.to_string(),
        }
    }
}

/// One request to the speech engine
#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    pub text: String,
    pub lang: String,
    pub voice: Option<Voice>,
    pub rate: f32,
    pub pitch: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Priority {
    High,
    Normal,
}

/// Lifecycle callbacks reported by the speech engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeechEvent {
    Start,
    End,
    Error(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnouncerState {
    Idle,
    Speaking,
}

/// Text-to-speech device. There is one per process; the announcer is its
/// only writer.
pub trait SpeechEngine: Send {
    fn voices(&self) -> Vec<Voice>;

    /// Start speaking. What happens if already speaking is engine-defined.
    fn speak(&mut self, utterance: Utterance) -> AppResult<()>;

    /// Stop the current utterance and drop anything queued
    fn cancel(&mut self);
}

/// Engine that writes utterances to the log, for headless runs
#[derive(Debug, Clone)]
pub struct TracingSpeechEngine {
    voice: Voice,
}

impl TracingSpeechEngine {
    pub fn new(lang: &str) -> Self {
        Self {
            voice: Voice::new("tracing", lang),
        }
    }
}

impl SpeechEngine for TracingSpeechEngine {
    fn voices(&self) -> Vec<Voice> {
        vec![self.voice.clone()]
    }

    fn speak(&mut self, utterance: Utterance) -> AppResult<()> {
        info!(lang = %utterance.lang, "Speaking: {}", utterance.text);
        Ok(())
    }

    fn cancel(&mut self) {
        debug!("Speech cancelled");
    }
}

const BID_TEMPLATES: [&str; 4] = [
    "مزايدة جديدة بقيمة {amount} من {bidder}",
    "{bidder} يرفع السعر إلى {amount}",
    "عرض جديد بمبلغ {amount} من {bidder}",
    "السعر الآن {amount}، والمزايد {bidder}",
];

const TEN_SECONDS_LEFT: &str = "تبقى عشر ثوانٍ";
const FINAL_COUNTDOWN: &str = "خمسة، أربعة، ثلاثة، اثنان، واحد";
const SOLD_TEMPLATE: &str = "تم البيع بمبلغ {amount} إلى {winner}";
const ENDED_WITHOUT_SALE: &str = "انتهى المزاد دون بيع";

/// Render an amount without trailing zeros, e.g. `15500.00` -> `15500`
pub fn format_amount(amount: Decimal) -> String {
    amount.normalize().to_string()
}

pub struct Announcer<E: SpeechEngine> {
    engine: Option<E>,
    config: SpeechConfig,
    voice: Option<Voice>,
    state: AnnouncerState,
    rng: StdRng,
}

impl<E: SpeechEngine> Announcer<E> {
    /// `engine` is `None` when no speech engine is available; every
    /// announcement is then a no-op.
    pub fn new(engine: Option<E>, config: SpeechConfig) -> Self {
        Self::with_rng(engine, config, StdRng::from_entropy())
    }

    pub fn with_seed(engine: Option<E>, config: SpeechConfig, seed: u64) -> Self {
        Self::with_rng(engine, config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(engine: Option<E>, config: SpeechConfig, rng: StdRng) -> Self {
        let mut announcer = Self {
            engine,
            config,
            voice: None,
            state: AnnouncerState::Idle,
            rng,
        };
        announcer.select_voice();
        announcer
    }

    /// Pick the first voice whose language contains the configured locale,
    /// else the first voice available.
    pub fn select_voice(&mut self) {
        let voices = match &self.engine {
            Some(engine) => engine.voices(),
            None => return,
        };

        let locale = self.config.locale.to_lowercase();
        self.voice = voices
            .iter()
            .find(|v| v.lang.to_lowercase().contains(&locale))
            .or_else(|| voices.first())
            .cloned();

        match &self.voice {
            Some(voice) => debug!("Selected voice {} ({})", voice.name, voice.lang),
            None => debug!("No speech voices available yet"),
        }
    }

    /// The engine's voice list changed
    pub fn on_voices_changed(&mut self) {
        self.select_voice();
    }

    /// Feed a lifecycle callback from the engine
    pub fn on_event(&mut self, event: SpeechEvent) {
        self.state = match event {
            SpeechEvent::Start => AnnouncerState::Speaking,
            SpeechEvent::End => AnnouncerState::Idle,
            SpeechEvent::Error(reason) => {
                debug!("Speech engine error ignored: {}", reason);
                AnnouncerState::Idle
            }
        };
    }

    pub fn state(&self) -> AnnouncerState {
        self.state
    }

    pub fn voice(&self) -> Option<&Voice> {
        self.voice.as_ref()
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled && self.engine.is_some()
    }

    pub fn engine(&self) -> Option<&E> {
        self.engine.as_ref()
    }

    pub fn speak(&mut self, text: &str, priority: Priority) {
        if !self.config.enabled {
            return;
        }
        let engine = match self.engine.as_mut() {
            Some(engine) => engine,
            None => return,
        };

        if priority == Priority::High {
            engine.cancel();
            self.state = AnnouncerState::Idle;
        }

        let utterance = Utterance {
            text: text.to_string(),
            lang: self
                .voice
                .as_ref()
                .map(|v| v.lang.clone())
                .unwrap_or_else(|| self.config.locale.clone()),
            voice: self.voice.clone(),
            rate: self.config.rate,
            pitch: self.config.pitch,
        };

        if let Err(e) = engine.speak(utterance) {
            warn!("Speech engine rejected announcement: {}", e);
            self.state = AnnouncerState::Idle;
        }
    }

    pub fn announce_bid(&mut self, amount: Decimal, bidder_name: &str) {
        let template = BID_TEMPLATES[self.rng.gen_range(0..BID_TEMPLATES.len())];
        let text = template
            .replace("{amount}", &format_amount(amount))
            .replace("{bidder}", bidder_name);
        self.speak(&text, Priority::Normal);
    }

    /// Announce only at exactly 10 and 5 seconds remaining
    pub fn announce_timer(&mut self, seconds_remaining: u64) {
        match seconds_remaining {
            10 => self.speak(TEN_SECONDS_LEFT, Priority::High),
            5 => self.speak(FINAL_COUNTDOWN, Priority::High),
            _ => {}
        }
    }

    pub fn announce_sold(&mut self, amount: Decimal, winner_name: &str) {
        let text = SOLD_TEMPLATE
            .replace("{amount}", &format_amount(amount))
            .replace("{winner}", winner_name);
        self.speak(&text, Priority::High);
    }

    pub fn announce_ended_without_sale(&mut self) {
        self.speak(ENDED_WITHOUT_SALE, Priority::High);
    }
}
