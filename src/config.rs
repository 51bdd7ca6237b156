use crate::models::AuctionId;
use std::env;
use std::time::Duration;

/// Real-time (Pusher protocol) connection configuration
#[derive(Debug, Clone)]
pub struct RealtimeConfig {
    pub url: String,
    pub tracked_auctions: Vec<AuctionId>,
}

/// REST API configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    pub token: Option<String>,
    pub timeout_secs: u64,
}

/// Announcer (speech) configuration
#[derive(Debug, Clone)]
pub struct SpeechConfig {
    pub enabled: bool,
    pub locale: String,
    pub rate: f32,
    pub pitch: f32,
}

/// Notification worker configuration
#[derive(Debug, Clone)]
pub struct NotificationConfig {
    pub scope: String,
    pub icon: String,
    pub badge_icon: String,
    pub default_title: String,
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub realtime: RealtimeConfig,
    pub api: ApiConfig,
    pub speech: SpeechConfig,
    pub notifications: NotificationConfig,
    pub log_level: String,
    pub log_format: String,
    pub environment: String,
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|s| s.trim().parse::<T>().ok())
}

/// Parse a comma-separated list of auction ids, skipping blanks
pub fn parse_auction_ids(raw: &str) -> Vec<AuctionId> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(AuctionId::from)
        .collect()
}

impl RealtimeConfig {
    pub fn from_env() -> Result<Self, String> {
        let url = env::var("REALTIME_URL")
            .unwrap_or_else(|_| "ws://localhost:8080/app/ramouse".to_string());

        if !url.starts_with("ws://") && !url.starts_with("wss://") {
            return Err(format!("REALTIME_URL must be a ws:// or wss:// URL, got {}", url));
        }

        let tracked_auctions = env::var("TRACKED_AUCTIONS")
            .map(|raw| parse_auction_ids(&raw))
            .unwrap_or_default();

        Ok(Self {
            url,
            tracked_auctions,
        })
    }
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            url: "ws://localhost:8080/app/ramouse".to_string(),
            tracked_auctions: Vec::new(),
        }
    }
}

impl ApiConfig {
    pub fn from_env() -> Result<Self, String> {
        let base_url = env::var("API_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:8000/api".to_string());

        let token = env::var("API_TOKEN").ok().filter(|t| !t.is_empty());

        let timeout_secs = parse_env::<u64>("API_TIMEOUT_SECS").unwrap_or(10);

        if timeout_secs == 0 {
            return Err("API_TIMEOUT_SECS must be greater than 0".to_string());
        }

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
            timeout_secs,
        })
    }

    /// Get request timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000/api".to_string(),
            token: None,
            timeout_secs: 10,
        }
    }
}

impl SpeechConfig {
    pub fn from_env() -> Result<Self, String> {
        let enabled = parse_env::<bool>("SPEECH_ENABLED").unwrap_or(true);
        let locale = env::var("SPEECH_LOCALE").unwrap_or_else(|_| "ar".to_string());
        let rate = parse_env::<f32>("SPEECH_RATE").unwrap_or(1.0);
        let pitch = parse_env::<f32>("SPEECH_PITCH").unwrap_or(1.0);

        if locale.trim().is_empty() {
            return Err("SPEECH_LOCALE must not be empty".to_string());
        }

        if !(rate > 0.0 && rate <= 2.0) {
            return Err(format!("SPEECH_RATE must be in (0, 2], got {}", rate));
        }

        if !(pitch >= 0.0 && pitch <= 2.0) {
            return Err(format!("SPEECH_PITCH must be in [0, 2], got {}", pitch));
        }

        Ok(Self {
            enabled,
            locale: locale.trim().to_string(),
            rate,
            pitch,
        })
    }
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            locale: "ar".to_string(),
            rate: 1.0,
            pitch: 1.0,
        }
    }
}

impl NotificationConfig {
    pub fn from_env() -> Result<Self, String> {
        let defaults = Self::default();

        let scope = env::var("APP_SCOPE").unwrap_or(defaults.scope);
        if url::Url::parse(&scope).is_err() {
            return Err(format!("APP_SCOPE must be an absolute URL, got {}", scope));
        }

        Ok(Self {
            scope,
            icon: env::var("APP_ICON").unwrap_or(defaults.icon),
            badge_icon: env::var("APP_BADGE_ICON").unwrap_or(defaults.badge_icon),
            default_title: env::var("NOTIFICATION_TITLE").unwrap_or(defaults.default_title),
        })
    }
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            scope: "http://localhost:3000/".to_string(),
            icon: "/icons/icon-192x192.png".to_string(),
            badge_icon: "/icons/badge-72x72.png".to_string(),
            default_title: "Ramouse".to_string(),
        }
    }
}

impl AppConfig {
    /// Create application config from environment variables
    pub fn from_env() -> Result<Self, String> {
        let realtime = RealtimeConfig::from_env()?;
        let api = ApiConfig::from_env()?;
        let speech = SpeechConfig::from_env()?;
        let notifications = NotificationConfig::from_env()?;

        let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        let log_format = env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        // Validate log level
        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&log_level.to_lowercase().as_str()) {
            return Err(format!(
                "Invalid LOG_LEVEL: {}. Must be one of: {:?}",
                log_level, valid_log_levels
            ));
        }

        let valid_log_formats = ["text", "json"];
        if !valid_log_formats.contains(&log_format.to_lowercase().as_str()) {
            return Err(format!(
                "Invalid LOG_FORMAT: {}. Must be one of: {:?}",
                log_format, valid_log_formats
            ));
        }

        // Validate environment
        let valid_environments = ["development", "staging", "production"];
        if !valid_environments.contains(&environment.to_lowercase().as_str()) {
            return Err(format!(
                "Invalid ENVIRONMENT: {}. Must be one of: {:?}",
                environment, valid_environments
            ));
        }

        Ok(Self {
            realtime,
            api,
            speech,
            notifications,
            log_level: log_level.to_lowercase(),
            log_format: log_format.to_lowercase(),
            environment: environment.to_lowercase(),
        })
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Check if running in development
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    /// Check if logs should be emitted as JSON
    pub fn json_logs(&self) -> bool {
        self.log_format == "json"
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            realtime: RealtimeConfig::default(),
            api: ApiConfig::default(),
            speech: SpeechConfig::default(),
            notifications: NotificationConfig::default(),
            log_level: "info".to_string(),
            log_format: "text".to_string(),
            environment: "development".to_string(),
        }
    }
}
