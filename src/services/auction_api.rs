use crate::config::ApiConfig;
use crate::error::{AppError, AppResult};
use crate::models::{Auction, AuctionId, AuctionStatus, ReminderRequest};
use chrono::{DateTime, Utc};
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{debug, info};

/// Auction as returned by `GET /auctions/{id}`
#[derive(Debug, Clone, Deserialize)]
pub struct AuctionResource {
    pub status: AuctionStatus,
    #[serde(default)]
    pub current_bid: Decimal,
    #[serde(default)]
    pub minimum_bid: Decimal,
    #[serde(default)]
    pub bid_count: u64,
    #[serde(default)]
    pub actual_start: Option<DateTime<Utc>>,
    #[serde(default)]
    pub ends_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub winner_name: Option<String>,
    #[serde(default)]
    pub final_price: Option<Decimal>,
}

impl AuctionResource {
    pub fn into_auction(self, id: AuctionId) -> Auction {
        Auction {
            id,
            is_live: self.status.is_live(),
            status: self.status,
            current_bid: self.current_bid,
            minimum_bid: self.minimum_bid,
            bid_count: self.bid_count,
            actual_start: self.actual_start,
            ends_at: self.ends_at,
            winner_name: self.winner_name,
            final_price: self.final_price,
        }
    }
}

#[derive(Debug, Deserialize)]
struct DataEnvelope<T> {
    data: T,
}

/// REST client for the auction endpoints this engine depends on.
///
/// The bearer token is passed in explicitly; there is no ambient session.
pub struct AuctionApi {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl AuctionApi {
    pub fn new(config: &ApiConfig) -> AppResult<Self> {
        let client = Client::builder().timeout(config.timeout()).build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
        })
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self
            .client
            .request(method, self.endpoint(path))
            .header(reqwest::header::ACCEPT, "application/json");
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Ask the server to push a reminder `minutes_before` the auction starts
    pub async fn schedule_reminder(&self, id: &AuctionId, minutes_before: u32) -> AppResult<()> {
        if minutes_before == 0 {
            return Err(AppError::Validation(
                "minutes_before must be greater than 0".to_string(),
            ));
        }

        let body = ReminderRequest::push(minutes_before);
        let response = self
            .request(Method::POST, &format!("/auctions/{}/remind", id))
            .json(&body)
            .send()
            .await?;

        check_status(response.status(), id)?;
        info!("Scheduled reminder for auction {} ({} min before)", id, minutes_before);
        Ok(())
    }

    /// Fetch the current state of an auction to seed the store
    pub async fn fetch_auction(&self, id: &AuctionId) -> AppResult<Auction> {
        let response = self
            .request(Method::GET, &format!("/auctions/{}", id))
            .send()
            .await?;

        check_status(response.status(), id)?;
        let envelope: DataEnvelope<AuctionResource> = response.json().await?;
        debug!("Fetched auction {} ({})", id, envelope.data.status.as_str());
        Ok(envelope.data.into_auction(id.clone()))
    }
}

fn check_status(status: StatusCode, id: &AuctionId) -> AppResult<()> {
    if status == StatusCode::NOT_FOUND {
        return Err(AppError::NotFound(format!("auction {}", id)));
    }
    if !status.is_success() {
        return Err(AppError::ExternalService(format!(
            "auction API returned {} for auction {}",
            status, id
        )));
    }
    Ok(())
}
