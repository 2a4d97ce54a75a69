//! Client for the official Clash Royale API, used to refresh the card catalog.

use std::time::Duration;

use backon::{ExponentialBuilder, Retryable};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

pub const DEFAULT_BASE_URL: &str = "https://api.clashroyale.com/v1";

#[derive(Debug, Clone, Error)]
pub enum ClashApiError {
    #[error("network error: {0}")]
    Transport(String),
    #[error("timeout")]
    Timeout,
    #[error("http {status}: {body}")]
    Http { status: u16, body: String },
    #[error("rate limited")]
    RateLimited,
    #[error("api key rejected (check the key and its allowed IPs)")]
    Forbidden,
    #[error("json error: {0}")]
    Serde(String),
    #[error("missing api key: CLASH_ROYALE_API_KEY is not set")]
    MissingApiKey,
}

impl ClashApiError {
    /// Returns true if the error is transient and should be retried.
    pub fn should_retry(&self) -> bool {
        match self {
            Self::Transport(_) | Self::Timeout | Self::RateLimited => true,
            Self::Http { status, .. } => (500..=599).contains(status),
            _ => false,
        }
    }
}

/// Body of `GET /cards`. Items are kept as raw JSON; ingestion decides which
/// entries are usable.
#[derive(Debug, Deserialize)]
pub struct CardsResponse {
    #[serde(default)]
    pub items: Vec<serde_json::Value>,
}

#[derive(Debug, Clone)]
pub struct ClashApiClient {
    http: Client,
    api_key: String,
    base_url: String,
}

impl ClashApiClient {
    const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

    pub fn new(api_key: Option<String>, base_url: Option<String>) -> Result<Self, ClashApiError> {
        let api_key = api_key
            .filter(|k| !k.trim().is_empty())
            .ok_or(ClashApiError::MissingApiKey)?;
        let http = Client::builder()
            .timeout(Self::REQUEST_TIMEOUT)
            .user_agent(concat!("deckbuilder/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ClashApiError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            api_key,
            base_url: base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
        })
    }

    /// Fetch every card the game currently knows about.
    pub async fn get_cards(&self) -> Result<CardsResponse, ClashApiError> {
        let response = (|| async { self.fetch_cards().await })
            .retry(
                &ExponentialBuilder::default()
                    .with_min_delay(Duration::from_secs(1))
                    .with_max_delay(Duration::from_secs(30))
                    .with_max_times(3)
                    .with_jitter(),
            )
            .when(|e: &ClashApiError| e.should_retry())
            .notify(|e, dur| {
                warn!(
                    "Clash Royale API call failed, retrying after {:.2}s: {}",
                    dur.as_secs_f64(),
                    e
                )
            })
            .await?;
        debug!(cards = response.items.len(), "Fetched cards from Clash Royale API");
        Ok(response)
    }

    async fn fetch_cards(&self) -> Result<CardsResponse, ClashApiError> {
        let res = self
            .http
            .get(format!("{}/cards", self.base_url))
            .bearer_auth(&self.api_key)
            .header("accept", "application/json")
            .send()
            .await
            .map_err(map_reqwest_error)?;

        match res.status() {
            s if s.is_success() => res
                .json::<CardsResponse>()
                .await
                .map_err(|e| ClashApiError::Serde(e.to_string())),
            StatusCode::FORBIDDEN | StatusCode::UNAUTHORIZED => Err(ClashApiError::Forbidden),
            StatusCode::TOO_MANY_REQUESTS => Err(ClashApiError::RateLimited),
            s => {
                let status = s.as_u16();
                let body = res.text().await.unwrap_or_default();
                Err(ClashApiError::Http { status, body })
            }
        }
    }
}

fn map_reqwest_error(e: reqwest::Error) -> ClashApiError {
    if e.is_timeout() {
        ClashApiError::Timeout
    } else {
        ClashApiError::Transport(e.to_string())
    }
}
