use crate::discogs::barcode::normalize_barcode;
use crate::discogs::models::{
    DiscogsErrorBody, DiscogsRelease, DiscogsSearchResponse, RateLimit,
};
use crate::discogs::rate_gate::RateGate;
use reqwest::header::{HeaderMap, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::{Client, Error as ReqwestError, StatusCode};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

pub const DISCOGS_API_BASE: &str = "https://api.discogs.com";
pub const DISCOGS_USER_AGENT: &str = "AcesLibrary/1.0";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);
pub const DEFAULT_PER_PAGE: u32 = 20;
/// Quota assumed when Discogs omits the rate limit headers
pub const ASSUMED_RATE_LIMIT: u32 = 60;

#[derive(Error, Debug)]
pub enum DiscogsError {
    #[error("DISCOGS_PERSONAL_ACCESS_TOKEN environment variable is not set")]
    MissingToken,
    #[error("Rate limit exceeded. Please try again later.")]
    RateLimited,
    #[error("{message}")]
    Upstream { status: u16, message: String },
    #[error("HTTP request failed: {0}")]
    Request(#[from] ReqwestError),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DiscogsError {
    /// Worth retrying later without changing the request
    pub fn is_retryable(&self) -> bool {
        matches!(self, DiscogsError::RateLimited)
    }
}

/// Read-only access to the Discogs catalog.
///
/// `DiscogsClient` is the production implementation; the import workflow and
/// the HTTP API only see this trait so they can run against fakes.
#[async_trait::async_trait]
pub trait ReleaseCatalog: Send + Sync {
    async fn search_releases(
        &self,
        query: &str,
        page: u32,
        per_page: u32,
    ) -> Result<DiscogsSearchResponse, DiscogsError>;

    async fn search_by_barcode(&self, barcode: &str)
        -> Result<DiscogsSearchResponse, DiscogsError>;

    async fn get_release(&self, release_id: u64) -> Result<DiscogsRelease, DiscogsError>;

    /// Last quota reported by Discogs, when known
    async fn rate_limit(&self) -> Option<RateLimit> {
        None
    }
}

#[derive(Clone)]
pub struct DiscogsClient {
    client: Client,
    token: String,
    base_url: String,
    rate_gate: Arc<RateGate>,
}

impl std::fmt::Debug for DiscogsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscogsClient")
            .field("base_url", &self.base_url)
            .field("token", &"<redacted>")
            .finish()
    }
}

impl DiscogsClient {
    /// Build a client. A missing or blank token fails immediately.
    pub fn new(
        token: Option<&str>,
        rate_gate: Arc<RateGate>,
        timeout: Duration,
    ) -> Result<Self, DiscogsError> {
        let token = token
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(DiscogsError::MissingToken)?;

        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            token: token.to_string(),
            base_url: DISCOGS_API_BASE.to_string(),
            rate_gate,
        })
    }

    /// Point the client at a different host (tests, caching proxies)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn rate_gate(&self) -> &Arc<RateGate> {
        &self.rate_gate
    }

    /// Search releases by free text (artist, album, ...)
    pub async fn search_releases(
        &self,
        query: &str,
        page: u32,
        per_page: u32,
    ) -> Result<DiscogsSearchResponse, DiscogsError> {
        let params = [
            ("q", query.to_string()),
            ("type", "release".to_string()),
            ("page", page.to_string()),
            ("per_page", per_page.to_string()),
        ];

        let response: DiscogsSearchResponse = self.fetch("/database/search", &params).await?;
        info!(
            "✓ Discogs search '{}' returned {} result(s) (page {}/{})",
            query,
            response.results.len(),
            response.pagination.page,
            response.pagination.pages
        );
        Ok(response)
    }

    /// Search releases by UPC/EAN barcode. Non-digits are stripped before sending.
    pub async fn search_by_barcode(
        &self,
        barcode: &str,
    ) -> Result<DiscogsSearchResponse, DiscogsError> {
        let params = [
            ("barcode", normalize_barcode(barcode)),
            ("type", "release".to_string()),
        ];

        let response: DiscogsSearchResponse = self.fetch("/database/search", &params).await?;
        info!(
            "✓ Discogs barcode search returned {} result(s)",
            response.results.len()
        );
        Ok(response)
    }

    /// Get detailed information about a specific release
    pub async fn get_release(&self, release_id: u64) -> Result<DiscogsRelease, DiscogsError> {
        let release: DiscogsRelease = self
            .fetch(&format!("/releases/{}", release_id), &[])
            .await?;
        debug!(
            "Fetched release {}: '{}' ({} tracklist entries, {} images)",
            release.id,
            release.title,
            release.tracklist.len(),
            release.images.len()
        );
        Ok(release)
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, DiscogsError> {
        self.rate_gate.acquire().await;

        let url = format!("{}{}", self.base_url, path);
        info!("📡 Discogs API: GET {} with params: {:?}", url, params);

        let response = self
            .client
            .get(&url)
            .query(params)
            .header(USER_AGENT, DISCOGS_USER_AGENT)
            .header(AUTHORIZATION, format!("Discogs token={}", self.token))
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| {
                warn!("✗ Discogs request to {} failed: {}", url, e);
                e
            })?;

        let rate_limit = parse_rate_limit_headers(response.headers());
        self.rate_gate
            .record_response(rate_limit, Instant::now())
            .await;

        let status = response.status();
        debug!("Response status: {}", status);

        if status == StatusCode::TOO_MANY_REQUESTS {
            warn!("✗ Discogs rate limit exceeded");
            return Err(DiscogsError::RateLimited);
        }

        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<DiscogsErrorBody>(&body)
                .ok()
                .and_then(|b| b.message)
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| format!("Discogs API error: {}", status.as_u16()));
            warn!("✗ Discogs API error {}: {}", status, message);
            return Err(DiscogsError::Upstream {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str(&body).map_err(|e| {
            error!("JSON parsing error for {}: {}", url, e);
            debug!("Raw response: {}", body);
            DiscogsError::Serialization(e)
        })
    }
}

fn header_u32(headers: &HeaderMap, name: &str, default: u32) -> u32 {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// Read the `X-Discogs-Ratelimit*` headers, assuming a fresh quota when absent
pub fn parse_rate_limit_headers(headers: &HeaderMap) -> RateLimit {
    RateLimit {
        limit: header_u32(headers, "x-discogs-ratelimit", ASSUMED_RATE_LIMIT),
        used: header_u32(headers, "x-discogs-ratelimit-used", 0),
        remaining: header_u32(headers, "x-discogs-ratelimit-remaining", ASSUMED_RATE_LIMIT),
    }
}

#[async_trait::async_trait]
impl ReleaseCatalog for DiscogsClient {
    async fn search_releases(
        &self,
        query: &str,
        page: u32,
        per_page: u32,
    ) -> Result<DiscogsSearchResponse, DiscogsError> {
        DiscogsClient::search_releases(self, query, page, per_page).await
    }

    async fn search_by_barcode(
        &self,
        barcode: &str,
    ) -> Result<DiscogsSearchResponse, DiscogsError> {
        DiscogsClient::search_by_barcode(self, barcode).await
    }

    async fn get_release(&self, release_id: u64) -> Result<DiscogsRelease, DiscogsError> {
        DiscogsClient::get_release(self, release_id).await
    }

    async fn rate_limit(&self) -> Option<RateLimit> {
        self.rate_gate.rate_limit().await
    }
}
