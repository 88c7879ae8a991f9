//! Copying externally hosted cover images into our own storage.

use crate::cloud_storage::{CloudStorage, CloudStorageError};
use crate::discogs::client::DISCOGS_USER_AGENT;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

const DEFAULT_CONTENT_TYPE: &str = "image/jpeg";

#[derive(Error, Debug)]
pub enum ImageProxyError {
    #[error("Image URL is required")]
    MissingUrl,
    #[error("Failed to fetch image from Discogs")]
    Fetch(Option<reqwest::Error>),
    #[error("Invalid image format")]
    InvalidFormat(String),
    #[error("Failed to upload image to storage")]
    Upload(#[from] CloudStorageError),
}

/// Fetches an external image and returns a stable URL we host
#[async_trait::async_trait]
pub trait ImageProxy: Send + Sync {
    async fn proxy_image(
        &self,
        image_url: &str,
        discogs_id: Option<&str>,
    ) -> Result<String, ImageProxyError>;
}

/// File extension for a content type, defaulting to jpg
pub fn extension_for(content_type: &str) -> &'static str {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    match mime.as_str() {
        "image/png" => "png",
        "image/webp" => "webp",
        "image/gif" => "gif",
        _ => "jpg",
    }
}

/// Storage key for a proxied cover: `discogs-{id}-{millis}.{ext}`
pub fn cover_key(discogs_id: Option<&str>, timestamp_millis: i64, extension: &str) -> String {
    match discogs_id.filter(|id| !id.is_empty()) {
        Some(id) => format!("discogs-{}-{}.{}", id, timestamp_millis, extension),
        None => format!("discogs-{}.{}", timestamp_millis, extension),
    }
}

/// Downloads with reqwest and uploads through a `CloudStorage`
pub struct CoverImageProxy {
    client: Client,
    storage: Arc<dyn CloudStorage>,
}

impl CoverImageProxy {
    pub fn new(storage: Arc<dyn CloudStorage>, timeout: Duration) -> Result<Self, ImageProxyError> {
        let client = Client::builder()
            .user_agent(DISCOGS_USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| ImageProxyError::Fetch(Some(e)))?;

        Ok(Self { client, storage })
    }
}

#[async_trait::async_trait]
impl ImageProxy for CoverImageProxy {
    async fn proxy_image(
        &self,
        image_url: &str,
        discogs_id: Option<&str>,
    ) -> Result<String, ImageProxyError> {
        if image_url.trim().is_empty() {
            return Err(ImageProxyError::MissingUrl);
        }

        info!("Proxying cover image {}", image_url);

        let response = self.client.get(image_url).send().await.map_err(|e| {
            warn!("Failed to fetch cover image {}: {}", image_url, e);
            ImageProxyError::Fetch(Some(e))
        })?;

        if !response.status().is_success() {
            warn!(
                "Cover image download failed with status {}",
                response.status()
            );
            return Err(ImageProxyError::Fetch(None));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or(DEFAULT_CONTENT_TYPE)
            .to_string();

        if !content_type.starts_with("image/") {
            warn!("Refusing to proxy non-image content type '{}'", content_type);
            return Err(ImageProxyError::InvalidFormat(content_type));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ImageProxyError::Fetch(Some(e)))?;

        let key = cover_key(
            discogs_id,
            chrono::Utc::now().timestamp_millis(),
            extension_for(&content_type),
        );

        let url = self
            .storage
            .upload_image(&key, bytes.to_vec(), &content_type)
            .await?;

        info!("Proxied cover image ({} bytes) to {}", bytes.len(), url);
        Ok(url)
    }
}
