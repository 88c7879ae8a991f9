use aws_config::{BehaviorVersion, Region};
use aws_credential_types::Credentials;
use aws_sdk_s3::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

pub const DEFAULT_COVER_BUCKET: &str = "vinyl-covers";

#[derive(Error, Debug)]
pub enum CloudStorageError {
    #[error("S3 SDK error: {0}")]
    SdkError(String),
    #[error("Configuration error: {0}")]
    Config(String),
}

/// S3 configuration for the cover image bucket
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct S3Config {
    pub bucket_name: String,
    pub region: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    pub endpoint_url: Option<String>, // For Supabase/MinIO/S3-compatible services
    /// Base URL objects in the bucket are publicly served from
    pub public_base_url: String,
}

impl S3Config {
    pub fn validate(&self) -> Result<(), CloudStorageError> {
        if self.bucket_name.trim().is_empty() {
            return Err(CloudStorageError::Config(
                "Bucket name cannot be empty".to_string(),
            ));
        }
        if self.region.trim().is_empty() {
            return Err(CloudStorageError::Config(
                "Region cannot be empty".to_string(),
            ));
        }
        if self.access_key_id.trim().is_empty() {
            return Err(CloudStorageError::Config(
                "Access key ID cannot be empty".to_string(),
            ));
        }
        if self.secret_access_key.trim().is_empty() {
            return Err(CloudStorageError::Config(
                "Secret access key cannot be empty".to_string(),
            ));
        }
        if self.public_base_url.trim().is_empty() {
            return Err(CloudStorageError::Config(
                "Public base URL cannot be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Public URL an uploaded object is reachable at
    pub fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_base_url.trim_end_matches('/'), key)
    }
}

/// Trait for cloud storage operations (allows mocking for tests)
#[async_trait::async_trait]
pub trait CloudStorage: Send + Sync {
    /// Store an image under `key` and return its public URL
    async fn upload_image(
        &self,
        key: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<String, CloudStorageError>;
}

/// Production S3 cloud storage implementation
pub struct S3CloudStorage {
    client: Client,
    config: S3Config,
}

impl S3CloudStorage {
    /// Create a new S3 cloud storage client
    pub async fn new(config: S3Config) -> Result<Self, CloudStorageError> {
        config.validate()?;

        let credentials = Credentials::new(
            config.access_key_id.clone(),
            config.secret_access_key.clone(),
            None, // session_token
            None, // expiration
            "aces-s3-config",
        );

        let shared_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .credentials_provider(credentials)
            .load()
            .await;

        let mut s3_config = aws_sdk_s3::config::Builder::from(&shared_config);

        // S3-compatible services are addressed path-style
        if let Some(endpoint) = &config.endpoint_url {
            s3_config = s3_config.endpoint_url(endpoint).force_path_style(true);
        }

        let client = Client::from_conf(s3_config.build());

        info!(
            "S3CloudStorage: using bucket '{}' ({})",
            config.bucket_name,
            config.endpoint_url.as_deref().unwrap_or("AWS")
        );

        Ok(S3CloudStorage { client, config })
    }
}

#[async_trait::async_trait]
impl CloudStorage for S3CloudStorage {
    async fn upload_image(
        &self,
        key: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<String, CloudStorageError> {
        debug!(
            "S3CloudStorage: uploading {} ({} bytes, {})",
            key,
            data.len(),
            content_type
        );

        self.client
            .put_object()
            .bucket(&self.config.bucket_name)
            .key(key)
            .body(data.into())
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| CloudStorageError::SdkError(format!("Put object failed: {}", e)))?;

        let url = self.config.public_url(key);
        info!("S3CloudStorage: uploaded {} to {}", key, url);

        Ok(url)
    }
}
