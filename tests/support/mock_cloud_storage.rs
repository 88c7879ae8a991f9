use aces::cloud_storage::{CloudStorage, CloudStorageError};
use std::collections::HashMap;
use std::sync::Mutex;

pub const MOCK_PUBLIC_BASE: &str = "https://storage.test/vinyl-covers";

/// Stored object: bytes plus content type
#[derive(Debug, Clone, PartialEq)]
pub struct StoredObject {
    pub data: Vec<u8>,
    pub content_type: String,
}

/// In-memory cover storage
#[derive(Default)]
pub struct MockCloudStorage {
    objects: Mutex<HashMap<String, StoredObject>>,
    fail_uploads: bool,
}

impl MockCloudStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage that rejects every upload
    pub fn failing() -> Self {
        Self {
            fail_uploads: true,
            ..Self::default()
        }
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.objects.lock().unwrap().keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn get(&self, key: &str) -> Option<StoredObject> {
        self.objects.lock().unwrap().get(key).cloned()
    }
}

#[async_trait::async_trait]
impl CloudStorage for MockCloudStorage {
    async fn upload_image(
        &self,
        key: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<String, CloudStorageError> {
        if self.fail_uploads {
            return Err(CloudStorageError::SdkError(
                "Put object failed: bucket unavailable".to_string(),
            ));
        }

        self.objects.lock().unwrap().insert(
            key.to_string(),
            StoredObject {
                data,
                content_type: content_type.to_string(),
            },
        );

        Ok(format!("{}/{}", MOCK_PUBLIC_BASE, key))
    }
}
