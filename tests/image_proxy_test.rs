mod support;

use aces::image_proxy::{CoverImageProxy, ImageProxy, ImageProxyError};
use std::sync::Arc;
use std::time::Duration;
use support::fake_discogs::PNG_BYTES;
use support::mock_cloud_storage::MOCK_PUBLIC_BASE;
use support::{serve, tracing_init, FakeDiscogs, MockCloudStorage};

async fn setup(storage: Arc<MockCloudStorage>) -> (CoverImageProxy, FakeDiscogs, String) {
    let fake = FakeDiscogs::new();
    let base_url = serve(fake.router()).await;
    let proxy = CoverImageProxy::new(storage, Duration::from_secs(5)).unwrap();
    (proxy, fake, base_url)
}

#[tokio::test]
async fn test_cover_is_copied_into_storage() {
    tracing_init();
    let storage = Arc::new(MockCloudStorage::new());
    let (proxy, fake, base_url) = setup(storage.clone()).await;

    let url = proxy
        .proxy_image(&format!("{}/images/cover.png", base_url), Some("249504"))
        .await
        .unwrap();

    let keys = storage.keys();
    assert_eq!(keys.len(), 1);
    let key = &keys[0];
    assert!(key.starts_with("discogs-249504-"), "unexpected key {}", key);
    assert!(key.ends_with(".png"));
    assert_eq!(url, format!("{}/{}", MOCK_PUBLIC_BASE, key));

    let stored = storage.get(key).unwrap();
    assert_eq!(stored.data, PNG_BYTES);
    assert_eq!(stored.content_type, "image/png");

    let download = &fake.requests()[0];
    assert_eq!(download.headers["user-agent"], "AcesLibrary/1.0");
}

#[tokio::test]
async fn test_key_without_release_id() {
    tracing_init();
    let storage = Arc::new(MockCloudStorage::new());
    let (proxy, _fake, base_url) = setup(storage.clone()).await;

    proxy
        .proxy_image(&format!("{}/images/cover.png", base_url), None)
        .await
        .unwrap();

    let key = &storage.keys()[0];
    let millis = key
        .strip_prefix("discogs-")
        .and_then(|rest| rest.strip_suffix(".png"))
        .unwrap();
    assert!(millis.parse::<i64>().is_ok(), "unexpected key {}", key);
}

#[tokio::test]
async fn test_non_image_content_is_rejected() {
    tracing_init();
    let storage = Arc::new(MockCloudStorage::new());
    let (proxy, _fake, base_url) = setup(storage.clone()).await;

    let err = proxy
        .proxy_image(&format!("{}/images/page.html", base_url), Some("1"))
        .await
        .unwrap_err();

    assert!(matches!(err, ImageProxyError::InvalidFormat(_)));
    assert_eq!(err.to_string(), "Invalid image format");
    assert!(storage.keys().is_empty());
}

#[tokio::test]
async fn test_failed_download_is_reported() {
    tracing_init();
    let storage = Arc::new(MockCloudStorage::new());
    let (proxy, _fake, base_url) = setup(storage.clone()).await;

    let err = proxy
        .proxy_image(&format!("{}/images/missing.png", base_url), Some("1"))
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Failed to fetch image from Discogs");
    assert!(storage.keys().is_empty());
}

#[tokio::test]
async fn test_upload_failure_is_reported() {
    tracing_init();
    let (proxy, _fake, base_url) = setup(Arc::new(MockCloudStorage::failing())).await;

    let err = proxy
        .proxy_image(&format!("{}/images/cover.png", base_url), Some("1"))
        .await
        .unwrap_err();

    assert!(matches!(err, ImageProxyError::Upload(_)));
    assert_eq!(err.to_string(), "Failed to upload image to storage");
}

#[tokio::test]
async fn test_blank_url_is_rejected_without_download() {
    tracing_init();
    let storage = Arc::new(MockCloudStorage::new());
    let (proxy, fake, _base_url) = setup(storage).await;

    let err = proxy.proxy_image("  ", None).await.unwrap_err();

    assert!(matches!(err, ImageProxyError::MissingUrl));
    assert!(fake.requests().is_empty());
}
