#![allow(dead_code)]

pub mod fake_discogs;
pub mod mock_cloud_storage;

pub use fake_discogs::{FakeDiscogs, RecordedRequest};
pub use mock_cloud_storage::MockCloudStorage;

use axum::Router;

/// Initialize tracing for tests with proper test output handling
pub fn tracing_init() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// Serve `router` on an ephemeral local port and return its base URL
pub async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("listener address");

    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("test server");
    });

    format!("http://{}", addr)
}
