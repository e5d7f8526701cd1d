use std::sync::Arc;

use axum::body::Body;
use backend::{
    marker_storage::{MarkerStorage, StorageConfig},
    routes,
    state::AppState,
};
use http::{Request, StatusCode};
use http_body_util::BodyExt;

use super::FakeS3;

pub const TEST_BUCKET: &str = "pathguard-markers";

/// Storage configuration pointed at a fake S3 endpoint
pub fn test_storage_config(fake: &FakeS3, signed_url_ttl_secs: u64) -> StorageConfig {
    StorageConfig {
        bucket: TEST_BUCKET.to_string(),
        region: "ca-central-1".to_string(),
        access_key: "test".to_string(),
        secret_key: "test".to_string(),
        signed_url_ttl_secs,
        list_prefix: "temp/".to_string(),
        endpoint_url: Some(fake.endpoint_url()),
    }
}

/// Test router wired to a fake S3 endpoint
pub fn test_router(fake: &FakeS3, signed_url_ttl_secs: u64) -> axum::Router {
    let marker_storage = Arc::new(MarkerStorage::from_config(test_storage_config(
        fake,
        signed_url_ttl_secs,
    )));

    routes::routes().with_state(AppState { marker_storage })
}

/// Sends a GET request through the router and parses the JSON body
pub async fn get_json(router: axum::Router, uri: &str) -> (StatusCode, serde_json::Value) {
    use tower::ServiceExt;

    let response = router
        .oneshot(
            Request::builder()
                .uri(uri)
                .body(Body::empty())
                .expect("Failed to build request"),
        )
        .await
        .expect("Request failed");

    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("Failed to read body")
        .to_bytes();
    let body = serde_json::from_slice(&bytes).expect("Body was not JSON");

    (status, body)
}
