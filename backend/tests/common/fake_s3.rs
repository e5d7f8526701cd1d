//! In-process stand-in for the S3 REST surface the signing service touches:
//! path-style ListObjectsV2, HeadObject, and GetObject.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use tokio::net::TcpListener;

struct FakeS3State {
    /// Key to body, kept sorted by key like a real listing
    objects: Vec<(String, String)>,
    page_size: usize,
    fail_listing: bool,
}

/// Handle to a running fake S3 endpoint
#[derive(Clone)]
pub struct FakeS3 {
    pub addr: SocketAddr,
}

impl FakeS3 {
    pub fn endpoint_url(&self) -> String {
        format!("http://{}", self.addr)
    }
}

/// Starts a fake S3 server with the given objects and listing page size
pub async fn start_fake_s3(objects: Vec<(&str, &str)>, page_size: usize) -> FakeS3 {
    start_fake_s3_inner(objects, page_size, false).await
}

/// Starts a fake S3 server whose listing calls always fail with a 500
pub async fn start_failing_fake_s3() -> FakeS3 {
    start_fake_s3_inner(Vec::new(), 1000, true).await
}

async fn start_fake_s3_inner(
    objects: Vec<(&str, &str)>,
    page_size: usize,
    fail_listing: bool,
) -> FakeS3 {
    let mut objects: Vec<(String, String)> = objects
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    objects.sort_by(|a, b| a.0.cmp(&b.0));

    let state = Arc::new(FakeS3State {
        objects,
        page_size,
        fail_listing,
    });

    let router = Router::new()
        .route("/{bucket}", get(list_objects))
        // Path-style ListObjectsV2 targets the bucket with a trailing slash
        // (`/{bucket}/?list-type=2`); axum 0.8 treats that as a distinct path
        // from `/{bucket}`, so register both against the listing handler.
        .route("/{bucket}/", get(list_objects))
        .route("/{bucket}/{*key}", get(get_object))
        .with_state(state);

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind fake S3 listener");
    let addr = listener.local_addr().expect("Failed to read local addr");

    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("Fake S3 died");
    });

    FakeS3 { addr }
}

async fn list_objects(
    State(state): State<Arc<FakeS3State>>,
    Path(bucket): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if state.fail_listing {
        return xml_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
             <Error><Code>InternalError</Code>\
             <Message>We encountered an internal error.</Message></Error>"
                .to_string(),
        );
    }

    let prefix = params.get("prefix").cloned().unwrap_or_default();
    let start: usize = params
        .get("continuation-token")
        .and_then(|t| t.parse().ok())
        .unwrap_or(0);

    let matching: Vec<&(String, String)> = state
        .objects
        .iter()
        .filter(|(key, _)| key.starts_with(&prefix))
        .collect();

    let end = (start + state.page_size).min(matching.len());
    let page = &matching[start.min(matching.len())..end];
    let is_truncated = end < matching.len();

    let mut xml = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
         <ListBucketResult xmlns=\"http://s3.amazonaws.com/doc/2006-03-01/\">",
    );
    xml.push_str(&format!(
        "<Name>{bucket}</Name><Prefix>{prefix}</Prefix>\
         <MaxKeys>{}</MaxKeys><KeyCount>{}</KeyCount>\
         <IsTruncated>{is_truncated}</IsTruncated>",
        state.page_size,
        page.len(),
    ));
    if is_truncated {
        xml.push_str(&format!("<NextContinuationToken>{end}</NextContinuationToken>"));
    }
    for (key, body) in page {
        xml.push_str(&format!(
            "<Contents><Key>{key}</Key>\
             <LastModified>2024-01-01T00:00:00.000Z</LastModified>\
             <ETag>&quot;0&quot;</ETag><Size>{}</Size>\
             <StorageClass>STANDARD</StorageClass></Contents>",
            body.len(),
        ));
    }
    xml.push_str("</ListBucketResult>");

    xml_response(StatusCode::OK, xml)
}

async fn get_object(
    State(state): State<Arc<FakeS3State>>,
    Path((_bucket, key)): Path<(String, String)>,
) -> Response {
    match state.objects.iter().find(|(k, _)| *k == key) {
        Some((_, body)) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/json")],
            body.clone(),
        )
            .into_response(),
        None => xml_response(
            StatusCode::NOT_FOUND,
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
             <Error><Code>NoSuchKey</Code>\
             <Message>The specified key does not exist.</Message></Error>"
                .to_string(),
        ),
    }
}

fn xml_response(status: StatusCode, xml: String) -> Response {
    (status, [(header::CONTENT_TYPE, "application/xml")], xml).into_response()
}
