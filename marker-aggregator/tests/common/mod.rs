// Not every utils is used in every test, so we allow dead code
#![allow(unused_imports, dead_code)]

//! In-process stand-in for the signing service and the object store the
//! presigned URLs point at.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use tokio::net::TcpListener;

use marker_aggregator::{Aggregator, AggregatorConfig, FetchPolicy};

/// One object served behind a fake presigned URL
pub struct FixtureObject {
    pub name: &'static str,
    pub status: StatusCode,
    pub body: &'static str,
    pub delay: Duration,
}

impl FixtureObject {
    pub fn ok(name: &'static str, body: &'static str) -> Self {
        Self {
            name,
            status: StatusCode::OK,
            body,
            delay: Duration::ZERO,
        }
    }

    pub fn with_status(name: &'static str, status: StatusCode, body: &'static str) -> Self {
        Self {
            name,
            status,
            body,
            delay: Duration::ZERO,
        }
    }

    pub fn delayed(name: &'static str, body: &'static str, delay: Duration) -> Self {
        Self {
            name,
            status: StatusCode::OK,
            body,
            delay,
        }
    }
}

/// How the fixture signing endpoint behaves
pub enum SigningBehavior {
    /// Return one fake presigned URL per configured object
    ListAll,
    /// Fail with the given status
    Fail(StatusCode),
    /// Return the given raw body with a 200
    Malformed(&'static str),
}

struct FixtureState {
    addr: SocketAddr,
    objects: Vec<FixtureObject>,
    behavior: SigningBehavior,
    object_hits: AtomicUsize,
}

/// Handle to a running fixture server
pub struct MarkerFixture {
    pub addr: SocketAddr,
    state: Arc<FixtureState>,
}

impl MarkerFixture {
    pub async fn start(behavior: SigningBehavior, objects: Vec<FixtureObject>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind fixture listener");
        let addr = listener.local_addr().expect("Failed to read local addr");

        let state = Arc::new(FixtureState {
            addr,
            objects,
            behavior,
            object_hits: AtomicUsize::new(0),
        });

        let router = Router::new()
            .route("/api/markers/signed-urls", get(signing_handler))
            .route("/objects/{name}", get(object_handler))
            .with_state(Arc::clone(&state));

        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("Fixture died");
        });

        Self { addr, state }
    }

    pub fn signing_endpoint(&self) -> String {
        format!("http://{}/api/markers/signed-urls", self.addr)
    }

    /// Number of object fetches the fixture has served
    pub fn object_hits(&self) -> usize {
        self.state.object_hits.load(Ordering::SeqCst)
    }
}

/// Aggregator wired to the fixture with test-sized timeouts
pub fn aggregator_for(fixture: &MarkerFixture, policy: FetchPolicy) -> Aggregator {
    let mut config = AggregatorConfig::new(fixture.signing_endpoint());
    config.fetch_policy = policy;
    config.per_fetch_timeout = Duration::from_secs(2);
    config.overall_deadline = Duration::from_secs(10);

    Aggregator::new(config, reqwest::Client::new())
}

async fn signing_handler(State(state): State<Arc<FixtureState>>) -> Response {
    match &state.behavior {
        SigningBehavior::Fail(status) => {
            (*status, Json(json!({ "error": "Failed to generate URL" }))).into_response()
        }
        SigningBehavior::Malformed(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/json")],
            (*body).to_string(),
        )
            .into_response(),
        SigningBehavior::ListAll => {
            let urls: Vec<String> = state
                .objects
                .iter()
                .map(|o| {
                    format!(
                        "http://{}/objects/{}?X-Amz-Signature=fixture&X-Amz-Expires=60",
                        state.addr, o.name
                    )
                })
                .collect();
            Json(json!({ "signedURLs": urls })).into_response()
        }
    }
}

async fn object_handler(
    State(state): State<Arc<FixtureState>>,
    Path(name): Path<String>,
) -> Response {
    state.object_hits.fetch_add(1, Ordering::SeqCst);

    match state.objects.iter().find(|o| o.name == name) {
        Some(object) => {
            if object.delay > Duration::ZERO {
                tokio::time::sleep(object.delay).await;
            }
            (
                object.status,
                [(header::CONTENT_TYPE, "application/json")],
                object.body.to_string(),
            )
                .into_response()
        }
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
