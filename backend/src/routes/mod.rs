//! Route handlers for the signing service

mod health;
mod signed_urls;

use axum::{routing::get, Router};

use crate::state::AppState;

/// Creates the router with all handler routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::handler))
        .route(
            "/api/markers/signed-urls",
            get(signed_urls::list_signed_urls),
        )
}
