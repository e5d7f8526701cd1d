use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::{state::AppState, types::AppError};

#[derive(Debug, Deserialize)]
pub struct SignedUrlsQuery {
    /// Optional marker document filename; signs that one object instead of
    /// the whole prefix
    pub filename: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SignedUrlsResponse {
    /// One presigned GET URL per qualifying marker document, in listing order
    #[serde(rename = "signedURLs")]
    pub signed_urls: Vec<String>,
}

/// Lists marker documents and mints one short-lived presigned GET URL per
/// qualifying object
///
/// All-or-nothing: any listing or signing failure fails the whole request.
/// An empty listing is a success with an empty array.
#[instrument(skip(app_state))]
pub async fn list_signed_urls(
    State(app_state): State<AppState>,
    Query(query): Query<SignedUrlsQuery>,
) -> Result<Json<SignedUrlsResponse>, AppError> {
    let storage = &app_state.marker_storage;

    // Step 1: Resolve the set of keys to sign
    let keys = match &query.filename {
        Some(filename) => {
            debug!("Resolving named marker document: {filename}");
            storage
                .named_marker_key(filename)
                .await?
                .into_iter()
                .collect()
        }
        None => storage.list_marker_keys().await?,
    };

    // Step 2: Mint one presigned URL per key, preserving listing order
    let mut signed_urls = Vec::with_capacity(keys.len());
    for key in &keys {
        let presigned = storage.presign_get(key).await?;
        signed_urls.push(presigned.url);
    }

    info!("Issued {} signed URL(s)", signed_urls.len());

    Ok(Json(SignedUrlsResponse { signed_urls }))
}
