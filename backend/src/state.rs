//! Application state management

use std::sync::Arc;

use crate::marker_storage::MarkerStorage;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// S3 marker storage client used for listing and presigning
    pub marker_storage: Arc<MarkerStorage>,
}
