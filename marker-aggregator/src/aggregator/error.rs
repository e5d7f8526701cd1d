//! Error types for aggregation cycles

use thiserror::Error;

/// Result type for aggregation operations
pub type AggregateResult<T> = Result<T, AggregateError>;

/// Errors that terminate an aggregation cycle
///
/// None of these are retried automatically; a new cycle is the retry.
#[derive(Error, Debug)]
pub enum AggregateError {
    /// The signing service call failed or returned non-success
    #[error("Signing service unavailable: {0}")]
    SigningUnavailable(String),

    /// The signing response lacked the expected `signedURLs` array
    #[error("Malformed signing response: {0}")]
    MalformedSigningResponse(String),

    /// At least one signed-URL fetch failed (strict policy)
    #[error("Fetch failed for {url}: {detail}")]
    PartialFetchFailure {
        /// Failing URL, query string stripped
        url: String,
        /// Status text or transport error
        detail: String,
    },

    /// A fetched body was not a valid marker array (strict policy)
    #[error("Malformed marker payload from {url}: {detail}")]
    MalformedMarkerPayload {
        /// Offending URL, query string stripped
        url: String,
        /// Parse or validation error
        detail: String,
    },

    /// The cycle did not settle within the configured deadline
    #[error("Aggregation deadline exceeded")]
    DeadlineExceeded,

    /// The consumer tore down the cycle
    #[error("Aggregation cancelled")]
    Cancelled,
}
