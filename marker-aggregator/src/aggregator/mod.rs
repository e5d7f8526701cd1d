//! Aggregation cycle: signing call, fan-out fetch, ordered flatten

mod error;
mod feed;

use std::fmt;
use std::time::Duration;

use futures::future::join_all;
use marker_types::Marker;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

pub use error::{AggregateError, AggregateResult};
pub use feed::{FetchState, MarkerFeed};

/// How the aggregator treats individual fetch failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchPolicy {
    /// Any failed fetch fails the whole cycle; no partial marker set escapes
    #[default]
    Strict,
    /// Failed fetches are reported alongside the markers that did arrive
    Lenient,
}

/// Configuration for one aggregator instance
#[derive(Debug, Clone)]
pub struct AggregatorConfig {
    /// URL of the signing service endpoint
    pub signing_endpoint: String,
    /// Failure policy for the fan-out phase
    pub fetch_policy: FetchPolicy,
    /// Timeout applied to each individual fetch
    pub per_fetch_timeout: Duration,
    /// Deadline for the whole cycle, signing call included
    pub overall_deadline: Duration,
}

impl AggregatorConfig {
    /// Creates a configuration with default policy and timeouts
    #[must_use]
    pub fn new(signing_endpoint: impl Into<String>) -> Self {
        Self {
            signing_endpoint: signing_endpoint.into(),
            fetch_policy: FetchPolicy::Strict,
            per_fetch_timeout: Duration::from_secs(10),
            overall_deadline: Duration::from_secs(30),
        }
    }
}

/// One failed signed-URL fetch
#[derive(Debug, Clone)]
pub struct FetchFailure {
    /// Failing URL with the signature query stripped
    pub url: String,
    /// What went wrong
    pub reason: FetchFailureReason,
}

/// Why a signed-URL fetch failed
#[derive(Debug, Clone)]
pub enum FetchFailureReason {
    /// Non-success HTTP status, e.g. an expired signature
    Status(String),
    /// Transport error or per-fetch timeout
    Transport(String),
    /// Body was not a valid marker array
    Malformed(String),
}

impl fmt::Display for FetchFailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Status(detail) | Self::Transport(detail) | Self::Malformed(detail) => {
                f.write_str(detail)
            }
        }
    }
}

impl fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.url, self.reason)
    }
}

impl FetchFailure {
    fn into_strict_error(self) -> AggregateError {
        match self.reason {
            FetchFailureReason::Malformed(detail) => AggregateError::MalformedMarkerPayload {
                url: self.url,
                detail,
            },
            FetchFailureReason::Status(detail) | FetchFailureReason::Transport(detail) => {
                AggregateError::PartialFetchFailure {
                    url: self.url,
                    detail,
                }
            }
        }
    }
}

/// Result of one completed aggregation cycle
///
/// Under the strict policy `failures` is always empty; under the lenient
/// policy it lists every fetch that did not contribute markers.
#[derive(Debug, Clone, Default)]
pub struct Aggregation {
    /// All markers, flattened in signed-URL order
    pub markers: Vec<Marker>,
    /// Fetches that failed (lenient policy only)
    pub failures: Vec<FetchFailure>,
}

#[derive(Deserialize)]
struct SigningResponse {
    #[serde(rename = "signedURLs")]
    signed_urls: Option<Vec<String>>,
}

/// Runs aggregation cycles against a signing service
pub struct Aggregator {
    config: AggregatorConfig,
    http: reqwest::Client,
}

impl Aggregator {
    /// Creates a new aggregator
    #[must_use]
    pub const fn new(config: AggregatorConfig, http: reqwest::Client) -> Self {
        Self { config, http }
    }

    /// Runs one full aggregation cycle
    ///
    /// The cycle is bounded by the configured overall deadline and can be
    /// torn down early through `cancel`; both outcomes surface as errors
    /// rather than an indefinitely pending future.
    ///
    /// # Errors
    ///
    /// Returns `AggregateError` when the signing call fails, when its
    /// response is malformed, when the deadline or cancellation fires, or —
    /// under the strict policy — when any individual fetch fails.
    #[instrument(skip(self, cancel), fields(endpoint = %self.config.signing_endpoint))]
    pub async fn run(&self, cancel: &CancellationToken) -> AggregateResult<Aggregation> {
        tokio::select! {
            () = cancel.cancelled() => Err(AggregateError::Cancelled),
            () = tokio::time::sleep(self.config.overall_deadline) => {
                Err(AggregateError::DeadlineExceeded)
            }
            result = self.run_cycle() => result,
        }
    }

    async fn run_cycle(&self) -> AggregateResult<Aggregation> {
        // Step 1: obtain the signed URL list
        let response = self
            .http
            .get(&self.config.signing_endpoint)
            .send()
            .await
            .map_err(|e| AggregateError::SigningUnavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AggregateError::SigningUnavailable(format!(
                "signing service returned {status}"
            )));
        }

        // Step 2: extract the array; a missing key fails explicitly instead
        // of surfacing as a downstream type error
        let signing: SigningResponse = response
            .json()
            .await
            .map_err(|e| AggregateError::MalformedSigningResponse(e.to_string()))?;
        let signed_urls = signing.signed_urls.ok_or_else(|| {
            AggregateError::MalformedSigningResponse("signedURLs key missing".to_string())
        })?;

        info!("Fetching {} marker document(s)", signed_urls.len());

        // Step 3: full fan-out against the storage provider
        let fetches = signed_urls.iter().map(|url| self.fetch_markers(url));

        // Step 4: deterministic join; join_all preserves signed-URL order
        let settled = join_all(fetches).await;

        let mut batches = Vec::with_capacity(settled.len());
        let mut failures = Vec::new();
        for result in settled {
            match result {
                Ok(markers) => batches.push(markers),
                Err(failure) => failures.push(failure),
            }
        }

        // Step 5: flatten per-document arrays, then apply the failure policy
        match self.config.fetch_policy {
            FetchPolicy::Strict => match failures.into_iter().next() {
                Some(failure) => Err(failure.into_strict_error()),
                None => Ok(Aggregation {
                    markers: flatten_batches(batches),
                    failures: Vec::new(),
                }),
            },
            FetchPolicy::Lenient => {
                if !failures.is_empty() {
                    warn!("{} document fetch(es) failed, continuing", failures.len());
                }
                Ok(Aggregation {
                    markers: flatten_batches(batches),
                    failures,
                })
            }
        }
    }

    async fn fetch_markers(&self, url: &str) -> Result<Vec<Marker>, FetchFailure> {
        let fail = |reason| FetchFailure {
            url: redact_query(url),
            reason,
        };

        let response = self
            .http
            .get(url)
            .timeout(self.config.per_fetch_timeout)
            .send()
            .await
            .map_err(|e| fail(FetchFailureReason::Transport(e.to_string())))?;

        let status = response.status();
        if !status.is_success() {
            return Err(fail(FetchFailureReason::Status(status.to_string())));
        }

        let markers: Vec<Marker> = response
            .json()
            .await
            .map_err(|e| fail(FetchFailureReason::Malformed(e.to_string())))?;

        for marker in &markers {
            marker
                .validate()
                .map_err(|e| fail(FetchFailureReason::Malformed(e.to_string())))?;
        }

        Ok(markers)
    }
}

/// Concatenates per-document marker arrays in order
fn flatten_batches(batches: Vec<Vec<Marker>>) -> Vec<Marker> {
    batches.into_iter().flatten().collect()
}

/// Strips the signature query from a presigned URL before recording it
fn redact_query(url: &str) -> String {
    url.split('?').next().unwrap_or(url).to_string()
}
