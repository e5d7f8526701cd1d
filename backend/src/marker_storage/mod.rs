//! S3-based marker document storage operations
mod error;

use std::sync::Arc;
use std::time::Duration;

use aws_credential_types::Credentials;
use aws_sdk_s3::{
    config::{retry::RetryConfig, timeout::TimeoutConfig, BehaviorVersion, Region},
    error::SdkError,
    operation::head_object::HeadObjectError,
    presigning::PresigningConfig,
    Client as S3Client,
};
use chrono::{DateTime, Utc};

pub use error::{StorageError, StorageResult};

const MAX_RETRIES: u32 = 3;
const OPERATION_TIMEOUT_SECS: u64 = 30;

/// Presigned URL with expiration information
#[derive(Debug, Clone)]
pub struct PresignedUrl {
    /// The presigned URL for GET operations
    pub url: String,
    /// ISO-8601 UTC timestamp when the URL expires
    pub expires_at: DateTime<Utc>,
}

/// Storage configuration handed to the marker storage constructor
///
/// Core logic never reads process environment; everything it needs arrives
/// through this struct.
#[derive(Clone)]
pub struct StorageConfig {
    /// S3 bucket holding the marker documents
    pub bucket: String,
    /// AWS region of the bucket
    pub region: String,
    /// Static access key id
    pub access_key: String,
    /// Static secret access key
    pub secret_key: String,
    /// Validity window for presigned GET URLs, in seconds
    pub signed_url_ttl_secs: u64,
    /// Key prefix under which marker documents live, e.g. `temp/`
    pub list_prefix: String,
    /// Endpoint override for LocalStack-style deployments
    pub endpoint_url: Option<String>,
}

impl StorageConfig {
    /// Builds the S3 client configuration for this storage target
    #[must_use]
    pub fn s3_client_config(&self) -> aws_sdk_s3::Config {
        let credentials =
            Credentials::from_keys(self.access_key.clone(), self.secret_key.clone(), None);

        let retry_config = RetryConfig::standard()
            .with_max_attempts(MAX_RETRIES)
            .with_initial_backoff(Duration::from_millis(50));

        let timeout_config = TimeoutConfig::builder()
            .operation_timeout(Duration::from_secs(OPERATION_TIMEOUT_SECS))
            .build();

        let mut builder = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .credentials_provider(credentials)
            .region(Region::new(self.region.clone()))
            .retry_config(retry_config)
            .timeout_config(timeout_config);

        if let Some(endpoint_url) = &self.endpoint_url {
            // Path-style addressing for LocalStack compatibility
            // https://github.com/awslabs/aws-sdk-rust/discussions/874
            builder = builder.endpoint_url(endpoint_url).force_path_style(true);
        }

        builder.build()
    }
}

/// Marker storage client for S3 listing and presigning operations
pub struct MarkerStorage {
    s3_client: Arc<S3Client>,
    config: StorageConfig,
}

impl MarkerStorage {
    /// Creates a new marker storage client from a pre-configured S3 client
    #[must_use]
    pub const fn new(s3_client: Arc<S3Client>, config: StorageConfig) -> Self {
        Self { s3_client, config }
    }

    /// Creates a new marker storage client, building the S3 client from the
    /// given configuration
    #[must_use]
    pub fn from_config(config: StorageConfig) -> Self {
        let s3_client = Arc::new(S3Client::from_conf(config.s3_client_config()));
        Self { s3_client, config }
    }

    /// Lists every marker document key under the configured prefix
    ///
    /// Exhausts continuation tokens page by page before returning, so a
    /// listing larger than the provider page size is never silently
    /// truncated. Only keys ending in `.json` qualify; listing order is
    /// preserved. An empty listing is not an error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::UpstreamError` for 5xx errors after retries
    /// Returns `StorageError::S3Error` for other S3 service errors
    pub async fn list_marker_keys(&self) -> StorageResult<Vec<String>> {
        let mut keys = Vec::new();
        let mut continuation_token: Option<String> = None;

        loop {
            let result = self
                .s3_client
                .list_objects_v2()
                .bucket(&self.config.bucket)
                .prefix(&self.config.list_prefix)
                .set_continuation_token(continuation_token.take())
                .send()
                .await;

            let page = match result {
                Ok(page) => page,
                Err(SdkError::ServiceError(service_err))
                    if service_err.raw().status().as_u16() >= 500 =>
                {
                    return Err(StorageError::UpstreamError(format!("{service_err:?}")));
                }
                Err(e) => return Err(e.into()),
            };

            for object in page.contents() {
                if let Some(key) = object.key() {
                    if key.ends_with(".json") {
                        keys.push(key.to_string());
                    }
                }
            }

            if page.is_truncated() == Some(true) {
                continuation_token = page.next_continuation_token().map(str::to_string);
                if continuation_token.is_none() {
                    break;
                }
            } else {
                break;
            }
        }

        tracing::debug!("Listed {} marker document(s)", keys.len());
        Ok(keys)
    }

    /// Resolves a client-supplied filename to a storage key, if it names an
    /// existing marker document under the configured prefix
    ///
    /// Returns `Ok(None)` for filenames that cannot qualify (wrong extension,
    /// path separators) or that do not exist; nothing to sign is a success.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the existence probe fails.
    pub async fn named_marker_key(&self, filename: &str) -> StorageResult<Option<String>> {
        let Some(key) = marker_key_for(&self.config.list_prefix, filename) else {
            return Ok(None);
        };

        if self.head_exists(&key).await? {
            Ok(Some(key))
        } else {
            Ok(None)
        }
    }

    /// Checks if an object exists in the bucket
    ///
    /// # Errors
    ///
    /// Returns `StorageError::S3Error` for S3 service errors
    /// Returns `StorageError::UpstreamError` for 5xx errors after retries
    pub async fn head_exists(&self, key: &str) -> StorageResult<bool> {
        let result = self
            .s3_client
            .head_object()
            .bucket(&self.config.bucket)
            .key(key)
            .send()
            .await;

        match result {
            Ok(_) => Ok(true),
            Err(SdkError::ServiceError(service_err))
                if matches!(service_err.err(), HeadObjectError::NotFound(_)) =>
            {
                Ok(false)
            }
            Err(SdkError::ServiceError(service_err))
                if service_err.raw().status().as_u16() >= 500 =>
            {
                Err(StorageError::UpstreamError(format!("{service_err:?}")))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Generates a presigned GET URL for one marker document
    ///
    /// Signing is a local operation against the configured credentials; it
    /// makes no network call.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::ConfigError` if presigning config creation fails
    /// Returns `StorageError::S3Error` if presigned URL generation fails
    pub async fn presign_get(&self, key: &str) -> StorageResult<PresignedUrl> {
        let presigned_config =
            PresigningConfig::expires_in(Duration::from_secs(self.config.signed_url_ttl_secs))
                .map_err(|e| {
                    StorageError::ConfigError(format!("Failed to create presigning config: {e}"))
                })?;

        let presigned_url = self
            .s3_client
            .get_object()
            .bucket(&self.config.bucket)
            .key(key)
            .presigned(presigned_config)
            .await
            .map_err(|e| StorageError::S3Error(format!("Failed to generate presigned URL: {e}")))?;

        let expires_at: DateTime<Utc> =
            Utc::now() + Duration::from_secs(self.config.signed_url_ttl_secs);

        Ok(PresignedUrl {
            url: presigned_url.uri().to_string(),
            expires_at,
        })
    }
}

/// Maps a client-supplied filename to a prefixed storage key
///
/// Only bare `.json` filenames qualify; anything with a path separator is
/// rejected.
#[must_use]
pub fn marker_key_for(prefix: &str, filename: &str) -> Option<String> {
    if filename.is_empty()
        || filename.contains('/')
        || filename.contains('\\')
        || !filename.ends_with(".json")
    {
        return None;
    }
    Some(format!("{prefix}{filename}"))
}
