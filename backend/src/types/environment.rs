//! Environment configuration for different deployment stages

use std::env;

use tracing::Level;

use crate::marker_storage::StorageConfig;

/// Presigned URL validity window unless overridden, in seconds
const DEFAULT_SIGNED_URL_TTL_SECS: u64 = 60;

/// Application environment configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    /// Production environment
    Production,
    /// Staging environment
    Staging,
    /// Development environment (uses `LocalStack`)
    Development {
        /// Optional override for presigned URL expiry in seconds
        presign_expiry_override: Option<u64>,
    },
}

impl Environment {
    /// Creates an Environment from the `APP_ENV` environment variable
    ///
    /// # Panics
    ///
    /// Panics if `APP_ENV` contains an invalid value
    #[must_use]
    pub fn from_env() -> Self {
        let env = env::var("APP_ENV")
            .unwrap_or_else(|_| "development".to_string())
            .trim()
            .to_lowercase();

        match env.as_str() {
            "production" => Self::Production,
            "staging" => Self::Staging,
            "development" => {
                // Check for presigned URL expiry override
                let presign_expiry_override = env::var("PRESIGNED_URL_EXPIRY_SECS")
                    .ok()
                    .and_then(|val| val.parse::<u64>().ok());

                Self::Development {
                    presign_expiry_override,
                }
            }
            _ => panic!("Invalid environment: {env}"),
        }
    }

    /// Returns the S3 bucket name for the environment
    ///
    /// # Panics
    ///
    /// Panics if the `S3_BUCKET_NAME` environment variable is not set outside
    /// of development
    #[must_use]
    pub fn s3_bucket(&self) -> String {
        match self {
            Self::Production | Self::Staging => {
                env::var("S3_BUCKET_NAME").expect("S3_BUCKET_NAME environment variable is not set")
            }
            Self::Development { .. } => {
                env::var("S3_BUCKET_NAME").unwrap_or_else(|_| "pathguard-markers".to_string())
            }
        }
    }

    /// Returns the AWS region of the marker bucket
    #[must_use]
    pub fn aws_region(&self) -> String {
        env::var("AWS_REGION").unwrap_or_else(|_| "ca-central-1".to_string())
    }

    /// Returns the static AWS credentials for URL signing
    ///
    /// # Panics
    ///
    /// Panics if the credential environment variables are not set outside of
    /// development
    #[must_use]
    pub fn aws_credentials(&self) -> (String, String) {
        match self {
            Self::Production | Self::Staging => (
                env::var("AWS_ACCESS_KEY_ID")
                    .expect("AWS_ACCESS_KEY_ID environment variable is not set"),
                env::var("AWS_SECRET_ACCESS_KEY")
                    .expect("AWS_SECRET_ACCESS_KEY environment variable is not set"),
            ),
            Self::Development { .. } => (
                env::var("AWS_ACCESS_KEY_ID").unwrap_or_else(|_| "test".to_string()),
                env::var("AWS_SECRET_ACCESS_KEY").unwrap_or_else(|_| "test".to_string()),
            ),
        }
    }

    /// Returns the key prefix under which marker documents live
    #[must_use]
    pub fn list_prefix(&self) -> String {
        env::var("MARKER_LIST_PREFIX").unwrap_or_else(|_| "temp/".to_string())
    }

    /// Returns the endpoint URL to use for AWS services
    #[must_use]
    pub fn override_aws_endpoint_url(&self) -> Option<String> {
        match self {
            // Regular AWS endpoints for production and staging
            Self::Production | Self::Staging => None,
            // LocalStack endpoint for development
            Self::Development { .. } => Some(
                env::var("AWS_ENDPOINT_URL")
                    .unwrap_or_else(|_| "http://localhost:4566".to_string()),
            ),
        }
    }

    /// Presigned URL expiry time in seconds
    #[must_use]
    pub fn signed_url_ttl_secs(&self) -> u64 {
        match self {
            Self::Production | Self::Staging => DEFAULT_SIGNED_URL_TTL_SECS,
            Self::Development {
                presign_expiry_override,
            } => presign_expiry_override.unwrap_or(DEFAULT_SIGNED_URL_TTL_SECS),
        }
    }

    /// Builds the explicit storage configuration handed to `MarkerStorage`
    #[must_use]
    pub fn storage_config(&self) -> StorageConfig {
        let (access_key, secret_key) = self.aws_credentials();

        StorageConfig {
            bucket: self.s3_bucket(),
            region: self.aws_region(),
            access_key,
            secret_key,
            signed_url_ttl_secs: self.signed_url_ttl_secs(),
            list_prefix: self.list_prefix(),
            endpoint_url: self.override_aws_endpoint_url(),
        }
    }

    /// Log level for the environment, overridable via `TRACING_LEVEL`
    #[must_use]
    pub fn tracing_level(&self) -> Level {
        env::var("TRACING_LEVEL")
            .ok()
            .and_then(|val| val.parse::<Level>().ok())
            .unwrap_or(match self {
                Self::Production | Self::Staging => Level::INFO,
                Self::Development { .. } => Level::DEBUG,
            })
    }
}
