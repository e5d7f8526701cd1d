//! Error types for marker storage operations

use aws_sdk_s3::{
    error::SdkError,
    operation::{head_object::HeadObjectError, list_objects_v2::ListObjectsV2Error},
};
use thiserror::Error;

/// Result type for marker storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during marker storage operations
#[derive(Error, Debug)]
pub enum StorageError {
    /// S3 service error
    #[error("S3 service error: {0}")]
    S3Error(String),

    /// AWS SDK error
    #[error("AWS SDK error: {0}")]
    AwsError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Upstream service error (5xx from S3)
    #[error("Upstream service error: {0}")]
    UpstreamError(String),
}

impl From<aws_sdk_s3::Error> for StorageError {
    fn from(error: aws_sdk_s3::Error) -> Self {
        Self::S3Error(error.to_string())
    }
}

impl From<SdkError<ListObjectsV2Error>> for StorageError {
    fn from(error: SdkError<ListObjectsV2Error>) -> Self {
        match error {
            SdkError::ServiceError(err) => Self::S3Error(format!("{:?}", err.err())),
            _ => Self::AwsError(error.to_string()),
        }
    }
}

impl From<SdkError<HeadObjectError>> for StorageError {
    fn from(error: SdkError<HeadObjectError>) -> Self {
        match error {
            SdkError::ServiceError(err) => match err.err() {
                // Not found is expected for the single-object probe
                HeadObjectError::NotFound(_) => Self::S3Error("Object not found".to_string()),
                _ => Self::S3Error(format!("{:?}", err.err())),
            },
            _ => Self::AwsError(error.to_string()),
        }
    }
}
