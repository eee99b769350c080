use crate::domain::value_objects::{BucketName, ObjectKey};

/// Errors that can occur while talking to the object store
#[derive(Debug, Clone)]
pub enum StorageError {
    /// Object not found
    ObjectNotFound { bucket: BucketName, key: ObjectKey },

    /// Access denied
    AccessDenied {
        bucket: BucketName,
        key: ObjectKey,
        operation: String,
    },

    /// Bucket or key rejected before reaching the store
    ValidationError { message: String },

    /// Operation not supported by the configured backend
    UnsupportedOperation { operation: String, reason: String },

    /// Infrastructure error with external source
    InfrastructureError {
        message: String,
        source: Option<String>, // Store error as string to allow Clone
    },
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::ObjectNotFound { bucket, key } => {
                write!(f, "Object not found: {}/{}", bucket, key)
            }
            StorageError::AccessDenied {
                bucket,
                key,
                operation,
            } => {
                write!(
                    f,
                    "Access denied for operation '{}' on object: {}/{}",
                    operation, bucket, key
                )
            }
            StorageError::ValidationError { message } => {
                write!(f, "Validation error: {}", message)
            }
            StorageError::UnsupportedOperation { operation, reason } => {
                write!(f, "Unsupported operation '{}': {}", operation, reason)
            }
            StorageError::InfrastructureError { message, .. } => {
                write!(f, "Infrastructure error: {}", message)
            }
        }
    }
}

impl std::error::Error for StorageError {}

impl From<crate::domain::errors::ValidationError> for StorageError {
    fn from(err: crate::domain::errors::ValidationError) -> Self {
        StorageError::ValidationError {
            message: err.to_string(),
        }
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;
