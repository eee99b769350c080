use crate::domain::{
    errors::StorageError,
    value_objects::{BucketName, ObjectKey},
};

/// Translate an object_store error for a known object into the domain
pub fn object_error(err: object_store::Error, bucket: &BucketName, key: &ObjectKey) -> StorageError {
    match err {
        object_store::Error::NotFound { .. } => StorageError::ObjectNotFound {
            bucket: bucket.clone(),
            key: key.clone(),
        },
        object_store::Error::PermissionDenied { .. }
        | object_store::Error::Unauthenticated { .. } => StorageError::AccessDenied {
            bucket: bucket.clone(),
            key: key.clone(),
            operation: err.to_string(),
        },
        other => other.into(),
    }
}

/// Convert object_store errors to domain storage errors
impl From<object_store::Error> for StorageError {
    fn from(err: object_store::Error) -> Self {
        match err {
            object_store::Error::NotSupported { .. } | object_store::Error::NotImplemented => {
                StorageError::UnsupportedOperation {
                    operation: "object_store".to_string(),
                    reason: err.to_string(),
                }
            }
            object_store::Error::InvalidPath { .. } => StorageError::ValidationError {
                message: err.to_string(),
            },
            _ => StorageError::InfrastructureError {
                message: format!("Object store operation failed: {}", err),
                source: Some(err.to_string()),
            },
        }
    }
}

/// Convert standard io::Error (local staging) to domain errors
impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        StorageError::InfrastructureError {
            message: format!("IO error: {}", err),
            source: Some(err.kind().to_string()),
        }
    }
}
