//! S3 backend construction using the object_store crate
//!
//! `object_store` binds one client to one bucket, so the gateway asks for a
//! store per bucket it touches (source buckets and the derivative bucket).

use object_store::{aws::AmazonS3Builder, ObjectStore as ObjectStoreBackend};
use std::sync::Arc;

use crate::domain::{
    errors::{StorageError, StorageResult},
    value_objects::BucketName,
};

/// Configuration for S3 storage backend
#[derive(Debug, Clone, Default)]
pub struct S3Config {
    pub region: Option<String>,
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    /// Custom endpoint for S3-compatible stores (MinIO, LocalStack)
    pub endpoint: Option<String>,
    pub allow_http: bool,
}

/// Create an S3 store for `bucket`.
///
/// Starts from the standard `AWS_*` environment so role credentials in the
/// host work without explicit keys; explicit settings override it.
pub fn create_s3_store(
    config: &S3Config,
    bucket: &BucketName,
) -> StorageResult<Arc<dyn ObjectStoreBackend>> {
    let mut builder = AmazonS3Builder::from_env().with_bucket_name(bucket.as_str());

    if let Some(region) = &config.region {
        builder = builder.with_region(region);
    }

    if let Some(access_key) = &config.access_key {
        builder = builder.with_access_key_id(access_key);
    }

    if let Some(secret_key) = &config.secret_key {
        builder = builder.with_secret_access_key(secret_key);
    }

    if let Some(endpoint) = &config.endpoint {
        builder = builder.with_endpoint(endpoint);
    }

    if config.allow_http {
        builder = builder.with_allow_http(true);
    }

    let store = builder
        .build()
        .map_err(|e| StorageError::InfrastructureError {
            message: format!("Failed to build S3 store for bucket {}", bucket),
            source: Some(e.to_string()),
        })?;

    Ok(Arc::new(store))
}
