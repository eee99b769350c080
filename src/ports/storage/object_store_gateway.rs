use crate::domain::{
    errors::StorageResult,
    value_objects::{BucketName, ObjectKey},
};
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};

/// Streamed object body
pub type ByteStream = BoxStream<'static, StorageResult<Bytes>>;

/// Port for the object store holding originals and derivatives.
/// This abstracts the actual storage backend (S3, local disk, memory).
#[async_trait]
pub trait ObjectStoreGateway: Send + Sync + 'static {
    /// Stream the body of `bucket`/`key`
    async fn fetch(&self, bucket: &BucketName, key: &ObjectKey) -> StorageResult<ByteStream>;

    /// Write `request.data` to `bucket`/`key`, overwriting any existing object
    async fn store(
        &self,
        bucket: &BucketName,
        key: &ObjectKey,
        request: StoreRequest,
    ) -> StorageResult<StoreAck>;
}

/// Body and headers for a single upload
#[derive(Debug, Clone)]
pub struct StoreRequest {
    pub data: Bytes,
    pub content_type: String,
    pub acl: Option<CannedAcl>,
}

impl StoreRequest {
    pub fn content_length(&self) -> u64 {
        self.data.len() as u64
    }
}

/// Acknowledgement of a completed upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreAck {
    pub size: u64,
    pub etag: Option<String>,
}

/// Canned access-control policies understood by S3-compatible stores
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum CannedAcl {
    Private,
    PublicRead,
    AuthenticatedRead,
    BucketOwnerRead,
    BucketOwnerFullControl,
}

impl CannedAcl {
    pub fn as_str(&self) -> &'static str {
        match self {
            CannedAcl::Private => "private",
            CannedAcl::PublicRead => "public-read",
            CannedAcl::AuthenticatedRead => "authenticated-read",
            CannedAcl::BucketOwnerRead => "bucket-owner-read",
            CannedAcl::BucketOwnerFullControl => "bucket-owner-full-control",
        }
    }
}

impl std::fmt::Display for CannedAcl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
