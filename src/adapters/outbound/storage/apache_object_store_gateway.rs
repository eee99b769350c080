use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt};
use object_store::{
    Attribute, AttributeValue, Attributes, ObjectStore as ApacheObjectStore, PutOptions,
    PutPayload, local::LocalFileSystem, memory::InMemory, path::Path as ObjectPath,
};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use super::{
    error::object_error,
    s3::{S3Config, create_s3_store},
};
use crate::{
    domain::{
        errors::{StorageError, StorageResult},
        value_objects::{BucketName, ObjectKey},
    },
    ports::storage::{ByteStream, ObjectStoreGateway, StoreAck, StoreRequest},
};

/// Metadata attribute carrying the canned ACL on backends without native ACLs
pub const ACL_METADATA_KEY: &str = "acl";

/// Builds the backing store for a bucket the first time it is touched
pub type StoreFactory =
    Arc<dyn Fn(&BucketName) -> StorageResult<Arc<dyn ApacheObjectStore>> + Send + Sync>;

/// Map a key onto an object_store path without rewriting it.
///
/// `Path::from` drops empty segments and percent-encodes some parts, and
/// `Path::parse` strips a leading or trailing delimiter. Either would let two
/// distinct keys address the same object, so such keys are refused instead.
pub(crate) fn object_path(key: &ObjectKey) -> StorageResult<ObjectPath> {
    let raw = key.as_str();
    if raw.starts_with('/') || raw.ends_with('/') {
        return Err(StorageError::ValidationError {
            message: format!("Object key {raw:?} starts or ends with '/'"),
        });
    }

    ObjectPath::parse(raw).map_err(|e| StorageError::ValidationError {
        message: e.to_string(),
    })
}

/// Gateway that implements ObjectStoreGateway on top of Apache object_store.
///
/// object_store clients are bound to a single bucket, so one is created
/// lazily per bucket and cached for the life of the gateway.
pub struct ApacheObjectStoreGateway {
    factory: StoreFactory,
    stores: RwLock<HashMap<BucketName, Arc<dyn ApacheObjectStore>>>,
    supports_attributes: bool,
}

impl ApacheObjectStoreGateway {
    pub fn new(factory: StoreFactory, supports_attributes: bool) -> Self {
        Self {
            factory,
            stores: RwLock::new(HashMap::new()),
            supports_attributes,
        }
    }

    /// Every bucket gets its own empty in-memory store
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(
                |_: &BucketName| -> StorageResult<Arc<dyn ApacheObjectStore>> {
                    Ok(Arc::new(InMemory::new()))
                },
            ),
            true,
        )
    }

    /// Buckets are directories under `root`.
    ///
    /// The local backend cannot persist attributes, so content type and ACL
    /// are dropped on upload.
    pub fn local(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self::new(
            Arc::new(
                move |bucket: &BucketName| -> StorageResult<Arc<dyn ApacheObjectStore>> {
                    let dir = root.join(bucket.as_str());
                    std::fs::create_dir_all(&dir)?;
                    Ok(Arc::new(LocalFileSystem::new_with_prefix(&dir)?))
                },
            ),
            false,
        )
    }

    /// Buckets live in S3 (or an S3-compatible endpoint)
    pub fn s3(config: S3Config) -> Self {
        Self::new(
            Arc::new(move |bucket: &BucketName| create_s3_store(&config, bucket)),
            true,
        )
    }

    /// Pin `bucket` to an existing store instead of building one
    pub async fn register(&self, bucket: BucketName, store: Arc<dyn ApacheObjectStore>) {
        self.stores.write().await.insert(bucket, store);
    }

    pub fn supports_attributes(&self) -> bool {
        self.supports_attributes
    }

    async fn store_for(&self, bucket: &BucketName) -> StorageResult<Arc<dyn ApacheObjectStore>> {
        if let Some(store) = self.stores.read().await.get(bucket) {
            return Ok(Arc::clone(store));
        }

        let mut stores = self.stores.write().await;
        // Another task may have raced us between the two locks.
        if let Some(store) = stores.get(bucket) {
            return Ok(Arc::clone(store));
        }

        debug!(%bucket, "opening object store for bucket");
        let store = (self.factory)(bucket)?;
        stores.insert(bucket.clone(), Arc::clone(&store));
        Ok(store)
    }

    fn attributes_for(&self, request: &StoreRequest) -> Attributes {
        let mut attributes = Attributes::new();
        if !self.supports_attributes {
            return attributes;
        }

        attributes.insert(
            Attribute::ContentType,
            AttributeValue::from(request.content_type.clone()),
        );
        if let Some(acl) = request.acl {
            attributes.insert(
                Attribute::Metadata(ACL_METADATA_KEY.into()),
                AttributeValue::from(acl.as_str()),
            );
        }
        attributes
    }
}

#[async_trait]
impl ObjectStoreGateway for ApacheObjectStoreGateway {
    async fn fetch(&self, bucket: &BucketName, key: &ObjectKey) -> StorageResult<ByteStream> {
        let store = self.store_for(bucket).await?;
        let path = object_path(key)?;

        let result = store
            .get(&path)
            .await
            .map_err(|e| object_error(e, bucket, key))?;

        Ok(result.into_stream().map_err(StorageError::from).boxed())
    }

    async fn store(
        &self,
        bucket: &BucketName,
        key: &ObjectKey,
        request: StoreRequest,
    ) -> StorageResult<StoreAck> {
        let store = self.store_for(bucket).await?;
        let path = object_path(key)?;
        let size = request.content_length();

        let opts = PutOptions {
            attributes: self.attributes_for(&request),
            ..Default::default()
        };

        let result = store
            .put_opts(&path, PutPayload::from(request.data), opts)
            .await
            .map_err(|e| object_error(e, bucket, key))?;

        Ok(StoreAck {
            size,
            etag: result.e_tag,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::storage::CannedAcl;
    use bytes::Bytes;

    fn bucket(name: &str) -> BucketName {
        BucketName::new(name).unwrap()
    }

    #[tokio::test]
    async fn test_registered_store_is_used() {
        let gateway = ApacheObjectStoreGateway::in_memory();
        let backing = Arc::new(InMemory::new());
        backing
            .put(&ObjectPath::from("a.jpg"), PutPayload::from_static(b"jpeg"))
            .await
            .unwrap();
        gateway.register(bucket("originals"), backing).await;

        let body: Vec<Bytes> = gateway
            .fetch(&bucket("originals"), &ObjectKey::new("a.jpg").unwrap())
            .await
            .unwrap()
            .try_collect()
            .await
            .unwrap();

        assert_eq!(body.concat(), b"jpeg");
    }

    #[tokio::test]
    async fn test_store_sets_content_type_and_acl_attributes() {
        let gateway = ApacheObjectStoreGateway::in_memory();
        let backing = Arc::new(InMemory::new());
        gateway
            .register(bucket("hngry-images"), backing.clone())
            .await;

        let key = ObjectKey::new("p/images/a/thumbnail.jpg").unwrap();
        gateway
            .store(
                &bucket("hngry-images"),
                &key,
                StoreRequest {
                    data: Bytes::from_static(b"thumb"),
                    content_type: "image/jpeg".to_string(),
                    acl: Some(CannedAcl::PublicRead),
                },
            )
            .await
            .unwrap();

        let got = backing.get(&ObjectPath::from(key.as_str())).await.unwrap();
        assert_eq!(
            got.attributes.get(&Attribute::ContentType).map(AsRef::<str>::as_ref),
            Some("image/jpeg")
        );
        assert_eq!(
            got.attributes
                .get(&Attribute::Metadata(ACL_METADATA_KEY.into()))
                .map(AsRef::<str>::as_ref),
            Some("public-read")
        );
    }

    #[tokio::test]
    async fn test_local_backend_round_trips_without_attributes() {
        let dir = tempfile::tempdir().unwrap();
        let gateway = ApacheObjectStoreGateway::local(dir.path());
        assert!(!gateway.supports_attributes());

        let key = ObjectKey::new("nested/dir/file.png").unwrap();
        let ack = gateway
            .store(
                &bucket("local-bucket"),
                &key,
                StoreRequest {
                    data: Bytes::from_static(b"png-bytes"),
                    content_type: "image/png".to_string(),
                    acl: Some(CannedAcl::PublicRead),
                },
            )
            .await
            .unwrap();
        assert_eq!(ack.size, 9);
        assert!(dir.path().join("local-bucket/nested/dir/file.png").exists());
    }

    #[test]
    fn test_object_path_keeps_key_exact() {
        for raw in ["p/images/a/thumbnail.jpg", "p/50%-off~#1.png", "a b/c.jpg"] {
            let path = object_path(&ObjectKey::new(raw).unwrap()).unwrap();
            assert_eq!(path.as_ref(), raw);
        }
    }

    #[test]
    fn test_object_path_refuses_keys_it_would_rewrite() {
        for raw in [
            "p/a//b/thumbnail.png",
            "/x/thumbnail.jpg",
            "p/x//thumbnail.png",
            "folder/",
            "p/../thumbnail.png",
            "p/./thumbnail.png",
        ] {
            let err = object_path(&ObjectKey::new(raw).unwrap()).unwrap_err();
            assert!(
                matches!(err, StorageError::ValidationError { .. }),
                "{raw} gave {err:?}"
            );
        }
    }

    #[tokio::test]
    async fn test_store_refuses_empty_segment_without_touching_neighbour() {
        let gateway = ApacheObjectStoreGateway::in_memory();
        let backing = Arc::new(InMemory::new());
        gateway.register(bucket("hngry-images"), backing.clone()).await;

        let request = || StoreRequest {
            data: Bytes::from_static(b"thumb"),
            content_type: "image/png".to_string(),
            acl: None,
        };
        let err = gateway
            .store(
                &bucket("hngry-images"),
                &ObjectKey::new("p/a//b/thumbnail.png").unwrap(),
                request(),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, StorageError::ValidationError { .. }));
        assert!(backing
            .get(&ObjectPath::from("p/a/b/thumbnail.png"))
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_missing_object_is_not_found() {
        let gateway = ApacheObjectStoreGateway::in_memory();
        let err = gateway
            .fetch(&bucket("originals"), &ObjectKey::new("nope.jpg").unwrap())
            .await
            .err()
            .unwrap();
        assert!(matches!(err, StorageError::ObjectNotFound { .. }));
    }
}
