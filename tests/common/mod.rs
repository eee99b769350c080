//! Stub collaborators shared by the integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use thumbnail_pipeline::{
    BucketName, ByteStream, ObjectKey, ObjectStoreGateway, ResizeError, ResizeOperation,
    ResizePreset, StorageError, StorageResult, StoreAck, StoreRequest,
};

pub const SOURCE_BUCKET: &str = "hngry-original-images";
pub const DESTINATION_BUCKET: &str = "hngry-images";

#[derive(Debug, Clone)]
pub struct StoredObject {
    pub data: Bytes,
    pub content_type: String,
    pub acl: Option<String>,
}

/// In-memory gateway that records every call and can be told to fail uploads
#[derive(Default)]
pub struct RecordingGateway {
    objects: Mutex<HashMap<(String, String), StoredObject>>,
    fail_store_keys: Mutex<HashSet<String>>,
    fetches: AtomicUsize,
    stores: AtomicUsize,
}

impl RecordingGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(&self, bucket: &str, key: &str, data: &'static [u8]) {
        self.objects.lock().unwrap().insert(
            (bucket.to_string(), key.to_string()),
            StoredObject {
                data: Bytes::from_static(data),
                content_type: "application/octet-stream".to_string(),
                acl: None,
            },
        );
    }

    pub fn fail_store_for(&self, key: &str) {
        self.fail_store_keys.lock().unwrap().insert(key.to_string());
    }

    pub fn object(&self, bucket: &str, key: &str) -> Option<StoredObject> {
        self.objects
            .lock()
            .unwrap()
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
    }

    pub fn keys_in(&self, bucket: &str) -> Vec<String> {
        let mut keys: Vec<String> = self
            .objects
            .lock()
            .unwrap()
            .keys()
            .filter(|(b, _)| b == bucket)
            .map(|(_, k)| k.clone())
            .collect();
        keys.sort();
        keys
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn store_count(&self) -> usize {
        self.stores.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ObjectStoreGateway for RecordingGateway {
    async fn fetch(&self, bucket: &BucketName, key: &ObjectKey) -> StorageResult<ByteStream> {
        self.fetches.fetch_add(1, Ordering::SeqCst);

        let object = self
            .object(bucket.as_str(), key.as_str())
            .ok_or_else(|| StorageError::ObjectNotFound {
                bucket: bucket.clone(),
                key: key.clone(),
            })?;

        // Two chunks, to exercise the streaming copy
        let mid = object.data.len() / 2;
        let chunks: Vec<StorageResult<Bytes>> = vec![
            Ok(object.data.slice(..mid)),
            Ok(object.data.slice(mid..)),
        ];
        Ok(futures::stream::iter(chunks).boxed())
    }

    async fn store(
        &self,
        bucket: &BucketName,
        key: &ObjectKey,
        request: StoreRequest,
    ) -> StorageResult<StoreAck> {
        self.stores.fetch_add(1, Ordering::SeqCst);

        if self.fail_store_keys.lock().unwrap().contains(key.as_str()) {
            return Err(StorageError::AccessDenied {
                bucket: bucket.clone(),
                key: key.clone(),
                operation: "put".to_string(),
            });
        }

        let size = request.content_length();
        self.objects.lock().unwrap().insert(
            (bucket.to_string(), key.to_string()),
            StoredObject {
                data: request.data,
                content_type: request.content_type,
                acl: request.acl.map(|a| a.as_str().to_string()),
            },
        );

        Ok(StoreAck { size, etag: None })
    }
}

/// Resizer that writes `<source bytes>:<preset name>` and can fail or hang
/// for chosen presets
#[derive(Default)]
pub struct StubResizer {
    fail_presets: HashSet<String>,
    hang_presets: HashSet<String>,
    calls: Mutex<Vec<String>>,
}

impl StubResizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(mut self, preset: &str) -> Self {
        self.fail_presets.insert(preset.to_string());
        self
    }

    pub fn hanging(mut self, preset: &str) -> Self {
        self.hang_presets.insert(preset.to_string());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ResizeOperation for StubResizer {
    async fn resize(
        &self,
        source: &Path,
        preset: &ResizePreset,
        output: &Path,
    ) -> Result<(), ResizeError> {
        self.calls.lock().unwrap().push(preset.name().to_string());

        if self.hang_presets.contains(preset.name()) {
            std::future::pending::<()>().await;
        }

        if self.fail_presets.contains(preset.name()) {
            return Err(ResizeError::ToolFailed {
                program: "stub".to_string(),
                status: "exit status: 1".to_string(),
                stderr: format!("cannot render {}", preset.name()),
            });
        }

        let mut data = tokio::fs::read(source)
            .await
            .map_err(|e| ResizeError::UnreadableSource {
                path: source.to_path_buf(),
                message: e.to_string(),
            })?;
        data.extend_from_slice(b":");
        data.extend_from_slice(preset.name().as_bytes());

        tokio::fs::write(output, data)
            .await
            .map_err(|e| ResizeError::OutputFailed {
                path: output.to_path_buf(),
                message: e.to_string(),
            })
    }
}

/// Everything left in a staging directory
pub fn staged_files(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
