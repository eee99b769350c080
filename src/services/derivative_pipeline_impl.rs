use async_trait::async_trait;
use bytes::Bytes;
use futures::TryStreamExt;
use std::path::Path;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

use crate::{
    domain::{
        errors::StorageResult,
        models::{
            DerivativeOutcome, DerivativeReport, DerivativeTarget, FetchOutcome, KeyPathMapper,
            PipelineResult, PresetRegistry, ResizePreset, SourceObject,
        },
        value_objects::{BucketName, ObjectKey},
    },
    ports::{
        resize::ResizeOperation,
        services::DerivativeService,
        storage::{CannedAcl, ObjectStoreGateway, StoreRequest},
    },
    services::content_type::sniff_content_type,
    staging::StagedFile,
};

/// Knobs for a pipeline beyond its collaborators
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    /// Every derivative lands here, whatever the source bucket
    pub destination_bucket: BucketName,
    pub acl: Option<CannedAcl>,
    /// How many presets may be resized at once; 1 runs them in registry order
    pub preset_concurrency: usize,
}

impl PipelineSettings {
    pub fn new(destination_bucket: BucketName) -> Self {
        Self {
            destination_bucket,
            acl: Some(CannedAcl::PublicRead),
            preset_concurrency: 1,
        }
    }
}

/// Fetch → (resize → upload) per preset, with failures isolated per preset
#[derive(Clone)]
pub struct DerivativePipelineImpl {
    gateway: Arc<dyn ObjectStoreGateway>,
    resizer: Arc<dyn ResizeOperation>,
    presets: Arc<PresetRegistry>,
    mapper: KeyPathMapper,
    settings: PipelineSettings,
}

impl DerivativePipelineImpl {
    pub fn new(
        gateway: Arc<dyn ObjectStoreGateway>,
        resizer: Arc<dyn ResizeOperation>,
        presets: Arc<PresetRegistry>,
        mapper: KeyPathMapper,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            gateway,
            resizer,
            presets,
            mapper,
            settings,
        }
    }

    pub fn mapper(&self) -> &KeyPathMapper {
        &self.mapper
    }

    pub fn presets(&self) -> &PresetRegistry {
        &self.presets
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Download the original into its staging path.
    ///
    /// The returned guard removes the file once the preset loop is done; if
    /// this future is dropped mid-download the partial file goes with it.
    async fn fetch_to_staging(&self, source: &SourceObject) -> StorageResult<(StagedFile, u64)> {
        let bucket = BucketName::new(source.bucket.as_str())?;
        let key = ObjectKey::new(source.key.as_str())?;

        let mut body = self.gateway.fetch(&bucket, &key).await?;

        if let Some(parent) = source.staging_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let staged = StagedFile::claim(&source.staging_path)?;
        let mut file = tokio::fs::File::create(staged.path()).await?;
        let mut size = 0u64;
        while let Some(chunk) = body.try_next().await? {
            file.write_all(&chunk).await?;
            size += chunk.len() as u64;
        }
        file.flush().await?;

        Ok((staged, size))
    }

    async fn derive(
        &self,
        source: &SourceObject,
        staged_source: &Path,
        preset: &ResizePreset,
        permits: &Semaphore,
        cancel: &CancellationToken,
    ) -> DerivativeReport {
        let target =
            self.mapper
                .derive_target(source, preset, &self.settings.destination_bucket);

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => DerivativeOutcome::Abandoned,
            outcome = async {
                let _permit = permits.acquire().await.ok();
                self.attempt(staged_source, &target).await
            } => outcome,
        };

        debug!(
            preset = preset.name(),
            destination_key = target.destination_key.as_str(),
            success = outcome.is_success(),
            "derivative finished"
        );

        DerivativeReport::new(&target, outcome)
    }

    async fn attempt(&self, staged_source: &Path, target: &DerivativeTarget) -> DerivativeOutcome {
        let output = match StagedFile::claim(&target.local_output_path) {
            Ok(output) => output,
            Err(e) => {
                return DerivativeOutcome::ResizeFailed {
                    reason: format!("cannot stage {}: {e}", target.local_output_path.display()),
                };
            }
        };

        if let Err(e) = self
            .resizer
            .resize(staged_source, &target.preset, output.path())
            .await
        {
            return DerivativeOutcome::ResizeFailed {
                reason: e.to_string(),
            };
        }

        match self.upload(output.path(), target).await {
            Ok((size, md5)) => DerivativeOutcome::Succeeded { size, md5 },
            Err(e) => DerivativeOutcome::UploadFailed {
                reason: e.to_string(),
            },
        }
    }

    async fn upload(&self, path: &Path, target: &DerivativeTarget) -> StorageResult<(u64, String)> {
        let data = Bytes::from(tokio::fs::read(path).await?);
        let key = ObjectKey::new(target.destination_key.as_str())?;
        let digest = format!("{:x}", md5::compute(&data));

        let request = StoreRequest {
            content_type: sniff_content_type(&data).to_string(),
            data,
            acl: self.settings.acl,
        };

        let ack = self
            .gateway
            .store(&target.destination_bucket, &key, request)
            .await?;

        Ok((ack.size, digest))
    }
}

#[async_trait]
impl DerivativeService for DerivativePipelineImpl {
    #[instrument(skip_all, fields(bucket = %source.bucket, key = %source.key))]
    async fn process_until(
        &self,
        source: &SourceObject,
        cancel: &CancellationToken,
    ) -> PipelineResult {
        let fetched = tokio::select! {
            biased;
            _ = cancel.cancelled() => return PipelineResult::abandoned(source.clone()),
            fetched = self.fetch_to_staging(source) => fetched,
        };

        let (staged, size) = match fetched {
            Ok(fetched) => fetched,
            Err(e) => return PipelineResult::fetch_failed(source.clone(), e.to_string()),
        };

        debug!(size, staging_path = %staged.path().display(), "source staged");

        // Read-only from here on; every preset writes to its own output path.
        let permits = Semaphore::new(self.settings.preset_concurrency.max(1));
        let attempts: Vec<_> = self
            .presets
            .iter()
            .map(|preset| self.derive(source, staged.path(), preset, &permits, cancel))
            .collect();
        let derivatives = futures::future::join_all(attempts).await;

        drop(staged);

        PipelineResult {
            source: source.clone(),
            fetch: FetchOutcome::Fetched { size },
            derivatives,
        }
    }
}

/// Builder for DerivativePipelineImpl
pub struct DerivativePipelineBuilder {
    gateway: Option<Arc<dyn ObjectStoreGateway>>,
    resizer: Option<Arc<dyn ResizeOperation>>,
    presets: Arc<PresetRegistry>,
    mapper: Option<KeyPathMapper>,
    settings: Option<PipelineSettings>,
}

impl DerivativePipelineBuilder {
    pub fn new() -> Self {
        Self {
            gateway: None,
            resizer: None,
            presets: Arc::new(PresetRegistry::default_registry()),
            mapper: None,
            settings: None,
        }
    }

    pub fn gateway(mut self, gateway: Arc<dyn ObjectStoreGateway>) -> Self {
        self.gateway = Some(gateway);
        self
    }

    pub fn resizer(mut self, resizer: Arc<dyn ResizeOperation>) -> Self {
        self.resizer = Some(resizer);
        self
    }

    pub fn presets(mut self, presets: Arc<PresetRegistry>) -> Self {
        self.presets = presets;
        self
    }

    pub fn mapper(mut self, mapper: KeyPathMapper) -> Self {
        self.mapper = Some(mapper);
        self
    }

    pub fn settings(mut self, settings: PipelineSettings) -> Self {
        self.settings = Some(settings);
        self
    }

    pub fn build(self) -> Result<DerivativePipelineImpl, &'static str> {
        let gateway = self.gateway.ok_or("Gateway is required")?;
        let resizer = self.resizer.ok_or("Resizer is required")?;
        let mapper = self
            .mapper
            .unwrap_or_else(|| KeyPathMapper::new(std::env::temp_dir()));
        let settings = self.settings.ok_or("Settings are required")?;

        Ok(DerivativePipelineImpl::new(
            gateway,
            resizer,
            self.presets,
            mapper,
            settings,
        ))
    }
}

impl Default for DerivativePipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
