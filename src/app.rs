use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use crate::{
    adapters::outbound::{
        eligibility::ImageExtensionEligibility,
        resize::{ConvertCommandResizer, DEFAULT_CONVERT_PROGRAM, ImageCrateResizer},
        storage::{ApacheObjectStoreGateway, S3Config},
    },
    domain::{
        errors::ValidationError,
        models::{KeyPathMapper, PresetRegistry},
        value_objects::BucketName,
    },
    ports::{
        eligibility::{AcceptAll, EligibilityPredicate},
        resize::ResizeOperation,
        storage::{CannedAcl, ObjectStoreGateway},
    },
    services::{BatchProcessorImpl, DerivativePipelineImpl, PipelineSettings},
    staging::ensure_staging_root,
};

/// Bucket every derivative is written to unless configured otherwise
pub const DEFAULT_DESTINATION_BUCKET: &str = "hngry-images";

/// Configuration for the application
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub storage_backend: StorageBackend,
    pub resizer_backend: ResizerBackend,
    pub destination_bucket: String,
    pub staging_dir: PathBuf,
    /// Presets resized at once per source object; 1 keeps registry order
    pub preset_concurrency: usize,
    pub eligibility: EligibilityPolicy,
    pub acl: Option<CannedAcl>,
    /// JSON preset list replacing the built-in registry
    pub presets_file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            storage_backend: StorageBackend::InMemory,
            resizer_backend: ResizerBackend::ImageCrate,
            destination_bucket: DEFAULT_DESTINATION_BUCKET.to_string(),
            staging_dir: std::env::temp_dir(),
            preset_concurrency: 1,
            eligibility: EligibilityPolicy::AcceptAll,
            acl: Some(CannedAcl::PublicRead),
            presets_file: None,
        }
    }
}

/// Storage backend configuration
#[derive(Debug, Clone)]
pub enum StorageBackend {
    InMemory,
    LocalFileSystem {
        root: PathBuf,
    },
    S3 {
        region: Option<String>,
        access_key: Option<String>,
        secret_key: Option<String>,
        endpoint: Option<String>,
        allow_http: bool,
    },
}

/// How derivatives are rendered
#[derive(Debug, Clone)]
pub enum ResizerBackend {
    ImageCrate,
    ConvertCommand { program: PathBuf },
}

/// Which notified objects are worth processing
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum EligibilityPolicy {
    AcceptAll,
    ImageExtensions,
}

/// Application services container
#[derive(Clone)]
pub struct AppServices {
    pub batch_processor: Arc<BatchProcessorImpl>,
    pub pipeline: Arc<DerivativePipelineImpl>,
    pub gateway: Arc<ApacheObjectStoreGateway>,
    pub presets: Arc<PresetRegistry>,
    pub mapper: KeyPathMapper,
}

/// Application builder for dependency injection
pub struct AppBuilder {
    config: AppConfig,
    resizer: Option<Arc<dyn ResizeOperation>>,
    presets: Option<PresetRegistry>,
}

impl AppBuilder {
    /// Create a new application builder
    pub fn new() -> Self {
        Self {
            config: AppConfig::default(),
            resizer: None,
            presets: None,
        }
    }

    /// Configure the application with custom settings
    pub fn with_config(mut self, config: AppConfig) -> Self {
        self.config = config;
        self
    }

    /// Configure storage backend
    pub fn with_storage_backend(mut self, backend: StorageBackend) -> Self {
        self.config.storage_backend = backend;
        self
    }

    pub fn with_resizer_backend(mut self, backend: ResizerBackend) -> Self {
        self.config.resizer_backend = backend;
        self
    }

    /// Use a ready-made resizer instead of the configured backend
    pub fn with_resizer(mut self, resizer: Arc<dyn ResizeOperation>) -> Self {
        self.resizer = Some(resizer);
        self
    }

    /// Use `presets` instead of the built-in registry or preset file
    pub fn with_presets(mut self, presets: PresetRegistry) -> Self {
        self.presets = Some(presets);
        self
    }

    pub fn with_staging_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.staging_dir = dir.into();
        self
    }

    pub fn with_destination_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.config.destination_bucket = bucket.into();
        self
    }

    pub fn with_eligibility(mut self, policy: EligibilityPolicy) -> Self {
        self.config.eligibility = policy;
        self
    }

    pub fn with_preset_concurrency(mut self, concurrency: usize) -> Self {
        self.config.preset_concurrency = concurrency;
        self
    }

    /// Build the complete application with services
    pub async fn build(self) -> Result<AppServices, AppError> {
        let destination_bucket = BucketName::new(self.config.destination_bucket.as_str())
            .map_err(|e| AppError::Configuration {
                message: format!(
                    "invalid destination bucket {:?}: {}",
                    self.config.destination_bucket, e
                ),
            })?;

        if self.config.preset_concurrency == 0 {
            return Err(AppError::Configuration {
                message: "preset concurrency must be at least 1".to_string(),
            });
        }

        ensure_staging_root(&self.config.staging_dir).map_err(|e| AppError::Staging {
            path: self.config.staging_dir.clone(),
            source: e,
        })?;

        let presets = Arc::new(self.load_presets().await?);
        let gateway = Arc::new(self.create_gateway()?);
        let resizer = match &self.resizer {
            Some(resizer) => Arc::clone(resizer),
            None => self.create_resizer(),
        };
        let mapper = KeyPathMapper::new(self.config.staging_dir.clone());

        let settings = PipelineSettings {
            destination_bucket,
            acl: self.config.acl,
            preset_concurrency: self.config.preset_concurrency,
        };

        let pipeline = Arc::new(DerivativePipelineImpl::new(
            gateway.clone() as Arc<dyn ObjectStoreGateway>,
            resizer,
            presets.clone(),
            mapper.clone(),
            settings,
        ));

        let batch_processor = Arc::new(
            BatchProcessorImpl::new(pipeline.clone(), mapper.clone())
                .with_eligibility(self.create_eligibility()),
        );

        info!(
            presets = presets.len(),
            destination_bucket = %self.config.destination_bucket,
            staging_dir = %self.config.staging_dir.display(),
            "application assembled"
        );

        Ok(AppServices {
            batch_processor,
            pipeline,
            gateway,
            presets,
            mapper,
        })
    }

    async fn load_presets(&self) -> Result<PresetRegistry, AppError> {
        if let Some(presets) = &self.presets {
            return Ok(presets.clone());
        }

        match &self.config.presets_file {
            Some(path) => {
                let document = tokio::fs::read_to_string(path).await.map_err(|e| {
                    AppError::Configuration {
                        message: format!("cannot read preset file {}: {}", path.display(), e),
                    }
                })?;
                Ok(PresetRegistry::from_json(&document)?)
            }
            None => Ok(PresetRegistry::default_registry()),
        }
    }

    fn create_gateway(&self) -> Result<ApacheObjectStoreGateway, AppError> {
        match &self.config.storage_backend {
            StorageBackend::InMemory => Ok(ApacheObjectStoreGateway::in_memory()),
            StorageBackend::LocalFileSystem { root } => {
                std::fs::create_dir_all(root).map_err(|e| AppError::StorageInit {
                    message: format!("cannot create storage root {}: {}", root.display(), e),
                })?;
                Ok(ApacheObjectStoreGateway::local(root.clone()))
            }
            StorageBackend::S3 {
                region,
                access_key,
                secret_key,
                endpoint,
                allow_http,
            } => Ok(ApacheObjectStoreGateway::s3(S3Config {
                region: region.clone(),
                access_key: access_key.clone(),
                secret_key: secret_key.clone(),
                endpoint: endpoint.clone(),
                allow_http: *allow_http,
            })),
        }
    }

    fn create_resizer(&self) -> Arc<dyn ResizeOperation> {
        match &self.config.resizer_backend {
            ResizerBackend::ImageCrate => Arc::new(ImageCrateResizer::new()),
            ResizerBackend::ConvertCommand { program } => {
                Arc::new(ConvertCommandResizer::new(program.clone()))
            }
        }
    }

    fn create_eligibility(&self) -> Arc<dyn EligibilityPredicate> {
        match self.config.eligibility {
            EligibilityPolicy::AcceptAll => Arc::new(AcceptAll),
            EligibilityPolicy::ImageExtensions => Arc::new(ImageExtensionEligibility),
        }
    }
}

impl Default for AppBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Application-level errors
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Storage initialization error: {message}")]
    StorageInit { message: String },

    #[error("Invalid preset registry: {0}")]
    Presets(#[from] ValidationError),

    #[error("Cannot prepare staging directory {path}: {source}")]
    Staging {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Create an in-memory application for testing and development
pub async fn create_in_memory_app() -> Result<AppServices, AppError> {
    AppBuilder::new()
        .with_storage_backend(StorageBackend::InMemory)
        .build()
        .await
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn env_flag(name: &str) -> bool {
    env_var(name)
        .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

/// Create application from environment variables
pub async fn create_app_from_env() -> Result<AppServices, AppError> {
    let storage_backend = match env_var("STORAGE_BACKEND").as_deref() {
        Some("s3") => StorageBackend::S3 {
            region: env_var("S3_REGION"),
            access_key: env_var("S3_ACCESS_KEY"),
            secret_key: env_var("S3_SECRET_KEY"),
            endpoint: env_var("S3_ENDPOINT"),
            allow_http: env_flag("S3_ALLOW_HTTP"),
        },
        Some("local") => {
            let root = env_var("STORAGE_ROOT").ok_or_else(|| AppError::Configuration {
                message: "STORAGE_ROOT environment variable required".to_string(),
            })?;
            StorageBackend::LocalFileSystem { root: root.into() }
        }
        Some("memory") | None => StorageBackend::InMemory,
        Some(other) => {
            return Err(AppError::Configuration {
                message: format!("unknown STORAGE_BACKEND {other:?}"),
            });
        }
    };

    let resizer_backend = match env_var("RESIZER").as_deref() {
        Some("convert") => ResizerBackend::ConvertCommand {
            program: env_var("CONVERT_PROGRAM")
                .unwrap_or_else(|| DEFAULT_CONVERT_PROGRAM.to_string())
                .into(),
        },
        Some("image") | None => ResizerBackend::ImageCrate,
        Some(other) => {
            return Err(AppError::Configuration {
                message: format!("unknown RESIZER {other:?}"),
            });
        }
    };

    let preset_concurrency = match env_var("PRESET_CONCURRENCY") {
        Some(raw) => raw.parse().map_err(|_| AppError::Configuration {
            message: format!("PRESET_CONCURRENCY must be a positive integer, got {raw:?}"),
        })?,
        None => 1,
    };

    let eligibility = match env_var("ELIGIBILITY").as_deref() {
        Some("image-extensions") => EligibilityPolicy::ImageExtensions,
        _ => EligibilityPolicy::AcceptAll,
    };

    let acl = match env_var("UPLOAD_ACL").as_deref() {
        Some("none") => None,
        Some(raw) => Some(
            <CannedAcl as clap::ValueEnum>::from_str(raw, true).map_err(|e| {
                AppError::Configuration {
                    message: format!("invalid UPLOAD_ACL: {e}"),
                }
            })?,
        ),
        None => Some(CannedAcl::PublicRead),
    };

    let config = AppConfig {
        storage_backend,
        resizer_backend,
        destination_bucket: env_var("DESTINATION_BUCKET")
            .unwrap_or_else(|| DEFAULT_DESTINATION_BUCKET.to_string()),
        staging_dir: env_var("STAGING_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(std::env::temp_dir),
        preset_concurrency,
        eligibility,
        acl,
        presets_file: env_var("PRESETS_FILE").map(PathBuf::from),
    };

    AppBuilder::new().with_config(config).build().await
}
