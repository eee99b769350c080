//! Command-line/environment settings shared by both binaries.

use clap::{Args, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    adapters::outbound::resize::DEFAULT_CONVERT_PROGRAM,
    app::{AppConfig, AppError, DEFAULT_DESTINATION_BUCKET, EligibilityPolicy, ResizerBackend, StorageBackend},
    ports::storage::CannedAcl,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StorageKind {
    Memory,
    Local,
    S3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ResizerKind {
    Image,
    Convert,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Args, Debug, Clone)]
pub struct RuntimeArgs {
    /// Storage backend type
    #[arg(long, env = "STORAGE_BACKEND", value_enum, default_value = "memory")]
    pub storage_backend: StorageKind,

    /// Root directory for the local backend (one sub-directory per bucket)
    #[arg(long, env = "STORAGE_ROOT")]
    pub storage_root: Option<PathBuf>,

    /// S3 region
    #[arg(long, env = "S3_REGION")]
    pub s3_region: Option<String>,

    /// S3 endpoint URL for S3-compatible stores
    #[arg(long, env = "S3_ENDPOINT")]
    pub s3_endpoint: Option<String>,

    /// S3 access key
    #[arg(long, env = "S3_ACCESS_KEY")]
    pub s3_access_key: Option<String>,

    /// S3 secret key
    #[arg(long, env = "S3_SECRET_KEY")]
    pub s3_secret_key: Option<String>,

    /// Allow plain HTTP to the S3 endpoint
    #[arg(long, env = "S3_ALLOW_HTTP", default_value = "false")]
    pub s3_allow_http: bool,

    /// Resizer implementation
    #[arg(long, env = "RESIZER", value_enum, default_value = "image")]
    pub resizer: ResizerKind,

    /// ImageMagick binary used by the convert resizer
    #[arg(long, env = "CONVERT_PROGRAM", default_value = DEFAULT_CONVERT_PROGRAM)]
    pub convert_program: PathBuf,

    /// Bucket that receives every derivative
    #[arg(long, env = "DESTINATION_BUCKET", default_value = DEFAULT_DESTINATION_BUCKET)]
    pub destination_bucket: String,

    /// Scratch directory for originals and rendered derivatives
    #[arg(long, env = "STAGING_DIR")]
    pub staging_dir: Option<PathBuf>,

    /// Presets resized at once per source object
    #[arg(long, env = "PRESET_CONCURRENCY", default_value = "1")]
    pub preset_concurrency: usize,

    /// Which notified objects to process
    #[arg(long, env = "ELIGIBILITY", value_enum, default_value = "accept-all")]
    pub eligibility: EligibilityPolicy,

    /// Canned ACL applied to uploaded derivatives
    #[arg(long, env = "UPLOAD_ACL", value_enum, default_value = "public-read")]
    pub acl: CannedAcl,

    /// Upload derivatives without any ACL
    #[arg(long, conflicts_with = "acl")]
    pub no_acl: bool,

    /// JSON preset list replacing the built-in registry
    #[arg(long, env = "PRESETS_FILE")]
    pub presets_file: Option<PathBuf>,

    /// Log level or filter directive
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Log output format
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value = "text")]
    pub log_format: LogFormat,
}

impl RuntimeArgs {
    pub fn to_app_config(&self) -> Result<AppConfig, AppError> {
        let storage_backend = match self.storage_backend {
            StorageKind::Memory => StorageBackend::InMemory,
            StorageKind::Local => {
                let root = self.storage_root.clone().ok_or_else(|| AppError::Configuration {
                    message: "STORAGE_ROOT is required for the local backend".to_string(),
                })?;
                StorageBackend::LocalFileSystem { root }
            }
            StorageKind::S3 => StorageBackend::S3 {
                region: self.s3_region.clone(),
                access_key: self.s3_access_key.clone(),
                secret_key: self.s3_secret_key.clone(),
                endpoint: self.s3_endpoint.clone(),
                allow_http: self.s3_allow_http,
            },
        };

        let resizer_backend = match self.resizer {
            ResizerKind::Image => ResizerBackend::ImageCrate,
            ResizerKind::Convert => ResizerBackend::ConvertCommand {
                program: self.convert_program.clone(),
            },
        };

        Ok(AppConfig {
            storage_backend,
            resizer_backend,
            destination_bucket: self.destination_bucket.clone(),
            staging_dir: self
                .staging_dir
                .clone()
                .unwrap_or_else(std::env::temp_dir),
            preset_concurrency: self.preset_concurrency,
            eligibility: self.eligibility,
            acl: (!self.no_acl).then_some(self.acl),
            presets_file: self.presets_file.clone(),
        })
    }

    pub fn init_logging(&self) -> Result<(), AppError> {
        init_logging(&self.log_level, self.log_format)
    }
}

/// Install the global subscriber. Logs go to stderr so stdout stays free for
/// reports.
pub fn init_logging(level: &str, format: LogFormat) -> Result<(), AppError> {
    let env_filter = EnvFilter::try_new(level).map_err(|e| AppError::Configuration {
        message: format!("invalid log level {level:?}: {e}"),
    })?;

    let registry = tracing_subscriber::registry().with(env_filter);
    let result = match format {
        LogFormat::Text => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init(),
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .try_init(),
    };

    result.map_err(|e| AppError::Configuration {
        message: format!("cannot install log subscriber: {e}"),
    })
}
