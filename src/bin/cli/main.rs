use anyhow::{Context, Result, bail};
use bytes::Bytes;
use clap::{Parser, Subcommand};
use futures::TryStreamExt;
use std::path::{Path, PathBuf};
use thumbnail_pipeline::{
    BatchService, BucketName, KeyPathMapper, NotificationRecord, ObjectKey, ObjectStoreGateway,
    PresetRegistry, RecordResult, StoreRequest,
    app::{AppBuilder, AppServices},
    config::RuntimeArgs,
    services::sniff_content_type,
};
use tokio::io::AsyncWriteExt;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "thumbnail-cli")]
#[command(about = "Run or inspect the thumbnail pipeline by hand", long_about = None)]
struct Cli {
    #[command(flatten)]
    runtime: RuntimeArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate every derivative for one source object
    Derive {
        /// Source bucket
        #[arg(short, long, default_value = "hngry-original-images")]
        bucket: String,
        /// Source object key
        #[arg(short, long)]
        key: String,
        /// Upload this local file as the source object first
        #[arg(long)]
        upload: Option<PathBuf>,
        /// Copy successful derivatives into this directory afterwards
        #[arg(long)]
        download: Option<PathBuf>,
    },

    /// Show staging paths and destination keys for a key, without any I/O
    Keys {
        /// Source object key
        #[arg(short, long)]
        key: String,
        /// Source bucket
        #[arg(short, long, default_value = "hngry-original-images")]
        bucket: String,
    },

    /// Print the preset registry
    Presets {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Same registry the pipeline would use, read without building the app
fn load_presets(runtime: &RuntimeArgs) -> Result<PresetRegistry> {
    match &runtime.presets_file {
        Some(path) => {
            let document = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read preset file {}", path.display()))?;
            Ok(PresetRegistry::from_json(&document)?)
        }
        None => Ok(PresetRegistry::default_registry()),
    }
}

fn print_keys(runtime: &RuntimeArgs, bucket: &str, key: &str) -> Result<()> {
    let presets = load_presets(runtime)?;
    let destination_bucket = BucketName::new(runtime.destination_bucket.as_str())?;
    let mapper = KeyPathMapper::new(
        runtime
            .staging_dir
            .clone()
            .unwrap_or_else(std::env::temp_dir),
    );

    let source = mapper.derive_source_object(bucket, key);
    println!("source:             {}/{}", source.bucket, source.key);
    println!("staging path:       {}", source.staging_path.display());
    println!("destination prefix: {}", source.destination_prefix);

    for preset in &presets {
        let target = mapper.derive_target(&source, preset, &destination_bucket);
        println!(
            "  {:<14} {}/{}  (local {})",
            preset.name(),
            target.destination_bucket,
            target.destination_key,
            target.local_output_path.display()
        );
    }

    Ok(())
}

fn print_presets(runtime: &RuntimeArgs, json: bool) -> Result<()> {
    let presets = load_presets(runtime)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&presets)?);
        return Ok(());
    }

    for preset in &presets {
        println!(
            "{:<14} {:>5}x{:<5} quality {}",
            preset.name(),
            preset.width(),
            preset.height(),
            preset.quality()
        );
    }

    Ok(())
}

async fn upload_source(app: &AppServices, bucket: &str, key: &str, file: &Path) -> Result<()> {
    let data = Bytes::from(
        tokio::fs::read(file)
            .await
            .with_context(|| format!("Failed to read {}", file.display()))?,
    );
    let request = StoreRequest {
        content_type: sniff_content_type(&data).to_string(),
        data,
        acl: None,
    };

    let ack = app
        .gateway
        .store(&BucketName::new(bucket)?, &ObjectKey::new(key)?, request)
        .await
        .context("Failed to upload source object")?;
    info!(bucket, key, size = ack.size, "source uploaded");

    Ok(())
}

/// Local file for a downloaded derivative, always somewhere under `dir`
fn download_path(dir: &Path, key: &str) -> Result<PathBuf> {
    let mut path = dir.to_path_buf();
    for segment in key.split('/') {
        if segment.is_empty() || segment == "." || segment == ".." {
            bail!(
                "Refusing to download {key:?}: it does not map to a path under {}",
                dir.display()
            );
        }
        path.push(segment);
    }
    Ok(path)
}

async fn download_derivatives(app: &AppServices, record: &RecordResult, dir: &Path) -> Result<()> {
    let RecordResult::Processed(result) = record else {
        return Ok(());
    };

    for derivative in result.derivatives.iter().filter(|d| d.outcome.is_success()) {
        let bucket = BucketName::new(derivative.destination_bucket.as_str())?;
        let key = ObjectKey::new(derivative.destination_key.as_str())?;
        let path = download_path(dir, &derivative.destination_key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut body = app.gateway.fetch(&bucket, &key).await?;
        let mut file = tokio::fs::File::create(&path)
            .await
            .with_context(|| format!("Failed to create {}", path.display()))?;
        while let Some(chunk) = body.try_next().await? {
            file.write_all(&chunk).await?;
        }
        file.flush().await?;
        println!("{}", path.display());
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    cli.runtime.init_logging()?;

    match &cli.command {
        Commands::Keys { key, bucket } => print_keys(&cli.runtime, bucket, key),
        Commands::Presets { json } => print_presets(&cli.runtime, *json),
        Commands::Derive {
            bucket,
            key,
            upload,
            download,
        } => {
            let app = AppBuilder::new()
                .with_config(cli.runtime.to_app_config()?)
                .build()
                .await
                .context("Failed to build application")?;

            if let Some(file) = upload {
                upload_source(&app, bucket, key, file).await?;
            }

            let result = app
                .batch_processor
                .handle(vec![NotificationRecord::new(bucket.as_str(), key.as_str())])
                .await;
            result.log_outcomes();
            println!("{}", serde_json::to_string_pretty(&result)?);

            if let (Some(dir), Some(record)) = (download, result.records.first()) {
                download_derivatives(&app, record, dir).await?;
            }

            result.into_invocation_result()?;
            Ok(())
        }
    }
}
