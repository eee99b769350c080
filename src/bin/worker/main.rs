use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use thumbnail_pipeline::{
    BatchService, app::AppBuilder, config::RuntimeArgs, parse_s3_event,
};
use tokio::io::AsyncReadExt;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, info, info_span, warn};
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(name = "thumbnail-worker")]
#[command(about = "Generate image derivatives for one batch of S3 upload notifications", long_about = None)]
struct Cli {
    /// S3 event JSON file; reads stdin when omitted or "-"
    #[arg(long, env = "EVENT_FILE")]
    event: Option<PathBuf>,

    /// Abandon in-flight work after this many seconds
    #[arg(long, env = "DEADLINE_SECS")]
    deadline_secs: Option<u64>,

    /// Pretty-print the run report
    #[arg(long)]
    pretty: bool,

    #[command(flatten)]
    runtime: RuntimeArgs,
}

impl Cli {
    async fn read_event(&self) -> Result<String> {
        match &self.event {
            Some(path) if path.as_os_str() != "-" => tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read event file {}", path.display())),
            _ => {
                let mut buf = String::new();
                tokio::io::stdin()
                    .read_to_string(&mut buf)
                    .await
                    .context("Failed to read event from stdin")?;
                Ok(buf)
            }
        }
    }
}

/// Cancel `token` on Ctrl-C or when the deadline passes
fn spawn_cancellation(token: CancellationToken, deadline: Option<Duration>) {
    tokio::spawn(async move {
        let deadline = async {
            match deadline {
                Some(d) => tokio::time::sleep(d).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            _ = token.cancelled() => return,
            _ = tokio::signal::ctrl_c() => warn!("interrupted, abandoning in-flight work"),
            _ = deadline => warn!("deadline reached, abandoning in-flight work"),
        }
        token.cancel();
    });
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    cli.runtime.init_logging()?;

    let event = cli.read_event().await?;
    let records = parse_s3_event(&event).context("Failed to parse S3 event")?;

    let config = cli.runtime.to_app_config()?;
    let app = AppBuilder::new()
        .with_config(config)
        .build()
        .await
        .context("Failed to build application")?;

    let cancel = CancellationToken::new();
    spawn_cancellation(cancel.clone(), cli.deadline_secs.map(Duration::from_secs));

    let invocation_id = Uuid::new_v4();
    let span = info_span!("invocation", %invocation_id);

    let result = async {
        info!(records = records.len(), "invocation started");
        let result = app.batch_processor.handle_until(records, cancel.clone()).await;
        result.log_outcomes();
        result
    }
    .instrument(span)
    .await;
    cancel.cancel();

    let report = if cli.pretty {
        serde_json::to_string_pretty(&result)
    } else {
        serde_json::to_string(&result)
    }
    .context("Failed to serialise run report")?;
    println!("{report}");

    result
        .into_invocation_result()
        .with_context(|| format!("invocation {invocation_id} failed"))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::parse_from([
            "thumbnail-worker",
            "--event",
            "event.json",
            "--deadline-secs",
            "30",
            "--storage-backend",
            "s3",
            "--s3-region",
            "eu-west-1",
        ]);

        assert_eq!(cli.event, Some(PathBuf::from("event.json")));
        assert_eq!(cli.deadline_secs, Some(30));
        assert!(!cli.pretty);
        assert!(cli.runtime.to_app_config().is_ok());
    }

    #[test]
    fn test_memory_config() {
        let cli = Cli::parse_from(["thumbnail-worker"]);

        let config = cli.runtime.to_app_config().unwrap();
        match config.storage_backend {
            thumbnail_pipeline::StorageBackend::InMemory => (),
            _ => panic!("Expected InMemory backend"),
        }
    }
}
