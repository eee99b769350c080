use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;
use tracing::{info, warn};

use super::derivative::{DerivativeOutcome, DerivativeReport};
use super::source_object::SourceObject;

/// How the download of the original ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FetchOutcome {
    Fetched { size: u64 },
    FetchFailed { reason: String },
    Abandoned,
}

impl FetchOutcome {
    pub fn is_fetched(&self) -> bool {
        matches!(self, FetchOutcome::Fetched { .. })
    }
}

/// Everything the pipeline knows about one source object after a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PipelineResult {
    pub source: SourceObject,
    pub fetch: FetchOutcome,
    /// One entry per preset, in registry order; empty when the fetch failed
    pub derivatives: Vec<DerivativeReport>,
}

impl PipelineResult {
    pub fn fetch_failed(source: SourceObject, reason: impl Into<String>) -> Self {
        Self {
            source,
            fetch: FetchOutcome::FetchFailed {
                reason: reason.into(),
            },
            derivatives: Vec::new(),
        }
    }

    pub fn abandoned(source: SourceObject) -> Self {
        Self {
            source,
            fetch: FetchOutcome::Abandoned,
            derivatives: Vec::new(),
        }
    }

    pub fn all_succeeded(&self) -> bool {
        self.fetch.is_fetched() && self.derivatives.iter().all(|d| d.outcome.is_success())
    }

    pub fn failed_derivatives(&self) -> impl Iterator<Item = &DerivativeReport> {
        self.derivatives.iter().filter(|d| !d.outcome.is_success())
    }

    /// Whether the original must be redelivered for this object to converge
    pub fn requires_redelivery(&self) -> bool {
        !self.fetch.is_fetched()
            || self
                .derivatives
                .iter()
                .any(|d| d.outcome == DerivativeOutcome::Abandoned)
    }
}

/// Why a notification record was not handed to the pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    IneligibleSource,
}

/// Result for one notification record, in batch order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum RecordResult {
    Processed(PipelineResult),
    Skipped {
        bucket: String,
        key: String,
        reason: SkipReason,
    },
    /// The invocation was cancelled before this record started
    NotAttempted { bucket: String, key: String },
}

impl RecordResult {
    pub fn requires_redelivery(&self) -> bool {
        match self {
            RecordResult::Processed(result) => result.requires_redelivery(),
            RecordResult::Skipped { .. } => false,
            RecordResult::NotAttempted { .. } => true,
        }
    }
}

/// Counts over a batch, for logs and the run report
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub records: usize,
    pub processed: usize,
    pub skipped: usize,
    pub not_attempted: usize,
    pub fetch_failures: usize,
    pub derivatives_succeeded: usize,
    pub derivatives_failed: usize,
}

/// Aggregate result of one invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchResult {
    pub started_at: DateTime<Utc>,
    #[serde(with = "duration_millis")]
    pub elapsed: Duration,
    pub cancelled: bool,
    pub records: Vec<RecordResult>,
}

impl BatchResult {
    pub fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            started_at,
            elapsed: Duration::ZERO,
            cancelled: false,
            records: Vec::new(),
        }
    }

    /// Only unfetched originals fail the invocation; per-preset failures are
    /// reported but would not heal on a blind retry.
    pub fn requires_redelivery(&self) -> bool {
        self.records.iter().any(RecordResult::requires_redelivery)
    }

    pub fn summary(&self) -> BatchSummary {
        let mut summary = BatchSummary {
            records: self.records.len(),
            ..BatchSummary::default()
        };

        for record in &self.records {
            match record {
                RecordResult::Processed(result) => {
                    summary.processed += 1;
                    if !result.fetch.is_fetched() {
                        summary.fetch_failures += 1;
                    }
                    for derivative in &result.derivatives {
                        if derivative.outcome.is_success() {
                            summary.derivatives_succeeded += 1;
                        } else {
                            summary.derivatives_failed += 1;
                        }
                    }
                }
                RecordResult::Skipped { .. } => summary.skipped += 1,
                RecordResult::NotAttempted { .. } => summary.not_attempted += 1,
            }
        }

        summary
    }

    /// Emit one event per (source object, preset), suitable for alerting and
    /// manual redrive of individual derivatives.
    pub fn log_outcomes(&self) {
        for record in &self.records {
            match record {
                RecordResult::Processed(result) => {
                    let bucket = result.source.bucket.as_str();
                    let key = result.source.key.as_str();
                    match &result.fetch {
                        FetchOutcome::Fetched { size } => {
                            info!(bucket, key, size, "source fetched");
                        }
                        FetchOutcome::FetchFailed { reason } => {
                            warn!(bucket, key, reason = reason.as_str(), "source fetch failed");
                        }
                        FetchOutcome::Abandoned => {
                            warn!(bucket, key, "source fetch abandoned");
                        }
                    }

                    for derivative in &result.derivatives {
                        let preset = derivative.preset.as_str();
                        let destination_key = derivative.destination_key.as_str();
                        match derivative.outcome.failure_reason() {
                            None => info!(
                                bucket,
                                key,
                                preset,
                                destination_key,
                                "derivative stored"
                            ),
                            Some(reason) => warn!(
                                bucket,
                                key,
                                preset,
                                destination_key,
                                reason,
                                "derivative failed"
                            ),
                        }
                    }
                }
                RecordResult::Skipped {
                    bucket,
                    key,
                    reason,
                } => {
                    info!(bucket = bucket.as_str(), key = key.as_str(), ?reason, "record skipped");
                }
                RecordResult::NotAttempted { bucket, key } => {
                    warn!(
                        bucket = bucket.as_str(),
                        key = key.as_str(),
                        "record not attempted before cancellation"
                    );
                }
            }
        }
    }

    /// Turn the batch into the signal handed back to the trigger
    pub fn into_invocation_result(self) -> Result<BatchResult, InvocationError> {
        if !self.requires_redelivery() {
            return Ok(self);
        }

        let failed_keys = self
            .records
            .iter()
            .filter(|r| r.requires_redelivery())
            .map(|r| match r {
                RecordResult::Processed(result) => {
                    format!("{}/{}", result.source.bucket, result.source.key)
                }
                RecordResult::Skipped { bucket, key, .. }
                | RecordResult::NotAttempted { bucket, key } => format!("{}/{}", bucket, key),
            })
            .collect();

        Err(InvocationError::RedeliveryRequired {
            failed_keys,
            cancelled: self.cancelled,
            result: Box::new(self),
        })
    }
}

/// Invocation-level failure reported to the host for redelivery
#[derive(Debug, thiserror::Error)]
pub enum InvocationError {
    #[error("source objects need redelivery (cancelled: {cancelled}): {}", .failed_keys.join(", "))]
    RedeliveryRequired {
        failed_keys: Vec<String>,
        cancelled: bool,
        result: Box<BatchResult>,
    },
}

mod duration_millis {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX))
    }
}
