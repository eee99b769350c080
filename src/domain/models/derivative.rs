use serde::Serialize;
use std::path::PathBuf;

use super::preset::ResizePreset;
use crate::domain::value_objects::BucketName;

/// One (source, preset) pairing for a single pipeline run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivativeTarget {
    pub preset: ResizePreset,
    /// Scratch file the resizer writes into; removed after upload or failure
    pub local_output_path: PathBuf,
    pub destination_bucket: BucketName,
    pub destination_key: String,
}

/// How a single derivative ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DerivativeOutcome {
    Succeeded { size: u64, md5: String },
    ResizeFailed { reason: String },
    UploadFailed { reason: String },
    /// Dropped in flight because the invocation was cancelled
    Abandoned,
}

impl DerivativeOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, DerivativeOutcome::Succeeded { .. })
    }

    pub fn failure_reason(&self) -> Option<&str> {
        match self {
            DerivativeOutcome::ResizeFailed { reason } | DerivativeOutcome::UploadFailed { reason } => {
                Some(reason)
            }
            DerivativeOutcome::Abandoned => Some("abandoned before completion"),
            DerivativeOutcome::Succeeded { .. } => None,
        }
    }
}

/// Outcome of one derivative plus where it was meant to go
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DerivativeReport {
    pub preset: String,
    pub destination_bucket: String,
    pub destination_key: String,
    #[serde(flatten)]
    pub outcome: DerivativeOutcome,
}

impl DerivativeReport {
    pub fn new(target: &DerivativeTarget, outcome: DerivativeOutcome) -> Self {
        Self {
            preset: target.preset.name().to_string(),
            destination_bucket: target.destination_bucket.to_string(),
            destination_key: target.destination_key.clone(),
            outcome,
        }
    }
}
