use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{
    domain::models::{BatchResult, KeyPathMapper, NotificationRecord, RecordResult, SkipReason},
    ports::{
        eligibility::{AcceptAll, EligibilityPredicate},
        services::{BatchService, DerivativeService},
    },
};

/// Drives the derivative pipeline over a batch of notifications, one record
/// at a time and in delivery order.
#[derive(Clone)]
pub struct BatchProcessorImpl {
    pipeline: Arc<dyn DerivativeService>,
    mapper: KeyPathMapper,
    eligibility: Arc<dyn EligibilityPredicate>,
}

impl BatchProcessorImpl {
    /// Processor that treats every record as eligible
    pub fn new(pipeline: Arc<dyn DerivativeService>, mapper: KeyPathMapper) -> Self {
        Self {
            pipeline,
            mapper,
            eligibility: Arc::new(AcceptAll),
        }
    }

    pub fn with_eligibility(mut self, eligibility: Arc<dyn EligibilityPredicate>) -> Self {
        self.eligibility = eligibility;
        self
    }
}

#[async_trait]
impl BatchService for BatchProcessorImpl {
    async fn handle_until(
        &self,
        batch: Vec<NotificationRecord>,
        cancel: CancellationToken,
    ) -> BatchResult {
        let started = Instant::now();
        let mut result = BatchResult::new(Utc::now());
        result.records.reserve(batch.len());

        info!(records = batch.len(), "handling notification batch");

        for record in batch {
            if cancel.is_cancelled() {
                result.cancelled = true;
                result.records.push(RecordResult::NotAttempted {
                    bucket: record.bucket,
                    key: record.key,
                });
                continue;
            }

            let source = self
                .mapper
                .derive_source_object(&record.bucket, &record.key);

            if !self.eligibility.is_supported(&source.key) {
                debug!(bucket = %source.bucket, key = %source.key, "skipping ineligible source");
                result.records.push(RecordResult::Skipped {
                    bucket: record.bucket,
                    key: record.key,
                    reason: SkipReason::IneligibleSource,
                });
                continue;
            }

            let pipeline_result = self.pipeline.process_until(&source, &cancel).await;
            result.records.push(RecordResult::Processed(pipeline_result));
        }

        // A token fired during the last record still counts as a cancelled run.
        result.cancelled |= cancel.is_cancelled();
        result.elapsed = started.elapsed();

        let summary = result.summary();
        if result.requires_redelivery() {
            warn!(?summary, "batch finished with records that need redelivery");
        } else {
            info!(?summary, "batch finished");
        }

        result
    }
}
