use crate::domain::models::{PipelineResult, SourceObject};
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// Port for generating every derivative of one source object.
///
/// Never fails past its boundary: fetch, resize and upload failures all come
/// back inside the `PipelineResult`.
#[async_trait]
pub trait DerivativeService: Send + Sync + 'static {
    /// Fetch the original, then resize and upload it once per preset
    async fn process(&self, source: &SourceObject) -> PipelineResult {
        self.process_until(source, &CancellationToken::new()).await
    }

    /// As `process`, abandoning in-flight work once `cancel` fires
    async fn process_until(
        &self,
        source: &SourceObject,
        cancel: &CancellationToken,
    ) -> PipelineResult;
}
