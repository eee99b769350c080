use crate::domain::{errors::ResizeError, models::ResizePreset};
use async_trait::async_trait;
use std::path::Path;

/// Port for the image-resampling step.
///
/// Implementations read `source`, fit it within the preset's bounding box
/// preserving aspect ratio, and write the result to `output`. The caller owns
/// both paths and never inspects how the work is done.
#[async_trait]
pub trait ResizeOperation: Send + Sync + 'static {
    async fn resize(
        &self,
        source: &Path,
        preset: &ResizePreset,
        output: &Path,
    ) -> Result<(), ResizeError>;
}
