//! In-process resizer built on the `image` crate.
//!
//! Decoding and resampling are CPU-bound, so the work runs on the blocking
//! pool. Output format follows the output path's extension; JPEG output honours
//! the preset quality, other formats use their encoder defaults.

use async_trait::async_trait;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageFormat};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::{
    domain::{errors::ResizeError, models::ResizePreset},
    ports::resize::ResizeOperation,
};

#[derive(Debug, Clone)]
pub struct ImageCrateResizer {
    filter: FilterType,
}

impl ImageCrateResizer {
    pub fn new() -> Self {
        Self {
            filter: FilterType::Lanczos3,
        }
    }

    pub fn with_filter(filter: FilterType) -> Self {
        Self { filter }
    }

    /// Run the resize on the blocking pool.
    ///
    /// The task outlives a dropped caller, so it owns its output: the image is
    /// rendered into a scratch file next to `output` and only moved into place
    /// while `abandoned` is still untripped.
    fn spawn_resize(
        &self,
        source: &Path,
        preset: &ResizePreset,
        output: &Path,
        abandoned: CancellationToken,
    ) -> JoinHandle<Result<(), ResizeError>> {
        let filter = self.filter;
        let source: PathBuf = source.to_path_buf();
        let output: PathBuf = output.to_path_buf();
        let preset = preset.clone();

        tokio::task::spawn_blocking(move || {
            Self::resize_blocking(filter, &source, &preset, &output, &abandoned)
        })
    }

    fn resize_blocking(
        filter: FilterType,
        source: &Path,
        preset: &ResizePreset,
        output: &Path,
        abandoned: &CancellationToken,
    ) -> Result<(), ResizeError> {
        let format = ImageFormat::from_path(output)
            .map_err(|_| ResizeError::UnsupportedFormat(output.display().to_string()))?;

        let img = image::open(source).map_err(|e| ResizeError::UnreadableSource {
            path: source.to_path_buf(),
            message: e.to_string(),
        })?;

        let (orig_w, orig_h) = img.dimensions();
        if orig_w == 0 || orig_h == 0 {
            return Err(ResizeError::InvalidGeometry {
                width: orig_w,
                height: orig_h,
            });
        }

        // Fit inside the box, aspect preserved; smaller images are scaled up.
        let resized = img.resize(preset.width(), preset.height(), filter);

        debug!(
            original_width = orig_w,
            original_height = orig_h,
            width = resized.width(),
            height = resized.height(),
            preset = preset.name(),
            "image resized"
        );

        let output_failed = |message: String| ResizeError::OutputFailed {
            path: output.to_path_buf(),
            message,
        };

        let dir = output
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let mut scratch = tempfile::Builder::new()
            .prefix(".resize-")
            .tempfile_in(dir)
            .map_err(|e| output_failed(e.to_string()))?;

        encode(&resized, format, preset.quality(), scratch.as_file_mut())
            .map_err(output_failed)?;

        if abandoned.is_cancelled() {
            return Err(abandoned_error());
        }
        scratch
            .persist(output)
            .map_err(|e| output_failed(e.error.to_string()))?;

        // The caller may have cleaned up while the file was being moved in.
        if abandoned.is_cancelled() {
            let _ = std::fs::remove_file(output);
            return Err(abandoned_error());
        }
        Ok(())
    }
}

impl Default for ImageCrateResizer {
    fn default() -> Self {
        Self::new()
    }
}

fn abandoned_error() -> ResizeError {
    ResizeError::TaskAborted("caller stopped waiting".to_string())
}

fn encode(
    img: &DynamicImage,
    format: ImageFormat,
    quality: u8,
    file: &mut File,
) -> Result<(), String> {
    let mut writer = BufWriter::new(file);

    match format {
        ImageFormat::Jpeg => {
            // JPEG has no alpha channel
            let rgb = img.to_rgb8();
            JpegEncoder::new_with_quality(&mut writer, quality.clamp(1, 100))
                .encode_image(&rgb)
                .map_err(|e| e.to_string())?;
        }
        other => img
            .write_to(&mut writer, other)
            .map_err(|e| e.to_string())?,
    }

    writer.flush().map_err(|e| e.to_string())
}

#[async_trait]
impl ResizeOperation for ImageCrateResizer {
    async fn resize(
        &self,
        source: &Path,
        preset: &ResizePreset,
        output: &Path,
    ) -> Result<(), ResizeError> {
        let abandoned = CancellationToken::new();
        // Trips if this future is dropped before the task reports back
        let _abandon_on_drop = abandoned.clone().drop_guard();

        self.spawn_resize(source, preset, output, abandoned)
            .await
            .map_err(|e| ResizeError::TaskAborted(e.to_string()))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn write_png(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
        let path = dir.join(name);
        let img = RgbImage::from_pixel(width, height, Rgb([200, 40, 40]));
        img.save(&path).unwrap();
        path
    }

    #[tokio::test]
    async fn test_fits_within_bounding_box() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_png(dir.path(), "wide.png", 400, 200);
        let output = dir.path().join("wide_thumbnail.png");
        let preset = ResizePreset::new("thumbnail", 100, 100, 90).unwrap();

        ImageCrateResizer::new()
            .resize(&source, &preset, &output)
            .await
            .unwrap();

        let resized = image::open(&output).unwrap();
        assert_eq!(resized.dimensions(), (100, 50));
    }

    #[tokio::test]
    async fn test_jpeg_output_uses_extension() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_png(dir.path(), "square.png", 64, 64);
        let output = dir.path().join("square_thumbnail.jpg");
        let preset = ResizePreset::new("thumbnail", 32, 32, 75).unwrap();

        ImageCrateResizer::new()
            .resize(&source, &preset, &output)
            .await
            .unwrap();

        let bytes = std::fs::read(&output).unwrap();
        assert_eq!(image::guess_format(&bytes).unwrap(), ImageFormat::Jpeg);
    }

    #[tokio::test]
    async fn test_garbage_source_is_unreadable() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("broken.png");
        std::fs::write(&source, b"definitely not a png").unwrap();
        let preset = ResizePreset::new("thumbnail", 32, 32, 75).unwrap();

        let err = ImageCrateResizer::new()
            .resize(&source, &preset, &dir.path().join("broken_thumbnail.png"))
            .await
            .unwrap_err();

        assert!(matches!(err, ResizeError::UnreadableSource { .. }));
    }

    #[tokio::test]
    async fn test_unknown_output_extension_is_unsupported() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_png(dir.path(), "a.png", 8, 8);
        let preset = ResizePreset::new("thumbnail", 4, 4, 75).unwrap();

        let err = ImageCrateResizer::new()
            .resize(&source, &preset, &dir.path().join("a_thumbnail"))
            .await
            .unwrap_err();

        assert!(matches!(err, ResizeError::UnsupportedFormat(_)));
    }

    fn entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_abandoned_resize_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_png(dir.path(), "a.png", 64, 64);
        let preset = ResizePreset::new("thumbnail", 16, 16, 75).unwrap();
        let abandoned = CancellationToken::new();
        abandoned.cancel();

        let err = ImageCrateResizer::resize_blocking(
            FilterType::Triangle,
            &source,
            &preset,
            &dir.path().join("a_thumbnail.png"),
            &abandoned,
        )
        .unwrap_err();

        assert!(matches!(err, ResizeError::TaskAborted(_)));
        assert_eq!(entries(dir.path()), vec!["a.png"]);
    }

    #[tokio::test]
    async fn test_slow_resize_cleans_up_after_caller_leaves() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_png(dir.path(), "big.png", 2000, 2000);
        let output = dir.path().join("big_thumbnail.png");
        let preset = ResizePreset::new("thumbnail", 200, 200, 95).unwrap();
        let resizer = ImageCrateResizer::new();

        let abandoned = CancellationToken::new();
        let task = resizer.spawn_resize(&source, &preset, &output, abandoned.clone());
        // Still decoding when the caller gives up
        abandoned.cancel();

        let result = task.await.unwrap();
        assert!(matches!(result, Err(ResizeError::TaskAborted(_))));
        assert_eq!(entries(dir.path()), vec!["big.png"]);
    }

    #[tokio::test]
    async fn test_successful_resize_leaves_only_output() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_png(dir.path(), "s.png", 40, 20);
        let output = dir.path().join("s_thumbnail.png");
        let preset = ResizePreset::new("thumbnail", 20, 20, 90).unwrap();

        ImageCrateResizer::new()
            .resize(&source, &preset, &output)
            .await
            .unwrap();

        assert_eq!(entries(dir.path()), vec!["s.png", "s_thumbnail.png"]);
    }
}
