use crate::ports::eligibility::EligibilityPredicate;

/// Extensions of raster formats worth generating thumbnails for
pub const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "webp", "bmp", "tif", "tiff", "avif",
];

/// Accepts keys that end in a known image extension.
///
/// Extensions can't be trusted to match the actual encoding, but filtering on
/// them keeps obvious non-images (and folder markers) out of the pipeline.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageExtensionEligibility;

impl EligibilityPredicate for ImageExtensionEligibility {
    fn is_supported(&self, key: &str) -> bool {
        if key.ends_with('/') {
            return false;
        }

        let file_name = key.rsplit('/').next().unwrap_or(key);
        match file_name.rsplit_once('.') {
            Some((_, extension)) => IMAGE_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(extension)),
            None => false,
        }
    }
}
