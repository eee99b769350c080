use image::ImageFormat;

/// Fallback when the bytes are not a recognised image
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Infer a MIME type from the leading bytes of an encoded image.
///
/// The extension is not consulted: a resize step may re-encode into a format
/// the original key does not advertise.
pub fn sniff_content_type(data: &[u8]) -> &'static str {
    match image::guess_format(data) {
        Ok(ImageFormat::Jpeg) => "image/jpeg",
        Ok(ImageFormat::Png) => "image/png",
        Ok(ImageFormat::Gif) => "image/gif",
        Ok(ImageFormat::WebP) => "image/webp",
        Ok(ImageFormat::Bmp) => "image/bmp",
        Ok(ImageFormat::Tiff) => "image/tiff",
        Ok(ImageFormat::Avif) => "image/avif",
        Ok(ImageFormat::Ico) => "image/x-icon",
        Ok(ImageFormat::Qoi) => "image/qoi",
        _ => OCTET_STREAM,
    }
}
