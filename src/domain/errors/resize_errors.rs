use std::path::PathBuf;
use thiserror::Error as ThisError;

/// Failures reported by a resize operation.
///
/// The pipeline only needs the message; the variants exist so adapters can
/// say which of the usual causes it was.
#[derive(ThisError, Debug)]
pub enum ResizeError {
    #[error("Unreadable source image {path}: {message}")]
    UnreadableSource { path: PathBuf, message: String },

    #[error("Unsupported image format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid geometry {width}x{height}")]
    InvalidGeometry { width: u32, height: u32 },

    #[error("Failed to write resized image {path}: {message}")]
    OutputFailed { path: PathBuf, message: String },

    #[error("Resize tool `{program}` exited with {status}: {stderr}")]
    ToolFailed {
        program: String,
        status: String,
        stderr: String,
    },

    #[error("Failed to launch resize tool `{program}`: {message}")]
    Spawn { program: String, message: String },

    #[error("Resize task aborted: {0}")]
    TaskAborted(String),
}
