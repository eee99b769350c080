use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

use crate::{
    domain::{errors::ResizeError, models::ResizePreset},
    ports::resize::ResizeOperation,
};

/// Default ImageMagick entry point
pub const DEFAULT_CONVERT_PROGRAM: &str = "convert";

/// Resizes by shelling out to ImageMagick:
/// `convert -thumbnail {w}x{h} -quality {q} <source> <output>`
#[derive(Debug, Clone)]
pub struct ConvertCommandResizer {
    program: PathBuf,
}

impl ConvertCommandResizer {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Argument vector handed to the tool, in order
    pub fn args(source: &Path, preset: &ResizePreset, output: &Path) -> Vec<OsString> {
        vec![
            "-thumbnail".into(),
            format!("{}x{}", preset.width(), preset.height()).into(),
            "-quality".into(),
            preset.quality().to_string().into(),
            source.as_os_str().to_owned(),
            output.as_os_str().to_owned(),
        ]
    }
}

impl Default for ConvertCommandResizer {
    fn default() -> Self {
        Self::new(DEFAULT_CONVERT_PROGRAM)
    }
}

#[async_trait]
impl ResizeOperation for ConvertCommandResizer {
    async fn resize(
        &self,
        source: &Path,
        preset: &ResizePreset,
        output: &Path,
    ) -> Result<(), ResizeError> {
        let program = self.program.display().to_string();

        debug!(%program, preset = preset.name(), source = %source.display(), "running resize tool");

        let result = Command::new(&self.program)
            .args(Self::args(source, preset, output))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| ResizeError::Spawn {
                program: program.clone(),
                message: e.to_string(),
            })?;

        if !result.status.success() {
            return Err(ResizeError::ToolFailed {
                program,
                status: result.status.to_string(),
                stderr: String::from_utf8_lossy(&result.stderr).trim().to_string(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_follow_imagemagick_order() {
        let preset = ResizePreset::new("thumbnail", 200, 150, 95).unwrap();
        let args = ConvertCommandResizer::args(
            Path::new("/tmp/a.jpg"),
            &preset,
            Path::new("/tmp/a_thumbnail.jpg"),
        );

        let args: Vec<String> = args
            .into_iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            args,
            vec![
                "-thumbnail",
                "200x150",
                "-quality",
                "95",
                "/tmp/a.jpg",
                "/tmp/a_thumbnail.jpg"
            ]
        );
    }

    #[tokio::test]
    async fn test_missing_program_is_spawn_error() {
        let resizer = ConvertCommandResizer::new("/nonexistent/bin/convert-missing");
        let preset = ResizePreset::new("thumbnail", 10, 10, 80).unwrap();

        let err = resizer
            .resize(Path::new("in.jpg"), &preset, Path::new("out.jpg"))
            .await
            .unwrap_err();

        assert!(matches!(err, ResizeError::Spawn { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_nonzero_exit_is_tool_failure() {
        // `false` ignores its arguments and exits 1
        let resizer = ConvertCommandResizer::new("false");
        let preset = ResizePreset::new("thumbnail", 10, 10, 80).unwrap();

        let err = resizer
            .resize(Path::new("in.jpg"), &preset, Path::new("out.jpg"))
            .await
            .unwrap_err();

        assert!(matches!(err, ResizeError::ToolFailed { .. }));
    }
}
