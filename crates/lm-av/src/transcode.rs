//! Lossy transcoding via ffmpeg, and verbatim copies.

use std::path::Path;

use async_trait::async_trait;

use lm_core::config::EncoderConfig;
use lm_core::{Error, Result};

use crate::command::ToolCommand;
use crate::tools::ToolConfig;

/// Converts one source file into one lossy destination file.
///
/// The destination directory already exists when this is called.
#[async_trait]
pub trait Transcoder: Send + Sync {
    /// Human-readable name identifying this transcoder implementation.
    fn name(&self) -> &'static str;

    /// Transcode `source` into `dest`, overwriting any existing file.
    async fn transcode(&self, source: &Path, dest: &Path) -> Result<()>;
}

/// A transcoder backed by the `ffmpeg` CLI.
#[derive(Debug, Clone)]
pub struct FfmpegTranscoder {
    tool: ToolConfig,
    encoder: EncoderConfig,
}

impl FfmpegTranscoder {
    pub fn new(tool: ToolConfig, encoder: EncoderConfig) -> Self {
        Self { tool, encoder }
    }

    fn command(&self, source: &Path, dest: &Path) -> ToolCommand {
        let mut cmd = ToolCommand::new(self.tool.path.clone());
        cmd.timeout(self.tool.timeout);
        cmd.args(["-nostdin", "-y", "-i"]);
        cmd.arg(source);
        cmd.arg("-q:a").arg(self.encoder.quality.to_string());
        cmd.args(&self.encoder.extra_args);
        cmd.arg(dest);
        cmd
    }
}

#[async_trait]
impl Transcoder for FfmpegTranscoder {
    fn name(&self) -> &'static str {
        "ffmpeg"
    }

    async fn transcode(&self, source: &Path, dest: &Path) -> Result<()> {
        tracing::debug!(
            source = %source.display(),
            dest = %dest.display(),
            quality = self.encoder.quality,
            "ffmpeg transcode"
        );
        self.command(source, dest).execute().await?;
        Ok(())
    }
}

/// Copy `source` to `dest` byte for byte, overwriting `dest`.
pub async fn copy_file(source: &Path, dest: &Path) -> Result<()> {
    let bytes = tokio::fs::copy(source, dest).await.map_err(|e| {
        Error::Io {
            source: std::io::Error::new(
                e.kind(),
                format!("copy {} -> {}: {e}", source.display(), dest.display()),
            ),
        }
    })?;
    tracing::debug!(source = %source.display(), dest = %dest.display(), bytes, "copied");
    Ok(())
}
