//! Audio stream probing.
//!
//! [`CodecProber`] is the interface the classifier uses to look inside an
//! ambiguous container. [`FfprobeProber`] implements it by shelling out to
//! `ffprobe` and reading the codec of the first audio stream.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use lm_core::{Error, Result};

use crate::command::ToolCommand;

/// Reports the codec of a file's primary audio stream.
///
/// Implementations must be safe to share across threads (`Send + Sync`).
pub trait CodecProber: Send + Sync {
    /// Human-readable name identifying this prober implementation.
    fn name(&self) -> &'static str;

    /// Return the codec name of the first audio stream (e.g. `"alac"`).
    ///
    /// A file without an audio stream yields an empty string. Failing to
    /// run the probe at all is an error, never an empty string.
    fn probe_codec(&self, path: &Path) -> Result<String>;
}

/// A prober backed by the `ffprobe` CLI.
#[derive(Debug, Clone)]
pub struct FfprobeProber {
    /// Path to the ffprobe binary.
    ffprobe_path: PathBuf,
}

impl FfprobeProber {
    /// Create a new prober using the given ffprobe path.
    pub fn new(ffprobe_path: PathBuf) -> Self {
        Self { ffprobe_path }
    }

    fn command(&self, path: &Path) -> ToolCommand {
        let mut cmd = ToolCommand::new(self.ffprobe_path.clone());
        cmd.args([
            "-v", "error",
            "-select_streams", "a:0",
            "-show_entries", "stream=codec_name",
            "-of", "json",
        ]);
        cmd.arg(path);
        cmd
    }
}

impl CodecProber for FfprobeProber {
    fn name(&self) -> &'static str {
        "ffprobe"
    }

    fn probe_codec(&self, path: &Path) -> Result<String> {
        let output = self
            .command(path)
            .execute_blocking()
            .map_err(|e| Error::probe(path, e.to_string()))?;

        let codec = parse_codec_name(&output.stdout).map_err(|e| Error::probe(path, e))?;
        tracing::debug!(file = %path.display(), codec = %codec, "Probed audio stream");
        Ok(codec)
    }
}

// ---------------------------------------------------------------------------
// JSON structures
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_name: Option<String>,
}

/// Extract the first stream's codec name from ffprobe's JSON output.
fn parse_codec_name(stdout: &str) -> std::result::Result<String, String> {
    let output: FfprobeOutput =
        serde_json::from_str(stdout).map_err(|e| format!("ffprobe JSON parse error: {e}"))?;

    Ok(output
        .streams
        .into_iter()
        .next()
        .and_then(|s| s.codec_name)
        .map(|c| c.trim().to_string())
        .unwrap_or_default())
}
