//! Application configuration types.
//!
//! The top-level [`Config`] struct is deserialized from JSON and carries the
//! mirror, tools, and encoder sections. Every section defaults sensibly so a
//! completely empty `{}` file is valid.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::Result;
use crate::Error;

// ---------------------------------------------------------------------------
// Top-level Config
// ---------------------------------------------------------------------------

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub mirror: MirrorConfig,
    pub tools: ToolsConfig,
    pub encoder: EncoderConfig,
}

impl Config {
    /// Deserialize a `Config` from a JSON string.
    pub fn from_json(json_str: &str) -> Result<Self> {
        serde_json::from_str(json_str)
            .map_err(|e| Error::Config(format!("config parse error: {e}")))
    }

    /// Read and parse a configuration file, surfacing every failure.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| Error::Io {
            source: std::io::Error::new(e.kind(), format!("read {}: {e}", path.display())),
        })?;
        Self::from_json(&contents)
    }

    /// Load configuration from a file path, falling back to defaults if the
    /// path is `None` or the file does not exist.
    ///
    /// A file that exists but cannot be parsed is still an error: silently
    /// running with defaults would mirror the library with the wrong settings.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        if !path.exists() {
            tracing::info!("No config file at {}; using defaults", path.display());
            return Ok(Self::default());
        }

        Self::load(path)
    }

    /// Reject configurations the run cannot start with.
    pub fn check(&self) -> Result<()> {
        if self.mirror.workers == 0 {
            return Err(Error::Config("mirror.workers must be at least 1".into()));
        }
        if self.mirror.target_extension().is_empty() {
            return Err(Error::Config("mirror.target_extension is empty".into()));
        }
        Ok(())
    }

    /// Return a list of validation warnings (non-fatal issues).
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.encoder.quality > 9 {
            warnings.push(format!(
                "encoder.quality {} is outside the VBR range 0..=9",
                self.encoder.quality
            ));
        }

        let target = self.mirror.target_extension().to_ascii_lowercase();
        for ext in self.mirror.copy_extensions() {
            if ext == target {
                warnings.push(format!(
                    "mirror.copy_extensions contains the target extension '{ext}'; \
                     copied files may collide with converted ones"
                ));
            }
            if ext == "flac" || ext == "m4a" {
                warnings.push(format!(
                    "mirror.copy_extensions contains '{ext}', which is converted instead"
                ));
            }
        }

        if let Some(ref p) = self.tools.ffmpeg_path {
            if !p.exists() {
                warnings.push(format!(
                    "tools.ffmpeg_path {} does not exist; falling back to PATH",
                    p.display()
                ));
            }
        }
        if let Some(ref p) = self.tools.ffprobe_path {
            if !p.exists() {
                warnings.push(format!(
                    "tools.ffprobe_path {} does not exist; falling back to PATH",
                    p.display()
                ));
            }
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// What the scanner does when a single file cannot be classified or rebased.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanErrorPolicy {
    /// Stop the scan at the first failing file.
    #[default]
    Abort,
    /// Log the failure, leave the file out of the mirror, keep scanning.
    Skip,
    /// Keep scanning, then fail with every collected failure.
    Collect,
}

impl std::fmt::Display for ScanErrorPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScanErrorPolicy::Abort => write!(f, "abort"),
            ScanErrorPolicy::Skip => write!(f, "skip"),
            ScanErrorPolicy::Collect => write!(f, "collect"),
        }
    }
}

impl std::str::FromStr for ScanErrorPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "abort" => Ok(ScanErrorPolicy::Abort),
            "skip" => Ok(ScanErrorPolicy::Skip),
            "collect" => Ok(ScanErrorPolicy::Collect),
            other => Err(Error::Config(format!(
                "unknown scan error policy '{other}' (valid: abort, skip, collect)"
            ))),
        }
    }
}

/// Library mirroring settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MirrorConfig {
    /// Number of concurrent transcode workers.
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Extension given to converted files.
    #[serde(default = "default_target_extension")]
    pub target_extension: String,
    pub on_scan_error: ScanErrorPolicy,
    /// Extensions copied verbatim into the mirror (cover art, cue sheets).
    pub copy_extensions: Vec<String>,
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            target_extension: default_target_extension(),
            on_scan_error: ScanErrorPolicy::default(),
            copy_extensions: Vec::new(),
        }
    }
}

impl MirrorConfig {
    /// Target extension without a leading dot.
    pub fn target_extension(&self) -> &str {
        self.target_extension.trim_start_matches('.')
    }

    /// Copy extensions, lowercased and without leading dots.
    pub fn copy_extensions(&self) -> Vec<String> {
        self.copy_extensions
            .iter()
            .map(|e| e.trim_start_matches('.').to_ascii_lowercase())
            .filter(|e| !e.is_empty())
            .collect()
    }
}

fn default_workers() -> usize {
    4
}

fn default_target_extension() -> String {
    "mp3".into()
}

/// External tool overrides.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub ffmpeg_path: Option<PathBuf>,
    pub ffprobe_path: Option<PathBuf>,
    /// Upper bound for a single tool invocation. Unset means no limit.
    pub timeout_secs: Option<u64>,
}

impl ToolsConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

/// Lossy encoder settings passed to ffmpeg.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderConfig {
    /// VBR quality for `-q:a` (0 is best, i.e. MP3 V0).
    pub quality: u8,
    /// Extra ffmpeg arguments inserted before the output path.
    pub extra_args: Vec<String>,
}
