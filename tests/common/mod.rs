//! Shared fixtures for integration tests.
//!
//! [`ContentProber`] and [`WritingTranscoder`] stand in for ffprobe and
//! ffmpeg so a whole mirror run can be exercised without either installed.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use lm_av::{CodecProber, Transcoder};
use lm_core::{Error, Result};

/// Prober that reports the file's contents as its codec name.
///
/// A file containing `broken` fails to probe.
pub struct ContentProber;

impl CodecProber for ContentProber {
    fn name(&self) -> &'static str {
        "content"
    }

    fn probe_codec(&self, path: &Path) -> Result<String> {
        let content = fs::read_to_string(path)?;
        let codec = content.trim();
        if codec == "broken" {
            return Err(Error::probe(path, "invalid data found when processing input"));
        }
        Ok(codec.to_string())
    }
}

/// Transcoder that writes a marker file at the destination.
///
/// Sources whose path contains `fail` are rejected the way a failing ffmpeg
/// would be. Writing fails if the destination directory is missing.
#[derive(Default)]
pub struct WritingTranscoder {
    calls: Mutex<Vec<PathBuf>>,
}

impl WritingTranscoder {
    pub fn calls(&self) -> Vec<PathBuf> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transcoder for WritingTranscoder {
    fn name(&self) -> &'static str {
        "writing"
    }

    async fn transcode(&self, source: &Path, dest: &Path) -> Result<()> {
        self.calls.lock().unwrap().push(source.to_path_buf());
        if source.to_string_lossy().contains("fail") {
            return Err(Error::tool("ffmpeg", "exited with status 1: Invalid data"));
        }
        tokio::fs::write(dest, format!("lossy:{}", source.display())).await?;
        Ok(())
    }
}

/// Create `files` (relative path, contents) under `root`.
pub fn library(root: &Path, files: &[(&str, &str)]) {
    for (rel, contents) in files {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, contents).unwrap();
    }
}
