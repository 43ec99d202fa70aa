//! The unit of work handed from the scanner to the worker pool.

use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// What a worker does with a job's source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobAction {
    /// Transcode the source into the lossy target format.
    Convert,
    /// Copy the source verbatim.
    Copy,
}

impl fmt::Display for JobAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobAction::Convert => write!(f, "CONVERT"),
            JobAction::Copy => write!(f, "COPY"),
        }
    }
}

/// One source file mapped to one destination file.
///
/// Jobs are immutable once built; they move by value into the queue and are
/// consumed by exactly one worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Job {
    action: JobAction,
    source: PathBuf,
    dest: PathBuf,
}

impl Job {
    pub fn convert(source: impl Into<PathBuf>, dest: impl Into<PathBuf>) -> Self {
        Self {
            action: JobAction::Convert,
            source: source.into(),
            dest: dest.into(),
        }
    }

    pub fn copy(source: impl Into<PathBuf>, dest: impl Into<PathBuf>) -> Self {
        Self {
            action: JobAction::Copy,
            source: source.into(),
            dest: dest.into(),
        }
    }

    pub fn action(&self) -> JobAction {
        self.action
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn dest(&self) -> &Path {
        &self.dest
    }

    /// Directory that must exist before the job runs.
    pub fn dest_dir(&self) -> Option<&Path> {
        self.dest.parent().filter(|p| !p.as_os_str().is_empty())
    }
}

impl fmt::Display for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}) {} => {}",
            self.action,
            self.source.display(),
            self.dest.display()
        )
    }
}
