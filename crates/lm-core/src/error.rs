//! Unified error type for lossymirror.
//!
//! All crates funnel their failures into [`Error`], which carries enough
//! context for the binary to pick a process exit status via
//! [`Error::exit_code`].

use std::path::{Path, PathBuf};

/// Unified error type covering all failure modes in lossymirror.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid or missing configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// An I/O operation failed.
    #[error("IO error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// An external tool (ffmpeg, ffprobe) could not be run or returned an error.
    #[error("Tool error [{tool}]: {message}")]
    Tool {
        /// Name of the tool that failed.
        tool: String,
        /// Human-readable error description.
        message: String,
    },

    /// Stream probing failed for a file, so it cannot be classified.
    #[error("Probe error for {}: {message}", path.display())]
    Probe {
        /// File that was being probed.
        path: PathBuf,
        /// Human-readable error description.
        message: String,
    },

    /// A file could not be expressed relative to the library root.
    #[error("Path error: {} is not under {}", path.display(), root.display())]
    Path {
        /// The offending file.
        path: PathBuf,
        /// The root it was expected to live under.
        root: PathBuf,
    },

    /// One or more files failed during the library scan.
    #[error("Scan error: {0}")]
    Scan(String),

    /// Catch-all for unexpected internal errors.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Map this error to a process exit status.
    ///
    /// `1` is reserved for "the run completed but some jobs failed", so
    /// every error class here uses a distinct non-zero status.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Config(_) => 2,
            Error::Probe { .. } => 3,
            Error::Path { .. } => 3,
            Error::Scan(_) => 3,
            Error::Tool { .. } => 4,
            Error::Io { .. } => 5,
            Error::Internal(_) => 70,
        }
    }

    /// Convenience constructor for [`Error::Tool`].
    pub fn tool(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Tool {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Convenience constructor for [`Error::Probe`].
    pub fn probe(path: impl AsRef<Path>, message: impl Into<String>) -> Self {
        Error::Probe {
            path: path.as_ref().to_path_buf(),
            message: message.into(),
        }
    }

    /// Convenience constructor for [`Error::Path`].
    pub fn path(path: impl AsRef<Path>, root: impl AsRef<Path>) -> Self {
        Error::Path {
            path: path.as_ref().to_path_buf(),
            root: root.as_ref().to_path_buf(),
        }
    }
}

/// Result alias using the crate-level [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn config_display() {
        let err = Error::Config("workers must be at least 1".into());
        assert_eq!(
            err.to_string(),
            "Configuration error: workers must be at least 1"
        );
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn io_from_std() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let err = Error::from(io_err);
        assert_matches!(err, Error::Io { .. });
        assert_eq!(err.exit_code(), 5);
    }

    #[test]
    fn tool_display() {
        let err = Error::tool("ffmpeg", "exit code 1");
        assert_eq!(err.to_string(), "Tool error [ffmpeg]: exit code 1");
        assert_eq!(err.exit_code(), 4);
    }

    #[test]
    fn probe_display() {
        let err = Error::probe("/music/a.m4a", "ffprobe not found");
        assert_eq!(
            err.to_string(),
            "Probe error for /music/a.m4a: ffprobe not found"
        );
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn path_display() {
        let err = Error::path("/elsewhere/a.flac", "/music");
        assert_eq!(
            err.to_string(),
            "Path error: /elsewhere/a.flac is not under /music"
        );
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn scan_and_internal_codes() {
        assert_eq!(Error::Scan("2 files failed".into()).exit_code(), 3);
        assert_eq!(Error::Internal("boom".into()).exit_code(), 70);
    }

    #[test]
    fn exit_codes_never_collide_with_job_failure() {
        let errors = [
            Error::Config(String::new()),
            Error::tool("ffmpeg", ""),
            Error::probe("a", ""),
            Error::path("a", "b"),
            Error::Scan(String::new()),
            Error::Internal(String::new()),
            Error::from(std::io::Error::other("x")),
        ];
        for err in &errors {
            assert_ne!(err.exit_code(), 0);
            assert_ne!(err.exit_code(), 1, "{err} must not look like a job failure");
        }
    }
}
