//! Library scanner.
//!
//! Walks the source library, classifies every regular file, and turns the
//! eligible ones into [`Job`]s whose destinations are rebased onto the
//! mirror root. Probing happens here, serially, before any worker starts.

use std::path::{Path, PathBuf};

use lm_core::config::MirrorConfig;
use lm_core::{Error, Job, Result, ScanErrorPolicy};
use walkdir::WalkDir;

use crate::classify::{extension_of, CodecClassifier};
use crate::rebase::{rebase_path, rebase_path_keep_extension};

/// A file or directory the scan could not handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanIssue {
    /// The entry involved, when walkdir could tell.
    pub path: Option<PathBuf>,
    pub message: String,
}

impl std::fmt::Display for ScanIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.path {
            Some(ref p) => write!(f, "{}: {}", p.display(), self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

/// Outcome of a library scan.
#[derive(Debug, Default)]
pub struct ScanReport {
    /// Jobs in walk order.
    pub jobs: Vec<Job>,
    /// Files left out under [`ScanErrorPolicy::Skip`].
    pub skipped: Vec<ScanIssue>,
    /// Entries the directory walk could not read.
    pub walk_errors: Vec<ScanIssue>,
}

/// Scanner producing the job list for one mirror run.
#[derive(Debug)]
pub struct LibraryScanner {
    classifier: CodecClassifier,
    target_extension: String,
    copy_extensions: Vec<String>,
    policy: ScanErrorPolicy,
}

impl LibraryScanner {
    pub fn new(classifier: CodecClassifier, target_extension: impl Into<String>) -> Self {
        Self {
            classifier,
            target_extension: target_extension.into(),
            copy_extensions: Vec::new(),
            policy: ScanErrorPolicy::default(),
        }
    }

    /// Build a scanner from the `mirror` configuration section.
    pub fn from_config(classifier: CodecClassifier, config: &MirrorConfig) -> Self {
        Self::new(classifier, config.target_extension())
            .with_copy_extensions(config.copy_extensions())
            .with_policy(config.on_scan_error)
    }

    /// Copy files with these (lowercase, dotless) extensions verbatim.
    pub fn with_copy_extensions(mut self, extensions: Vec<String>) -> Self {
        self.copy_extensions = extensions;
        self
    }

    pub fn with_policy(mut self, policy: ScanErrorPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Walk `source_root` and build the job list for mirroring it into
    /// `dest_root`.
    ///
    /// Entries are visited in file-name order so the job list is stable
    /// between runs over an unchanged tree.
    ///
    /// # Errors
    ///
    /// Under [`ScanErrorPolicy::Abort`] the first probe or path failure is
    /// returned. Under [`ScanErrorPolicy::Collect`] every failure is gathered
    /// into one [`Error::Scan`]. Walk errors are never fatal.
    pub fn scan(&self, source_root: &Path, dest_root: &Path) -> Result<ScanReport> {
        tracing::info!(
            source = %source_root.display(),
            dest = %dest_root.display(),
            policy = %self.policy,
            "Scanning library"
        );

        let mut report = ScanReport::default();
        let mut collected: Vec<ScanIssue> = Vec::new();
        let mut files_seen: u64 = 0;

        let walker = WalkDir::new(source_root)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| match e {
                Ok(entry) => Some(entry),
                Err(err) => {
                    tracing::warn!(error = %err, "Error walking directory");
                    report.walk_errors.push(ScanIssue {
                        path: err.path().map(Path::to_path_buf),
                        message: err.to_string(),
                    });
                    None
                }
            });

        for entry in walker {
            if !entry.file_type().is_file() {
                continue;
            }
            files_seen += 1;

            let path = entry.path();
            match self.job_for(path, source_root, dest_root) {
                Ok(Some(job)) => {
                    tracing::debug!(%job, "Queued");
                    report.jobs.push(job);
                }
                Ok(None) => {}
                Err(e) => match self.policy {
                    ScanErrorPolicy::Abort => return Err(e),
                    ScanErrorPolicy::Skip => {
                        tracing::warn!(file = %path.display(), error = %e, "Skipping file");
                        report.skipped.push(issue(path, &e));
                    }
                    ScanErrorPolicy::Collect => {
                        tracing::warn!(file = %path.display(), error = %e, "Scan failure collected");
                        collected.push(issue(path, &e));
                    }
                },
            }
        }

        if !collected.is_empty() {
            let details: Vec<String> = collected.iter().map(ToString::to_string).collect();
            return Err(Error::Scan(format!(
                "{} file(s) could not be scanned:\n  {}",
                collected.len(),
                details.join("\n  ")
            )));
        }

        tracing::info!(
            files_seen,
            jobs = report.jobs.len(),
            skipped = report.skipped.len(),
            walk_errors = report.walk_errors.len(),
            "Library scan complete"
        );
        Ok(report)
    }

    /// The job for a single file, or `None` if it is not mirrored.
    fn job_for(&self, path: &Path, source_root: &Path, dest_root: &Path) -> Result<Option<Job>> {
        if self.classifier.is_convertible(path)? {
            let dest = rebase_path(path, source_root, dest_root, &self.target_extension)?;
            return Ok(Some(Job::convert(path, dest)));
        }

        let copy = extension_of(path)
            .map(|ext| self.copy_extensions.contains(&ext))
            .unwrap_or(false);
        if copy {
            let dest = rebase_path_keep_extension(path, source_root, dest_root)?;
            return Ok(Some(Job::copy(path, dest)));
        }

        Ok(None)
    }
}

fn issue(path: &Path, error: &Error) -> ScanIssue {
    ScanIssue {
        path: Some(path.to_path_buf()),
        message: error.to_string(),
    }
}
