//! Orchestration of one mirror run: scan, prepare destinations, dispatch.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use lm_av::{CodecProber, Transcoder};
use lm_core::{Config, Error, Job, Result};

use crate::classify::CodecClassifier;
use crate::pool::{JobQueue, PoolSummary, WorkerPool};
use crate::scanner::{LibraryScanner, ScanReport};

/// A source library, its mirror root, and the settings for mirroring it.
#[derive(Debug, Clone)]
pub struct Mirror {
    source_root: PathBuf,
    dest_root: PathBuf,
    config: Config,
}

impl Mirror {
    /// Validate the roots and configuration for a run.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the configuration is unusable or the
    /// source root is not a directory.
    pub fn new(
        source_root: impl Into<PathBuf>,
        dest_root: impl Into<PathBuf>,
        config: Config,
    ) -> Result<Self> {
        let source_root = source_root.into();
        let dest_root = dest_root.into();

        config.check()?;
        for warning in config.validate() {
            tracing::warn!("config: {warning}");
        }

        if !source_root.is_dir() {
            return Err(Error::Config(format!(
                "source library {} is not a directory",
                source_root.display()
            )));
        }
        if dest_root.starts_with(&source_root) {
            tracing::warn!(
                dest = %dest_root.display(),
                "Destination is inside the source library; earlier output may be rescanned"
            );
        }

        Ok(Self {
            source_root,
            dest_root,
            config,
        })
    }

    pub fn source_root(&self) -> &Path {
        &self.source_root
    }

    pub fn dest_root(&self) -> &Path {
        &self.dest_root
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Walk the source library and build the job list.
    pub fn scan(&self, prober: Arc<dyn CodecProber>) -> Result<ScanReport> {
        let classifier = CodecClassifier::new(prober);
        LibraryScanner::from_config(classifier, &self.config.mirror)
            .scan(&self.source_root, &self.dest_root)
    }

    /// Create every destination directory the jobs need.
    ///
    /// Must complete before any job is dispatched; workers never create
    /// directories. Returns the number of distinct directories.
    pub fn prepare(&self, jobs: &[Job]) -> Result<usize> {
        prepare_destinations(jobs)
    }

    /// Queue every job, run the worker pool, and wait for it to finish.
    pub async fn dispatch(&self, jobs: Vec<Job>, transcoder: Arc<dyn Transcoder>) -> PoolSummary {
        let pool = WorkerPool::new(self.config.mirror.workers, transcoder);
        pool.run(JobQueue::load(jobs)).await
    }
}

/// Ensure the parent directory of every job's destination exists.
///
/// Each distinct directory is created once, ancestors included.
pub fn prepare_destinations(jobs: &[Job]) -> Result<usize> {
    let dirs: BTreeSet<&Path> = jobs.iter().filter_map(Job::dest_dir).collect();

    for dir in &dirs {
        std::fs::create_dir_all(dir).map_err(|e| Error::Io {
            source: std::io::Error::new(
                e.kind(),
                format!("create {}: {e}", dir.display()),
            ),
        })?;
    }

    tracing::debug!(directories = dirs.len(), "Destination directories ready");
    Ok(dirs.len())
}
