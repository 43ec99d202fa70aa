//! Job queue and worker pool.
//!
//! The queue is a bounded tokio channel sized to hold the whole job list.
//! It is filled once and closed by dropping its only sender, so workers
//! see `None` exactly when every job has been handed out.
//!
//! Workers share the receiver behind an async mutex: whoever holds the lock
//! receives the next job, which makes every job go to exactly one worker.
//! The lock is released before the job runs, so up to `workers` jobs run at
//! the same time.

use std::sync::Arc;

use lm_av::Transcoder;
use lm_core::{Job, JobAction, Result};
use tokio::sync::{mpsc, Mutex};

/// A closed, pre-filled queue of jobs.
#[derive(Debug)]
pub struct JobQueue {
    rx: Arc<Mutex<mpsc::Receiver<Job>>>,
    len: usize,
}

impl JobQueue {
    /// Load every job into a channel with room for all of them, then close it.
    pub fn load(jobs: Vec<Job>) -> Self {
        let len = jobs.len();
        // tokio channels cannot have zero capacity.
        let (tx, rx) = mpsc::channel(len.max(1));

        for job in jobs {
            tx.try_send(job)
                .expect("job queue has room for every job and a live receiver");
        }
        drop(tx);

        Self {
            rx: Arc::new(Mutex::new(rx)),
            len,
        }
    }

    /// Number of jobs the queue was loaded with.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Take the next job, or `None` once the queue is drained.
    pub async fn next(&self) -> Option<Job> {
        let mut guard = self.rx.lock().await;
        guard.recv().await
    }

    fn handle(&self) -> Self {
        Self {
            rx: Arc::clone(&self.rx),
            len: self.len,
        }
    }
}

/// A job that did not complete.
#[derive(Debug, Clone)]
pub struct JobFailure {
    /// Worker that ran the job.
    pub worker: usize,
    pub job: Job,
    pub error: String,
}

/// Outcome of draining a queue.
#[derive(Debug, Default)]
pub struct PoolSummary {
    /// Jobs handed to workers.
    pub total: usize,
    pub succeeded: usize,
    pub failures: Vec<JobFailure>,
    /// Worker tasks that died outside a job.
    pub panicked_workers: usize,
}

impl PoolSummary {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty() && self.panicked_workers == 0
    }

    /// Jobs that did not succeed, plus one per panicked worker.
    pub fn failed(&self) -> usize {
        self.failures.len() + self.panicked_workers
    }

    fn merge(&mut self, other: PoolSummary) {
        self.total += other.total;
        self.succeeded += other.succeeded;
        self.failures.extend(other.failures);
        self.panicked_workers += other.panicked_workers;
    }
}

/// Fixed-size pool of workers draining a [`JobQueue`].
#[derive(Clone)]
pub struct WorkerPool {
    workers: usize,
    transcoder: Arc<dyn Transcoder>,
}

impl WorkerPool {
    /// Create a pool of `workers` workers (at least one).
    pub fn new(workers: usize, transcoder: Arc<dyn Transcoder>) -> Self {
        Self {
            workers: workers.max(1),
            transcoder,
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Drain `queue` with every worker and wait for all of them to finish.
    ///
    /// Job failures are logged and collected; they never stop other workers.
    pub async fn run(&self, queue: JobQueue) -> PoolSummary {
        tracing::info!(
            workers = self.workers,
            jobs = queue.len(),
            transcoder = self.transcoder.name(),
            "Starting worker pool"
        );

        let mut handles = Vec::with_capacity(self.workers);
        for id in 0..self.workers {
            let queue = queue.handle();
            let transcoder = Arc::clone(&self.transcoder);
            handles.push(tokio::spawn(run_worker(id, queue, transcoder)));
        }
        drop(queue);

        let mut summary = PoolSummary::default();
        for (id, handle) in handles.into_iter().enumerate() {
            match handle.await {
                Ok(worker_summary) => summary.merge(worker_summary),
                Err(e) => {
                    tracing::error!(worker = id, error = %e, "Worker task panicked");
                    summary.panicked_workers += 1;
                }
            }
        }

        tracing::info!(
            total = summary.total,
            succeeded = summary.succeeded,
            failed = summary.failed(),
            "Worker pool finished"
        );
        summary
    }
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("workers", &self.workers)
            .field("transcoder", &self.transcoder.name())
            .finish()
    }
}

/// Worker loop: take a job, run it, report, repeat until the queue is drained.
///
/// Each job runs in its own task so a panic costs only that job.
async fn run_worker(id: usize, queue: JobQueue, transcoder: Arc<dyn Transcoder>) -> PoolSummary {
    tracing::debug!(worker = id, "Worker spawned");
    let mut summary = PoolSummary::default();

    while let Some(job) = queue.next().await {
        summary.total += 1;
        tracing::info!(worker = id, %job, "New job");

        let task = {
            let job = job.clone();
            let transcoder = Arc::clone(&transcoder);
            tokio::spawn(async move { execute(&job, transcoder.as_ref()).await })
        };

        let error = match task.await {
            Ok(Ok(())) => {
                tracing::info!(worker = id, dest = %job.dest().display(), "Job done");
                summary.succeeded += 1;
                continue;
            }
            Ok(Err(e)) => e.to_string(),
            Err(e) => format!("job panicked: {e}"),
        };

        tracing::error!(
            worker = id,
            source = %job.source().display(),
            dest = %job.dest().display(),
            error = %error,
            "Job failed"
        );
        summary.failures.push(JobFailure {
            worker: id,
            job,
            error,
        });
    }

    tracing::debug!(worker = id, processed = summary.total, "Worker finished");
    summary
}

async fn execute(job: &Job, transcoder: &dyn Transcoder) -> Result<()> {
    match job.action() {
        JobAction::Convert => transcoder.transcode(job.source(), job.dest()).await,
        JobAction::Copy => lm_av::copy_file(job.source(), job.dest()).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use lm_core::Error;
    use std::collections::HashSet;
    use std::path::{Path, PathBuf};
    use std::sync::Mutex as StdMutex;

    /// Records every invocation and fails sources whose name contains "fail".
    #[derive(Default)]
    struct RecordingTranscoder {
        seen: StdMutex<Vec<PathBuf>>,
    }

    #[async_trait]
    impl Transcoder for RecordingTranscoder {
        fn name(&self) -> &'static str {
            "recording"
        }

        async fn transcode(&self, source: &Path, _dest: &Path) -> Result<()> {
            tokio::task::yield_now().await;
            self.seen.lock().unwrap().push(source.to_path_buf());
            if source.to_string_lossy().contains("fail") {
                return Err(Error::tool("recording", "exited with status 1"));
            }
            Ok(())
        }
    }

    fn jobs(n: usize) -> Vec<Job> {
        (0..n)
            .map(|i| Job::convert(format!("/m/{i}.flac"), format!("/o/{i}.mp3")))
            .collect()
    }

    #[test]
    fn queue_reports_length() {
        let queue = JobQueue::load(jobs(3));
        assert_eq!(queue.len(), 3);
        assert!(!queue.is_empty());
        assert!(JobQueue::load(Vec::new()).is_empty());
    }

    #[tokio::test]
    async fn queue_is_fifo_and_closed() {
        let queue = JobQueue::load(jobs(3));
        for i in 0..3 {
            let job = queue.next().await.unwrap();
            assert_eq!(job.source(), Path::new(&format!("/m/{i}.flac")));
        }
        assert!(queue.next().await.is_none());
        assert!(queue.next().await.is_none());
    }

    #[tokio::test]
    async fn every_job_runs_exactly_once() {
        for workers in [1, 2, 4, 16] {
            let transcoder = Arc::new(RecordingTranscoder::default());
            let pool = WorkerPool::new(workers, transcoder.clone());
            let summary = pool.run(JobQueue::load(jobs(25))).await;

            assert_eq!(summary.total, 25);
            assert_eq!(summary.succeeded, 25);
            assert!(summary.is_success());

            let seen = transcoder.seen.lock().unwrap();
            assert_eq!(seen.len(), 25);
            let unique: HashSet<_> = seen.iter().collect();
            assert_eq!(unique.len(), 25, "a job ran twice with {workers} workers");
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn multi_threaded_runtime_drains_queue() {
        let transcoder = Arc::new(RecordingTranscoder::default());
        let summary = WorkerPool::new(8, transcoder.clone())
            .run(JobQueue::load(jobs(100)))
            .await;
        assert_eq!(summary.succeeded, 100);
        assert_eq!(transcoder.seen.lock().unwrap().len(), 100);
    }

    #[tokio::test]
    async fn empty_queue_terminates_without_invocations() {
        let transcoder = Arc::new(RecordingTranscoder::default());
        let summary = WorkerPool::new(4, transcoder.clone())
            .run(JobQueue::load(Vec::new()))
            .await;
        assert_eq!(summary.total, 0);
        assert!(summary.is_success());
        assert!(transcoder.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn failure_is_isolated() {
        let transcoder = Arc::new(RecordingTranscoder::default());
        let queue = JobQueue::load(vec![
            Job::convert("/m/a.flac", "/o/a.mp3"),
            Job::convert("/m/fail.flac", "/o/fail.mp3"),
            Job::convert("/m/c.flac", "/o/c.mp3"),
        ]);
        let summary = WorkerPool::new(2, transcoder.clone()).run(queue).await;

        assert_eq!(summary.total, 3);
        assert_eq!(summary.succeeded, 2);
        assert_eq!(summary.failures.len(), 1);
        assert_eq!(summary.failures[0].job.source(), Path::new("/m/fail.flac"));
        assert!(summary.failures[0].error.contains("status 1"));
        assert_eq!(transcoder.seen.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn all_failing_still_terminates() {
        let transcoder = Arc::new(RecordingTranscoder::default());
        let queue = JobQueue::load(
            (0..5)
                .map(|i| Job::convert(format!("/m/fail{i}.flac"), format!("/o/{i}.mp3")))
                .collect(),
        );
        let summary = WorkerPool::new(3, transcoder).run(queue).await;
        assert_eq!(summary.total, 5);
        assert_eq!(summary.failures.len(), 5);
    }

    #[tokio::test]
    async fn copy_jobs_bypass_transcoder() {
        let tmp = tempfile::tempdir().unwrap();
        let src = tmp.path().join("cover.jpg");
        let dst = tmp.path().join("out.jpg");
        std::fs::write(&src, b"art").unwrap();

        let transcoder = Arc::new(RecordingTranscoder::default());
        let summary = WorkerPool::new(1, transcoder.clone())
            .run(JobQueue::load(vec![Job::copy(&src, &dst)]))
            .await;

        assert!(summary.is_success());
        assert_eq!(std::fs::read(&dst).unwrap(), b"art");
        assert!(transcoder.seen.lock().unwrap().is_empty());
    }

    /// Panics on sources whose name contains "panic".
    #[derive(Default)]
    struct PanickingTranscoder {
        completed: StdMutex<Vec<PathBuf>>,
    }

    #[async_trait]
    impl Transcoder for PanickingTranscoder {
        fn name(&self) -> &'static str {
            "panicking"
        }

        async fn transcode(&self, source: &Path, _dest: &Path) -> Result<()> {
            if source.to_string_lossy().contains("panic") {
                panic!("decoder crashed on {}", source.display());
            }
            self.completed.lock().unwrap().push(source.to_path_buf());
            Ok(())
        }
    }

    #[tokio::test]
    async fn panicking_job_costs_only_itself() {
        let transcoder = Arc::new(PanickingTranscoder::default());
        let queue = JobQueue::load(
            (0..6)
                .map(|i| {
                    let name = if i == 4 { "panic".to_string() } else { i.to_string() };
                    Job::convert(format!("/m/{name}.flac"), format!("/o/{i}.mp3"))
                })
                .collect(),
        );
        let summary = WorkerPool::new(1, transcoder.clone()).run(queue).await;

        assert_eq!(summary.total, 6);
        assert_eq!(summary.succeeded, 5);
        assert_eq!(summary.failed(), 1);
        assert_eq!(summary.panicked_workers, 0);
        assert!(!summary.is_success());
        assert_eq!(summary.failures[0].job.source(), Path::new("/m/panic.flac"));
        assert!(summary.failures[0].error.contains("panicked"));

        let completed = transcoder.completed.lock().unwrap();
        assert_eq!(completed.len(), 5);
        assert!(completed.contains(&PathBuf::from("/m/5.flac")));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn panics_across_workers_still_drain_queue() {
        let transcoder = Arc::new(PanickingTranscoder::default());
        let queue = JobQueue::load(
            (0..20)
                .map(|i| {
                    let name = if i % 5 == 0 { format!("panic{i}") } else { i.to_string() };
                    Job::convert(format!("/m/{name}.flac"), format!("/o/{i}.mp3"))
                })
                .collect(),
        );
        let summary = WorkerPool::new(3, transcoder.clone()).run(queue).await;

        assert_eq!(summary.total, 20);
        assert_eq!(summary.succeeded, 16);
        assert_eq!(summary.failures.len(), 4);
        assert_eq!(transcoder.completed.lock().unwrap().len(), 16);
    }

    #[test]
    fn zero_workers_is_clamped() {
        let pool = WorkerPool::new(0, Arc::new(RecordingTranscoder::default()));
        assert_eq!(pool.workers(), 1);
    }
}
