//! Job registry: bounded worker pool, handles, polling, events.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{broadcast, mpsc, Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use papergraph_core::{defaults, Error, JobId, JobKind, JobOutput, JobStatus, Result};

/// Configuration for the job registry.
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Number of worker tasks executing queued jobs.
    pub workers: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            workers: defaults::JOB_WORKERS,
        }
    }
}

impl RegistryConfig {
    /// Create config from environment variables (with defaults).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `JOB_WORKERS` | `4` | Worker tasks executing queued jobs |
    pub fn from_env() -> Self {
        let workers = std::env::var("JOB_WORKERS")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(defaults::JOB_WORKERS)
            .max(1);

        Self { workers }
    }

    /// Set the worker count.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }
}

/// Event emitted by the registry as jobs move through their lifecycle.
#[derive(Debug, Clone)]
pub enum JobEvent {
    /// A job was accepted and queued.
    Submitted { id: JobId, kind: JobKind },
    /// A worker picked the job up.
    Started { id: JobId, kind: JobKind },
    /// The job finished successfully.
    Completed {
        id: JobId,
        kind: JobKind,
        duration_ms: u64,
    },
    /// The job failed; the message is what `poll` reports.
    Failed {
        id: JobId,
        kind: JobKind,
        error: String,
    },
}

type JobFn = Box<dyn FnOnce() -> Result<JobOutput> + Send + 'static>;

struct QueuedJob {
    id: JobId,
    kind: JobKind,
    work: JobFn,
}

#[derive(Debug)]
enum JobPhase {
    Queued,
    Running,
    Completed(Arc<JobOutput>),
    Failed(String),
}

#[derive(Debug)]
struct JobRecord {
    kind: JobKind,
    phase: JobPhase,
    submitted_at: DateTime<Utc>,
    started_at: Option<DateTime<Utc>>,
}

impl JobRecord {
    /// Milliseconds since the job left the queue (or since submission, if a
    /// terminal state lands before the start is recorded).
    fn elapsed_ms(&self) -> u64 {
        let since = self.started_at.unwrap_or(self.submitted_at);
        (Utc::now() - since).num_milliseconds().max(0) as u64
    }
}

struct RegistryInner {
    next_id: AtomicU64,
    /// Append-only by unique handle; completed results are retained for the
    /// registry's lifetime (no eviction; bounded deployments only).
    jobs: RwLock<HashMap<JobId, JobRecord>>,
    event_tx: broadcast::Sender<JobEvent>,
}

impl RegistryInner {
    async fn start(&self, id: JobId) {
        let mut jobs = self.jobs.write().await;
        if let Some(record) = jobs.get_mut(&id) {
            record.phase = JobPhase::Running;
            record.started_at = Some(Utc::now());
            let _ = self.event_tx.send(JobEvent::Started {
                id,
                kind: record.kind,
            });
        }
    }

    async fn complete(&self, id: JobId, output: JobOutput) {
        let mut jobs = self.jobs.write().await;
        if let Some(record) = jobs.get_mut(&id) {
            let duration_ms = record.elapsed_ms();
            record.phase = JobPhase::Completed(Arc::new(output));
            info!(job_id = %id, kind = %record.kind, duration_ms, "job completed");
            let _ = self.event_tx.send(JobEvent::Completed {
                id,
                kind: record.kind,
                duration_ms,
            });
        }
    }

    async fn fail(&self, id: JobId, error: String) {
        let mut jobs = self.jobs.write().await;
        if let Some(record) = jobs.get_mut(&id) {
            warn!(job_id = %id, kind = %record.kind, error = %error, "job failed");
            let _ = self.event_tx.send(JobEvent::Failed {
                id,
                kind: record.kind,
                error: error.clone(),
            });
            record.phase = JobPhase::Failed(error);
        }
    }
}

/// Registry running submitted units of work on a fixed pool of workers.
///
/// Excess submissions queue with unbounded depth: no backpressure is applied
/// to submitters, which is a known risk under sustained overload. Handles
/// come from a monotonic counter and are never reused within a process run;
/// nothing survives a restart.
pub struct JobRegistry {
    inner: Arc<RegistryInner>,
    queue_tx: Mutex<Option<mpsc::UnboundedSender<QueuedJob>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl JobRegistry {
    /// Create a registry and spawn its worker pool. Requires a tokio
    /// runtime.
    pub fn new(config: RegistryConfig) -> Self {
        let (event_tx, _) = broadcast::channel(defaults::EVENT_BUS_CAPACITY);
        let inner = Arc::new(RegistryInner {
            next_id: AtomicU64::new(0),
            jobs: RwLock::new(HashMap::new()),
            event_tx,
        });

        let (queue_tx, queue_rx) = mpsc::unbounded_channel();
        let queue_rx = Arc::new(Mutex::new(queue_rx));

        let worker_count = config.workers.max(1);
        let workers = (0..worker_count)
            .map(|worker| {
                let queue_rx = queue_rx.clone();
                let inner = inner.clone();
                tokio::spawn(worker_loop(worker, queue_rx, inner))
            })
            .collect();

        info!(workers = worker_count, "job registry started");
        Self {
            inner,
            queue_tx: Mutex::new(Some(queue_tx)),
            workers: Mutex::new(workers),
        }
    }

    /// Schedule a unit of work and return its handle immediately.
    ///
    /// The job is registered before it is enqueued, so a poll racing the
    /// worker pool never observes `NotFound` for a returned handle.
    pub async fn submit<F>(&self, kind: JobKind, work: F) -> JobId
    where
        F: FnOnce() -> Result<JobOutput> + Send + 'static,
    {
        let id = JobId::new(self.inner.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        {
            let mut jobs = self.inner.jobs.write().await;
            jobs.insert(
                id,
                JobRecord {
                    kind,
                    phase: JobPhase::Queued,
                    submitted_at: Utc::now(),
                    started_at: None,
                },
            );
        }
        let _ = self.inner.event_tx.send(JobEvent::Submitted { id, kind });

        let queued = QueuedJob {
            id,
            kind,
            work: Box::new(work),
        };
        let rejected = {
            let tx = self.queue_tx.lock().await;
            match tx.as_ref() {
                Some(tx) => tx.send(queued).is_err(),
                None => true,
            }
        };
        if rejected {
            self.inner
                .fail(id, "registry is shut down".to_string())
                .await;
        } else {
            debug!(job_id = %id, kind = %kind, "job submitted");
        }

        id
    }

    /// Non-blocking status lookup.
    pub async fn poll(&self, id: JobId) -> JobStatus {
        let jobs = self.inner.jobs.read().await;
        match jobs.get(&id) {
            None => JobStatus::NotFound,
            Some(record) => match &record.phase {
                JobPhase::Queued | JobPhase::Running => JobStatus::Running,
                JobPhase::Completed(output) => JobStatus::Completed(output.clone()),
                JobPhase::Failed(error) => JobStatus::Failed(error.clone()),
            },
        }
    }

    /// Completed output for a handle, as an error-typed accessor.
    pub async fn result(&self, id: JobId) -> Result<Arc<JobOutput>> {
        match self.poll(id).await {
            JobStatus::NotFound => Err(Error::JobNotFound(id)),
            JobStatus::Running => Err(Error::Job(format!("job {id} is still running"))),
            JobStatus::Failed(error) => Err(Error::Job(error)),
            JobStatus::Completed(output) => Ok(output),
        }
    }

    /// Get a receiver for job lifecycle events.
    pub fn events(&self) -> broadcast::Receiver<JobEvent> {
        self.inner.event_tx.subscribe()
    }

    /// Drain and stop the worker pool.
    ///
    /// Work already queued still runs to completion; new submissions fail
    /// immediately. Idempotent.
    pub async fn shutdown(&self) -> Result<()> {
        {
            let mut tx = self.queue_tx.lock().await;
            if tx.take().is_none() {
                return Ok(());
            }
        }

        let mut workers = self.workers.lock().await;
        for handle in workers.drain(..) {
            handle
                .await
                .map_err(|e| Error::Internal(format!("worker task failed: {e}")))?;
        }
        info!("job registry stopped");
        Ok(())
    }
}

async fn worker_loop(
    worker: usize,
    queue_rx: Arc<Mutex<mpsc::UnboundedReceiver<QueuedJob>>>,
    inner: Arc<RegistryInner>,
) {
    loop {
        // Hold the receiver lock only for the dequeue so sibling workers can
        // pull the next job while this one runs.
        let job = { queue_rx.lock().await.recv().await };
        let Some(QueuedJob { id, kind, work }) = job else {
            break;
        };

        inner.start(id).await;
        info!(worker, job_id = %id, kind = %kind, "processing job");

        match tokio::task::spawn_blocking(work).await {
            Ok(Ok(output)) => inner.complete(id, output).await,
            Ok(Err(err)) => inner.fail(id, err.to_string()).await,
            Err(join_err) => {
                error!(worker, job_id = %id, error = %join_err, "job panicked");
                inner.fail(id, format!("job panicked: {join_err}")).await;
            }
        }
    }
    debug!(worker, "worker exited");
}
