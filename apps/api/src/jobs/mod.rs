//! Background task queue.
//!
//! Producers call `JobQueue::enqueue`, which never blocks the request. A pool
//! of workers shares the receiving end and runs jobs to completion. Nothing
//! is reported back to the producer; a failed job is logged and dropped.
//!
//! Shutdown: once every `JobQueue` clone is dropped the channel closes, the
//! workers drain what is left and exit, and `JobWorkers::join` returns.

use std::sync::Arc;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::cache::CacheStore;
use crate::stats::{user_stats_key, GLOBAL_STATS_KEY};

const QUEUE_CAPACITY: usize = 1024;

/// Cached snapshot a `RefreshCache` job evicts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum CacheTarget {
    UserStats(Uuid),
    GlobalStats,
}

impl CacheTarget {
    pub fn key(&self) -> String {
        match self {
            CacheTarget::UserStats(user_id) => user_stats_key(*user_id),
            CacheTarget::GlobalStats => GLOBAL_STATS_KEY.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Job {
    SendEmail {
        to: String,
        subject: String,
        body: String,
    },
    RefreshCache {
        target: CacheTarget,
    },
}

impl Job {
    pub fn name(&self) -> &'static str {
        match self {
            Job::SendEmail { .. } => "email",
            Job::RefreshCache { .. } => "cache",
        }
    }

    pub fn welcome_email(email: &str, username: &str) -> Self {
        Job::SendEmail {
            to: email.to_string(),
            subject: "Welcome to GameVault".to_string(),
            body: format!("Hi {username}, your game collection is ready to go."),
        }
    }
}

/// Producer handle. Cheap to clone; carried in `AppState`.
#[derive(Clone)]
pub struct JobQueue {
    tx: mpsc::Sender<Job>,
}

impl JobQueue {
    pub fn enqueue(&self, job: Job) {
        let name = job.name();
        match self.tx.try_send(job) {
            Ok(()) => debug!("Enqueued {name} job"),
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!("Job queue full, dropping {name} job")
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                warn!("Job queue closed, dropping {name} job")
            }
        }
    }
}

/// Worker pool handle, owned by `main` for shutdown.
pub struct JobWorkers {
    handles: Vec<JoinHandle<()>>,
}

impl JobWorkers {
    /// Waits for every worker to drain the queue and exit.
    pub async fn join(self) {
        for handle in self.handles {
            if let Err(e) = handle.await {
                error!("Job worker panicked: {e}");
            }
        }
        info!("Background workers stopped");
    }
}

/// Executes jobs. Holds whatever collaborators the job kinds need.
struct JobRunner {
    cache: Arc<dyn CacheStore>,
}

impl JobRunner {
    async fn run(&self, job: Job) -> Result<()> {
        match job {
            Job::SendEmail { to, subject, body } => {
                // No mail transport is configured; delivery is recorded in the log.
                info!("Sending email to {to}: {subject}");
                debug!("Email body: {body}");
                info!("Email sent to {to}");
            }
            Job::RefreshCache { target } => {
                let key = target.key();
                self.cache.delete(&key).await?;
                info!("Cache refreshed: {key}");
            }
        }
        Ok(())
    }
}

/// Spawns `workers` consumers (at least one) and returns the producer handle.
pub fn start(workers: usize, cache: Arc<dyn CacheStore>) -> (JobQueue, JobWorkers) {
    let (tx, rx) = mpsc::channel(QUEUE_CAPACITY);
    let rx = Arc::new(Mutex::new(rx));
    let runner = Arc::new(JobRunner { cache });

    let handles = (0..workers.max(1))
        .map(|worker| tokio::spawn(worker_loop(worker, rx.clone(), runner.clone())))
        .collect();

    info!("Background queue started with {} workers", workers.max(1));
    (JobQueue { tx }, JobWorkers { handles })
}

async fn worker_loop(worker: usize, rx: Arc<Mutex<mpsc::Receiver<Job>>>, runner: Arc<JobRunner>) {
    loop {
        let next = rx.lock().await.recv().await;
        let Some(job) = next else {
            debug!("Worker {worker} exiting: queue closed");
            break;
        };
        let name = job.name();
        if let Err(e) = runner.run(job).await {
            error!("{name} job failed on worker {worker}: {e:#}");
        }
    }
}
