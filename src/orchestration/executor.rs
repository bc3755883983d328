//! # Task Executor
//!
//! Bounded worker pool running one lifecycle task per dispatched message.
//!
//! Sizing follows the classic core/max/queue model:
//! - `core_pool_size` permanent workers drain a bounded queue
//! - when the queue is full, an extra worker is started for the submitted
//!   task, up to `max_pool_size`; extra workers retire after
//!   `keep_alive_seconds` without work
//! - when workers and queue are saturated, submission waits for room
//!
//! Every task runs behind `catch_unwind`, so a panicking task resolves its
//! handle with [`NfvoError::TaskPanicked`] and leaves the worker alive.

use futures::FutureExt;
use parking_lot::Mutex;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

use crate::config::ExecutorConfig;
use crate::error::{NfvoError, NfvoResult};

type Job = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;
type SharedReceiver = Arc<tokio::sync::Mutex<mpsc::Receiver<Job>>>;

/// Handle to a submitted task.
///
/// Awaiting [`TaskHandle::join`] is the returning path; dropping the handle
/// makes the submission fire-and-forget.
#[derive(Debug)]
pub struct TaskHandle<T> {
    name: String,
    receiver: oneshot::Receiver<NfvoResult<T>>,
}

impl<T> TaskHandle<T> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn join(self) -> NfvoResult<T> {
        self.receiver.await.map_err(|_| {
            NfvoError::executor(format!("Task {} was dropped before completing", self.name))
        })?
    }
}

#[derive(Clone)]
pub struct TaskExecutor {
    inner: Arc<ExecutorInner>,
}

struct ExecutorInner {
    sender: Mutex<Option<mpsc::Sender<Job>>>,
    receiver: SharedReceiver,
    config: ExecutorConfig,
    workers: AtomicUsize,
    busy: AtomicUsize,
}

impl TaskExecutor {
    /// Start the pool's permanent workers. Must be called within a tokio runtime.
    pub fn new(config: ExecutorConfig) -> Self {
        let (sender, receiver) = mpsc::channel(config.queue_capacity.max(1));
        let inner = Arc::new(ExecutorInner {
            sender: Mutex::new(Some(sender)),
            receiver: Arc::new(tokio::sync::Mutex::new(receiver)),
            config,
            workers: AtomicUsize::new(0),
            busy: AtomicUsize::new(0),
        });

        let core = inner.config.core_pool_size.max(1);
        for _ in 0..core {
            inner.workers.fetch_add(1, Ordering::SeqCst);
            tokio::spawn(run_worker(Arc::clone(&inner), None, None));
        }

        info!(
            core_pool_size = core,
            max_pool_size = inner.config.max_pool_size,
            queue_capacity = inner.config.queue_capacity,
            "🏊 EXECUTOR: Task executor started"
        );

        Self { inner }
    }

    /// Submit a task; waits only while the pool and its queue are saturated.
    pub async fn submit<F, T>(&self, name: impl Into<String>, task: F) -> NfvoResult<TaskHandle<T>>
    where
        F: Future<Output = NfvoResult<T>> + Send + 'static,
        T: Send + 'static,
    {
        let name = name.into();
        let sender = self
            .inner
            .sender
            .lock()
            .clone()
            .ok_or_else(|| NfvoError::executor("Task executor is shut down"))?;

        let (result_tx, result_rx) = oneshot::channel();
        let job_name = name.clone();
        let job: Job = Box::pin(async move {
            let outcome = match AssertUnwindSafe(task).catch_unwind().await {
                Ok(outcome) => outcome,
                Err(panic) => {
                    let message = panic_message(panic.as_ref());
                    error!(task = %job_name, panic_msg = %message, "❌ EXECUTOR: Task panicked");
                    Err(NfvoError::TaskPanicked(format!("{job_name}: {message}")))
                }
            };
            if let Err(error) = &outcome {
                warn!(task = %job_name, error = %error, "❌ EXECUTOR: Task failed");
            }
            // The caller may have dropped the handle
            let _ = result_tx.send(outcome);
        });

        match sender.try_send(job) {
            Ok(()) => {}
            Err(TrySendError::Full(job)) => {
                if self.try_reserve_extra_worker() {
                    debug!(task = %name, "🏊 EXECUTOR: Queue full, starting extra worker");
                    let keep_alive = Duration::from_secs(self.inner.config.keep_alive_seconds);
                    tokio::spawn(run_worker(Arc::clone(&self.inner), Some(job), Some(keep_alive)));
                } else {
                    debug!(task = %name, "🏊 EXECUTOR: Pool saturated, waiting for queue space");
                    sender
                        .send(job)
                        .await
                        .map_err(|_| NfvoError::executor("Task executor is shut down"))?;
                }
            }
            Err(TrySendError::Closed(_)) => {
                return Err(NfvoError::executor("Task executor is shut down"));
            }
        }

        Ok(TaskHandle {
            name,
            receiver: result_rx,
        })
    }

    /// Stop accepting tasks; queued tasks still run.
    pub fn shutdown(&self) {
        if self.inner.sender.lock().take().is_some() {
            info!("🛑 EXECUTOR: Task executor shutting down");
        }
    }

    /// Workers currently alive, permanent and extra.
    pub fn active_workers(&self) -> usize {
        self.inner.workers.load(Ordering::SeqCst)
    }

    /// Workers currently running a task.
    pub fn busy_workers(&self) -> usize {
        self.inner.busy.load(Ordering::SeqCst)
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.inner.config
    }

    fn try_reserve_extra_worker(&self) -> bool {
        let max = self.inner.config.max_pool_size;
        self.inner
            .workers
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |current| {
                (current < max).then_some(current + 1)
            })
            .is_ok()
    }
}

impl std::fmt::Debug for TaskExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskExecutor")
            .field("config", &self.inner.config)
            .field("workers", &self.active_workers())
            .field("busy", &self.busy_workers())
            .finish()
    }
}

/// Worker loop. Permanent workers have no keep-alive and stop when the
/// queue is closed and drained; extra workers also stop after idling.
async fn run_worker(inner: Arc<ExecutorInner>, first: Option<Job>, keep_alive: Option<Duration>) {
    if let Some(job) = first {
        run_job(&inner, job).await;
    }

    loop {
        let receiver = Arc::clone(&inner.receiver);
        let next = async move {
            let mut queue = receiver.lock().await;
            let job = queue.recv().await;
            job
        };
        let job = match keep_alive {
            Some(idle) => match tokio::time::timeout(idle, next).await {
                Ok(job) => job,
                Err(_) => {
                    debug!("🏊 EXECUTOR: Extra worker idle, retiring");
                    None
                }
            },
            None => next.await,
        };

        match job {
            Some(job) => run_job(&inner, job).await,
            None => break,
        }
    }

    inner.workers.fetch_sub(1, Ordering::SeqCst);
}

async fn run_job(inner: &ExecutorInner, job: Job) {
    inner.busy.fetch_add(1, Ordering::SeqCst);
    job.await;
    inner.busy.fetch_sub(1, Ordering::SeqCst);
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "Unknown panic".to_string()
    }
}
