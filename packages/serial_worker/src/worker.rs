//! Worker lifecycle: construction, configuration and shutdown.

use std::any::type_name;
use std::sync::Arc;
use std::thread::{self, JoinHandle as ThreadJoinHandle};
use std::time::Duration;
use std::{fmt, io, panic};

use scopeguard::ScopeGuard;
use tracing::{debug, warn};

use crate::pal::{Platform, PlatformFacade};
use crate::{Error, FlushOutcome, Result, Scheduler, Task, TaskKind, ThreadPriority, WorkerShared};

const DEFAULT_NAME: &str = "serial-worker";

const DEFAULT_FLUSH_TIMEOUT: Duration = Duration::from_millis(500);

/// A dedicated background thread that executes scheduled tasks one at a time, in the order they
/// were scheduled.
///
/// Tasks are either one-shot ([`schedule_work()`][Self::schedule_work]) or perpetual
/// ([`schedule_perpetual()`][Self::schedule_perpetual]). A perpetual task is appended back to
/// the end of the queue after each execution, so it keeps running in round-robin fashion
/// alongside whatever else is queued.
///
/// Use [`flush()`][Self::flush] to block until the queue has drained. While a flush is in progress,
/// perpetual tasks that finish executing are not requeued, so a flush can complete even when
/// perpetual tasks are scheduled. They do not come back on their own after the flush.
///
/// Each worker owns exactly one thread. Create several workers if more parallelism is needed.
///
/// # Lifetime
///
/// When the worker is dropped:
/// 1. The worker thread is signaled to shut down.
/// 2. The drop blocks until the currently executing task (if any) returns.
/// 3. Any queued tasks that have not started are dropped without being executed.
///
/// # Panics
///
/// Tasks are expected to handle their own errors. If a task panics, the panic is logged and the
/// process is aborted.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::time::Duration;
///
/// use serial_worker::{FlushOutcome, ThreadPriority, Worker};
///
/// let worker = Worker::new("example", ThreadPriority::default()).unwrap();
/// let counter = Arc::new(AtomicUsize::new(0));
///
/// for _ in 0..10 {
///     let counter = Arc::clone(&counter);
///     worker.schedule_work(move || {
///         counter.fetch_add(1, Ordering::Relaxed);
///     });
/// }
///
/// assert_eq!(worker.flush(Duration::from_secs(5)), FlushOutcome::Completed);
/// assert_eq!(counter.load(Ordering::Relaxed), 10);
/// ```
pub struct Worker {
    shared: Arc<WorkerShared>,
    thread: Option<ThreadJoinHandle<()>>,
    default_flush_timeout: Duration,
}

impl Worker {
    /// Starts a worker with the given name and operating system thread priority hint.
    ///
    /// The name is used for the thread name and in log messages. Failing to apply the priority
    /// is logged as a warning and is not an error.
    ///
    /// Use [`Worker::builder()`] for more configuration options.
    ///
    /// # Errors
    ///
    /// Returns an error if the worker thread could not be started.
    pub fn new(name: impl Into<String>, priority: ThreadPriority) -> Result<Self> {
        Self::builder().name(name).priority(priority).build()
    }

    /// Creates a builder for configuring the worker.
    #[must_use]
    pub fn builder() -> WorkerBuilder {
        WorkerBuilder::new()
    }

    /// The name of the worker, as given at construction time.
    #[must_use]
    pub fn name(&self) -> &str {
        self.shared.name()
    }

    /// Schedules a task to be executed once.
    ///
    /// Tasks scheduled from one thread execute in the order they were scheduled. This never
    /// blocks beyond briefly acquiring the queue lock.
    pub fn schedule_work<F>(&self, task: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.shared.schedule(Task::one_shot(task));
    }

    /// Schedules a task to be executed repeatedly.
    ///
    /// After every execution, the task is appended to the end of the queue. It stops running when
    /// the worker is dropped or when it finishes an execution while a flush is in progress.
    pub fn schedule_perpetual<F>(&self, task: F)
    where
        F: FnMut() + Send + 'static,
    {
        self.shared.schedule(Task::new(TaskKind::Perpetual, task));
    }

    /// Schedules a task of the given kind.
    pub fn schedule<F>(&self, kind: TaskKind, task: F)
    where
        F: FnMut() + Send + 'static,
    {
        self.shared.schedule(Task::new(kind, task));
    }

    /// Blocks until all scheduled tasks have finished executing or until the timeout elapses.
    ///
    /// Tasks scheduled while the flush is in progress are also waited for. Perpetual tasks
    /// that finish executing during the flush are retired instead of requeued.
    ///
    /// If another thread is already flushing this worker, this call waits for that flush to end
    /// with the queue drained, bounded by its own timeout.
    ///
    /// A timeout is logged as a warning. It does not cancel anything: work continues in the
    /// background after this returns.
    ///
    /// Calling this from a task running on the same worker cannot complete and always waits
    /// for the full timeout.
    pub fn flush(&self, timeout: Duration) -> FlushOutcome {
        self.shared.flush(timeout)
    }

    /// Same as [`flush()`][Self::flush] with the timeout configured on the builder
    /// (500 milliseconds unless changed).
    pub fn flush_with_default_timeout(&self) -> FlushOutcome {
        self.shared.flush(self.default_flush_timeout)
    }

    /// The number of tasks that are queued or currently executing.
    ///
    /// This is inherently racy against concurrent scheduling and is meant for diagnostics and
    /// tests, not for control flow.
    #[must_use]
    pub fn job_count(&self) -> usize {
        self.shared.job_count()
    }

    /// Returns a handle that can schedule work on this worker from any thread, including from
    /// tasks running on the worker itself.
    #[must_use]
    pub fn scheduler(&self) -> Scheduler {
        Scheduler::new(Arc::clone(&self.shared))
    }

    fn start(builder: WorkerBuilder) -> Result<Self> {
        let WorkerBuilder {
            name,
            priority,
            default_flush_timeout,
            platform,
        } = builder;

        let shared = Arc::new(WorkerShared::new(name.clone()));

        let (setup_tx, setup_rx) = oneshot::channel::<Option<io::Result<()>>>();

        let mut thread_builder = thread::Builder::new();

        // Thread naming is best-effort. The worker keeps its full name for logging either way.
        if name.contains('\0') {
            warn!(
                worker = %name.escape_debug(),
                "worker name contains a NUL byte, leaving worker thread unnamed"
            );
        } else {
            thread_builder = thread_builder.name(name.clone());
        }

        let thread = thread_builder
            .spawn({
                let shared = Arc::clone(&shared);

                move || {
                    let priority_result =
                        priority.map(|priority| platform.set_current_thread_priority(priority));

                    // If the receiver is gone, construction has been abandoned and the quit
                    // signal is already on its way.
                    drop(setup_tx.send(priority_result));

                    debug!(worker = %shared.name(), "worker thread started");
                    shared.run_until_quit();
                    debug!(worker = %shared.name(), "worker thread exiting");
                }
            })
            .map_err(|source| Error::Spawn {
                name: name.clone(),
                source,
            })?;

        // Until setup is confirmed, any early return must not leave the thread running.
        let guard = scopeguard::guard((Arc::clone(&shared), thread), |(shared, thread)| {
            shared.request_quit();

            // The thread ended abnormally and that is what we report to the caller.
            drop(thread.join());
        });

        match setup_rx.recv() {
            Ok(Some(Err(error))) => {
                if let Some(priority) = priority {
                    warn!(
                        worker = %name,
                        %priority,
                        %error,
                        "failed to set worker thread priority"
                    );
                }
            }
            Ok(Some(Ok(())) | None) => {}
            Err(_) => return Err(Error::SetupFailed { name }),
        }

        let (_, thread) = ScopeGuard::into_inner(guard);

        Ok(Self {
            shared,
            thread: Some(thread),
            default_flush_timeout,
        })
    }
}

impl fmt::Debug for Worker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(type_name::<Self>())
            .field("name", &self.shared.name())
            .field("job_count", &self.shared.job_count())
            .field("default_flush_timeout", &self.default_flush_timeout)
            .finish_non_exhaustive()
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        self.shared.request_quit();

        let Some(thread) = self.thread.take() else {
            return;
        };

        if thread.thread().id() == thread::current().id() {
            // Dropped by one of its own tasks. The loop exits as soon as that task returns.
            return;
        }

        if let Err(payload) = thread.join() {
            // Task panics abort the process, so the worker thread itself should never panic.
            // If it does, something is very wrong and we do not want to hide it.
            panic::resume_unwind(payload);
        }
    }
}

/// Builder for configuring a [`Worker`].
#[derive(Debug)]
pub struct WorkerBuilder {
    name: String,
    priority: Option<ThreadPriority>,
    default_flush_timeout: Duration,
    platform: PlatformFacade,
}

impl WorkerBuilder {
    fn new() -> Self {
        Self {
            name: DEFAULT_NAME.to_string(),
            priority: None,
            default_flush_timeout: DEFAULT_FLUSH_TIMEOUT,
            platform: PlatformFacade::target(),
        }
    }

    /// Sets the name used for the worker thread and in log messages.
    ///
    /// Default is `serial-worker`.
    ///
    /// A name that the operating system cannot accept as a thread name (for example, one
    /// containing a NUL byte) leaves the thread unnamed. This is logged as a warning.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the operating system priority hint to apply to the worker thread.
    ///
    /// By default, the priority inherited from the operating system is left unchanged.
    #[must_use]
    pub fn priority(mut self, priority: ThreadPriority) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Sets the timeout used by [`Worker::flush_with_default_timeout()`].
    ///
    /// Default is 500 milliseconds.
    #[must_use]
    pub fn default_flush_timeout(mut self, timeout: Duration) -> Self {
        self.default_flush_timeout = timeout;
        self
    }

    #[cfg(test)]
    pub(crate) fn platform(mut self, platform: PlatformFacade) -> Self {
        self.platform = platform;
        self
    }

    /// Starts the worker thread and returns the worker once the thread is running.
    ///
    /// # Errors
    ///
    /// Returns an error if the worker thread could not be started.
    pub fn build(self) -> Result<Worker> {
        Worker::start(self)
    }
}
