//! Cloneable handle for scheduling work on a worker.

use std::sync::Arc;

use crate::{Task, TaskKind, WorkerShared};

/// A handle for scheduling tasks on a [`Worker`][crate::Worker].
///
/// Schedulers are cheaply cloneable and can be shared across threads. A task may capture a
/// scheduler for its own worker and schedule more work from inside its body.
///
/// A scheduler does not keep the worker thread alive. Tasks scheduled after the worker has been
/// dropped are discarded without being executed.
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
///
/// use serial_worker::{FlushOutcome, Worker};
///
/// let worker = Worker::builder().name("nested").build().unwrap();
/// let scheduler = worker.scheduler();
///
/// worker.schedule_work(move || {
///     scheduler.schedule_work(|| println!("scheduled from inside a task"));
/// });
///
/// assert_eq!(worker.flush(Duration::from_secs(5)), FlushOutcome::Completed);
/// ```
#[derive(Clone, Debug)]
pub struct Scheduler {
    shared: Arc<WorkerShared>,
}

impl Scheduler {
    pub(crate) fn new(shared: Arc<WorkerShared>) -> Self {
        Self { shared }
    }

    /// The name of the worker this scheduler belongs to.
    #[must_use]
    pub fn worker_name(&self) -> &str {
        self.shared.name()
    }

    /// Schedules a task to be executed once.
    ///
    /// See [`Worker::schedule_work()`][crate::Worker::schedule_work].
    pub fn schedule_work<F>(&self, task: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.shared.schedule(Task::one_shot(task));
    }

    /// Schedules a task to be executed repeatedly.
    ///
    /// See [`Worker::schedule_perpetual()`][crate::Worker::schedule_perpetual].
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

    /// The number of tasks that are queued or currently executing on the worker.
    #[must_use]
    pub fn job_count(&self) -> usize {
        self.shared.job_count()
    }
}
