//! Task queue shared between a worker thread and everyone who schedules work on it.

use std::any::{Any, type_name};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use std::{fmt, mem, panic, process};

use parking_lot::{Condvar, Mutex, MutexGuard};
use tracing::{error, trace, warn};

use crate::{FlushOutcome, Task, TaskKind};

struct QueueState {
    tasks: VecDeque<Task>,

    // Tasks that are either in `tasks` or currently executing on the worker thread.
    job_count: usize,

    work_added: bool,
    quit_requested: bool,
}

pub(crate) struct WorkerShared {
    name: String,

    state: Mutex<QueueState>,

    // Signaled when work is added or quit is requested.
    work_added: Condvar,

    // Signaled when the job count reaches zero and when a flush ends.
    drained: Condvar,

    // Only ever modified while holding the `state` lock.
    flushing: AtomicBool,
}

impl WorkerShared {
    pub(crate) fn new(name: String) -> Self {
        Self {
            name,
            state: Mutex::new(QueueState {
                tasks: VecDeque::new(),
                job_count: 0,
                work_added: false,
                quit_requested: false,
            }),
            work_added: Condvar::new(),
            drained: Condvar::new(),
            flushing: AtomicBool::new(false),
        }
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn schedule(&self, task: Task) {
        let mut state = self.state.lock();

        if state.quit_requested {
            // Nobody will ever run it. Captured state may run arbitrary code on drop.
            drop(state);
            drop(task);
            return;
        }

        state.tasks.push_back(task);

        // Cannot overflow because we would run out of memory for the queue first.
        state.job_count = state.job_count.wrapping_add(1);
        state.work_added = true;

        self.work_added.notify_one();
    }

    pub(crate) fn job_count(&self) -> usize {
        self.state.lock().job_count
    }

    pub(crate) fn request_quit(&self) {
        let mut state = self.state.lock();
        state.quit_requested = true;
        state.work_added = true;

        self.work_added.notify_all();
    }

    /// Processes the queue on the current thread until quit is requested.
    ///
    /// Tasks still queued when the loop exits are dropped without being executed.
    pub(crate) fn run_until_quit(&self) {
        let mut state = self.state.lock();

        while !state.quit_requested {
            let Some(mut task) = state.tasks.pop_front() else {
                // Nothing queued and nothing executing.
                self.drained.notify_all();

                self.work_added
                    .wait_while(&mut state, |s| !s.work_added && !s.quit_requested);
                state.work_added = false;
                continue;
            };

            MutexGuard::unlocked(&mut state, || self.execute(&mut task));

            // Acquire pairs with the Release stores in `flush()`, which happen under the same lock.
            let requeue =
                task.kind() == TaskKind::Perpetual && !self.flushing.load(Ordering::Acquire);

            if requeue {
                state.tasks.push_back(task);
                continue;
            }

            MutexGuard::unlocked(&mut state, || drop(task));

            // Cannot underflow because every task in flight was counted when scheduled.
            state.job_count = state.job_count.wrapping_sub(1);

            if state.job_count == 0 {
                self.drained.notify_all();
            }
        }

        let abandoned = mem::take(&mut state.tasks);
        state.job_count = 0;
        drop(state);

        // Perpetual tasks commonly capture a scheduler for this worker, so dropping them here
        // breaks the reference cycle between the queue and its tasks.
        drop(abandoned);
    }

    fn execute(&self, task: &mut Task) {
        let result = panic::catch_unwind(panic::AssertUnwindSafe(|| task.run()));

        match result {
            Ok(()) => trace!(worker = %self.name, kind = ?task.kind(), "executed task"),
            Err(payload) => {
                error!(
                    worker = %self.name,
                    panic_message = %panic_message(payload.as_ref()),
                    "task panicked on worker thread, aborting process"
                );
                process::abort();
            }
        }
    }

    /// Blocks until the job count reaches zero or the timeout elapses.
    ///
    /// Only the first concurrent caller drives the flush. Other callers wait for the driving
    /// flush to end with the queue drained, each bounded by its own timeout.
    pub(crate) fn flush(&self, timeout: Duration) -> FlushOutcome {
        let mut state = self.state.lock();

        if self.flushing.swap(true, Ordering::AcqRel) {
            self.drained.wait_while_for(
                &mut state,
                |s| s.job_count != 0 || self.flushing.load(Ordering::Acquire),
                timeout,
            );

            let timed_out = state.job_count != 0 || self.flushing.load(Ordering::Acquire);

            if timed_out {
                warn!(worker = %self.name, ?timeout, "timed out waiting for concurrent worker flush");
            }

            return FlushOutcome::from_timed_out(timed_out);
        }

        self.drained
            .wait_while_for(&mut state, |s| s.job_count != 0, timeout);

        let timed_out = state.job_count != 0;

        self.flushing.store(false, Ordering::Release);
        self.drained.notify_all();

        drop(state);

        if timed_out {
            warn!(worker = %self.name, ?timeout, "worker flush timed out");
        }

        FlushOutcome::from_timed_out(timed_out)
    }
}

impl fmt::Debug for WorkerShared {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(type_name::<Self>())
            .field("name", &self.name)
            .field("flushing", &self.flushing.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        *s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "<non-string panic payload>"
    }
}
