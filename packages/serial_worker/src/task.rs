//! Units of work held in the worker queue.

use std::any::type_name;
use std::fmt;

/// Whether a task runs once or keeps coming back to the worker queue.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
#[non_exhaustive]
pub enum TaskKind {
    /// Executed exactly once, then discarded.
    #[default]
    OneShot,

    /// Appended back to the tail of the queue after every execution, until the worker is
    /// dropped or a flush consumes it.
    ///
    /// If a flush is in progress when a perpetual task finishes executing, the task is
    /// considered complete and is not requeued. It does not come back on its own once the
    /// flush is over; schedule it again if it should keep running.
    Perpetual,
}

type TaskFn = Box<dyn FnMut() + Send + 'static>;

pub(crate) struct Task {
    kind: TaskKind,
    body: TaskFn,
}

impl Task {
    pub(crate) fn new<F>(kind: TaskKind, body: F) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        Self {
            kind,
            body: Box::new(body),
        }
    }

    pub(crate) fn one_shot<F>(body: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        let mut body = Some(body);

        Self::new(TaskKind::OneShot, move || {
            if let Some(body) = body.take() {
                body();
            }
        })
    }

    pub(crate) fn kind(&self) -> TaskKind {
        self.kind
    }

    pub(crate) fn run(&mut self) {
        (self.body)();
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(type_name::<Self>())
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}
