/// How a call to [`Worker::flush()`][crate::Worker::flush] ended.
///
/// A timed out flush does not cancel anything. The worker keeps processing its queue in
/// the background after the caller has been released.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[must_use = "a flush may time out, in which case queued work has not completed"]
pub enum FlushOutcome {
    /// The queue drained before the timeout elapsed.
    Completed,

    /// The timeout elapsed while tasks were still queued or executing.
    TimedOut,
}

impl FlushOutcome {
    /// Whether the queue drained before the timeout elapsed.
    #[must_use]
    pub fn is_completed(self) -> bool {
        matches!(self, Self::Completed)
    }

    pub(crate) fn from_timed_out(timed_out: bool) -> Self {
        if timed_out {
            Self::TimedOut
        } else {
            Self::Completed
        }
    }
}
