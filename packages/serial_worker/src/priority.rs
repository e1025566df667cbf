use derive_more::{Display, From};

/// Operating system thread priority hint for a worker thread.
///
/// The value is passed to the operating system as-is and its meaning is platform-specific:
///
/// * On Windows, it is a `THREAD_PRIORITY_*` value given to `SetThreadPriority()`
///   (e.g. `-2` for lowest, `0` for normal, `2` for highest).
/// * On Linux, it is the nice value of the worker thread (`-20` to `19`, lower values mean higher
///   priority). Raising the priority above the current value usually requires privileges.
/// * On other platforms, applying a priority is not supported.
///
/// Failing to apply the priority is not fatal: the worker logs a warning and continues with
/// whatever priority the operating system gave the thread.
#[derive(Clone, Copy, Debug, Default, Display, Eq, From, Hash, PartialEq)]
#[display("{_0}")]
pub struct ThreadPriority(i32);

impl ThreadPriority {
    /// Creates a priority hint from a raw platform-specific value.
    #[must_use]
    pub const fn new(value: i32) -> Self {
        Self(value)
    }

    /// The raw platform-specific value of the hint.
    #[must_use]
    pub const fn get(self) -> i32 {
        self.0
    }
}
