use std::fmt::Debug;
use std::io;

use crate::ThreadPriority;

/// Thread operations that differ between operating systems.
///
/// All methods act on the calling thread. The worker calls them from its own thread before it
/// starts processing tasks.
#[cfg_attr(test, mockall::automock)]
pub(crate) trait Platform: Debug + Send + Sync + 'static {
    /// Applies an operating system priority hint to the current thread.
    fn set_current_thread_priority(&self, priority: ThreadPriority) -> io::Result<()>;
}
