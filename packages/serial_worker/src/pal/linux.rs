use std::io;

use crate::ThreadPriority;
use crate::pal::Platform;

/// Platform implementation that targets the real Linux operating system.
#[derive(Debug)]
pub(crate) struct BuildTargetPlatform;

pub(crate) static BUILD_TARGET_PLATFORM: BuildTargetPlatform = BuildTargetPlatform;

// Error paths require the OS to reject the request, which is impractical to trigger in tests.
#[cfg_attr(coverage_nightly, coverage(off))]
impl Platform for BuildTargetPlatform {
    fn set_current_thread_priority(&self, priority: ThreadPriority) -> io::Result<()> {
        // On Linux, the nice value set via PRIO_PROCESS on a thread ID applies to that thread only.
        // SAFETY: No safety requirements.
        let thread_id = unsafe { libc::syscall(libc::SYS_gettid) };
        let thread_id = libc::id_t::try_from(thread_id).map_err(io::Error::other)?;

        // SAFETY: No safety requirements beyond passing valid arguments.
        let result = unsafe { libc::setpriority(libc::PRIO_PROCESS, thread_id, priority.get()) };

        if result == 0 {
            Ok(())
        } else {
            Err(io::Error::last_os_error())
        }
    }
}
