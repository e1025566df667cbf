use std::io;

use windows::Win32::System::Threading::{GetCurrentThread, SetThreadPriority, THREAD_PRIORITY};

use crate::ThreadPriority;
use crate::pal::Platform;

/// Platform implementation that targets the real Windows operating system.
#[derive(Debug)]
pub(crate) struct BuildTargetPlatform;

pub(crate) static BUILD_TARGET_PLATFORM: BuildTargetPlatform = BuildTargetPlatform;

#[cfg_attr(coverage_nightly, coverage(off))]
impl Platform for BuildTargetPlatform {
    fn set_current_thread_priority(&self, priority: ThreadPriority) -> io::Result<()> {
        // SAFETY: No safety requirements. The returned pseudo-handle does not need to be closed.
        let thread = unsafe { GetCurrentThread() };

        // SAFETY: No safety requirements beyond passing a valid thread handle.
        unsafe { SetThreadPriority(thread, THREAD_PRIORITY(priority.get())) }
            .map_err(io::Error::from)
    }
}
