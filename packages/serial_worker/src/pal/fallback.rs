use std::io;

use crate::ThreadPriority;
use crate::pal::Platform;

/// Fallback platform implementation for operating systems without native support.
///
/// Thread priority cannot be applied, so every attempt reports [`io::ErrorKind::Unsupported`]
/// and the worker carries on with the default priority after logging a warning.
#[derive(Debug)]
pub(crate) struct BuildTargetPlatform;

#[cfg_attr(
    not(any(miri, not(any(target_os = "linux", windows)))),
    expect(dead_code, reason = "only the primary implementation on unsupported platforms")
)]
pub(crate) static BUILD_TARGET_PLATFORM: BuildTargetPlatform = BuildTargetPlatform;

impl Platform for BuildTargetPlatform {
    fn set_current_thread_priority(&self, priority: ThreadPriority) -> io::Result<()> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            format!("thread priority {priority} cannot be applied on this platform"),
        ))
    }
}
