use std::io;
#[cfg(test)]
use std::sync::Arc;

#[cfg(test)]
use crate::pal::MockPlatform;
use crate::pal::{BUILD_TARGET_PLATFORM, BuildTargetPlatform, Platform};
use crate::ThreadPriority;

/// Enum to hide the real/mock choice behind a single wrapper type.
#[derive(Clone, Debug)]
pub(crate) enum PlatformFacade {
    Target(&'static BuildTargetPlatform),

    #[cfg(test)]
    Mock(Arc<MockPlatform>),
}

impl PlatformFacade {
    pub(crate) fn target() -> Self {
        Self::Target(&BUILD_TARGET_PLATFORM)
    }

    #[cfg(test)]
    pub(crate) fn from_mock(mock: MockPlatform) -> Self {
        Self::Mock(Arc::new(mock))
    }
}

impl Platform for PlatformFacade {
    fn set_current_thread_priority(&self, priority: ThreadPriority) -> io::Result<()> {
        match self {
            Self::Target(p) => p.set_current_thread_priority(priority),
            #[cfg(test)]
            Self::Mock(p) => p.set_current_thread_priority(priority),
        }
    }
}
