use std::io;

use thiserror::Error;

/// Errors that can occur when starting a [`Worker`][crate::Worker].
///
/// Once a worker has been constructed, none of its operations fail with an error.
/// A flush that does not finish in time is reported via
/// [`FlushOutcome::TimedOut`][crate::FlushOutcome::TimedOut] instead.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The operating system refused to create the worker thread.
    #[error("failed to spawn thread for worker '{name}'")]
    Spawn {
        /// Name of the worker that could not be started.
        name: String,

        /// The error reported by the operating system.
        #[source]
        source: io::Error,
    },

    /// The worker thread started but terminated before it finished its setup.
    ///
    /// The thread has already been joined by the time this error is returned.
    #[error("worker '{name}' terminated during thread setup")]
    SetupFailed {
        /// Name of the worker that could not be started.
        name: String,
    },
}

/// A specialized `Result` type for worker operations, returning the crate's
/// [`Error`] type as the error value.
pub type Result<T> = std::result::Result<T, Error>;
