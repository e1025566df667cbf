#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![cfg_attr(coverage_nightly, coverage(off))] // This is all test code, no need to test it.

//! Private helpers for testing `serial_worker`.

mod log_capture;

use std::sync::mpsc;
use std::thread;
use std::time::Duration;

pub use log_capture::*;

/// Runs a test on a separate thread and fails it if it does not finish within a time limit.
///
/// Worker tests block on condition variables and thread joins, so a bug tends to show up as a
/// hang rather than a failed assertion. The watchdog turns such hangs into panics.
///
/// The limit is 10 seconds, or 60 seconds under Miri where synchronization is much slower.
///
/// When the `MUTATION_TESTING` environment variable is set to "1", the watchdog is disabled and
/// the test runs directly, so that mutation testing can detect hanging mutations.
///
/// # Panics
///
/// Panics if the test exceeds the time limit, or resumes the panic of the test if it panicked.
///
/// # Example
///
/// ```rust
/// use testing::with_watchdog;
///
/// let answer = with_watchdog(|| 6 * 7);
/// assert_eq!(answer, 42);
/// ```
pub fn with_watchdog<F, R>(test_fn: F) -> R
where
    F: FnOnce() -> R + Send + 'static,
    R: Send + 'static,
{
    if std::env::var("MUTATION_TESTING").as_deref() == Ok("1") {
        return test_fn();
    }

    let limit = if cfg!(miri) {
        Duration::from_secs(60)
    } else {
        Duration::from_secs(10)
    };

    let (result_tx, result_rx) = mpsc::channel();

    let test_thread = thread::spawn(move || {
        // The receiver is gone only if the watchdog already fired.
        drop(result_tx.send(test_fn()));
    });

    match result_rx.recv_timeout(limit) {
        Ok(result) => {
            test_thread.join().expect("test thread already produced its result");
            result
        }
        Err(mpsc::RecvTimeoutError::Timeout) => {
            panic!("test did not finish within {limit:?}, assuming it is hung");
        }
        Err(mpsc::RecvTimeoutError::Disconnected) => match test_thread.join() {
            Ok(()) => panic!("test thread exited without producing a result"),
            Err(payload) => std::panic::resume_unwind(payload),
        },
    }
}
