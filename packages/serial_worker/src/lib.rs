#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! A dedicated background thread that executes one-shot and perpetual tasks in order.
//!
//! A [`Worker`] owns exactly one thread and a FIFO queue of tasks. Producers on any thread
//! schedule closures onto it and may block until the queue has drained with
//! [`Worker::flush()`].
//!
//! This is part of the [Folo project](https://github.com/folo-rs/folo) that provides mechanisms for
//! high-performance hardware-aware programming in Rust.
//!
//! # Quick start
//!
//! ```rust
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::time::Duration;
//!
//! use serial_worker::{FlushOutcome, ThreadPriority, Worker};
//!
//! let worker = Worker::new("telemetry", ThreadPriority::default()).unwrap();
//!
//! worker.schedule_work(|| println!("runs once"));
//!
//! let polls = Arc::new(AtomicUsize::new(0));
//! worker.schedule_perpetual({
//!     let polls = Arc::clone(&polls);
//!     move || {
//!         polls.fetch_add(1, Ordering::Relaxed);
//!     }
//! });
//!
//! // Flushing retires the perpetual task and waits for everything else to finish.
//! assert_eq!(worker.flush(Duration::from_secs(5)), FlushOutcome::Completed);
//! assert_eq!(worker.job_count(), 0);
//! assert!(polls.load(Ordering::Relaxed) >= 1);
//! ```
//!
//! # Task kinds
//!
//! * **One-shot** tasks execute exactly once. One-shot tasks scheduled from the same thread
//!   execute in the order they were scheduled.
//! * **Perpetual** tasks are appended back to the end of the queue after every execution, so
//!   they keep running after one pass over whatever else is queued ahead of them.
//!
//! # Flushing
//!
//! [`Worker::flush()`] blocks until every scheduled task has finished executing or the timeout
//! elapses. Perpetual tasks that finish executing while a flush is in progress are retired
//! instead of requeued and must be scheduled again to resume.
//!
//! Only one caller drives a flush at a time. Concurrent callers wait for the driving flush to
//! complete, each bounded by its own timeout.
//!
//! # Shutdown behavior
//!
//! When the [`Worker`] is dropped, it signals the worker thread to shut down and waits for the
//! currently executing task (if any) to return. Queued tasks that have not started are dropped
//! without being executed.
//!
//! # Logging
//!
//! The crate emits [`tracing`] events. Failing to apply the thread priority and flush timeouts
//! are logged as warnings that include the worker name.
//!
//! # Panics
//!
//! Tasks must not panic. If a task panics, the panic is logged and the process is aborted.

mod error;
mod flush;
mod pal;
mod priority;
mod queue;
mod scheduler;
mod task;
mod worker;

pub use error::*;
pub use flush::*;
pub use priority::*;
pub(crate) use queue::*;
pub use scheduler::*;
pub use task::TaskKind;
pub(crate) use task::Task;
pub use worker::*;
