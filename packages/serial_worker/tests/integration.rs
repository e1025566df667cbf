//! Integration tests for the serial worker.
//!
//! These tests verify worker behavior with real threads. They are ignored under Miri because
//! they rely on wall-clock timing.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use serial_worker::{FlushOutcome, TaskKind, ThreadPriority, Worker};
use testing::{LogCapture, with_watchdog};

const GENEROUS_TIMEOUT: Duration = Duration::from_secs(5);

/// Blocks the worker thread until the test opens it.
#[derive(Clone)]
struct Gate {
    open: Arc<(Mutex<bool>, Condvar)>,
}

impl Gate {
    fn new() -> Self {
        Self {
            open: Arc::new((Mutex::new(false), Condvar::new())),
        }
    }

    fn wait(&self) {
        let (lock, condvar) = &*self.open;
        let mut open = lock.lock();
        condvar.wait_while(&mut open, |open| !*open);
    }

    fn open(&self) {
        let (lock, condvar) = &*self.open;
        *lock.lock() = true;
        condvar.notify_all();
    }
}

fn worker(name: &str) -> Worker {
    Worker::builder().name(name).build().unwrap()
}

#[cfg_attr(miri, ignore)]
#[test]
fn one_shot_tasks_execute_in_scheduling_order() {
    with_watchdog(|| {
        let worker = worker("fifo");
        let order = Arc::new(Mutex::new(Vec::new()));

        for index in 0..100 {
            let order = Arc::clone(&order);
            worker.schedule_work(move || order.lock().push(index));
        }

        assert_eq!(worker.flush(GENEROUS_TIMEOUT), FlushOutcome::Completed);
        assert_eq!(*order.lock(), (0..100).collect::<Vec<_>>());
    });
}

#[cfg_attr(miri, ignore)]
#[test]
fn perpetual_task_runs_repeatedly() {
    with_watchdog(|| {
        let worker = worker("perpetual");
        let counter = Arc::new(AtomicUsize::new(0));

        worker.schedule_perpetual({
            let counter = Arc::clone(&counter);
            move || {
                counter.fetch_add(1, Ordering::Relaxed);
                thread::sleep(Duration::from_millis(1));
            }
        });

        let deadline = Instant::now() + GENEROUS_TIMEOUT;
        while counter.load(Ordering::Relaxed) < 3 {
            assert!(Instant::now() < deadline, "perpetual task did not repeat");
            thread::sleep(Duration::from_millis(5));
        }

        // Still scheduled: requeueing does not change the job count.
        assert_eq!(worker.job_count(), 1);
    });
}

#[cfg_attr(miri, ignore)]
#[test]
fn perpetual_task_interleaves_with_one_shot_tasks() {
    with_watchdog(|| {
        let worker = worker("round-robin");
        let gate = Gate::new();
        let trace = Arc::new(Mutex::new(Vec::new()));

        worker.schedule_work({
            let gate = gate.clone();
            move || gate.wait()
        });

        worker.schedule_perpetual({
            let trace = Arc::clone(&trace);
            move || trace.lock().push("p")
        });

        for label in ["a", "b"] {
            let trace = Arc::clone(&trace);
            worker.schedule_work(move || trace.lock().push(label));
        }

        gate.open();

        assert_eq!(worker.flush(GENEROUS_TIMEOUT), FlushOutcome::Completed);

        let trace = trace.lock();
        assert_eq!(trace.get(..3), Some(&["p", "a", "b"][..]));
    });
}

#[cfg_attr(miri, ignore)]
#[test]
fn job_count_tracks_queued_and_completed_work() {
    with_watchdog(|| {
        let worker = worker("job-count");
        let gate = Gate::new();
        let started = Arc::new(Barrier::new(2));

        worker.schedule_work({
            let gate = gate.clone();
            let started = Arc::clone(&started);
            move || {
                started.wait();
                gate.wait();
            }
        });

        started.wait();

        for _ in 0..7 {
            worker.schedule_work(|| {});
        }

        // The job count covers queued and executing tasks, so the gate task still blocking
        // the worker counts alongside the 7 queued ones.
        assert_eq!(worker.job_count(), 8);

        gate.open();

        assert_eq!(worker.flush(GENEROUS_TIMEOUT), FlushOutcome::Completed);
        assert_eq!(worker.job_count(), 0);
    });
}

#[cfg_attr(miri, ignore)]
#[test]
fn flush_waits_for_executing_task() {
    with_watchdog(|| {
        let worker = worker("slow");
        let finished = Arc::new(AtomicBool::new(false));

        worker.schedule_work({
            let finished = Arc::clone(&finished);
            move || {
                thread::sleep(Duration::from_millis(50));
                finished.store(true, Ordering::Release);
            }
        });

        assert_eq!(worker.flush(GENEROUS_TIMEOUT), FlushOutcome::Completed);
        assert!(finished.load(Ordering::Acquire));
    });
}

#[cfg_attr(miri, ignore)]
#[test]
fn flush_times_out_on_slow_perpetual_task_and_logs_warning() {
    with_watchdog(|| {
        let worker = worker("never-drains");

        worker.schedule_perpetual(|| thread::sleep(Duration::from_millis(200)));

        let logs = LogCapture::new();
        let outcome = logs.run(|| worker.flush(Duration::from_millis(50)));

        assert_eq!(outcome, FlushOutcome::TimedOut);

        let output = logs.contents();
        assert!(output.contains("WARN"));
        assert!(output.contains("never-drains"));

        // Work carries on in the background after the timeout.
        assert_eq!(worker.job_count(), 1);
    });
}

#[cfg_attr(miri, ignore)]
#[test]
fn flush_retires_perpetual_task_without_reviving_it() {
    with_watchdog(|| {
        let worker = worker("retire");
        let counter = Arc::new(AtomicUsize::new(0));

        worker.schedule_perpetual({
            let counter = Arc::clone(&counter);
            move || {
                counter.fetch_add(1, Ordering::Relaxed);
                thread::sleep(Duration::from_millis(1));
            }
        });

        assert_eq!(worker.flush(GENEROUS_TIMEOUT), FlushOutcome::Completed);
        assert_eq!(worker.job_count(), 0);

        let after_flush = counter.load(Ordering::Relaxed);

        // Waking the worker with unrelated work does not bring the perpetual task back.
        worker.schedule_work(|| {});
        assert_eq!(worker.flush(GENEROUS_TIMEOUT), FlushOutcome::Completed);
        thread::sleep(Duration::from_millis(20));

        assert_eq!(counter.load(Ordering::Relaxed), after_flush);
    });
}

#[cfg_attr(miri, ignore)]
#[test]
fn perpetual_task_can_be_rescheduled_after_flush() {
    with_watchdog(|| {
        let worker = worker("reschedule");
        let counter = Arc::new(AtomicUsize::new(0));

        let make_task = {
            let counter = Arc::clone(&counter);
            move || {
                let counter = Arc::clone(&counter);
                move || {
                    counter.fetch_add(1, Ordering::Relaxed);
                }
            }
        };

        worker.schedule(TaskKind::Perpetual, make_task());
        assert_eq!(worker.flush(GENEROUS_TIMEOUT), FlushOutcome::Completed);

        let after_first = counter.load(Ordering::Relaxed);
        worker.schedule(TaskKind::Perpetual, make_task());

        let deadline = Instant::now() + GENEROUS_TIMEOUT;
        while counter.load(Ordering::Relaxed) <= after_first.saturating_add(1) {
            assert!(Instant::now() < deadline, "rescheduled task did not run");
            thread::yield_now();
        }
    });
}

#[cfg_attr(miri, ignore)]
#[test]
fn concurrent_flush_callers_both_return() {
    with_watchdog(|| {
        let worker = worker("concurrent-flush");
        let completed = Arc::new(AtomicUsize::new(0));

        for _ in 0..10 {
            let completed = Arc::clone(&completed);
            worker.schedule_work(move || {
                thread::sleep(Duration::from_millis(5));
                completed.fetch_add(1, Ordering::Relaxed);
            });
        }

        let start = Barrier::new(2);

        let outcomes = thread::scope(|s| {
            let flushers = [(); 2].map(|()| {
                s.spawn(|| {
                    start.wait();
                    let outcome = worker.flush(GENEROUS_TIMEOUT);
                    (outcome, completed.load(Ordering::Relaxed))
                })
            });

            flushers.map(|flusher| flusher.join().unwrap())
        });

        for (outcome, completed_when_returned) in outcomes {
            assert_eq!(outcome, FlushOutcome::Completed);
            assert_eq!(completed_when_returned, 10);
        }

        assert_eq!(worker.job_count(), 0);
    });
}

#[cfg_attr(miri, ignore)]
#[test]
fn drop_abandons_pending_tasks_promptly() {
    with_watchdog(|| {
        let worker = worker("shutdown");
        let executed = Arc::new(AtomicUsize::new(0));
        let started = Arc::new(Barrier::new(2));

        worker.schedule_work({
            let started = Arc::clone(&started);
            move || {
                started.wait();
                thread::sleep(Duration::from_millis(20));
            }
        });

        for _ in 0..1000 {
            let executed = Arc::clone(&executed);
            worker.schedule_work(move || {
                executed.fetch_add(1, Ordering::Relaxed);
                thread::sleep(Duration::from_millis(10));
            });
        }

        started.wait();

        let drop_started = Instant::now();
        drop(worker);

        assert!(drop_started.elapsed() < Duration::from_secs(2));
        assert!(executed.load(Ordering::Relaxed) < 1000);
    });
}

#[cfg_attr(miri, ignore)]
#[test]
fn drop_while_perpetual_task_runs() {
    with_watchdog(|| {
        let worker = worker("perpetual-shutdown");

        worker.schedule_perpetual(|| thread::sleep(Duration::from_millis(2)));
        thread::sleep(Duration::from_millis(10));

        drop(worker);
    });
}

#[cfg_attr(miri, ignore)]
#[test]
fn task_can_schedule_on_its_own_worker() {
    with_watchdog(|| {
        let worker = worker("reentrant");
        let scheduler = worker.scheduler();
        let order = Arc::new(Mutex::new(Vec::new()));

        worker.schedule_work({
            let order = Arc::clone(&order);
            move || {
                order.lock().push("outer");

                let inner_order = Arc::clone(&order);
                scheduler.schedule_work(move || inner_order.lock().push("inner"));
            }
        });

        assert_eq!(worker.flush(GENEROUS_TIMEOUT), FlushOutcome::Completed);
        assert_eq!(*order.lock(), vec!["outer", "inner"]);
    });
}

#[cfg_attr(miri, ignore)]
#[test]
fn concurrent_producers_all_get_executed() {
    with_watchdog(|| {
        let worker = worker("producers");
        let counter = Arc::new(AtomicUsize::new(0));

        thread::scope(|s| {
            for _ in 0..4 {
                s.spawn(|| {
                    for _ in 0..250 {
                        let counter = Arc::clone(&counter);
                        worker.schedule_work(move || {
                            counter.fetch_add(1, Ordering::Relaxed);
                        });
                    }
                });
            }
        });

        assert_eq!(worker.flush(GENEROUS_TIMEOUT), FlushOutcome::Completed);
        assert_eq!(counter.load(Ordering::Relaxed), 1000);
    });
}

#[cfg_attr(miri, ignore)]
#[test]
fn new_accepts_name_and_priority() {
    with_watchdog(|| {
        // Whether the OS accepts the hint depends on privileges. Either way the worker starts.
        let worker = Worker::new("background", ThreadPriority::new(-1)).unwrap();

        assert_eq!(worker.name(), "background");
        assert_eq!(worker.flush(GENEROUS_TIMEOUT), FlushOutcome::Completed);
    });
}

#[cfg_attr(miri, ignore)]
#[test]
fn worker_thread_carries_worker_name() {
    with_watchdog(|| {
        let worker = worker("named-thread");
        let observed = Arc::new(Mutex::new(None));

        worker.schedule_work({
            let observed = Arc::clone(&observed);
            move || *observed.lock() = thread::current().name().map(str::to_string)
        });

        assert_eq!(worker.flush(GENEROUS_TIMEOUT), FlushOutcome::Completed);
        assert_eq!(observed.lock().as_deref(), Some("named-thread"));
    });
}
