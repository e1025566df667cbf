//! Runs a perpetual polling task next to one-shot work and shows how flushing retires it.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use serial_worker::{FlushOutcome, ThreadPriority, Worker};

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let worker = Worker::new("poller", ThreadPriority::default()).unwrap();
    let polls = Arc::new(AtomicUsize::new(0));

    worker.schedule_perpetual({
        let polls = Arc::clone(&polls);
        move || {
            polls.fetch_add(1, Ordering::Relaxed);
            thread::sleep(Duration::from_millis(10));
        }
    });

    for batch in 0..3 {
        worker.schedule_work(move || println!("processing batch {batch}"));
    }

    thread::sleep(Duration::from_millis(100));
    println!("polled {} times so far", polls.load(Ordering::Relaxed));

    match worker.flush(Duration::from_secs(1)) {
        FlushOutcome::Completed => println!("queue drained, polling stopped"),
        FlushOutcome::TimedOut => println!("queue did not drain in time"),
    }

    println!("jobs remaining: {}", worker.job_count());
}
