use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use chart_data::{DrainScheduler, NoopScheduler, PendingItem, StagingQueue};

struct CountingScheduler(AtomicUsize);

impl CountingScheduler {
    fn new() -> Arc<Self> {
        Arc::new(Self(AtomicUsize::new(0)))
    }

    fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

impl DrainScheduler for CountingScheduler {
    fn schedule_drain(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

fn drain_values(queue: &StagingQueue, max: usize) -> Vec<f64> {
    let mut out = Vec::new();
    queue.drain(max, |item| {
        if let PendingItem::Value(v) = item {
            out.push(v);
        }
    });
    out
}

#[test]
fn test_fifo_one_batch_vs_many_small_batches() {
    let big = StagingQueue::new(Arc::new(NoopScheduler));
    let small = StagingQueue::new(Arc::new(NoopScheduler));
    for i in 0..50 {
        big.producer().push(PendingItem::Value(i as f64));
        small.producer().push(PendingItem::Value(i as f64));
    }

    let in_one = drain_values(&big, 1000);

    let mut in_many = Vec::new();
    loop {
        let chunk = drain_values(&small, 7);
        if chunk.is_empty() {
            break;
        }
        in_many.extend(chunk);
    }

    let expected: Vec<f64> = (0..50).map(|i| i as f64).collect();
    assert_eq!(in_one, expected, "single batch must preserve FIFO order");
    assert_eq!(in_many, expected, "chunked drains must yield the same contents");
}

#[test]
fn test_capped_drain_reschedules_until_empty() {
    let scheduler = CountingScheduler::new();
    let queue = StagingQueue::new(scheduler.clone());
    let producer = queue.producer();
    for i in 0..25 {
        producer.push(PendingItem::Value(i as f64));
    }

    let first = queue.drain(10, |_| {});
    assert_eq!(first.drained, 10);
    assert_eq!(first.remaining, 15);
    assert!(first.rescheduled, "cap hit with backlog must reschedule");

    let second = queue.drain(10, |_| {});
    assert!(second.rescheduled);

    let third = queue.drain(10, |_| {});
    assert_eq!(third.drained, 5);
    assert_eq!(third.remaining, 0);
    assert!(!third.rescheduled, "an emptied queue must not reschedule");
}

#[test]
fn test_racing_producers_schedule_exactly_one_drain() {
    let scheduler = CountingScheduler::new();
    let queue = StagingQueue::new(scheduler.clone());

    let mut handles = Vec::new();
    for t in 0..8 {
        let producer = queue.producer();
        handles.push(thread::spawn(move || {
            for i in 0..100 {
                producer.send(PendingItem::Value((t * 100 + i) as f64));
            }
        }));
    }
    for h in handles {
        h.join().unwrap();
    }

    assert_eq!(queue.pending(), 800);
    assert_eq!(queue.total_staged(), 800);
    assert_eq!(
        scheduler.count(),
        1,
        "the CAS latch must collapse racing schedule requests into one task"
    );

    // The latch clears when the drain begins, so the next send schedules
    // a fresh pass.
    queue.drain(1000, |_| {});
    queue.producer().send(PendingItem::Value(0.0));
    assert_eq!(scheduler.count(), 2);
}

#[test]
fn test_counters_track_staged_and_drained() {
    let queue = StagingQueue::new(Arc::new(NoopScheduler));
    let producer = queue.producer();
    for i in 0..10 {
        producer.push(PendingItem::Value(i as f64));
    }
    assert_eq!(producer.pending(), 10);
    assert_eq!(producer.total_staged(), 10);

    queue.drain(4, |_| {});
    assert_eq!(queue.pending(), 6);
    assert_eq!(queue.total_staged(), 10, "total is monotonic");
}

#[test]
fn test_drain_off_owner_thread_panics() {
    let queue = StagingQueue::new(Arc::new(NoopScheduler));
    queue.producer().push(PendingItem::Value(1.0));

    let result = thread::spawn(move || {
        queue.drain(10, |_| {});
    })
    .join();
    assert!(result.is_err(), "drain must refuse to run off the owner thread");
}
