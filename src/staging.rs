use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, ThreadId};

use crossbeam_channel::{unbounded, Receiver, Sender};
use tracing::debug;

/// Payload staged by producer threads for a later owner-thread drain.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PendingItem {
    /// XY point with optional measurement error.
    Point { x: f64, y: f64, err: Option<f64> },
    /// Strip-chart sample: time in raw seconds, value.
    Sample { t: f64, v: f64 },
    /// Raw value for histogram filling.
    Value(f64),
}

/// Posts "run a drain" onto the owner thread.
///
/// Implemented by the embedding event loop; the queue guarantees at most one
/// outstanding call per drain cycle, so implementations need no dedup of
/// their own.
pub trait DrainScheduler: Send + Sync {
    fn schedule_drain(&self);
}

/// A scheduler that does nothing. Useful when the owner polls explicitly.
pub struct NoopScheduler;

impl DrainScheduler for NoopScheduler {
    fn schedule_drain(&self) {}
}

struct Shared {
    /// Items ever staged. Monotonic.
    staged: AtomicU64,
    /// Items ever drained. Monotonic, owner thread only.
    drained: AtomicU64,
    /// True while a drain task is posted but has not yet started.
    drain_scheduled: AtomicBool,
}

impl Shared {
    fn pending(&self) -> u64 {
        let staged = self.staged.load(Ordering::Acquire);
        let drained = self.drained.load(Ordering::Acquire);
        staged.saturating_sub(drained)
    }

    /// CAS the latch; returns true when the caller won and must schedule.
    fn try_latch(&self) -> bool {
        self.drain_scheduled
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

/// Consumer side of the staging queue. Owned by a curve, drained on the
/// owner thread only.
pub struct StagingQueue {
    tx: Sender<PendingItem>,
    rx: Receiver<PendingItem>,
    shared: Arc<Shared>,
    scheduler: Arc<dyn DrainScheduler>,
    owner: ThreadId,
}

/// Result of one drain pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DrainOutcome {
    /// Items applied in this pass.
    pub drained: usize,
    /// Items still staged when the pass ended.
    pub remaining: u64,
    /// True when the cap was hit with backlog left and another pass was
    /// scheduled.
    pub rescheduled: bool,
}

impl StagingQueue {
    /// Create a queue owned by the current thread.
    pub fn new(scheduler: Arc<dyn DrainScheduler>) -> Self {
        let (tx, rx) = unbounded();
        Self {
            tx,
            rx,
            shared: Arc::new(Shared {
                staged: AtomicU64::new(0),
                drained: AtomicU64::new(0),
                drain_scheduled: AtomicBool::new(false),
            }),
            scheduler,
            owner: thread::current().id(),
        }
    }

    /// Cloneable producer handle for foreign threads.
    pub fn producer(&self) -> StagingProducer {
        StagingProducer {
            tx: self.tx.clone(),
            shared: Arc::clone(&self.shared),
            scheduler: Arc::clone(&self.scheduler),
        }
    }

    /// Items staged and not yet drained.
    pub fn pending(&self) -> u64 {
        self.shared.pending()
    }

    /// Items ever staged.
    pub fn total_staged(&self) -> u64 {
        self.shared.staged.load(Ordering::Acquire)
    }

    /// Pop up to `max` items and hand them to `apply`, as one batch.
    ///
    /// Must run on the owner thread. The schedule latch clears as the drain
    /// begins, so producers racing with this call can arm the next pass.
    /// When the cap is hit and backlog remains, another pass is scheduled
    /// before returning, bounding per-tick work under bursty input.
    pub fn drain<F>(&self, max: usize, mut apply: F) -> DrainOutcome
    where
        F: FnMut(PendingItem),
    {
        assert_eq!(
            thread::current().id(),
            self.owner,
            "StagingQueue::drain called off the owner thread; \
             producers must go through StagingProducer::push + schedule_drain_once"
        );

        self.shared.drain_scheduled.store(false, Ordering::Release);

        let mut drained = 0usize;
        while drained < max {
            match self.rx.try_recv() {
                Ok(item) => {
                    apply(item);
                    drained += 1;
                }
                Err(_) => break,
            }
        }
        self.shared.drained.fetch_add(drained as u64, Ordering::AcqRel);

        let remaining = self.shared.pending();
        let mut rescheduled = false;
        if drained == max && remaining > 0 && self.shared.try_latch() {
            self.scheduler.schedule_drain();
            rescheduled = true;
        }
        if drained > 0 {
            debug!(drained, remaining, rescheduled, "staging drain");
        }
        DrainOutcome {
            drained,
            remaining,
            rescheduled,
        }
    }
}

/// Producer handle: lock-free append plus drain scheduling. Clone freely
/// across threads.
#[derive(Clone)]
pub struct StagingProducer {
    tx: Sender<PendingItem>,
    shared: Arc<Shared>,
    scheduler: Arc<dyn DrainScheduler>,
}

impl StagingProducer {
    /// Append one item. Never blocks.
    pub fn push(&self, item: PendingItem) {
        self.shared.staged.fetch_add(1, Ordering::AcqRel);
        // The consumer lives as long as the curve; a send after the curve
        // is gone is a silent no-op.
        let _ = self.tx.send(item);
    }

    /// Arm the drain latch; at most one of any number of racing callers
    /// reaches the scheduler.
    pub fn schedule_drain_once(&self) {
        if self.shared.try_latch() {
            self.scheduler.schedule_drain();
        }
    }

    /// Append and make sure a drain is coming.
    pub fn send(&self, item: PendingItem) {
        self.push(item);
        self.schedule_drain_once();
    }

    pub fn pending(&self) -> u64 {
        self.shared.pending()
    }

    pub fn total_staged(&self) -> u64 {
        self.shared.staged.load(Ordering::Acquire)
    }
}
