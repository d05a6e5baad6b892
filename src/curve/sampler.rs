use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, warn};

use crate::error::ModelError;

use super::CurveProducer;

/// Function the sampler evaluates on every tick. Errors stop the sampler's
/// own schedule; nothing else is affected.
pub type SampleSource = Arc<dyn Fn() -> eyre::Result<f64> + Send + Sync>;

/// Periodic background sampler feeding a strip-chart curve.
///
/// Every tick evaluates the source, stamps the result with wall-clock
/// seconds, and pushes it through the curve's producer handle, the same
/// ingestion path manual adds use. Stop/start at will; stopping cancels
/// the schedule without touching already-staged samples.
pub struct Sampler {
    producer: CurveProducer,
    source: SampleSource,
    interval: Duration,
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl Sampler {
    pub fn new(
        producer: CurveProducer,
        interval: Duration,
        source: SampleSource,
    ) -> Result<Self, ModelError> {
        if interval.is_zero() {
            return Err(ModelError::ZeroInterval);
        }
        Ok(Self {
            producer,
            source,
            interval,
            running: Arc::new(AtomicBool::new(false)),
            handle: None,
        })
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Begin sampling. No-op when already running.
    pub fn start(&mut self) {
        if self.running.swap(true, Ordering::AcqRel) {
            return;
        }
        let producer = self.producer.clone();
        let source = Arc::clone(&self.source);
        let running = Arc::clone(&self.running);
        let interval = self.interval;
        self.handle = Some(thread::spawn(move || {
            debug!("sampler started");
            while running.load(Ordering::Acquire) {
                match source() {
                    Ok(v) => {
                        let t = Utc::now().timestamp_micros() as f64 / 1e6;
                        producer.add_sample(t, v);
                    }
                    Err(error) => {
                        warn!(%error, "sampler source failed, stopping schedule");
                        running.store(false, Ordering::Release);
                        break;
                    }
                }
                thread::sleep(interval);
            }
            debug!("sampler stopped");
        }));
    }

    /// Stop sampling and wait for the tick thread to exit. Staged samples
    /// stay queued for the next drain.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for Sampler {
    fn drop(&mut self) {
        self.stop();
    }
}
