use std::sync::Arc;
use std::thread::{self, ThreadId};

use crossbeam_channel::{unbounded, Receiver, Sender};
use tracing::debug;

use crate::curve::{Bounds, Curve, CurveEvent, CurveId};
use crate::error::ModelError;
use crate::fit::FitterFactory;
use crate::histogram::{Histogram1d, Histogram2d};
use crate::staging::DrainScheduler;
use crate::style::{CurveStyle, StyleId};

/// Owns the ordered curve list, fans every curve's change events into one
/// tagged stream, and issues style ids.
///
/// The cached 2D histogram is a documented asymmetry: it has no curve
/// wrapper and therefore no visibility/style/notification machinery; it
/// is shared read-mostly state behind its own lock.
pub struct Dataset {
    curves: Vec<Curve>,
    scheduler: Arc<dyn DrainScheduler>,
    fan_in_tx: Sender<CurveEvent>,
    fan_in_rx: Receiver<CurveEvent>,
    subscribers: Vec<Sender<CurveEvent>>,
    next_curve_id: u64,
    next_style_id: u64,
    hist2d: Option<Arc<Histogram2d>>,
    owner: ThreadId,
}

impl Dataset {
    /// Create a dataset owned by the current thread.
    pub fn new(scheduler: Arc<dyn DrainScheduler>) -> Self {
        let (fan_in_tx, fan_in_rx) = unbounded();
        Self {
            curves: Vec::new(),
            scheduler,
            fan_in_tx,
            fan_in_rx,
            subscribers: Vec::new(),
            next_curve_id: 1,
            next_style_id: 1,
            hist2d: None,
            owner: thread::current().id(),
        }
    }

    fn assert_owner(&self) {
        assert_eq!(
            thread::current().id(),
            self.owner,
            "dataset used off its owner thread; producers stage through curve producer handles"
        );
    }

    /// Fresh style from the dataset's counter.
    fn issue_style(&mut self) -> CurveStyle {
        let id = StyleId(self.next_style_id);
        self.next_style_id += 1;
        CurveStyle {
            id,
            ..CurveStyle::default()
        }
    }

    fn register(&mut self, mut curve: Curve) -> CurveId {
        let id = CurveId(self.next_curve_id);
        self.next_curve_id += 1;
        curve.core.id = id;
        curve.subscribe(self.fan_in_tx.clone());
        debug!(curve = %curve.name(), ?id, "curve added");
        self.curves.push(curve);
        id
    }

    pub fn add_xy_curve(&mut self, name: impl Into<Arc<str>>) -> CurveId {
        let style = self.issue_style();
        let mut curve = Curve::xy(name, Arc::clone(&self.scheduler));
        curve.core.style = style;
        self.register(curve)
    }

    pub fn add_histogram_curve(
        &mut self,
        name: impl Into<Arc<str>>,
        hist: Histogram1d,
    ) -> CurveId {
        let style = self.issue_style();
        let mut curve = Curve::histogram(name, hist, Arc::clone(&self.scheduler));
        curve.core.style = style;
        self.register(curve)
    }

    pub fn add_strip_chart_curve(
        &mut self,
        name: impl Into<Arc<str>>,
        capacity: usize,
    ) -> Result<CurveId, ModelError> {
        let style = self.issue_style();
        let mut curve = Curve::strip_chart(name, capacity, Arc::clone(&self.scheduler))?;
        curve.core.style = style;
        Ok(self.register(curve))
    }

    pub fn len(&self) -> usize {
        self.curves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.curves.is_empty()
    }

    pub fn curves(&self) -> impl Iterator<Item = &Curve> {
        self.curves.iter()
    }

    pub fn curves_mut(&mut self) -> impl Iterator<Item = &mut Curve> {
        self.curves.iter_mut()
    }

    pub fn curve(&self, id: CurveId) -> Option<&Curve> {
        self.curves.iter().find(|c| c.id() == id)
    }

    pub fn curve_mut(&mut self, id: CurveId) -> Option<&mut Curve> {
        self.curves.iter_mut().find(|c| c.id() == id)
    }

    pub fn curve_by_name(&self, name: &str) -> Option<&Curve> {
        self.curves.iter().find(|c| c.name() == name)
    }

    pub fn curve_by_name_mut(&mut self, name: &str) -> Option<&mut Curve> {
        self.curves.iter_mut().find(|c| c.name() == name)
    }

    /// Remove and return a curve. Its subscription dies with it.
    pub fn remove_curve(&mut self, id: CurveId) -> Result<Curve, ModelError> {
        match self.curves.iter().position(|c| c.id() == id) {
            Some(index) => Ok(self.curves.remove(index)),
            None => Err(ModelError::NoSuchCurve(format!("{id:?}"))),
        }
    }

    /// Apply one style value to a curve, copying it under a fresh id so
    /// the same value can be handed to several curves without sharing.
    pub fn apply_style(&mut self, id: CurveId, style: &CurveStyle) -> Result<(), ModelError> {
        let issued = StyleId(self.next_style_id);
        self.next_style_id += 1;
        let curve = self
            .curve_mut(id)
            .ok_or_else(|| ModelError::NoSuchCurve(format!("{id:?}")))?;
        curve.set_style(&style.reissued(issued));
        Ok(())
    }

    /// Aggregate extent over every curve's own bounds.
    pub fn bounds(&self) -> Option<Bounds> {
        self.curves
            .iter()
            .fold(None, |acc, c| Bounds::merge(acc, c.bounds()))
    }

    /// Register a listener on the dataset-level stream.
    pub fn subscribe(&mut self, tx: Sender<CurveEvent>) {
        self.subscribers.push(tx);
    }

    /// Move fanned-in curve events to dataset subscribers and return them.
    /// Owner thread only.
    pub fn pump_events(&mut self) -> Vec<CurveEvent> {
        self.assert_owner();
        let events: Vec<CurveEvent> = self.fan_in_rx.try_iter().collect();
        if !events.is_empty() {
            self.subscribers
                .retain(|tx| events.iter().all(|e| tx.send(e.clone()).is_ok()));
        }
        events
    }

    /// Drain every curve's staging queue, `max_per_curve` items each.
    /// Owner thread only; the usual body of a scheduled drain task.
    pub fn drain_staged(&mut self, max_per_curve: usize) -> usize {
        self.assert_owner();
        self.curves
            .iter_mut()
            .map(|c| c.drain_staged(max_per_curve).drained)
            .sum()
    }

    /// Recompute stale derived artifacts across all curves.
    pub fn refresh_derived(&mut self, factory: &dyn FitterFactory) {
        self.assert_owner();
        for curve in &mut self.curves {
            curve.refresh_derived(factory);
        }
    }

    /// Install the dataset's single cached 2D histogram, returning the
    /// shared handle.
    pub fn set_histogram_2d(&mut self, hist: Histogram2d) -> Arc<Histogram2d> {
        let hist = Arc::new(hist);
        self.hist2d = Some(Arc::clone(&hist));
        hist
    }

    pub fn histogram_2d(&self) -> Option<Arc<Histogram2d>> {
        self.hist2d.clone()
    }

    pub fn take_histogram_2d(&mut self) -> Option<Arc<Histogram2d>> {
        self.hist2d.take()
    }
}
