//! Curves: the mutable, observable series the dataset owns.
//!
//! One `Curve` is a shared [`CurveCore`] (notification, style, derived
//! cache) plus a closed [`CurveData`] variant. Owner-thread code mutates
//! through `&mut Curve`; every other thread goes through the cloneable
//! [`CurveProducer`] and the staging queue.

pub mod base;
mod histogram;
mod sampler;
mod strip_chart;
mod xy;

pub use base::{ChangeKind, CurveCore, CurveEvent, CurveId, DerivedArtifact};
pub use histogram::HistogramData;
pub use sampler::{SampleSource, Sampler};
pub use strip_chart::StripChartData;
pub use xy::XyData;

use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::ModelError;
use crate::fit::{FitVectors, FitterFactory};
use crate::histogram::Histogram1d;
use crate::staging::{DrainOutcome, DrainScheduler, PendingItem, StagingProducer, StagingQueue};
use crate::style::{CurveStyle, DrawMethod, TimeUnit};

/// Axis-aligned data extent of a curve.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl Bounds {
    /// Merge two optional bounds; either side may be absent.
    pub fn merge(a: Option<Bounds>, b: Option<Bounds>) -> Option<Bounds> {
        match (a, b) {
            (Some(a), Some(b)) => Some(Bounds {
                x_min: a.x_min.min(b.x_min),
                x_max: a.x_max.max(b.x_max),
                y_min: a.y_min.min(b.y_min),
                y_max: a.y_max.max(b.y_max),
            }),
            (Some(a), None) => Some(a),
            (None, Some(b)) => Some(b),
            (None, None) => None,
        }
    }
}

/// Storage for one curve variant.
pub enum CurveData {
    Xy(XyData),
    Histogram(HistogramData),
    StripChart(StripChartData),
}

impl CurveData {
    /// Apply one staged item. Items that do not match the variant are
    /// dropped; producers are typed, so a mismatch is a wiring bug, not
    /// data loss worth failing over.
    fn apply(&mut self, item: PendingItem) {
        match (self, item) {
            (CurveData::Xy(xy), PendingItem::Point { x, y, err }) => xy.push(x, y, err),
            (CurveData::Histogram(h), PendingItem::Value(v)) => h.hist.fill(v),
            (CurveData::StripChart(s), PendingItem::Sample { t, v }) => s.push(t, v),
            (_, item) => debug!(?item, "staged item does not match curve variant, dropped"),
        }
    }

    fn clear(&mut self) {
        match self {
            CurveData::Xy(xy) => xy.clear(),
            CurveData::Histogram(h) => h.hist.clear(),
            CurveData::StripChart(s) => s.clear(),
        }
    }
}

/// Immutable copy of a curve's plottable arrays for the renderer.
#[derive(Clone, Debug, PartialEq)]
pub enum CurveSnapshot {
    Xy {
        x: Vec<f64>,
        y: Vec<f64>,
        /// Present only when the error column matches the data length.
        errors: Option<Vec<f64>>,
    },
    Histogram {
        edges: Vec<f64>,
        counts: Vec<f64>,
        underflow: f64,
        overflow: f64,
    },
    StripChart {
        /// Times scaled to the curve's display unit.
        times: Vec<f64>,
        values: Vec<f64>,
    },
}

/// One curve: shared core + variant storage + staging queue.
pub struct Curve {
    pub(crate) core: CurveCore,
    pub(crate) data: CurveData,
    staging: StagingQueue,
}

impl Curve {
    pub(crate) fn with_parts(
        id: CurveId,
        name: impl Into<Arc<str>>,
        style: CurveStyle,
        data: CurveData,
        scheduler: Arc<dyn DrainScheduler>,
    ) -> Self {
        Self {
            core: CurveCore::new(id, name, style),
            data,
            staging: StagingQueue::new(scheduler),
        }
    }

    /// Empty XY curve owned by the current thread.
    pub fn xy(name: impl Into<Arc<str>>, scheduler: Arc<dyn DrainScheduler>) -> Self {
        Self::with_parts(
            CurveId::default(),
            name,
            CurveStyle::default(),
            CurveData::Xy(XyData::default()),
            scheduler,
        )
    }

    /// Curve wrapping a 1D histogram engine.
    pub fn histogram(
        name: impl Into<Arc<str>>,
        hist: Histogram1d,
        scheduler: Arc<dyn DrainScheduler>,
    ) -> Self {
        let mut curve = Self::with_parts(
            CurveId::default(),
            name,
            CurveStyle::default(),
            CurveData::Histogram(HistogramData { hist }),
            scheduler,
        );
        curve.core.draw_method = DrawMethod::Bars;
        curve
    }

    /// Strip-chart curve with a fixed-capacity ring buffer.
    pub fn strip_chart(
        name: impl Into<Arc<str>>,
        capacity: usize,
        scheduler: Arc<dyn DrainScheduler>,
    ) -> Result<Self, ModelError> {
        let mut curve = Self::with_parts(
            CurveId::default(),
            name,
            CurveStyle::default(),
            CurveData::StripChart(StripChartData::new(capacity)?),
            scheduler,
        );
        curve.core.draw_method = DrawMethod::Stairs;
        Ok(curve)
    }

    // ---- core delegation -------------------------------------------------

    pub fn id(&self) -> CurveId {
        self.core.id()
    }

    pub fn name(&self) -> &str {
        self.core.name()
    }

    pub fn is_visible(&self) -> bool {
        self.core.is_visible()
    }

    pub fn is_dirty(&self) -> bool {
        self.core.is_dirty()
    }

    pub fn style(&self) -> &CurveStyle {
        self.core.style()
    }

    pub fn draw_method(&self) -> DrawMethod {
        self.core.draw_method()
    }

    pub fn fit_order(&self) -> u32 {
        self.core.fit_order()
    }

    pub fn derived(&self) -> Option<&DerivedArtifact> {
        self.core.derived()
    }

    pub fn subscribe(&mut self, tx: crossbeam_channel::Sender<CurveEvent>) {
        self.core.subscribe(tx);
    }

    pub fn begin_update(&mut self) {
        self.core.begin_update();
    }

    pub fn end_update(&mut self) {
        self.core.end_update();
    }

    pub fn mark_data_changed(&mut self) {
        self.core.mark_data_changed();
    }

    pub fn mark_style_changed(&mut self) {
        self.core.mark_style_changed();
    }

    pub fn mark_fit_changed(&mut self) {
        self.core.mark_fit_changed();
    }

    /// Show or hide the curve. Notifies STYLE; caches are untouched, so
    /// re-showing a fitted curve needs no recompute.
    pub fn set_visible(&mut self, visible: bool) {
        if self.core.visible != visible {
            self.core.visible = visible;
            self.core.notify_appearance();
        }
    }

    /// Apply a style value. The style is copied in; later edits by the
    /// caller do not leak into this curve.
    pub fn set_style(&mut self, style: &CurveStyle) {
        self.core.style = style.clone();
        self.core.mark_style_changed();
    }

    pub fn set_draw_method(&mut self, method: DrawMethod) {
        if self.core.draw_method != method {
            self.core.draw_method = method;
            self.core.mark_style_changed();
        }
    }

    pub fn set_fit_order(&mut self, order: u32) {
        if self.core.fit_order != order {
            self.core.fit_order = order;
            self.core.mark_style_changed();
        }
    }

    // ---- staging ---------------------------------------------------------

    /// Cloneable producer handle for foreign threads.
    pub fn producer(&self) -> CurveProducer {
        CurveProducer {
            inner: self.staging.producer(),
        }
    }

    pub fn staged_pending(&self) -> u64 {
        self.staging.pending()
    }

    /// Apply up to `max` staged items as one batch, firing one DATA
    /// notification for the whole batch. Owner thread only. Re-schedules
    /// itself when the cap was hit with backlog left.
    pub fn drain_staged(&mut self, max: usize) -> DrainOutcome {
        self.core.assert_owner();
        let data = &mut self.data;
        let outcome = self.staging.drain(max, |item| data.apply(item));
        if outcome.drained > 0 {
            self.core.mark_data_changed();
        }
        outcome
    }

    /// Empty the variant storage and notify once.
    pub fn clear(&mut self) {
        self.data.clear();
        self.core.mark_data_changed();
    }

    // ---- derived artifacts ----------------------------------------------

    /// Fit vectors for the current variant, or None when the variant has
    /// no fit (strip charts).
    pub fn fit_vectors(&self) -> Option<FitVectors> {
        match &self.data {
            CurveData::Xy(xy) => Some(xy.fit_vectors()),
            CurveData::Histogram(h) => Some(h.fit_vectors()),
            CurveData::StripChart(_) => None,
        }
    }

    /// Recompute the derived artifact if the cache is stale.
    ///
    /// Fail-soft: a fitter/spline error is logged, the cache stays empty,
    /// the draw method is untouched, and nothing propagates to the caller.
    pub fn refresh_derived(&mut self, factory: &dyn FitterFactory) {
        self.core.assert_owner();
        if !self.core.dirty && self.core.derived.is_some() {
            return;
        }
        let method = self.core.draw_method;
        if !method.wants_fit() && !method.wants_spline() {
            self.core.derived = None;
            self.core.dirty = false;
            return;
        }
        let Some(vectors) = self.fit_vectors() else {
            self.core.dirty = false;
            return;
        };

        let attempt: eyre::Result<DerivedArtifact> = if method.wants_spline() {
            match factory.spline_builder() {
                Some(builder) => builder
                    .build(vectors.x(), vectors.y())
                    .map(DerivedArtifact::Spline),
                None => Err(eyre::eyre!("no spline capability installed")),
            }
        } else {
            match factory.fitter_for(method, self.core.fit_order) {
                Some(fitter) => fitter.fit(&vectors).map(DerivedArtifact::Fit),
                None => Err(eyre::eyre!("no fitter for {method:?}")),
            }
        };

        match attempt {
            Ok(artifact) => {
                self.core.derived = Some(artifact);
                self.core.dirty = false;
                self.core.mark_fit_changed();
            }
            Err(error) => {
                warn!(curve = %self.core.name, %error, "derived-artifact recompute failed");
            }
        }
    }

    // ---- reads -----------------------------------------------------------

    /// Immutable copy of the plottable arrays.
    pub fn snapshot(&self) -> CurveSnapshot {
        match &self.data {
            CurveData::Xy(xy) => xy.snapshot(),
            CurveData::Histogram(h) => h.snapshot(),
            CurveData::StripChart(s) => s.snapshot(),
        }
    }

    /// Data extent, or None when empty.
    pub fn bounds(&self) -> Option<Bounds> {
        match &self.data {
            CurveData::Xy(xy) => xy.bounds(),
            CurveData::Histogram(h) => h.bounds(),
            CurveData::StripChart(s) => s.bounds(),
        }
    }

    /// The strip chart's display time unit; `Seconds` for other variants.
    pub fn display_unit(&self) -> TimeUnit {
        match &self.data {
            CurveData::StripChart(s) => s.display_unit(),
            _ => TimeUnit::Seconds,
        }
    }
}

/// Producer-side handle to one curve's staging queue. Clone freely across
/// threads; never blocks.
#[derive(Clone)]
pub struct CurveProducer {
    inner: StagingProducer,
}

impl CurveProducer {
    pub fn add_point(&self, x: f64, y: f64) {
        self.inner.send(PendingItem::Point { x, y, err: None });
    }

    pub fn add_point_with_error(&self, x: f64, y: f64, err: f64) {
        self.inner.send(PendingItem::Point {
            x,
            y,
            err: Some(err),
        });
    }

    /// Stage a batch, arming the drain latch once at the end.
    pub fn add_points(&self, points: &[(f64, f64)]) {
        for &(x, y) in points {
            self.inner.push(PendingItem::Point { x, y, err: None });
        }
        self.inner.schedule_drain_once();
    }

    pub fn add_sample(&self, t: f64, v: f64) {
        self.inner.send(PendingItem::Sample { t, v });
    }

    pub fn add_value(&self, v: f64) {
        self.inner.send(PendingItem::Value(v));
    }

    pub fn add_values(&self, values: &[f64]) {
        for &v in values {
            self.inner.push(PendingItem::Value(v));
        }
        self.inner.schedule_drain_once();
    }

    pub fn pending(&self) -> u64 {
        self.inner.pending()
    }

    pub fn total_staged(&self) -> u64 {
        self.inner.total_staged()
    }
}
