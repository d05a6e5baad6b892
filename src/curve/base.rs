use std::sync::Arc;
use std::thread::{self, ThreadId};

use crossbeam_channel::Sender;
use tracing::warn;

use crate::fit::{FitOutcome, SplineOutcome};
use crate::style::{CurveStyle, DrawMethod};

/// Which aspect of a curve changed. Batched flushes always fire in the
/// order Data, Fit, Style.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChangeKind {
    Data,
    Fit,
    Style,
}

/// Identifier the owning dataset assigns to a curve. Standalone curves
/// get id 0.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct CurveId(pub u64);

/// Change notification, tagged with the originating curve.
#[derive(Clone, Debug)]
pub struct CurveEvent {
    pub curve: CurveId,
    pub name: Arc<str>,
    pub kind: ChangeKind,
}

/// Cached derived artifact: a fit result or a spline, never both.
#[derive(Debug)]
pub enum DerivedArtifact {
    Fit(FitOutcome),
    Spline(SplineOutcome),
}

#[derive(Clone, Copy, Debug, Default)]
struct PendingChanges {
    data: bool,
    fit: bool,
    style: bool,
}

/// State and notification machinery shared by every curve variant.
///
/// Owned exclusively by the owner thread; the assertion in `notify` is the
/// backstop for code that smuggles a `&mut Curve` across threads.
pub struct CurveCore {
    pub(crate) id: CurveId,
    pub(crate) name: Arc<str>,
    pub(crate) visible: bool,
    pub(crate) style: CurveStyle,
    pub(crate) draw_method: DrawMethod,
    pub(crate) fit_order: u32,
    pub(crate) dirty: bool,
    pub(crate) derived: Option<DerivedArtifact>,
    subscribers: Vec<Sender<CurveEvent>>,
    batch_depth: u32,
    pending: PendingChanges,
    owner: ThreadId,
}

impl CurveCore {
    pub(crate) fn new(id: CurveId, name: impl Into<Arc<str>>, style: CurveStyle) -> Self {
        Self {
            id,
            name: name.into(),
            visible: true,
            style,
            draw_method: DrawMethod::default(),
            fit_order: 1,
            dirty: false,
            derived: None,
            subscribers: Vec::new(),
            batch_depth: 0,
            pending: PendingChanges::default(),
            owner: thread::current().id(),
        }
    }

    pub(crate) fn assert_owner(&self) {
        assert_eq!(
            thread::current().id(),
            self.owner,
            "curve {:?} mutated off its owner thread; \
             use the curve's producer() handle to stage changes and drain them on the owner",
            self.name
        );
    }

    /// Register a change listener. Disconnected listeners are pruned on
    /// the next notification.
    pub fn subscribe(&mut self, tx: Sender<CurveEvent>) {
        self.subscribers.push(tx);
    }

    fn emit(&mut self, kind: ChangeKind) {
        let event = CurveEvent {
            curve: self.id,
            name: Arc::clone(&self.name),
            kind,
        };
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    fn notify(&mut self, kind: ChangeKind) {
        self.assert_owner();
        if self.batch_depth > 0 {
            match kind {
                ChangeKind::Data => self.pending.data = true,
                ChangeKind::Fit => self.pending.fit = true,
                ChangeKind::Style => self.pending.style = true,
            }
        } else {
            self.emit(kind);
        }
    }

    /// Data changed: derived artifacts are stale, listeners hear DATA.
    pub fn mark_data_changed(&mut self) {
        self.derived = None;
        self.dirty = true;
        self.notify(ChangeKind::Data);
    }

    /// Style changed: same cache teardown as data, listeners hear STYLE.
    pub fn mark_style_changed(&mut self) {
        self.derived = None;
        self.dirty = true;
        self.notify(ChangeKind::Style);
    }

    /// Fit artifact changed; caches stay as they are.
    pub fn mark_fit_changed(&mut self) {
        self.notify(ChangeKind::Fit);
    }

    /// STYLE notification without cache teardown, for appearance-only
    /// changes like visibility.
    pub(crate) fn notify_appearance(&mut self) {
        self.notify(ChangeKind::Style);
    }

    /// Open a reentrant batch: changes accumulate as pending flags until
    /// the matching `end_update`.
    pub fn begin_update(&mut self) {
        self.assert_owner();
        self.batch_depth += 1;
    }

    /// Close a batch level. At depth zero, pending flags flush in fixed
    /// order DATA, FIT, STYLE, each at most once.
    pub fn end_update(&mut self) {
        self.assert_owner();
        if self.batch_depth == 0 {
            warn!(curve = %self.name, "end_update without matching begin_update");
            return;
        }
        self.batch_depth -= 1;
        if self.batch_depth > 0 {
            return;
        }
        let pending = std::mem::take(&mut self.pending);
        if pending.data {
            self.emit(ChangeKind::Data);
        }
        if pending.fit {
            self.emit(ChangeKind::Fit);
        }
        if pending.style {
            self.emit(ChangeKind::Style);
        }
    }

    pub fn id(&self) -> CurveId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn style(&self) -> &CurveStyle {
        &self.style
    }

    pub fn draw_method(&self) -> DrawMethod {
        self.draw_method
    }

    pub fn fit_order(&self) -> u32 {
        self.fit_order
    }

    pub fn derived(&self) -> Option<&DerivedArtifact> {
        self.derived.as_ref()
    }
}
