use std::sync::Arc;
use std::thread;

use chart_data::{
    ChangeKind, Curve, DerivedArtifact, DrawMethod, FitOutcome, FitVectors, Fitter, FitterFactory,
    NoopScheduler, SplineBuilder, SplineOutcome,
};
use crossbeam_channel::unbounded;

struct MeanFitter;

impl Fitter for MeanFitter {
    fn fit(&self, vectors: &FitVectors) -> eyre::Result<FitOutcome> {
        if vectors.is_empty() {
            eyre::bail!("nothing to fit");
        }
        let mean = vectors.y().iter().sum::<f64>() / vectors.len() as f64;
        Ok(FitOutcome::new(move |_| mean, format!("mean = {mean:.3}")))
    }
}

struct FailingFitter;

impl Fitter for FailingFitter {
    fn fit(&self, _vectors: &FitVectors) -> eyre::Result<FitOutcome> {
        eyre::bail!("numerical breakdown")
    }
}

struct TestFactory {
    fail: bool,
}

impl FitterFactory for TestFactory {
    fn fitter_for(&self, _method: DrawMethod, _order: u32) -> Option<Box<dyn Fitter>> {
        if self.fail {
            Some(Box::new(FailingFitter))
        } else {
            Some(Box::new(MeanFitter))
        }
    }

    fn spline_builder(&self) -> Option<Box<dyn SplineBuilder>> {
        struct Linear;
        impl SplineBuilder for Linear {
            fn build(&self, _x: &[f64], y: &[f64]) -> eyre::Result<SplineOutcome> {
                let first = y.first().copied().unwrap_or(0.0);
                Ok(SplineOutcome::new(move |_| first))
            }
        }
        Some(Box::new(Linear))
    }
}

#[test]
fn test_mixed_direct_and_staged_adds_lose_nothing() {
    let mut curve = Curve::xy("mixed", Arc::new(NoopScheduler));
    let producer = curve.producer();

    let handle = thread::spawn(move || {
        for i in 0..50 {
            producer.add_point(i as f64, 1.0);
        }
    });
    for i in 0..50 {
        curve.add_point(i as f64, 2.0);
    }
    handle.join().unwrap();
    curve.drain_staged(1000);

    assert_eq!(
        curve.point_count(),
        100,
        "direct and staged adds must neither lose nor duplicate points"
    );
}

#[test]
fn test_one_notification_per_drain_batch() {
    let mut curve = Curve::xy("batched", Arc::new(NoopScheduler));
    let (tx, rx) = unbounded();
    curve.subscribe(tx);

    let producer = curve.producer();
    for i in 0..20 {
        producer.add_point(i as f64, i as f64);
    }
    curve.drain_staged(1000);

    let events: Vec<_> = rx.try_iter().collect();
    assert_eq!(events.len(), 1, "one batch, one notification");
    assert_eq!(events[0].kind, ChangeKind::Data);
}

#[test]
fn test_batch_flush_order_data_then_style() {
    let mut curve = Curve::xy("ordered", Arc::new(NoopScheduler));
    let (tx, rx) = unbounded();
    curve.subscribe(tx);

    curve.begin_update();
    curve.mark_data_changed();
    curve.mark_style_changed();
    curve.mark_data_changed();
    curve.end_update();

    let kinds: Vec<ChangeKind> = rx.try_iter().map(|e| e.kind).collect();
    assert_eq!(
        kinds,
        vec![ChangeKind::Data, ChangeKind::Style],
        "pending flags flush once each, DATA before STYLE"
    );
}

#[test]
fn test_reentrant_batches_flush_at_depth_zero() {
    let mut curve = Curve::xy("nested", Arc::new(NoopScheduler));
    let (tx, rx) = unbounded();
    curve.subscribe(tx);

    curve.begin_update();
    curve.begin_update();
    curve.mark_data_changed();
    curve.end_update();
    assert_eq!(rx.try_iter().count(), 0, "inner end must not flush");
    curve.end_update();
    assert_eq!(rx.try_iter().count(), 1, "outer end flushes once");
}

#[test]
fn test_dirty_and_derived_lifecycle() {
    let mut curve = Curve::xy("fit", Arc::new(NoopScheduler));
    curve.set_draw_method(DrawMethod::PolyFit);
    curve.add_points(&[(0.0, 1.0), (1.0, 3.0), (2.0, 5.0)]);

    assert!(curve.is_dirty());
    assert!(curve.derived().is_none(), "data changes clear the cache");

    curve.refresh_derived(&TestFactory { fail: false });
    assert!(!curve.is_dirty(), "successful recompute clears dirty");
    match curve.derived() {
        Some(DerivedArtifact::Fit(fit)) => {
            assert!((fit.eval(10.0) - 3.0).abs() < 1e-12);
            assert!(fit.summary().starts_with("mean"));
        }
        other => panic!("expected a fit artifact, got {other:?}"),
    }

    // New data invalidates again.
    curve.add_point(3.0, 7.0);
    assert!(curve.is_dirty());
    assert!(curve.derived().is_none());
}

#[test]
fn test_spline_selected_by_draw_method() {
    let mut curve = Curve::xy("spline", Arc::new(NoopScheduler));
    curve.set_draw_method(DrawMethod::Spline);
    curve.add_points(&[(0.0, 4.0), (1.0, 5.0)]);

    curve.refresh_derived(&TestFactory { fail: false });
    assert!(
        matches!(curve.derived(), Some(DerivedArtifact::Spline(_))),
        "spline method must cache a spline, not a fit"
    );
}

#[test]
fn test_fit_failure_is_fail_soft() {
    let mut curve = Curve::xy("failing", Arc::new(NoopScheduler));
    curve.set_draw_method(DrawMethod::GaussFit);
    curve.set_fit_order(3);
    curve.add_point(0.0, 1.0);

    curve.refresh_derived(&TestFactory { fail: true });

    assert!(curve.derived().is_none(), "failed fits leave the cache empty");
    assert!(curve.is_dirty(), "a failed recompute does not clear dirty");
    assert_eq!(
        curve.draw_method(),
        DrawMethod::GaussFit,
        "draw-method state survives the failure"
    );
    assert_eq!(curve.fit_order(), 3);
}

#[test]
fn test_weighted_fit_auto_selected_on_matching_errors() {
    let mut curve = Curve::xy("weighted", Arc::new(NoopScheduler));
    curve.add_point_with_error(0.0, 1.0, 0.5);
    curve.add_point_with_error(1.0, 2.0, 0.5);
    assert!(curve.fit_vectors().unwrap().is_weighted());

    // A bare point breaks the length match; the fit falls back to
    // unweighted.
    curve.add_point(2.0, 3.0);
    assert!(!curve.fit_vectors().unwrap().is_weighted());
}

#[test]
fn test_set_xy_data_validates_lengths() {
    let mut curve = Curve::xy("bulk", Arc::new(NoopScheduler));
    assert!(curve
        .set_xy_data(vec![0.0, 1.0], vec![1.0], None)
        .is_err());
    assert!(curve
        .set_xy_data(vec![0.0, 1.0], vec![1.0, 2.0], Some(vec![0.1]))
        .is_err());
    assert!(curve
        .set_xy_data(vec![0.0, 1.0], vec![1.0, 2.0], Some(vec![0.1, 0.2]))
        .is_ok());
    assert_eq!(curve.point_count(), 2);
}

#[test]
fn test_style_copied_not_shared() {
    let mut a = Curve::xy("a", Arc::new(NoopScheduler));
    let mut b = Curve::xy("b", Arc::new(NoopScheduler));

    let mut style = a.style().clone();
    style.line_width = 7.0;
    a.set_style(&style);
    b.set_style(&style);

    style.line_width = 1.0;
    assert_eq!(a.style().line_width, 7.0, "styles are copied on apply");
    assert_eq!(b.style().line_width, 7.0);
}

#[test]
fn test_visibility_notifies_without_cache_teardown() {
    let mut curve = Curve::xy("vis", Arc::new(NoopScheduler));
    curve.set_draw_method(DrawMethod::PolyFit);
    curve.add_point(0.0, 1.0);
    curve.refresh_derived(&TestFactory { fail: false });
    assert!(curve.derived().is_some());

    let (tx, rx) = unbounded();
    curve.subscribe(tx);
    curve.set_visible(false);

    let kinds: Vec<ChangeKind> = rx.try_iter().map(|e| e.kind).collect();
    assert_eq!(kinds, vec![ChangeKind::Style]);
    assert!(
        curve.derived().is_some(),
        "hiding a curve must not discard its fit"
    );
}

#[test]
fn test_mutation_off_owner_thread_panics() {
    let mut curve = Curve::xy("affinity", Arc::new(NoopScheduler));
    let result = thread::spawn(move || {
        curve.add_point(0.0, 0.0);
    })
    .join();
    assert!(
        result.is_err(),
        "owner-thread assertion must reject foreign mutation"
    );
}
