use std::sync::Arc;
use std::thread;

use chart_data::{Hist2dContents, Histogram2d, ModelError, OutOfRangeCounts};

fn grid_10x10() -> Histogram2d {
    Histogram2d::new(10, 10, 0.0, 10.0, 0.0, 10.0).unwrap()
}

#[test]
fn test_closed_upper_edge_lands_in_last_bin() {
    let hist = grid_10x10();
    hist.fill(10.0, 10.0, 1.0);

    assert_eq!(hist.count_at(9, 9), Some(1.0));
    assert_eq!(hist.good_count(), 1);
    assert_eq!(hist.out_of_range(), OutOfRangeCounts::default());
}

#[test]
fn test_edge_out_of_range_increments_one_counter() {
    let hist = grid_10x10();
    hist.fill(-1.0, 5.0, 1.0);

    let out = hist.out_of_range();
    assert_eq!(out.x_under, 1);
    assert_eq!(
        out,
        OutOfRangeCounts {
            x_under: 1,
            ..OutOfRangeCounts::default()
        },
        "only the x-underflow counter moves"
    );
    assert_eq!(hist.good_count(), 0);
    assert_eq!(hist.max_count(), 0.0, "bin contents stay untouched");
}

#[test]
fn test_corner_out_of_range_counts_once() {
    let hist = grid_10x10();
    hist.fill(-1.0, -1.0, 1.0);

    let out = hist.out_of_range();
    assert_eq!(out.x_under_y_under, 1);
    assert_eq!(out.x_under, 0, "corners do not double-count the edges");
    assert_eq!(out.y_under, 0);
    assert_eq!(hist.good_count(), 0);
}

#[test]
fn test_all_eight_regions_classify() {
    let hist = grid_10x10();
    hist.fill(-1.0, 5.0, 1.0);
    hist.fill(11.0, 5.0, 1.0);
    hist.fill(5.0, -1.0, 1.0);
    hist.fill(5.0, 11.0, 1.0);
    hist.fill(-1.0, -1.0, 1.0);
    hist.fill(11.0, -1.0, 1.0);
    hist.fill(-1.0, 11.0, 1.0);
    hist.fill(11.0, 11.0, 1.0);

    assert_eq!(
        hist.out_of_range(),
        OutOfRangeCounts {
            x_under: 1,
            x_over: 1,
            y_under: 1,
            y_over: 1,
            x_under_y_under: 1,
            x_over_y_under: 1,
            x_under_y_over: 1,
            x_over_y_over: 1,
        }
    );
    assert_eq!(hist.good_count(), 0);
}

#[test]
fn test_zero_weight_and_non_finite_are_noops() {
    let hist = grid_10x10();
    hist.fill(5.0, 5.0, 0.0);
    hist.fill(f64::NAN, 5.0, 1.0);
    hist.fill(5.0, f64::INFINITY, 1.0);
    hist.fill(5.0, 5.0, f64::NAN);

    assert_eq!(hist.good_count(), 0);
    assert_eq!(hist.out_of_range(), OutOfRangeCounts::default());
    assert_eq!(hist.max_count(), 0.0);
}

#[test]
fn test_percentile_ranks_against_nonzero_bins() {
    let hist = Histogram2d::new(5, 1, 0.0, 5.0, 0.0, 1.0).unwrap();
    hist.fill(0.5, 0.5, 1.0);
    hist.fill(1.5, 0.5, 2.0);
    hist.fill(2.5, 0.5, 3.0);
    hist.fill(3.5, 0.5, 4.0);

    // Sorted nonzero distribution: [1, 2, 3, 4].
    assert_eq!(hist.percentile(0.5, 0.5), Some(25.0));
    assert_eq!(hist.percentile(1.5, 0.5), Some(50.0));
    assert_eq!(hist.percentile(3.5, 0.5), Some(100.0));
    assert_eq!(hist.percentile(4.5, 0.5), Some(0.0), "empty bin ranks below all");
    assert_eq!(hist.percentile(-1.0, 0.5), None, "out of range has no rank");
}

#[test]
fn test_percentile_distribution_rebuilds_after_mutation() {
    let hist = Histogram2d::new(4, 1, 0.0, 4.0, 0.0, 1.0).unwrap();
    hist.fill(0.5, 0.5, 1.0);
    assert_eq!(hist.percentile(0.5, 0.5), Some(100.0));

    // A heavier bin demotes the first one.
    hist.fill(1.5, 0.5, 10.0);
    assert_eq!(hist.percentile(0.5, 0.5), Some(50.0));
}

#[test]
fn test_local_mean_over_3x3_block() {
    let hist = Histogram2d::new(3, 3, 0.0, 3.0, 0.0, 3.0).unwrap();
    // 9 bins valued 1..=9, row-major.
    for iy in 0..3 {
        for ix in 0..3 {
            let w = (iy * 3 + ix + 1) as f64;
            hist.fill(ix as f64 + 0.5, iy as f64 + 0.5, w);
        }
    }

    // Center sees the whole grid: mean of 1..9.
    assert_eq!(hist.local_mean(1.5, 1.5), Some(5.0));
    // Corner sees its 2×2 corner: (1 + 2 + 4 + 5) / 4.
    assert_eq!(hist.local_mean(0.5, 0.5), Some(3.0));
}

#[test]
fn test_snapshot_is_a_deep_copy() {
    let hist = grid_10x10();
    hist.fill(5.0, 5.0, 2.0);
    let before = hist.snapshot();

    hist.fill(5.0, 5.0, 2.0);
    let after = hist.snapshot();

    assert_eq!(before.counts[5 * 10 + 5], 2.0, "snapshot does not track later fills");
    assert_eq!(after.counts[5 * 10 + 5], 4.0);
    assert_eq!(before.good_count, 1);
    assert_eq!(after.good_count, 2);
}

#[test]
fn test_set_contents_validates_before_mutating() {
    let hist = Histogram2d::new(2, 2, 0.0, 2.0, 0.0, 2.0).unwrap();
    hist.fill(0.5, 0.5, 7.0);

    let bad_shape = Hist2dContents {
        counts: vec![1.0; 3],
        good_count: 0,
        out_of_range: OutOfRangeCounts::default(),
    };
    assert!(matches!(
        hist.set_contents(bad_shape),
        Err(ModelError::ContentsShape { expected: 4, got: 3 })
    ));

    let bad_value = Hist2dContents {
        counts: vec![1.0, f64::NAN, 1.0, 1.0],
        good_count: 0,
        out_of_range: OutOfRangeCounts::default(),
    };
    assert!(matches!(
        hist.set_contents(bad_value),
        Err(ModelError::NonFiniteCount { index: 1 })
    ));
    assert_eq!(hist.count_at(0, 0), Some(7.0), "failed setters leave state alone");

    let good = Hist2dContents {
        counts: vec![1.0, 2.0, 3.0, 4.0],
        good_count: 10,
        out_of_range: OutOfRangeCounts {
            x_over: 2,
            ..OutOfRangeCounts::default()
        },
    };
    assert!(hist.set_contents(good).is_ok());
    assert_eq!(hist.good_count(), 10);
    assert_eq!(hist.out_of_range().x_over, 2);
    assert_eq!(hist.max_count(), 4.0, "caches rebuild from the new contents");
    assert_eq!(hist.min_nonzero(), 1.0);
    assert_eq!(hist.mean_count(), 2.5);
}

#[test]
fn test_contents_payload_survives_serialization() {
    // The bulk-setter's payload is the persistence hook; a stored copy
    // must load back into a fresh grid.
    let source = Histogram2d::new(2, 2, 0.0, 2.0, 0.0, 2.0).unwrap();
    source.fill(0.5, 0.5, 3.0);
    source.fill(-1.0, 0.5, 1.0);
    let snap = source.snapshot();

    let payload = Hist2dContents {
        counts: snap.counts,
        good_count: snap.good_count,
        out_of_range: snap.out_of_range,
    };
    let stored = serde_json::to_string(&payload).unwrap();
    let loaded: Hist2dContents = serde_json::from_str(&stored).unwrap();

    let target = Histogram2d::new(2, 2, 0.0, 2.0, 0.0, 2.0).unwrap();
    target.set_contents(loaded).unwrap();
    assert_eq!(target.count_at(0, 0), Some(3.0));
    assert_eq!(target.good_count(), 1);
    assert_eq!(target.out_of_range().x_under, 1);
}

#[test]
fn test_concurrent_fills_and_reads_stay_consistent() {
    let hist = Arc::new(grid_10x10());

    let mut handles = Vec::new();
    for _ in 0..4 {
        let h = Arc::clone(&hist);
        handles.push(thread::spawn(move || {
            for i in 0..1000 {
                h.fill((i % 10) as f64 + 0.5, 5.5, 1.0);
            }
        }));
    }
    // Reader thread racing the fills: every snapshot is internally
    // consistent because one lock guards both paths.
    let reader = {
        let h = Arc::clone(&hist);
        thread::spawn(move || {
            for _ in 0..100 {
                let snap = h.snapshot();
                let total: f64 = snap.counts.iter().sum();
                assert_eq!(total, snap.good_count as f64);
            }
        })
    };
    for h in handles {
        h.join().unwrap();
    }
    reader.join().unwrap();

    assert_eq!(hist.good_count(), 4000);
    assert_eq!(hist.max_count(), 400.0);
}
