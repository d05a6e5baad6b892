use parking_lot::Mutex;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ModelError;

/// Sample counts for the 8 out-of-range regions around the grid: 4 edges
/// (one coordinate out) and 4 corners (both out). Each counts samples,
/// not weights.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutOfRangeCounts {
    pub x_under: u64,
    pub x_over: u64,
    pub y_under: u64,
    pub y_over: u64,
    pub x_under_y_under: u64,
    pub x_over_y_under: u64,
    pub x_under_y_over: u64,
    pub x_over_y_over: u64,
}

/// Deep copy of the full grid state for concurrent-safe external reads.
#[derive(Clone, Debug, PartialEq)]
pub struct Hist2dSnapshot {
    pub nx: usize,
    pub ny: usize,
    pub x_range: (f64, f64),
    pub y_range: (f64, f64),
    /// Row-major: `counts[iy * nx + ix]`.
    pub counts: Vec<f64>,
    pub good_count: u64,
    pub out_of_range: OutOfRangeCounts,
}

/// Bulk-replacement payload for [`Histogram2d::set_contents`], the
/// persistence hook. Serde-friendly so embedders can store it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Hist2dContents {
    /// Row-major, must match the grid's nx × ny.
    pub counts: Vec<f64>,
    pub good_count: u64,
    pub out_of_range: OutOfRangeCounts,
}

#[derive(Clone, Copy, Debug)]
struct Aggregates {
    max: f64,
    min_nonzero: f64,
    mean: f64,
}

struct Inner {
    counts: Vec<f64>,
    good_count: u64,
    out_of_range: OutOfRangeCounts,
    aggregates: Option<Aggregates>,
    /// Sorted nonzero finite bin values backing percentile queries.
    /// Rebuilt lazily after any mutation.
    sorted_nonzero: Option<Vec<f64>>,
}

impl Inner {
    fn invalidate(&mut self) {
        self.aggregates = None;
        self.sorted_nonzero = None;
    }
}

/// Two-dimensional histogram on a uniform nx × ny grid.
///
/// One internal lock guards mutation and every read path uniformly, so
/// renderers on other threads never observe torn state. The upper edge is
/// closed on both axes: a value exactly at max lands in the last bin.
pub struct Histogram2d {
    nx: usize,
    ny: usize,
    x_min: f64,
    x_max: f64,
    y_min: f64,
    y_max: f64,
    x_width: f64,
    y_width: f64,
    inner: Mutex<Inner>,
}

/// Where a coordinate sits relative to one axis of the grid.
#[derive(Clone, Copy, PartialEq, Eq)]
enum AxisSide {
    Under,
    In(usize),
    Over,
}

impl Histogram2d {
    pub fn new(
        nx: usize,
        ny: usize,
        x_min: f64,
        x_max: f64,
        y_min: f64,
        y_max: f64,
    ) -> Result<Self, ModelError> {
        if nx == 0 || ny == 0 {
            return Err(ModelError::ZeroBins);
        }
        if !(x_max > x_min) {
            return Err(ModelError::EmptyRange {
                min: x_min,
                max: x_max,
            });
        }
        if !(y_max > y_min) {
            return Err(ModelError::EmptyRange {
                min: y_min,
                max: y_max,
            });
        }
        Ok(Self {
            nx,
            ny,
            x_min,
            x_max,
            y_min,
            y_max,
            x_width: (x_max - x_min) / nx as f64,
            y_width: (y_max - y_min) / ny as f64,
            inner: Mutex::new(Inner {
                counts: vec![0.0; nx * ny],
                good_count: 0,
                out_of_range: OutOfRangeCounts::default(),
                aggregates: None,
                sorted_nonzero: None,
            }),
        })
    }

    pub fn nx(&self) -> usize {
        self.nx
    }

    pub fn ny(&self) -> usize {
        self.ny
    }

    pub fn x_range(&self) -> (f64, f64) {
        (self.x_min, self.x_max)
    }

    pub fn y_range(&self) -> (f64, f64) {
        (self.y_min, self.y_max)
    }

    fn side(v: f64, min: f64, max: f64, width: f64, n: usize) -> AxisSide {
        if v < min {
            AxisSide::Under
        } else if v > max {
            AxisSide::Over
        } else if v == max {
            // Closed upper edge: exactly max maps into the last bin.
            AxisSide::In(n - 1)
        } else {
            let idx = ((v - min) / width).floor() as usize;
            AxisSide::In(idx.min(n - 1))
        }
    }

    /// Add a weighted sample. Weight 0 or any non-finite input is a no-op.
    /// In-range samples add `weight` to their bin and 1 to the good count;
    /// out-of-range samples bump exactly one of the 8 region counters.
    pub fn fill(&self, x: f64, y: f64, weight: f64) {
        if weight == 0.0 || !x.is_finite() || !y.is_finite() || !weight.is_finite() {
            return;
        }
        let sx = Self::side(x, self.x_min, self.x_max, self.x_width, self.nx);
        let sy = Self::side(y, self.y_min, self.y_max, self.y_width, self.ny);

        let mut inner = self.inner.lock();
        match (sx, sy) {
            (AxisSide::In(ix), AxisSide::In(iy)) => {
                inner.counts[iy * self.nx + ix] += weight;
                inner.good_count += 1;
            }
            (AxisSide::Under, AxisSide::In(_)) => inner.out_of_range.x_under += 1,
            (AxisSide::Over, AxisSide::In(_)) => inner.out_of_range.x_over += 1,
            (AxisSide::In(_), AxisSide::Under) => inner.out_of_range.y_under += 1,
            (AxisSide::In(_), AxisSide::Over) => inner.out_of_range.y_over += 1,
            (AxisSide::Under, AxisSide::Under) => inner.out_of_range.x_under_y_under += 1,
            (AxisSide::Over, AxisSide::Under) => inner.out_of_range.x_over_y_under += 1,
            (AxisSide::Under, AxisSide::Over) => inner.out_of_range.x_under_y_over += 1,
            (AxisSide::Over, AxisSide::Over) => inner.out_of_range.x_over_y_over += 1,
        }
        inner.invalidate();
    }

    fn locate(&self, x: f64, y: f64) -> Option<(usize, usize)> {
        if !x.is_finite() || !y.is_finite() {
            return None;
        }
        let sx = Self::side(x, self.x_min, self.x_max, self.x_width, self.nx);
        let sy = Self::side(y, self.y_min, self.y_max, self.y_width, self.ny);
        match (sx, sy) {
            (AxisSide::In(ix), AxisSide::In(iy)) => Some((ix, iy)),
            _ => None,
        }
    }

    /// Count in the bin at grid indices (ix, iy).
    pub fn count_at(&self, ix: usize, iy: usize) -> Option<f64> {
        if ix >= self.nx || iy >= self.ny {
            return None;
        }
        Some(self.inner.lock().counts[iy * self.nx + ix])
    }

    /// Count in the bin containing the point (x, y), if in range.
    pub fn value_at(&self, x: f64, y: f64) -> Option<f64> {
        let (ix, iy) = self.locate(x, y)?;
        Some(self.inner.lock().counts[iy * self.nx + ix])
    }

    pub fn good_count(&self) -> u64 {
        self.inner.lock().good_count
    }

    pub fn out_of_range(&self) -> OutOfRangeCounts {
        self.inner.lock().out_of_range
    }

    fn aggregates(inner: &mut Inner) -> Aggregates {
        if let Some(a) = inner.aggregates {
            return a;
        }
        let mut max = 0.0f64;
        let mut min_nonzero = f64::INFINITY;
        let mut sum = 0.0;
        for &c in &inner.counts {
            if !c.is_finite() {
                continue;
            }
            max = max.max(c);
            if c > 0.0 {
                min_nonzero = min_nonzero.min(c);
            }
            sum += c;
        }
        let a = Aggregates {
            max,
            min_nonzero: if min_nonzero.is_finite() {
                min_nonzero
            } else {
                0.0
            },
            mean: sum / inner.counts.len() as f64,
        };
        inner.aggregates = Some(a);
        a
    }

    pub fn max_count(&self) -> f64 {
        Self::aggregates(&mut self.inner.lock()).max
    }

    /// Smallest nonzero bin value, or 0 when the grid is empty.
    pub fn min_nonzero(&self) -> f64 {
        Self::aggregates(&mut self.inner.lock()).min_nonzero
    }

    /// Mean over all bins, zeros included.
    pub fn mean_count(&self) -> f64 {
        Self::aggregates(&mut self.inner.lock()).mean
    }

    fn sorted_nonzero(inner: &mut Inner) -> &[f64] {
        if inner.sorted_nonzero.is_none() {
            let mut values: Vec<f64> = inner
                .counts
                .iter()
                .copied()
                .filter(|c| c.is_finite() && *c > 0.0)
                .collect();
            values.par_sort_unstable_by(f64::total_cmp);
            debug!(bins = values.len(), "rebuilt percentile distribution");
            inner.sorted_nonzero = Some(values);
        }
        inner.sorted_nonzero.as_deref().unwrap()
    }

    /// Rank (0–100) of the bin containing (x, y) against the distribution
    /// of nonzero finite bins. None when the point is out of range or the
    /// grid holds no nonzero bins.
    pub fn percentile(&self, x: f64, y: f64) -> Option<f64> {
        let (ix, iy) = self.locate(x, y)?;
        let mut inner = self.inner.lock();
        let v = inner.counts[iy * self.nx + ix];
        let sorted = Self::sorted_nonzero(&mut inner);
        if sorted.is_empty() {
            return None;
        }
        // Upper bound: values <= v.
        let rank = sorted.partition_point(|&s| s <= v);
        Some(rank as f64 / sorted.len() as f64 * 100.0)
    }

    /// Mean over the 3×3 block centered on the bin containing (x, y),
    /// restricted to finite in-grid neighbors.
    pub fn local_mean(&self, x: f64, y: f64) -> Option<f64> {
        let (ix, iy) = self.locate(x, y)?;
        let inner = self.inner.lock();
        let mut sum = 0.0;
        let mut n = 0usize;
        for dy in -1i64..=1 {
            for dx in -1i64..=1 {
                let jx = ix as i64 + dx;
                let jy = iy as i64 + dy;
                if jx < 0 || jy < 0 || jx >= self.nx as i64 || jy >= self.ny as i64 {
                    continue;
                }
                let c = inner.counts[jy as usize * self.nx + jx as usize];
                if c.is_finite() {
                    sum += c;
                    n += 1;
                }
            }
        }
        if n == 0 {
            return None;
        }
        Some(sum / n as f64)
    }

    /// Deep copy of the full state for concurrent-safe external reads.
    pub fn snapshot(&self) -> Hist2dSnapshot {
        let inner = self.inner.lock();
        Hist2dSnapshot {
            nx: self.nx,
            ny: self.ny,
            x_range: (self.x_min, self.x_max),
            y_range: (self.y_min, self.y_max),
            counts: inner.counts.clone(),
            good_count: inner.good_count,
            out_of_range: inner.out_of_range,
        }
    }

    /// Validated bulk replacement of the bin matrix and every region
    /// counter, which is the persistence hook. Rejects shape mismatches and
    /// non-finite counts without touching state; invalidates all caches
    /// on success.
    pub fn set_contents(&self, contents: Hist2dContents) -> Result<(), ModelError> {
        if contents.counts.len() != self.nx * self.ny {
            return Err(ModelError::ContentsShape {
                expected: self.nx * self.ny,
                got: contents.counts.len(),
            });
        }
        if let Some(index) = contents.counts.iter().position(|c| !c.is_finite()) {
            return Err(ModelError::NonFiniteCount { index });
        }
        let mut inner = self.inner.lock();
        inner.counts = contents.counts;
        inner.good_count = contents.good_count;
        inner.out_of_range = contents.out_of_range;
        inner.invalidate();
        Ok(())
    }

    /// Zero every bin and counter.
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.counts.iter_mut().for_each(|c| *c = 0.0);
        inner.good_count = 0;
        inner.out_of_range = OutOfRangeCounts::default();
        inner.invalidate();
    }
}
