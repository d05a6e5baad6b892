use tracing::debug;

use crate::fit::FitVectors;

use super::hist1d::Histogram1d;

/// Peak-search strategy over a bin range, in increasing order of
/// sophistication.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PeakSearch {
    /// First bin with the maximum raw count.
    Raw,
    /// Moving average over a clamped ±radius window; ties resolved by
    /// higher raw count.
    Flat { radius: usize },
    /// Weighted moving average, weight = radius + 1 − distance; ties
    /// resolved by raw count, then proximity to the range midpoint.
    Triangular { radius: usize },
    /// Triangular smoothing with plateau resolution: contiguous ties pick
    /// the bin nearest the plateau midpoint, scattered ties compare raw
    /// counts.
    Best { radius: usize },
}

/// Result of guarded fit-window preparation. The vectors may be empty;
/// the metadata lets callers diagnose degenerate windows instead of
/// handling an error.
#[derive(Debug)]
pub struct FitWindow {
    /// Bin centers / counts / Poisson weights inside the window.
    pub vectors: FitVectors,
    /// Peak the window is centered on, when one was found.
    pub peak_bin: Option<usize>,
    /// Inclusive bin range actually used.
    pub bin_range: Option<(usize, usize)>,
    /// Half-window actually applied after clamping or expansion.
    pub half_window: usize,
    /// True when the zero-count last resort was taken.
    pub zero_bins_included: bool,
}

impl FitWindow {
    fn empty() -> Self {
        Self {
            vectors: FitVectors::default(),
            peak_bin: None,
            bin_range: None,
            half_window: 0,
            zero_bins_included: false,
        }
    }
}

impl Histogram1d {
    /// Clamp an inclusive bin range to the histogram; None when it is
    /// empty after clamping.
    fn clamp_range(&self, lo: usize, hi: usize) -> Option<(usize, usize)> {
        let n = self.bin_count();
        let hi = hi.min(n - 1);
        if lo > hi {
            return None;
        }
        Some((lo, hi))
    }

    fn flat_smoothed(&self, bin: usize, radius: usize) -> f64 {
        let n = self.bin_count();
        let a = bin.saturating_sub(radius);
        let b = (bin + radius).min(n - 1);
        let counts = self.counts();
        let sum: f64 = counts[a..=b].iter().sum();
        sum / (b - a + 1) as f64
    }

    fn triangular_smoothed(&self, bin: usize, radius: usize) -> f64 {
        let n = self.bin_count();
        let a = bin.saturating_sub(radius);
        let b = (bin + radius).min(n - 1);
        let counts = self.counts();
        let mut num = 0.0;
        let mut den = 0.0;
        for j in a..=b {
            let d = bin.abs_diff(j);
            let w = (radius + 1 - d) as f64;
            num += w * counts[j];
            den += w;
        }
        num / den
    }

    /// Run one peak-search strategy over an inclusive bin range.
    pub fn find_peak(&self, strategy: PeakSearch, lo: usize, hi: usize) -> Option<usize> {
        match strategy {
            PeakSearch::Raw => self.find_peak_raw(lo, hi),
            PeakSearch::Flat { radius } => self.find_peak_flat(radius, lo, hi),
            PeakSearch::Triangular { radius } => self.find_peak_triangular(radius, lo, hi),
            PeakSearch::Best { radius } => self.find_peak_best(radius, lo, hi),
        }
    }

    /// First bin with the maximum raw count in range.
    pub fn find_peak_raw(&self, lo: usize, hi: usize) -> Option<usize> {
        let (lo, hi) = self.clamp_range(lo, hi)?;
        let counts = self.counts();
        let mut best = lo;
        for bin in lo..=hi {
            if counts[bin] > counts[best] {
                best = bin;
            }
        }
        Some(best)
    }

    /// Flat-smoothed peak; ties go to the higher raw count.
    pub fn find_peak_flat(&self, radius: usize, lo: usize, hi: usize) -> Option<usize> {
        let (lo, hi) = self.clamp_range(lo, hi)?;
        let counts = self.counts();
        let mut best = lo;
        let mut best_avg = self.flat_smoothed(lo, radius);
        for bin in (lo + 1)..=hi {
            let avg = self.flat_smoothed(bin, radius);
            if avg > best_avg || (avg == best_avg && counts[bin] > counts[best]) {
                best = bin;
                best_avg = avg;
            }
        }
        Some(best)
    }

    /// Triangular-smoothed peak; ties go to raw count, then to the bin
    /// nearer the range midpoint.
    pub fn find_peak_triangular(&self, radius: usize, lo: usize, hi: usize) -> Option<usize> {
        let (lo, hi) = self.clamp_range(lo, hi)?;
        let counts = self.counts();
        let mid = (lo + hi) as f64 / 2.0;
        let mut best = lo;
        let mut best_sm = self.triangular_smoothed(lo, radius);
        for bin in (lo + 1)..=hi {
            let sm = self.triangular_smoothed(bin, radius);
            let better = sm > best_sm
                || (sm == best_sm
                    && (counts[bin] > counts[best]
                        || (counts[bin] == counts[best]
                            && (bin as f64 - mid).abs() < (best as f64 - mid).abs())));
            if better {
                best = bin;
                best_sm = sm;
            }
        }
        Some(best)
    }

    /// Triangular-smoothed peak with plateau resolution.
    pub fn find_peak_best(&self, radius: usize, lo: usize, hi: usize) -> Option<usize> {
        let (lo, hi) = self.clamp_range(lo, hi)?;
        let counts = self.counts();
        let mid = (lo + hi) as f64 / 2.0;

        let smoothed: Vec<f64> = (lo..=hi)
            .map(|bin| self.triangular_smoothed(bin, radius))
            .collect();
        let max = smoothed.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let tied: Vec<usize> = (lo..=hi).filter(|&b| smoothed[b - lo] == max).collect();

        if tied.len() == 1 {
            return Some(tied[0]);
        }

        let first = tied[0];
        let last = *tied.last().unwrap();
        let contiguous = last - first + 1 == tied.len();

        let pick = if contiguous {
            // One plateau: take the bin nearest its midpoint, then the
            // range midpoint.
            let plateau_mid = (first + last) as f64 / 2.0;
            tied.iter()
                .copied()
                .min_by(|&a, &b| {
                    let da = (a as f64 - plateau_mid).abs();
                    let db = (b as f64 - plateau_mid).abs();
                    da.total_cmp(&db)
                        .then((a as f64 - mid).abs().total_cmp(&(b as f64 - mid).abs()))
                })
                .unwrap()
        } else {
            // Scattered ties: fall back to raw counts, then range midpoint.
            tied.iter()
                .copied()
                .max_by(|&a, &b| {
                    counts[a]
                        .total_cmp(&counts[b])
                        .then((b as f64 - mid).abs().total_cmp(&(a as f64 - mid).abs()))
                })
                .unwrap()
        };
        Some(pick)
    }

    /// Prepare a peak-centered fit window inside `[lo, hi]`.
    ///
    /// The peak is searched first in the inner sub-range that could fully
    /// support a ±`half_window` window; the window is then clamped
    /// asymmetrically to whichever is nearer, the histogram edge or the
    /// search-range edge. If fewer than `min_points` nonzero bins remain,
    /// the window expands to its maximum possible size, and as a last
    /// resort zero-count bins are included (with Poisson fallback weight
    /// 1). Never fails; inspect the metadata for degenerate outcomes.
    pub fn prepare_fit_window(
        &self,
        half_window: usize,
        lo: usize,
        hi: usize,
        min_points: usize,
    ) -> FitWindow {
        let Some((lo, hi)) = self.clamp_range(lo, hi) else {
            return FitWindow::empty();
        };

        const SMOOTH_RADIUS: usize = 1;
        let inner_lo = lo + half_window;
        let inner_hi = hi.saturating_sub(half_window);
        let peak = if inner_lo <= inner_hi {
            self.find_peak_best(SMOOTH_RADIUS, inner_lo, inner_hi)
        } else {
            self.find_peak_best(SMOOTH_RADIUS, lo, hi)
        };
        let Some(peak) = peak else {
            return FitWindow::empty();
        };

        let mut left = half_window.min(peak - lo);
        let mut right = half_window.min(hi - peak);

        let counts = self.counts();
        let nonzero = |a: usize, b: usize| counts[a..=b].iter().filter(|&&c| c > 0.0).count();

        if nonzero(peak - left, peak + right) < min_points {
            left = peak - lo;
            right = hi - peak;
            debug!(peak, "fit window expanded to full search range");
        }
        let zero_bins_included = nonzero(peak - left, peak + right) < min_points;
        if zero_bins_included {
            debug!(peak, "fit window including zero-count bins");
        }

        let (a, b) = (peak - left, peak + right);
        let mut x = Vec::with_capacity(b - a + 1);
        let mut y = Vec::with_capacity(b - a + 1);
        let mut w = Vec::with_capacity(b - a + 1);
        for bin in a..=b {
            let c = counts[bin];
            if c > 0.0 {
                x.push(self.bin_center(bin));
                y.push(c);
                w.push(1.0 / c);
            } else if zero_bins_included {
                x.push(self.bin_center(bin));
                y.push(0.0);
                w.push(1.0);
            }
        }
        let vectors = FitVectors::from_xy_weights(x, y, w)
            .expect("window vectors are built with equal lengths");

        FitWindow {
            vectors,
            peak_bin: Some(peak),
            bin_range: Some((a, b)),
            half_window: left.max(right),
            zero_bins_included,
        }
    }
}
