use crate::fit::FitVectors;
use crate::histogram::Histogram1d;

use super::{Bounds, Curve, CurveData, CurveSnapshot};

/// Curve storage wrapping the 1D histogram engine.
pub struct HistogramData {
    pub(crate) hist: Histogram1d,
}

impl HistogramData {
    /// Bin centers vs counts, unweighted: binned data has no natural
    /// per-point weight on this path.
    pub(crate) fn fit_vectors(&self) -> FitVectors {
        let centers: Vec<f64> = (0..self.hist.bin_count())
            .map(|b| self.hist.bin_center(b))
            .collect();
        FitVectors::from_xy(centers, self.hist.counts().to_vec())
            .expect("one center per count bin")
    }

    pub(crate) fn snapshot(&self) -> CurveSnapshot {
        CurveSnapshot::Histogram {
            edges: self.hist.edges().to_vec(),
            counts: self.hist.counts().to_vec(),
            underflow: self.hist.underflow(),
            overflow: self.hist.overflow(),
        }
    }

    pub(crate) fn bounds(&self) -> Option<Bounds> {
        let y_max = self
            .hist
            .counts()
            .iter()
            .copied()
            .fold(0.0f64, f64::max);
        Some(Bounds {
            x_min: self.hist.min(),
            x_max: self.hist.max(),
            y_min: 0.0,
            y_max,
        })
    }
}

impl Curve {
    /// Read access to the wrapped histogram engine, when this is a
    /// histogram curve.
    pub fn histogram_engine(&self) -> Option<&Histogram1d> {
        match &self.data {
            CurveData::Histogram(h) => Some(&h.hist),
            _ => None,
        }
    }

    /// Fill one value and notify. Owner thread only; producers use
    /// [`super::CurveProducer::add_value`].
    pub fn fill(&mut self, v: f64) {
        if let CurveData::Histogram(h) = &mut self.data {
            h.hist.fill(v);
            self.core.mark_data_changed();
        }
    }

    /// Fill many values with one notification.
    pub fn fill_all(&mut self, values: &[f64]) {
        if values.is_empty() {
            return;
        }
        if let CurveData::Histogram(h) = &mut self.data {
            h.hist.fill_all(values);
            self.core.mark_data_changed();
        }
    }

    /// Weighted fill and notify.
    pub fn fill_weighted(&mut self, v: f64, w: f64) {
        if let CurveData::Histogram(h) = &mut self.data {
            h.hist.fill_weighted(v, w);
            self.core.mark_data_changed();
        }
    }
}
