use std::collections::VecDeque;

use crate::error::ModelError;
use crate::style::TimeUnit;

use super::{Bounds, Curve, CurveData, CurveSnapshot};

/// Fixed-capacity ring of (time, value) samples. Storage always holds raw
/// seconds; the display unit scales reads only.
pub struct StripChartData {
    samples: VecDeque<(f64, f64)>,
    capacity: usize,
    display_unit: TimeUnit,
}

impl StripChartData {
    pub(crate) fn new(capacity: usize) -> Result<Self, ModelError> {
        if capacity == 0 {
            return Err(ModelError::ZeroCapacity);
        }
        Ok(Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
            display_unit: TimeUnit::Seconds,
        })
    }

    /// Append a sample, trimming oldest-first to capacity.
    pub(crate) fn push(&mut self, t: f64, v: f64) {
        if self.samples.len() >= self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back((t, v));
    }

    pub(crate) fn clear(&mut self) {
        self.samples.clear();
    }

    pub(crate) fn display_unit(&self) -> TimeUnit {
        self.display_unit
    }

    pub(crate) fn snapshot(&self) -> CurveSnapshot {
        let scale = self.display_unit.seconds_per_unit();
        CurveSnapshot::StripChart {
            times: self.samples.iter().map(|&(t, _)| t / scale).collect(),
            values: self.samples.iter().map(|&(_, v)| v).collect(),
        }
    }

    pub(crate) fn bounds(&self) -> Option<Bounds> {
        if self.samples.is_empty() {
            return None;
        }
        let scale = self.display_unit.seconds_per_unit();
        let mut b = Bounds {
            x_min: f64::INFINITY,
            x_max: f64::NEG_INFINITY,
            y_min: f64::INFINITY,
            y_max: f64::NEG_INFINITY,
        };
        for &(t, v) in &self.samples {
            let t = t / scale;
            b.x_min = b.x_min.min(t);
            b.x_max = b.x_max.max(t);
            b.y_min = b.y_min.min(v);
            b.y_max = b.y_max.max(v);
        }
        Some(b)
    }
}

impl Curve {
    /// Append one sample and notify. Owner thread only; the sampler and
    /// other producers use [`super::CurveProducer::add_sample`].
    pub fn push_sample(&mut self, t: f64, v: f64) {
        if let CurveData::StripChart(s) = &mut self.data {
            s.push(t, v);
            self.core.mark_data_changed();
        }
    }

    /// Change the display time unit. Storage is untouched; only reads
    /// scale differently. Notifies STYLE.
    pub fn set_display_unit(&mut self, unit: TimeUnit) {
        if let CurveData::StripChart(s) = &mut self.data {
            if s.display_unit != unit {
                s.display_unit = unit;
                self.core.notify_appearance();
            }
        }
    }

    /// Sample count of a strip chart; 0 for other variants.
    pub fn sample_count(&self) -> usize {
        match &self.data {
            CurveData::StripChart(s) => s.samples.len(),
            _ => 0,
        }
    }
}
