use crate::column::DataColumn;
use crate::error::ModelError;
use crate::fit::FitVectors;

use super::{Bounds, Curve, CurveData, CurveSnapshot};

/// XY storage: paired x/y columns plus an error column that only counts
/// when its length matches the data.
#[derive(Clone, Debug, Default)]
pub struct XyData {
    pub(crate) x: DataColumn,
    pub(crate) y: DataColumn,
    pub(crate) errors: DataColumn,
}

impl XyData {
    pub(crate) fn push(&mut self, x: f64, y: f64, err: Option<f64>) {
        self.x.push(x);
        self.y.push(y);
        if let Some(e) = err {
            self.errors.push(e);
        }
    }

    pub(crate) fn clear(&mut self) {
        self.x.clear();
        self.y.clear();
        self.errors.clear();
    }

    fn errors_match(&self) -> bool {
        !self.errors.is_empty() && self.errors.len() == self.x.len()
    }

    /// Weighted when the error column matches, unweighted otherwise.
    pub(crate) fn fit_vectors(&self) -> FitVectors {
        let errors = self.errors_match().then_some(&self.errors);
        FitVectors::from_columns(&self.x, &self.y, errors)
            .expect("paired columns are kept at equal length")
    }

    pub(crate) fn snapshot(&self) -> CurveSnapshot {
        CurveSnapshot::Xy {
            x: self.x.values().to_vec(),
            y: self.y.values().to_vec(),
            errors: self.errors_match().then(|| self.errors.values().to_vec()),
        }
    }

    pub(crate) fn bounds(&self) -> Option<Bounds> {
        let (x_min, x_max) = self.x.extents()?;
        let (y_min, y_max) = self.y.extents()?;
        Some(Bounds {
            x_min,
            x_max,
            y_min,
            y_max,
        })
    }
}

impl Curve {
    fn xy_data_mut(&mut self) -> Option<&mut XyData> {
        match &mut self.data {
            CurveData::Xy(xy) => Some(xy),
            _ => None,
        }
    }

    /// Append one point and notify. Owner thread only; producers use
    /// [`super::CurveProducer::add_point`].
    pub fn add_point(&mut self, x: f64, y: f64) {
        if let Some(xy) = self.xy_data_mut() {
            xy.push(x, y, None);
            self.core.mark_data_changed();
        }
    }

    pub fn add_point_with_error(&mut self, x: f64, y: f64, err: f64) {
        if let Some(xy) = self.xy_data_mut() {
            xy.push(x, y, Some(err));
            self.core.mark_data_changed();
        }
    }

    /// Append many points with one notification.
    pub fn add_points(&mut self, points: &[(f64, f64)]) {
        if points.is_empty() {
            return;
        }
        if let Some(xy) = self.xy_data_mut() {
            for &(x, y) in points {
                xy.push(x, y, None);
            }
            self.core.mark_data_changed();
        }
    }

    /// Validated bulk replacement of the XY contents.
    pub fn set_xy_data(
        &mut self,
        x: Vec<f64>,
        y: Vec<f64>,
        errors: Option<Vec<f64>>,
    ) -> Result<(), ModelError> {
        if x.len() != y.len() {
            return Err(ModelError::MismatchedLengths {
                x_len: x.len(),
                y_len: y.len(),
            });
        }
        if let Some(e) = &errors {
            if e.len() != x.len() {
                return Err(ModelError::MismatchedErrorColumn {
                    data_len: x.len(),
                    err_len: e.len(),
                });
            }
        }
        if let Some(xy) = self.xy_data_mut() {
            xy.x.set_values(x);
            xy.y.set_values(y);
            match errors {
                Some(e) => xy.errors.set_values(e),
                None => xy.errors.clear(),
            }
            self.core.mark_data_changed();
        }
        Ok(())
    }

    /// Point count of an XY curve; 0 for other variants.
    pub fn point_count(&self) -> usize {
        match &self.data {
            CurveData::Xy(xy) => xy.x.len(),
            _ => 0,
        }
    }
}
