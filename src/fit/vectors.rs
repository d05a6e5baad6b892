use crate::column::DataColumn;
use crate::error::ModelError;

/// Immutable (x, y, optional weight) triple prepared for least-squares
/// fitting.
///
/// Weights come from measurement errors as 1/σ²; a non-finite or
/// non-positive σ sanitizes to weight 0 so the point drops out of the fit
/// instead of poisoning it.
#[derive(Clone, Debug, Default)]
pub struct FitVectors {
    x: Vec<f64>,
    y: Vec<f64>,
    weights: Option<Vec<f64>>,
}

impl FitVectors {
    /// Unweighted vectors from raw arrays. Rejects mismatched lengths.
    pub fn from_xy(x: Vec<f64>, y: Vec<f64>) -> Result<Self, ModelError> {
        if x.len() != y.len() {
            return Err(ModelError::MismatchedLengths {
                x_len: x.len(),
                y_len: y.len(),
            });
        }
        Ok(Self {
            x,
            y,
            weights: None,
        })
    }

    /// Weighted vectors from raw arrays plus per-point errors.
    pub fn from_xy_errors(x: Vec<f64>, y: Vec<f64>, errors: &[f64]) -> Result<Self, ModelError> {
        if x.len() != y.len() {
            return Err(ModelError::MismatchedLengths {
                x_len: x.len(),
                y_len: y.len(),
            });
        }
        if errors.len() != x.len() {
            return Err(ModelError::MismatchedErrorColumn {
                data_len: x.len(),
                err_len: errors.len(),
            });
        }
        let weights = errors.iter().copied().map(weight_from_error).collect();
        Ok(Self {
            x,
            y,
            weights: Some(weights),
        })
    }

    /// Vectors from paired columns and an optional error column.
    pub fn from_columns(
        x: &DataColumn,
        y: &DataColumn,
        errors: Option<&DataColumn>,
    ) -> Result<Self, ModelError> {
        match errors {
            Some(e) => Self::from_xy_errors(x.values().to_vec(), y.values().to_vec(), e.values()),
            None => Self::from_xy(x.values().to_vec(), y.values().to_vec()),
        }
    }

    /// Weighted vectors with precomputed weights. Internal to the
    /// histogram fit-window path.
    pub(crate) fn from_xy_weights(
        x: Vec<f64>,
        y: Vec<f64>,
        weights: Vec<f64>,
    ) -> Result<Self, ModelError> {
        if x.len() != y.len() {
            return Err(ModelError::MismatchedLengths {
                x_len: x.len(),
                y_len: y.len(),
            });
        }
        if weights.len() != x.len() {
            return Err(ModelError::MismatchedErrorColumn {
                data_len: x.len(),
                err_len: weights.len(),
            });
        }
        Ok(Self {
            x,
            y,
            weights: Some(weights),
        })
    }

    pub fn x(&self) -> &[f64] {
        &self.x
    }

    pub fn y(&self) -> &[f64] {
        &self.y
    }

    pub fn weights(&self) -> Option<&[f64]> {
        self.weights.as_deref()
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// True when a weight vector of matching length is present.
    pub fn is_weighted(&self) -> bool {
        self.weights
            .as_ref()
            .is_some_and(|w| w.len() == self.x.len())
    }
}

/// 1/σ², sanitized: non-finite or non-positive σ contributes weight 0.
pub(crate) fn weight_from_error(sigma: f64) -> f64 {
    if sigma.is_finite() && sigma > 0.0 {
        1.0 / (sigma * sigma)
    } else {
        0.0
    }
}
