use rand::Rng;

use crate::error::ModelError;

use super::vectors::weight_from_error;
use super::FitVectors;

/// Generate noisy weighted test data for exercising fit code.
///
/// Samples `eval` on an even grid over `[x_min, x_max]`, perturbs each y by
/// a symmetric multiplicative jitter of up to `jitter` (e.g. 0.1 for ±10%),
/// and assigns each point a σ drawn as a random fraction (up to
/// `sigma_fraction`) of the local signal scale. Near-zero signal falls back
/// to scale 1 so flat regions still get usable weights.
pub fn synthetic_fit_vectors<F>(
    eval: F,
    x_min: f64,
    x_max: f64,
    count: usize,
    jitter: f64,
    sigma_fraction: f64,
    rng: &mut impl Rng,
) -> Result<FitVectors, ModelError>
where
    F: Fn(f64) -> f64,
{
    if count == 0 {
        return Err(ModelError::ZeroSamples);
    }
    if !(x_max > x_min) {
        return Err(ModelError::EmptyRange {
            min: x_min,
            max: x_max,
        });
    }

    let step = if count > 1 {
        (x_max - x_min) / (count - 1) as f64
    } else {
        0.0
    };

    let mut x = Vec::with_capacity(count);
    let mut y = Vec::with_capacity(count);
    let mut weights = Vec::with_capacity(count);

    for i in 0..count {
        let xi = x_min + step * i as f64;
        let truth = eval(xi);

        // Symmetric multiplicative jitter: factor in [1-jitter, 1+jitter].
        let factor = 1.0 + jitter * (2.0 * rng.random::<f64>() - 1.0);
        let yi = truth * factor;

        let scale = if truth.abs() > f64::EPSILON {
            truth.abs()
        } else {
            1.0
        };
        let sigma = sigma_fraction * scale * rng.random::<f64>();

        x.push(xi);
        y.push(yi);
        weights.push(weight_from_error(sigma));
    }

    FitVectors::from_xy_weights(x, y, weights)
}
