//! Fit-vector construction and the pluggable fit/spline capability seams.
//!
//! The numerical algorithms live outside this crate; curves talk to them
//! through [`Fitter`] and [`SplineBuilder`], selected via a
//! [`FitterFactory`] keyed by draw method and fit order.

mod synthetic;
mod vectors;

pub use synthetic::synthetic_fit_vectors;
pub use vectors::FitVectors;

use crate::style::DrawMethod;

/// Result of a successful fit: an evaluator plus a one-line summary for
/// display next to the curve.
pub struct FitOutcome {
    eval: Box<dyn Fn(f64) -> f64 + Send + Sync>,
    summary: String,
}

impl FitOutcome {
    pub fn new(
        eval: impl Fn(f64) -> f64 + Send + Sync + 'static,
        summary: impl Into<String>,
    ) -> Self {
        Self {
            eval: Box::new(eval),
            summary: summary.into(),
        }
    }

    pub fn eval(&self, x: f64) -> f64 {
        (self.eval)(x)
    }

    pub fn summary(&self) -> &str {
        &self.summary
    }
}

impl std::fmt::Debug for FitOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FitOutcome")
            .field("summary", &self.summary)
            .finish_non_exhaustive()
    }
}

/// An interpolation through the points, treated as an opaque derived
/// artifact exactly like a fit result.
pub struct SplineOutcome {
    eval: Box<dyn Fn(f64) -> f64 + Send + Sync>,
}

impl SplineOutcome {
    pub fn new(eval: impl Fn(f64) -> f64 + Send + Sync + 'static) -> Self {
        Self {
            eval: Box::new(eval),
        }
    }

    pub fn eval(&self, x: f64) -> f64 {
        (self.eval)(x)
    }
}

impl std::fmt::Debug for SplineOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SplineOutcome").finish_non_exhaustive()
    }
}

/// Least-squares fitting capability. Errors are opaque and handled
/// fail-soft by the curve.
pub trait Fitter: Send + Sync {
    fn fit(&self, vectors: &FitVectors) -> eyre::Result<FitOutcome>;
}

/// Spline interpolation capability.
pub trait SplineBuilder: Send + Sync {
    fn build(&self, x: &[f64], y: &[f64]) -> eyre::Result<SplineOutcome>;
}

/// Instantiates the fitter matching a curve's draw method and integer
/// order/count knob (polynomial degree, Gaussian count, ...).
pub trait FitterFactory: Send + Sync {
    /// None when the method has no fit (e.g. plain lines).
    fn fitter_for(&self, method: DrawMethod, order: u32) -> Option<Box<dyn Fitter>>;

    /// The spline capability, if the embedder provides one.
    fn spline_builder(&self) -> Option<Box<dyn SplineBuilder>>;
}
