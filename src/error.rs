use thiserror::Error;

/// Validation errors raised at construction or bulk-replacement time.
///
/// These are fail-fast: nothing is partially mutated when one is returned.
/// Runtime fit failures never surface here; they are handled fail-soft by
/// the curve (see `Curve::refresh_derived`).
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("mismatched input lengths: x has {x_len}, y has {y_len}")]
    MismatchedLengths { x_len: usize, y_len: usize },

    #[error("error column length {err_len} does not match data length {data_len}")]
    MismatchedErrorColumn { data_len: usize, err_len: usize },

    #[error("bin edges must be strictly ascending (edge[{index}] = {value} is not above its predecessor)")]
    NonAscendingEdges { index: usize, value: f64 },

    #[error("at least 2 bin edges are required, got {got}")]
    TooFewEdges { got: usize },

    #[error("bin count must be positive")]
    ZeroBins,

    #[error("histogram range is empty or inverted: [{min}, {max}]")]
    EmptyRange { min: f64, max: f64 },

    #[error("capacity must be positive")]
    ZeroCapacity,

    #[error("sampling interval must be positive")]
    ZeroInterval,

    #[error("sample count must be positive")]
    ZeroSamples,

    #[error("contents have {got} bins, grid expects {expected}")]
    ContentsShape { expected: usize, got: usize },

    #[error("non-finite count at bin {index}")]
    NonFiniteCount { index: usize },

    #[error("no curve named {0:?}")]
    NoSuchCurve(String),
}
