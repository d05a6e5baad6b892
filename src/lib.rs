//! chart_data crate: concurrent data model for interactive charting
//!
//! Curves (XY series, histograms, streaming strip charts) are mutated on a
//! single owner thread; any other thread stages data through lock-free
//! producer handles and a coalesced drain. Derived artifacts (fits,
//! splines) are cached lazily and invalidated by data/style changes.

pub mod column;
pub mod curve;
pub mod dataset;
pub mod error;
pub mod fit;
pub mod histogram;
pub mod staging;
pub mod style;

pub use column::DataColumn;
pub use curve::{
    Bounds, ChangeKind, Curve, CurveData, CurveEvent, CurveId, CurveProducer, CurveSnapshot,
    DerivedArtifact, SampleSource, Sampler,
};
pub use dataset::Dataset;
pub use error::ModelError;
pub use fit::{synthetic_fit_vectors, FitOutcome, FitVectors, Fitter, FitterFactory, SplineBuilder, SplineOutcome};
pub use histogram::{
    BinLocation, FitWindow, Hist2dContents, Hist2dSnapshot, HistStats, Histogram1d, Histogram2d,
    OutOfRangeCounts, PeakSearch,
};
pub use staging::{DrainOutcome, DrainScheduler, NoopScheduler, PendingItem, StagingProducer, StagingQueue};
pub use style::{CurveStyle, DrawMethod, Rgba, StyleId, TimeUnit};
