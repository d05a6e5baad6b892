//! Binned data engines: 1D histogram with peak search and guarded
//! fit-window preparation, and a lock-guarded 2D grid histogram.

mod hist1d;
mod hist2d;
mod peak;

pub use hist1d::{BinLocation, HistStats, Histogram1d};
pub use hist2d::{Hist2dContents, Hist2dSnapshot, Histogram2d, OutOfRangeCounts};
pub use peak::{FitWindow, PeakSearch};
