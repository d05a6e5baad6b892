use serde::{Deserialize, Serialize};

/// RGBA color, linear components in [0, 1].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Rgba {
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }
}

impl Default for Rgba {
    fn default() -> Self {
        // Opaque blue, matching the library's default series color.
        Self::new(0.0, 0.35, 0.9, 1.0)
    }
}

/// How a curve is drawn, and which derived artifact it wants.
///
/// `Spline` and the two fit variants drive the derived-artifact cache;
/// the rest are plain geometry tags the renderer interprets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum DrawMethod {
    #[default]
    Line,
    Scatter,
    /// Step drawing; the only method a strip chart uses.
    Stairs,
    Bars,
    /// Interpolating spline through the points.
    Spline,
    /// Least-squares polynomial of the curve's fit order.
    PolyFit,
    /// Sum of `fit_order` Gaussians.
    GaussFit,
}

impl DrawMethod {
    /// True for methods whose derived artifact is a least-squares fit.
    pub fn wants_fit(self) -> bool {
        matches!(self, Self::PolyFit | Self::GaussFit)
    }

    /// True for methods whose derived artifact is a spline.
    pub fn wants_spline(self) -> bool {
        matches!(self, Self::Spline)
    }
}

/// Display scale for strip-chart time stamps. Applied only when reading a
/// snapshot; stored samples always keep raw seconds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum TimeUnit {
    #[default]
    Seconds,
    Minutes,
    Hours,
}

impl TimeUnit {
    /// Divisor taking raw seconds to this unit.
    pub fn seconds_per_unit(self) -> f64 {
        match self {
            Self::Seconds => 1.0,
            Self::Minutes => 60.0,
            Self::Hours => 3600.0,
        }
    }
}

/// Identifier issued by the dataset's style counter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct StyleId(pub u64);

/// Visual style for one curve.
///
/// Styles are plain values: applying one style to several curves copies it,
/// so later edits to one curve never leak into another.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CurveStyle {
    pub id: StyleId,
    pub color: Rgba,
    pub line_width: f32,
    pub point_size: f32,
}

impl Default for CurveStyle {
    fn default() -> Self {
        Self {
            id: StyleId(0),
            color: Rgba::default(),
            line_width: 2.0,
            point_size: 4.0,
        }
    }
}

impl CurveStyle {
    /// Copy of this style re-tagged with a fresh id. Used by the dataset
    /// when one style value is applied across multiple curves.
    pub fn reissued(&self, id: StyleId) -> Self {
        Self { id, ..self.clone() }
    }
}
