/// Ordered sequence of values with incrementally maintained min/max.
///
/// Backs the x/y/error storage of XY curves. Min/max are kept current on
/// every append; bulk replacement recomputes them in one pass.
#[derive(Clone, Debug, Default)]
pub struct DataColumn {
    values: Vec<f64>,
    min: f64,
    max: f64,
}

impl DataColumn {
    pub fn new() -> Self {
        Self {
            values: Vec::new(),
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            values: Vec::with_capacity(capacity),
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }

    pub fn from_values(values: Vec<f64>) -> Self {
        let mut col = Self {
            values,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        };
        col.recompute_extents();
        col
    }

    pub fn push(&mut self, v: f64) {
        if v.is_finite() {
            self.min = self.min.min(v);
            self.max = self.max.max(v);
        }
        self.values.push(v);
    }

    pub fn extend_from_slice(&mut self, vs: &[f64]) {
        for &v in vs {
            self.push(v);
        }
    }

    pub fn set_values(&mut self, values: Vec<f64>) {
        self.values = values;
        self.recompute_extents();
    }

    pub fn clear(&mut self) {
        self.values.clear();
        self.min = f64::INFINITY;
        self.max = f64::NEG_INFINITY;
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn get(&self, index: usize) -> Option<f64> {
        self.values.get(index).copied()
    }

    /// (min, max) over the finite values, or None when there are none.
    pub fn extents(&self) -> Option<(f64, f64)> {
        if self.min <= self.max {
            Some((self.min, self.max))
        } else {
            None
        }
    }

    fn recompute_extents(&mut self) {
        self.min = f64::INFINITY;
        self.max = f64::NEG_INFINITY;
        for &v in &self.values {
            if v.is_finite() {
                self.min = self.min.min(v);
                self.max = self.max.max(v);
            }
        }
    }
}
