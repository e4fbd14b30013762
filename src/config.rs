//! Build-wide tolerances and numbering configuration.

/// Configuration shared by every stage of one model build.
#[derive(Debug, Clone, Copy)]
pub struct BuildConfig {
    /// Two surfaces whose parameters differ by less than this are the same surface.
    pub surface_tolerance: f64,
    /// Directions whose components differ by less than this are parallel.
    pub angular_tolerance: f64,
    /// Points closer than this to a surface are considered on it.
    pub on_surface_tolerance: f64,
    /// Build index handed to the first registered component.
    pub first_index: i32,
    /// Surface/cell numbers reserved for each component.
    pub index_block: i32,
    /// Distance stepped either side of a line crossing to classify it.
    pub track_step: f64,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            surface_tolerance: 1e-6,
            angular_tolerance: 1e-6,
            on_surface_tolerance: 1e-8,
            first_index: 1_000_000,
            index_block: 10_000,
            track_step: 1e-6,
        }
    }
}

impl BuildConfig {
    /// Sets the surface dedup tolerance.
    #[must_use]
    pub fn with_surface_tolerance(mut self, tol: f64) -> Self {
        self.surface_tolerance = tol;
        self
    }

    /// Sets the on-surface tolerance used by half-space tests.
    #[must_use]
    pub fn with_on_surface_tolerance(mut self, tol: f64) -> Self {
        self.on_surface_tolerance = tol;
        self
    }

    /// Sets the first build index and the block reserved per component.
    #[must_use]
    pub fn with_index_range(mut self, first_index: i32, index_block: i32) -> Self {
        self.first_index = first_index;
        self.index_block = index_block;
        self
    }
}
