//! Population density: where roads want to grow.

use fastnoise_lite::{FastNoiseLite, NoiseType};

use crate::{geom::Point, segment::Segment};

/// A scalar field in `[0, 1]` over the plane.
///
/// Generation calls this a lot, so it should be cheap. It must also be
/// deterministic, or generation won't be.
pub trait PopulationDensity {
    /// The density at `(x, y)`.
    fn density(&self, x: f64, y: f64) -> f64;

    /// The density at a point.
    fn density_at(&self, p: Point) -> f64 {
        self.density(p.x, p.y)
    }

    /// The mean of the density at a segment's two ends.
    fn on_road(&self, seg: &Segment) -> f64 {
        (self.density_at(seg.start()) + self.density_at(seg.end())) / 2.0
    }
}

impl<F: Fn(f64, f64) -> f64> PopulationDensity for F {
    fn density(&self, x: f64, y: f64) -> f64 {
        self(x, y)
    }
}

/// Blobby population centers made of three layers of simplex noise.
pub struct Heatmap {
    noise: FastNoiseLite,
}

impl Heatmap {
    /// Creates a heatmap from a noise seed.
    pub fn new(seed: u32) -> Self {
        let mut noise = FastNoiseLite::new();
        noise.set_seed(Some(seed as i32));
        noise.set_noise_type(Some(NoiseType::OpenSimplex2));
        // Coordinates are scaled by hand in `density`.
        noise.set_frequency(Some(1.0));
        Heatmap { noise }
    }

    fn sample(&self, x: f64, y: f64) -> f64 {
        (f64::from(self.noise.get_noise_2d(x as f32, y as f32)) + 1.0) / 2.0
    }
}

impl std::fmt::Debug for Heatmap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Heatmap").finish_non_exhaustive()
    }
}

impl PopulationDensity for Heatmap {
    fn density(&self, x: f64, y: f64) -> f64 {
        let v1 = self.sample(x / 10000.0, y / 10000.0);
        let v2 = self.sample(x / 20000.0 + 500.0, y / 20000.0 + 500.0);
        let v3 = self.sample(x / 20000.0 + 1000.0, y / 20000.0 + 1000.0);
        let v = (v1 * v2 + v3) / 2.0;
        (v * v).clamp(0.0, 1.0)
    }
}
