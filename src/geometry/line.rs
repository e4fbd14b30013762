use crate::error::{GeometryError, Result};
use crate::math::{Point3, Vector3, TOLERANCE};

use super::Surface;

/// A tracking ray `origin + t * direction` with a unit direction, so `t` is
/// a distance.
#[derive(Debug, Clone)]
pub struct Line {
    origin: Point3,
    direction: Vector3,
}

impl Line {
    /// # Errors
    ///
    /// Returns an error for a zero direction.
    pub fn new(origin: Point3, direction: Vector3) -> Result<Self> {
        let norm = direction.norm();
        if norm < TOLERANCE {
            return Err(GeometryError::ZeroVector.into());
        }
        Ok(Self {
            origin,
            direction: direction / norm,
        })
    }

    #[must_use]
    pub fn origin(&self) -> &Point3 {
        &self.origin
    }

    #[must_use]
    pub fn direction(&self) -> &Vector3 {
        &self.direction
    }

    /// Point at distance `t`.
    #[must_use]
    pub fn at(&self, t: f64) -> Point3 {
        self.origin + self.direction * t
    }

    /// Distances beyond `min_t` at which the ray meets `surface`, ascending.
    #[must_use]
    pub fn hits(&self, surface: &impl Surface, min_t: f64) -> Vec<f64> {
        surface
            .line_intersect(&self.origin, &self.direction)
            .into_iter()
            .filter(|&t| t > min_t)
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::geometry::{Plane, Sphere};

    #[test]
    fn direction_is_normalized() {
        let line = Line::new(Point3::origin(), Vector3::new(0.0, 0.0, 4.0)).unwrap();
        assert_eq!(line.at(2.5), Point3::new(0.0, 0.0, 2.5));
        assert!(Line::new(Point3::origin(), Vector3::zeros()).is_err());
    }

    #[test]
    fn hits_skip_points_behind() {
        let line = Line::new(Point3::origin(), Vector3::x()).unwrap();
        let sphere = Sphere::new(Point3::origin(), 2.0).unwrap();
        assert_eq!(line.hits(&sphere, 0.0), vec![2.0]);
        let plane = Plane::new(Point3::new(-1.0, 0.0, 0.0), Vector3::x()).unwrap();
        assert!(line.hits(&plane, 0.0).is_empty());
    }
}
