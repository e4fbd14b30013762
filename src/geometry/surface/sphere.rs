use crate::error::{GeometryError, Result};
use crate::math::{quadratic_roots, Point3, Vector3, TOLERANCE};

use super::Surface;

/// A spherical surface in 3D space.
///
/// `f(P) = |P - centre| - r`, positive outside.
#[derive(Debug, Clone, PartialEq)]
pub struct Sphere {
    centre: Point3,
    radius: f64,
}

impl Sphere {
    /// Creates a new sphere.
    ///
    /// # Errors
    ///
    /// Returns an error if the radius is non-positive.
    pub fn new(centre: Point3, radius: f64) -> Result<Self> {
        if radius < TOLERANCE {
            return Err(
                GeometryError::Degenerate("sphere radius must be positive".into()).into(),
            );
        }
        Ok(Self { centre, radius })
    }

    /// Returns the centre of the sphere.
    #[must_use]
    pub fn centre(&self) -> &Point3 {
        &self.centre
    }

    /// Returns the radius.
    #[must_use]
    pub fn radius(&self) -> f64 {
        self.radius
    }

    #[must_use]
    pub fn same_as(&self, other: &Sphere, tol: f64) -> bool {
        (self.centre - other.centre).norm() < tol && (self.radius - other.radius).abs() < tol
    }
}

impl Surface for Sphere {
    fn value(&self, point: &Point3) -> f64 {
        (point - self.centre).norm() - self.radius
    }

    fn normal_at(&self, point: &Point3) -> Vector3 {
        let d = point - self.centre;
        let len = d.norm();
        if len < TOLERANCE {
            return Vector3::z();
        }
        d / len
    }

    fn line_intersect(&self, origin: &Point3, dir: &Vector3) -> Vec<f64> {
        let dp = origin - self.centre;
        let a = dir.dot(dir);
        let b = 2.0 * dp.dot(dir);
        let c = dp.dot(&dp) - self.radius * self.radius;
        quadratic_roots(a, b, c)
    }

    fn mnemonic(&self) -> &'static str {
        if self.centre.coords.norm() < TOLERANCE {
            "so"
        } else {
            "s"
        }
    }

    fn parameters(&self) -> Vec<f64> {
        if self.centre.coords.norm() < TOLERANCE {
            vec![self.radius]
        } else {
            vec![self.centre.x, self.centre.y, self.centre.z, self.radius]
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn value_and_normal() {
        let s = Sphere::new(Point3::new(1.0, 2.0, 3.0), 2.0).unwrap();
        assert!((s.value(&Point3::new(4.0, 2.0, 3.0)) - 1.0).abs() < 1e-12);
        assert!(s.value(&Point3::new(1.0, 2.0, 3.0)) < 0.0);
        let n = s.normal_at(&Point3::new(1.0, 5.0, 3.0));
        assert!((n - Vector3::y()).norm() < 1e-12);
    }

    #[test]
    fn invalid_radius() {
        assert!(Sphere::new(Point3::origin(), 0.0).is_err());
    }

    #[test]
    fn line_through_centre() {
        let s = Sphere::new(Point3::origin(), 1.0).unwrap();
        let t = s.line_intersect(&Point3::new(0.0, 0.0, -3.0), &Vector3::z());
        assert_eq!(t.len(), 2);
        assert!((t[0] - 2.0).abs() < 1e-9);
        assert!((t[1] - 4.0).abs() < 1e-9);
    }

    #[test]
    fn card_form() {
        assert_eq!(Sphere::new(Point3::origin(), 4.0).unwrap().mnemonic(), "so");
        let s = Sphere::new(Point3::new(1.0, 0.0, 0.0), 4.0).unwrap();
        assert_eq!(s.parameters(), vec![1.0, 0.0, 0.0, 4.0]);
    }
}
