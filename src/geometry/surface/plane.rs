use crate::error::{GeometryError, Result};
use crate::math::{Point3, Vector3, TOLERANCE};

use super::{aligned_axis, Surface};

/// An infinite plane in 3D space.
///
/// Stored as a unit normal `n` and distance `d`; the implicit function is
/// `f(P) = n . P - d`, positive on the side the normal points to.
#[derive(Debug, Clone, PartialEq)]
pub struct Plane {
    normal: Vector3,
    distance: f64,
}

impl Plane {
    /// Creates a plane through `origin` with the given normal.
    ///
    /// # Errors
    ///
    /// Returns an error if the normal vector is zero-length.
    pub fn new(origin: Point3, normal: Vector3) -> Result<Self> {
        let len = normal.norm();
        if len < TOLERANCE {
            return Err(GeometryError::ZeroVector.into());
        }
        let normal = normal / len;
        Ok(Self {
            distance: normal.dot(&origin.coords),
            normal,
        })
    }

    /// Creates a plane through three points, normal `(b - a) x (c - a)`.
    ///
    /// # Errors
    ///
    /// Returns an error if the points are collinear.
    pub fn from_points(a: &Point3, b: &Point3, c: &Point3) -> Result<Self> {
        let normal = (b - a).cross(&(c - a));
        if normal.norm() < TOLERANCE {
            return Err(GeometryError::Degenerate("plane points are collinear".into()).into());
        }
        Self::new(*a, normal)
    }

    /// Returns the unit normal.
    #[must_use]
    pub fn normal(&self) -> &Vector3 {
        &self.normal
    }

    /// Returns the signed distance of the plane from the origin along the normal.
    #[must_use]
    pub fn distance(&self) -> f64 {
        self.distance
    }

    /// The same plane with its sense reversed.
    #[must_use]
    pub fn flipped(&self) -> Self {
        Self {
            normal: -self.normal,
            distance: -self.distance,
        }
    }

    /// `Some(1)` for the same plane, `Some(-1)` for the same plane with the
    /// opposite normal, `None` otherwise.
    #[must_use]
    pub fn matches(&self, other: &Plane, tol: f64, angular_tol: f64) -> Option<i32> {
        if (self.normal - other.normal).norm() < angular_tol
            && (self.distance - other.distance).abs() < tol
        {
            Some(1)
        } else if (self.normal + other.normal).norm() < angular_tol
            && (self.distance + other.distance).abs() < tol
        {
            Some(-1)
        } else {
            None
        }
    }

    /// True if the normal is parallel (either sense) to `axis` within `cos_tol`.
    #[must_use]
    pub fn is_parallel_to(&self, axis: &Vector3, cos_tol: f64) -> bool {
        let len = axis.norm();
        len > TOLERANCE && self.normal.dot(axis).abs() / len >= cos_tol
    }
}

impl Surface for Plane {
    fn value(&self, point: &Point3) -> f64 {
        self.normal.dot(&point.coords) - self.distance
    }

    fn normal_at(&self, _point: &Point3) -> Vector3 {
        self.normal
    }

    fn line_intersect(&self, origin: &Point3, dir: &Vector3) -> Vec<f64> {
        let denom = self.normal.dot(dir);
        if denom.abs() < TOLERANCE {
            // Line is parallel to plane
            return Vec::new();
        }
        vec![-self.value(origin) / denom]
    }

    fn mnemonic(&self) -> &'static str {
        match aligned_axis(&self.normal, TOLERANCE) {
            Some(0) if self.normal.x > 0.0 => "px",
            Some(1) if self.normal.y > 0.0 => "py",
            Some(2) if self.normal.z > 0.0 => "pz",
            _ => "p",
        }
    }

    fn parameters(&self) -> Vec<f64> {
        if self.mnemonic() == "p" {
            vec![self.normal.x, self.normal.y, self.normal.z, self.distance]
        } else {
            vec![self.distance]
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn y_plane(y: f64) -> Plane {
        Plane::new(Point3::new(0.0, y, 0.0), Vector3::y()).unwrap()
    }

    #[test]
    fn value_is_signed_distance() {
        let p = y_plane(2.0);
        assert!((p.value(&Point3::new(5.0, 5.0, -1.0)) - 3.0).abs() < TOLERANCE);
        assert!((p.value(&Point3::new(0.0, -1.0, 0.0)) + 3.0).abs() < TOLERANCE);
    }

    #[test]
    fn zero_normal_rejected() {
        assert!(Plane::new(Point3::origin(), Vector3::zeros()).is_err());
    }

    #[test]
    fn collinear_points_rejected() {
        let a = Point3::origin();
        let b = Point3::new(1.0, 0.0, 0.0);
        let c = Point3::new(2.0, 0.0, 0.0);
        assert!(Plane::from_points(&a, &b, &c).is_err());
    }

    #[test]
    fn matches_with_sign() {
        let a = y_plane(2.0);
        let b = Plane::new(Point3::new(7.0, 2.0, 1.0), Vector3::new(0.0, -3.0, 0.0)).unwrap();
        assert_eq!(a.matches(&a.clone(), 1e-6, 1e-6), Some(1));
        assert_eq!(a.matches(&b, 1e-6, 1e-6), Some(-1));
        assert_eq!(a.matches(&y_plane(2.1), 1e-6, 1e-6), None);
    }

    #[test]
    fn line_hits_plane_once() {
        let p = y_plane(4.0);
        let t = p.line_intersect(&Point3::origin(), &Vector3::new(0.0, 2.0, 0.0));
        assert_eq!(t.len(), 1);
        assert!((t[0] - 2.0).abs() < TOLERANCE);
        assert!(p
            .line_intersect(&Point3::origin(), &Vector3::x())
            .is_empty());
    }

    #[test]
    fn card_form() {
        assert_eq!(y_plane(3.0).mnemonic(), "py");
        assert_eq!(y_plane(3.0).parameters(), vec![3.0]);
        let flipped = y_plane(3.0).flipped();
        assert_eq!(flipped.mnemonic(), "p");
        assert_eq!(flipped.parameters().len(), 4);
    }
}
