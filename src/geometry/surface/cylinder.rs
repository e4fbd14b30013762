use crate::error::{GeometryError, Result};
use crate::math::{quadratic_roots, Matrix3, Point3, Vector3, TOLERANCE};

use super::{aligned_axis, general_quadric, Surface};

/// An infinite circular cylinder in 3D space.
///
/// Defined by a point on the axis, the axis direction and the radius.
/// `f(P) = |d - (d . a) a| - r` with `d = P - centre`, so the positive
/// half-space is outside the cylinder.
#[derive(Debug, Clone, PartialEq)]
pub struct Cylinder {
    centre: Point3,
    axis: Vector3,
    radius: f64,
}

impl Cylinder {
    /// Creates a new cylinder.
    ///
    /// # Arguments
    ///
    /// * `centre` - A point on the cylinder axis
    /// * `axis` - Axis direction (will be normalized)
    /// * `radius` - Radius (must be positive)
    ///
    /// # Errors
    ///
    /// Returns an error if the radius is non-positive or the axis is zero-length.
    pub fn new(centre: Point3, axis: Vector3, radius: f64) -> Result<Self> {
        if radius < TOLERANCE {
            return Err(
                GeometryError::Degenerate("cylinder radius must be positive".into()).into(),
            );
        }

        let axis_len = axis.norm();
        if axis_len < TOLERANCE {
            return Err(GeometryError::ZeroVector.into());
        }

        Ok(Self {
            centre,
            axis: axis / axis_len,
            radius,
        })
    }

    /// Returns the point on the axis the cylinder was built from.
    #[must_use]
    pub fn centre(&self) -> &Point3 {
        &self.centre
    }

    /// Returns the axis direction (unit vector).
    #[must_use]
    pub fn axis(&self) -> &Vector3 {
        &self.axis
    }

    /// Returns the radius.
    #[must_use]
    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Component of `point - centre` perpendicular to the axis.
    fn radial(&self, point: &Point3) -> Vector3 {
        let d = point - self.centre;
        d - self.axis * d.dot(&self.axis)
    }

    /// Geometric equality: parallel axes (either sense), equal radius, and
    /// the other centre lying on this axis.
    #[must_use]
    pub fn same_as(&self, other: &Cylinder, tol: f64, angular_tol: f64) -> bool {
        let parallel = (self.axis - other.axis).norm() < angular_tol
            || (self.axis + other.axis).norm() < angular_tol;
        parallel
            && (self.radius - other.radius).abs() < tol
            && self.radial(&other.centre).norm() < tol
    }
}

impl Surface for Cylinder {
    fn value(&self, point: &Point3) -> f64 {
        self.radial(point).norm() - self.radius
    }

    fn normal_at(&self, point: &Point3) -> Vector3 {
        let r = self.radial(point);
        let len = r.norm();
        if len < TOLERANCE {
            // On the axis every radial direction is equally outward
            return crate::math::perpendicular_dir(&self.axis);
        }
        r / len
    }

    fn line_intersect(&self, origin: &Point3, dir: &Vector3) -> Vec<f64> {
        // Project everything onto the plane perpendicular to the cylinder axis
        let dp_perp = self.radial(origin);
        let dir_perp = dir - self.axis * dir.dot(&self.axis);

        // Solve |dp_perp + t * dir_perp|^2 = r^2
        let a = dir_perp.dot(&dir_perp);
        if a < TOLERANCE {
            return Vec::new();
        }
        let b = 2.0 * dp_perp.dot(&dir_perp);
        let c = dp_perp.dot(&dp_perp) - self.radius * self.radius;
        quadratic_roots(a, b, c)
    }

    fn mnemonic(&self) -> &'static str {
        match aligned_axis(&self.axis, TOLERANCE) {
            Some(0) => "c/x",
            Some(1) => "c/y",
            Some(2) => "c/z",
            _ => "gq",
        }
    }

    fn parameters(&self) -> Vec<f64> {
        // Base point of the axis closest to the coordinate plane it pierces
        let c = self.centre - self.axis * self.centre.coords.dot(&self.axis);
        match aligned_axis(&self.axis, TOLERANCE) {
            Some(0) => vec![c.y, c.z, self.radius],
            Some(1) => vec![c.x, c.z, self.radius],
            Some(2) => vec![c.x, c.y, self.radius],
            _ => {
                let m = Matrix3::identity() - self.axis * self.axis.transpose();
                general_quadric(&m, &c, self.radius * self.radius)
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn y_cylinder(radius: f64) -> Cylinder {
        Cylinder::new(Point3::origin(), Vector3::y(), radius).unwrap()
    }

    #[test]
    fn value_outside_positive() {
        let c = y_cylinder(3.0);
        assert!((c.value(&Point3::new(4.0, 100.0, 0.0)) - 1.0).abs() < 1e-12);
        assert!(c.value(&Point3::new(0.0, -7.0, 1.0)) < 0.0);
    }

    #[test]
    fn invalid_radius() {
        assert!(Cylinder::new(Point3::origin(), Vector3::z(), 0.0).is_err());
        assert!(Cylinder::new(Point3::origin(), Vector3::zeros(), 1.0).is_err());
    }

    #[test]
    fn same_as_ignores_axis_sense_and_base_point() {
        let a = y_cylinder(3.0);
        let b = Cylinder::new(Point3::new(0.0, 12.0, 0.0), -Vector3::y(), 3.0).unwrap();
        let c = Cylinder::new(Point3::new(0.5, 0.0, 0.0), Vector3::y(), 3.0).unwrap();
        assert!(a.same_as(&b, 1e-6, 1e-6));
        assert!(!a.same_as(&c, 1e-6, 1e-6));
    }

    #[test]
    fn line_through_axis_hits_twice() {
        let c = y_cylinder(2.0);
        let t = c.line_intersect(&Point3::new(-5.0, 1.0, 0.0), &Vector3::x());
        assert_eq!(t.len(), 2);
        assert!((t[0] - 3.0).abs() < 1e-9);
        assert!((t[1] - 7.0).abs() < 1e-9);
    }

    #[test]
    fn line_along_axis_misses() {
        let c = y_cylinder(2.0);
        assert!(c.line_intersect(&Point3::origin(), &Vector3::y()).is_empty());
    }

    #[test]
    fn normal_points_outward() {
        let c = y_cylinder(2.0);
        let n = c.normal_at(&Point3::new(0.0, 3.0, 2.0));
        assert!((n - Vector3::z()).norm() < 1e-12);
    }

    #[test]
    fn card_form() {
        let c = Cylinder::new(Point3::new(1.0, 5.0, 2.0), Vector3::y(), 3.0).unwrap();
        assert_eq!(c.mnemonic(), "c/y");
        assert_eq!(c.parameters(), vec![1.0, 2.0, 3.0]);
        let skew = Cylinder::new(Point3::origin(), Vector3::new(1.0, 1.0, 0.0), 1.0).unwrap();
        assert_eq!(skew.mnemonic(), "gq");
        assert_eq!(skew.parameters().len(), 10);
    }
}
