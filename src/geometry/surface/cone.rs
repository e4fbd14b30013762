use crate::error::{GeometryError, Result};
use crate::math::{quadratic_roots, Matrix3, Point3, Vector3, TOLERANCE};

use super::{aligned_axis, general_quadric, Surface};

/// A circular cone in 3D space.
///
/// Defined by an apex, an axis direction and a half-angle. By default both
/// nappes are part of the surface; `sheet` restricts it to the nappe along
/// `+axis` (`1`) or `-axis` (`-1`), in which case every point on the other
/// side of the apex is outside.
///
/// `f(P) = |d_perp| cos(alpha) - |d . a| sin(alpha)`: the distance to the
/// nearest generator, positive outside the cone.
#[derive(Debug, Clone, PartialEq)]
pub struct Cone {
    apex: Point3,
    axis: Vector3,
    half_angle: f64,
    sheet: i8,
}

impl Cone {
    /// Creates a two-sheet cone.
    ///
    /// # Arguments
    ///
    /// * `apex` - The apex (tip) of the cone
    /// * `axis` - Axis direction (will be normalized)
    /// * `half_angle_deg` - Half-angle in degrees (must be in `(0, 90)`)
    ///
    /// # Errors
    ///
    /// Returns an error if the half-angle is out of range or the axis is zero-length.
    pub fn new(apex: Point3, axis: Vector3, half_angle_deg: f64) -> Result<Self> {
        let half_angle = half_angle_deg.to_radians();
        if half_angle <= TOLERANCE || half_angle >= std::f64::consts::FRAC_PI_2 - TOLERANCE {
            return Err(GeometryError::Degenerate(
                "cone half-angle must be in (0, 90) degrees".into(),
            )
            .into());
        }

        let axis_len = axis.norm();
        if axis_len < TOLERANCE {
            return Err(GeometryError::ZeroVector.into());
        }

        Ok(Self {
            apex,
            axis: axis / axis_len,
            half_angle,
            sheet: 0,
        })
    }

    /// Restricts the cone to a single nappe (`1` along the axis, `-1` against it).
    #[must_use]
    pub fn with_sheet(mut self, sheet: i8) -> Self {
        self.sheet = sheet.signum();
        self
    }

    /// Returns the apex point.
    #[must_use]
    pub fn apex(&self) -> &Point3 {
        &self.apex
    }

    /// Returns the axis direction (unit vector).
    #[must_use]
    pub fn axis(&self) -> &Vector3 {
        &self.axis
    }

    /// Returns the half-angle in radians.
    #[must_use]
    pub fn half_angle(&self) -> f64 {
        self.half_angle
    }

    /// Returns the sheet restriction (`0` for both nappes).
    #[must_use]
    pub fn sheet(&self) -> i8 {
        self.sheet
    }

    fn on_sheet(&self, axial: f64) -> bool {
        self.sheet == 0 || axial * f64::from(self.sheet) >= 0.0
    }

    /// Geometric equality. A two-sheet cone is symmetric under axis reversal;
    /// a single-sheet cone must also select the same nappe.
    #[must_use]
    pub fn same_as(&self, other: &Cone, tol: f64, angular_tol: f64) -> bool {
        if (self.apex - other.apex).norm() >= tol
            || (self.half_angle - other.half_angle).abs() >= angular_tol
        {
            return false;
        }
        if (self.axis - other.axis).norm() < angular_tol {
            return self.sheet == other.sheet;
        }
        (self.axis + other.axis).norm() < angular_tol && self.sheet == -other.sheet
    }
}

impl Surface for Cone {
    fn value(&self, point: &Point3) -> f64 {
        let d = point - self.apex;
        let axial = d.dot(&self.axis);
        if !self.on_sheet(axial) {
            return d.norm();
        }
        let radial = (d - self.axis * axial).norm();
        radial * self.half_angle.cos() - axial.abs() * self.half_angle.sin()
    }

    fn normal_at(&self, point: &Point3) -> Vector3 {
        // Gradient of |d|^2 cos^2 - (d.a)^2, which has the same sign as value
        let d = point - self.apex;
        let ca = self.half_angle.cos();
        let g = d * (ca * ca) - self.axis * d.dot(&self.axis);
        let len = g.norm();
        if len < TOLERANCE {
            return self.axis;
        }
        g / len
    }

    fn line_intersect(&self, origin: &Point3, dir: &Vector3) -> Vec<f64> {
        // |P-apex|^2 * cos^2(alpha) = ((P-apex).axis)^2 with P = O + t*dir
        let dp = origin - self.apex;
        let ca = self.half_angle.cos();
        let cos2 = ca * ca;
        let d_dot_a = dir.dot(&self.axis);
        let dp_dot_a = dp.dot(&self.axis);

        let a = d_dot_a * d_dot_a - dir.dot(dir) * cos2;
        let b = 2.0 * (d_dot_a * dp_dot_a - dp.dot(dir) * cos2);
        let c = dp_dot_a * dp_dot_a - dp.dot(&dp) * cos2;

        quadratic_roots(a, b, c)
            .into_iter()
            .filter(|t| self.on_sheet(dp_dot_a + t * d_dot_a))
            .collect()
    }

    fn mnemonic(&self) -> &'static str {
        match aligned_axis(&self.axis, TOLERANCE) {
            Some(0) => "k/x",
            Some(1) => "k/y",
            Some(2) => "k/z",
            _ => "gq",
        }
    }

    fn parameters(&self) -> Vec<f64> {
        let tan2 = self.half_angle.tan().powi(2);
        match aligned_axis(&self.axis, TOLERANCE) {
            Some(i) => {
                let mut out = vec![self.apex.x, self.apex.y, self.apex.z, tan2];
                if self.sheet != 0 {
                    // Sheet is expressed relative to the positive coordinate axis
                    let sense = self.axis[i].signum() * f64::from(self.sheet);
                    out.push(sense);
                }
                out
            }
            None => {
                let ca = self.half_angle.cos();
                let m = Matrix3::identity() * (ca * ca) - self.axis * self.axis.transpose();
                general_quadric(&m, &self.apex, 0.0)
            }
        }
    }
}
