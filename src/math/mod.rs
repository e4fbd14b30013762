/// 3D point type.
pub type Point3 = nalgebra::Point3<f64>;

/// 3D vector type.
pub type Vector3 = nalgebra::Vector3<f64>;

/// 3x3 rotation matrix.
pub type Matrix3 = nalgebra::Matrix3<f64>;

/// Global geometric tolerance for floating-point comparisons.
pub const TOLERANCE: f64 = 1e-10;

/// Returns a unit vector perpendicular to `dir`.
///
/// `dir` must be non-zero; the result is undefined otherwise.
#[must_use]
pub fn perpendicular_dir(dir: &Vector3) -> Vector3 {
    // Choose a reference vector not parallel to dir
    let reference = if dir.x.abs() < 0.9 {
        Vector3::x()
    } else {
        Vector3::y()
    };
    dir.cross(&reference).normalize()
}

/// Rotation about a unit `axis` by `angle_deg` degrees (right-handed).
#[must_use]
pub fn axis_rotation(axis: &Vector3, angle_deg: f64) -> Matrix3 {
    let unit = nalgebra::Unit::new_normalize(*axis);
    nalgebra::Rotation3::from_axis_angle(&unit, angle_deg.to_radians()).into_inner()
}

/// Real roots of `a t^2 + b t + c = 0`, degrading to the linear case.
///
/// Double roots are reported once.
#[must_use]
pub fn quadratic_roots(a: f64, b: f64, c: f64) -> Vec<f64> {
    if a.abs() < TOLERANCE {
        if b.abs() < TOLERANCE {
            return Vec::new();
        }
        return vec![-c / b];
    }
    let disc = b * b - 4.0 * a * c;
    if disc < -TOLERANCE {
        return Vec::new();
    }
    let disc = disc.max(0.0).sqrt();
    if disc < TOLERANCE {
        return vec![-b / (2.0 * a)];
    }
    // Numerically stable form
    let q = -0.5 * (b + b.signum() * disc);
    let mut roots = vec![q / a, c / q];
    roots.sort_by(f64::total_cmp);
    roots
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn perpendicular_is_orthogonal() {
        for dir in [Vector3::x(), Vector3::y(), Vector3::new(1.0, 2.0, -3.0)] {
            let p = perpendicular_dir(&dir);
            assert!(p.dot(&dir).abs() < 1e-12);
            assert_relative_eq!(p.norm(), 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn rotation_about_z() {
        let m = axis_rotation(&Vector3::z(), 90.0);
        let v = m * Vector3::x();
        assert_relative_eq!(v, Vector3::y(), epsilon = 1e-12);
    }

    #[test]
    fn quadratic_two_roots() {
        let r = quadratic_roots(1.0, 0.0, -4.0);
        assert_eq!(r.len(), 2);
        assert_relative_eq!(r[0], -2.0, epsilon = 1e-12);
        assert_relative_eq!(r[1], 2.0, epsilon = 1e-12);
    }

    #[test]
    fn quadratic_linear_and_none() {
        assert_eq!(quadratic_roots(0.0, 2.0, -4.0), vec![2.0]);
        assert!(quadratic_roots(1.0, 0.0, 4.0).is_empty());
    }
}
