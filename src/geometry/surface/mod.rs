mod cone;
mod cylinder;
mod plane;
mod sphere;

pub use cone::Cone;
pub use cylinder::Cylinder;
pub use plane::Plane;
pub use sphere::Sphere;

use crate::math::{Point3, Vector3};

/// Trait for implicit surfaces `f(P) = 0` splitting space into two half-spaces.
///
/// `value` is positive on the positive half-space (the side selected by a
/// bare surface number) and negative on the complementary side. Implementors
/// return a signed distance, or a close approximation of one, so that
/// tolerances mean the same thing for every primitive.
pub trait Surface {
    /// Evaluates the signed implicit function at `point`.
    fn value(&self, point: &Point3) -> f64;

    /// Outward gradient direction (towards the positive half-space) at `point`.
    fn normal_at(&self, point: &Point3) -> Vector3;

    /// Line parameters `t` at which `origin + t * dir` meets the surface.
    ///
    /// `dir` need not be normalized; roots are returned in ascending order.
    fn line_intersect(&self, origin: &Point3, dir: &Vector3) -> Vec<f64>;

    /// Short surface-card mnemonic (`p`, `px`, `c/z`, `gq`, ...).
    fn mnemonic(&self) -> &'static str;

    /// Surface-card parameters matching [`Surface::mnemonic`].
    fn parameters(&self) -> Vec<f64>;
}

/// Any primitive the surface register can hold.
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    /// A plane; positive side along the normal.
    Plane(Plane),
    /// A cylinder; positive side outside.
    Cylinder(Cylinder),
    /// A cone; positive side outside.
    Cone(Cone),
    /// A sphere; positive side outside.
    Sphere(Sphere),
}

impl Primitive {
    fn inner(&self) -> &dyn Surface {
        match self {
            Primitive::Plane(s) => s,
            Primitive::Cylinder(s) => s,
            Primitive::Cone(s) => s,
            Primitive::Sphere(s) => s,
        }
    }

    /// Classifies `point` as `+1` (positive side), `-1` or `0` (on the surface).
    #[must_use]
    pub fn side(&self, point: &Point3, tol: f64) -> i8 {
        let v = self.value(point);
        if v > tol {
            1
        } else if v < -tol {
            -1
        } else {
            0
        }
    }

    /// Compares two primitives geometrically.
    ///
    /// Returns `Some(1)` if they are the same surface with the same sense,
    /// `Some(-1)` if they are the same surface with the senses swapped and
    /// `None` otherwise. Only planes can match with a swapped sense.
    #[must_use]
    pub fn matches(&self, other: &Primitive, tol: f64, angular_tol: f64) -> Option<i32> {
        match (self, other) {
            (Primitive::Plane(a), Primitive::Plane(b)) => a.matches(b, tol, angular_tol),
            (Primitive::Cylinder(a), Primitive::Cylinder(b)) => {
                a.same_as(b, tol, angular_tol).then_some(1)
            }
            (Primitive::Cone(a), Primitive::Cone(b)) => a.same_as(b, tol, angular_tol).then_some(1),
            (Primitive::Sphere(a), Primitive::Sphere(b)) => a.same_as(b, tol).then_some(1),
            _ => None,
        }
    }

    /// Returns the plane if this primitive is one.
    #[must_use]
    pub fn as_plane(&self) -> Option<&Plane> {
        match self {
            Primitive::Plane(p) => Some(p),
            _ => None,
        }
    }
}

impl Surface for Primitive {
    fn value(&self, point: &Point3) -> f64 {
        self.inner().value(point)
    }

    fn normal_at(&self, point: &Point3) -> Vector3 {
        self.inner().normal_at(point)
    }

    fn line_intersect(&self, origin: &Point3, dir: &Vector3) -> Vec<f64> {
        self.inner().line_intersect(origin, dir)
    }

    fn mnemonic(&self) -> &'static str {
        self.inner().mnemonic()
    }

    fn parameters(&self) -> Vec<f64> {
        self.inner().parameters()
    }
}

/// Axis letter for a unit vector parallel to a coordinate axis.
pub(crate) fn aligned_axis(v: &Vector3, tol: f64) -> Option<usize> {
    (0..3).find(|&i| (v[i].abs() - 1.0).abs() < tol)
}

/// Coefficients of the general quadric `(P - c)^T M (P - c) - k` in MCNP
/// `gq` order: `A B C D E F G H J K`.
pub(crate) fn general_quadric(m: &nalgebra::Matrix3<f64>, c: &Point3, k: f64) -> Vec<f64> {
    let cv = c.coords;
    let lin = m * cv * -2.0;
    let constant = cv.dot(&(m * cv)) - k;
    vec![
        m[(0, 0)],
        m[(1, 1)],
        m[(2, 2)],
        2.0 * m[(0, 1)],
        2.0 * m[(1, 2)],
        2.0 * m[(0, 2)],
        lin.x,
        lin.y,
        lin.z,
        constant,
    ]
}
