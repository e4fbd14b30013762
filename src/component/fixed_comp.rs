//! Component frames and link points.
//!
//! A component carries a right-handed frame (origin, X, Y, Z) and a list of
//! link units. Link `i` is addressed by the signed side index `i + 1`:
//!
//! - side `0` is the frame itself (origin, +Y, all space);
//! - side `k > 0` is link `k - 1` as stored;
//! - side `-k` is the same link with its axis reversed and its rule
//!   complemented.
//!
//! A link rule is the half-space *outside* the component across that face,
//! so the next component in a chain can use it directly as its front.

use std::collections::HashMap;

use tracing::trace;

use crate::error::{CombLayerError, GeometryError, IndexError, LookupError, Result};
use crate::math::{axis_rotation, Point3, Vector3, TOLERANCE};
use crate::rule::HeadRule;

/// One link point of a component.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinkUnit {
    connect: Option<(Point3, Vector3)>,
    rule: Option<HeadRule>,
}

impl LinkUnit {
    /// The connection point, if set.
    #[must_use]
    pub fn point(&self) -> Option<Point3> {
        self.connect.map(|(p, _)| p)
    }

    /// The outward unit axis, if set.
    #[must_use]
    pub fn axis(&self) -> Option<Vector3> {
        self.connect.map(|(_, a)| a)
    }

    /// The boundary rule, if set.
    #[must_use]
    pub fn rule(&self) -> Option<&HeadRule> {
        self.rule.as_ref()
    }
}

/// Frame plus link points of one component.
#[derive(Debug, Clone)]
pub struct FixedComp {
    key: String,
    origin: Point3,
    x: Vector3,
    y: Vector3,
    z: Vector3,
    links: Vec<LinkUnit>,
    names: HashMap<String, usize>,
}

impl FixedComp {
    /// A component `key` with `n_links` empty links and the global frame.
    #[must_use]
    pub fn new(key: &str, n_links: usize) -> Self {
        Self {
            key: key.to_string(),
            origin: Point3::origin(),
            x: Vector3::x(),
            y: Vector3::y(),
            z: Vector3::z(),
            links: vec![LinkUnit::default(); n_links],
            names: HashMap::new(),
        }
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    #[must_use]
    pub fn origin(&self) -> &Point3 {
        &self.origin
    }

    #[must_use]
    pub fn x(&self) -> &Vector3 {
        &self.x
    }

    #[must_use]
    pub fn y(&self) -> &Vector3 {
        &self.y
    }

    #[must_use]
    pub fn z(&self) -> &Vector3 {
        &self.z
    }

    #[must_use]
    pub fn n_links(&self) -> usize {
        self.links.len()
    }

    /// Sets the frame from an origin, a beam axis `y` and a reference `z`
    /// (made orthogonal to `y`). X completes the right-handed triple.
    ///
    /// # Errors
    ///
    /// Returns an error if `y` is zero or `z_ref` is parallel to it.
    pub fn set_frame(&mut self, origin: Point3, y: Vector3, z_ref: Vector3) -> Result<()> {
        let y_len = y.norm();
        if y_len < TOLERANCE {
            return Err(GeometryError::ZeroVector.into());
        }
        let y = y / y_len;
        let z = z_ref - y * z_ref.dot(&y);
        let z_len = z.norm();
        if z_len < TOLERANCE {
            return Err(
                GeometryError::Degenerate(format!("{}: Z reference parallel to Y", self.key)).into(),
            );
        }
        let z = z / z_len;
        self.origin = origin;
        self.y = y;
        self.z = z;
        self.x = y.cross(&z);
        Ok(())
    }

    /// Places this component's frame on link `side` of `parent`: origin at
    /// the link point, Y along the link axis, Z from the parent's Z.
    ///
    /// # Errors
    ///
    /// Returns an error if the parent link is unset or out of range.
    pub fn create_unit_vector(&mut self, parent: &FixedComp, side: i32) -> Result<()> {
        let origin = parent.link_pt(side)?;
        let y = parent.link_axis(side)?;
        // Beam along the parent's Z: fall back to its X as the up reference
        let z_ref = if parent.z.cross(&y).norm() < TOLERANCE {
            parent.x
        } else {
            parent.z
        };
        self.set_frame(origin, y, z_ref)?;
        trace!(key = %self.key, parent = %parent.key, side, "unit vectors set");
        Ok(())
    }

    /// Moves the origin by a displacement expressed in the local frame.
    pub fn apply_shift(&mut self, dx: f64, dy: f64, dz: f64) {
        self.origin += self.x * dx + self.y * dy + self.z * dz;
    }

    /// Rotates the frame by `xy_deg` about Z, then by `z_deg` about the new X.
    pub fn apply_angle_rotate(&mut self, xy_deg: f64, z_deg: f64) {
        let qz = axis_rotation(&self.z, xy_deg);
        self.x = qz * self.x;
        self.y = qz * self.y;
        let qx = axis_rotation(&self.x, z_deg);
        self.y = qx * self.y;
        self.z = qx * self.z;
    }

    fn link_index(&self, side: i32) -> Result<usize> {
        let n = self.links.len();
        usize::try_from(side.unsigned_abs())
            .ok()
            .and_then(|k| k.checked_sub(1))
            .filter(|&i| i < n)
            .ok_or_else(|| IndexError::out_of_range("link side", side, n).into())
    }

    fn unit_mut(&mut self, index: usize) -> Result<&mut LinkUnit> {
        let n = self.links.len();
        self.links.get_mut(index).ok_or_else(|| {
            IndexError::out_of_range("link", i64::try_from(index).unwrap_or(i64::MAX), n).into()
        })
    }

    /// The raw link unit for side `side` (sign ignored).
    ///
    /// # Errors
    ///
    /// Returns an index error for side `0` or past the last link.
    pub fn link(&self, side: i32) -> Result<&LinkUnit> {
        let i = self.link_index(side)?;
        Ok(&self.links[i])
    }

    /// Sets the connection point and outward axis of link `index` (0-based).
    ///
    /// # Errors
    ///
    /// Returns an index error past the last link, a geometry error for a
    /// zero axis.
    pub fn set_connect(&mut self, index: usize, point: Point3, axis: Vector3) -> Result<()> {
        let len = axis.norm();
        if len < TOLERANCE {
            return Err(GeometryError::ZeroVector.into());
        }
        self.unit_mut(index)?.connect = Some((point, axis / len));
        Ok(())
    }

    /// Sets the boundary rule of link `index` (0-based).
    ///
    /// # Errors
    ///
    /// Returns an index error past the last link.
    pub fn set_link_surf(&mut self, index: usize, rule: HeadRule) -> Result<()> {
        self.unit_mut(index)?.rule = Some(rule);
        Ok(())
    }

    /// Sets the boundary of link `index` to a single signed surface.
    ///
    /// # Errors
    ///
    /// Returns an index error past the last link.
    pub fn set_link_surf_signed(&mut self, index: usize, surf: i32) -> Result<()> {
        self.set_link_surf(index, HeadRule::from(surf))
    }

    /// Intersects `rule` into the boundary of link `index`.
    ///
    /// # Errors
    ///
    /// Returns an index error past the last link.
    pub fn add_link_surf(&mut self, index: usize, rule: &HeadRule) -> Result<()> {
        let unit = self.unit_mut(index)?;
        let mut joined = unit.rule.take().unwrap_or_default();
        joined.add_intersection(rule);
        unit.rule = Some(joined);
        Ok(())
    }

    /// Copies side `side` of `other` into link `index`, honouring the sign.
    ///
    /// # Errors
    ///
    /// Returns an error if either link is out of range or the source is unset.
    pub fn copy_link(&mut self, index: usize, other: &FixedComp, side: i32) -> Result<()> {
        let point = other.link_pt(side)?;
        let axis = other.link_axis(side)?;
        let rule = other.full_rule(side)?;
        let unit = self.unit_mut(index)?;
        unit.connect = Some((point, axis));
        unit.rule = Some(rule);
        Ok(())
    }

    /// Names link `index` (0-based).
    ///
    /// # Errors
    ///
    /// Returns an index error past the last link.
    pub fn name_side_index(&mut self, index: usize, name: &str) -> Result<()> {
        self.unit_mut(index)?;
        self.names.insert(name.to_string(), index);
        Ok(())
    }

    /// Resolves a side name to its signed side index. `-name` and `#name`
    /// give the reversed side, and a plain integer is accepted as is.
    ///
    /// # Errors
    ///
    /// Returns a lookup error for an unknown name.
    pub fn side_index(&self, name: &str) -> Result<i32> {
        if let Ok(side) = name.parse::<i32>() {
            return Ok(side);
        }
        let (sign, key) = match name.strip_prefix('-').or_else(|| name.strip_prefix('#')) {
            Some(rest) => (-1, rest),
            None => (1, name),
        };
        let index = self
            .names
            .get(key)
            .ok_or_else(|| LookupError::not_found("link name", format!("{}:{key}", self.key)))?;
        let side = i32::try_from(*index + 1)
            .map_err(|_| IndexError::out_of_range("link", i64::MAX, self.links.len()))?;
        Ok(sign * side)
    }

    fn unset(&self, what: &'static str, side: i32) -> CombLayerError {
        LookupError::not_found(what, format!("{}:{side}", self.key)).into()
    }

    /// Connection point of side `side`.
    ///
    /// # Errors
    ///
    /// Returns an index error for a bad side, a lookup error if unset.
    pub fn link_pt(&self, side: i32) -> Result<Point3> {
        if side == 0 {
            return Ok(self.origin);
        }
        self.link(side)?
            .point()
            .ok_or_else(|| self.unset("link point", side))
    }

    /// Outward axis of side `side`, reversed for a negative side.
    ///
    /// # Errors
    ///
    /// Returns an index error for a bad side, a lookup error if unset.
    pub fn link_axis(&self, side: i32) -> Result<Vector3> {
        if side == 0 {
            return Ok(self.y);
        }
        let axis = self
            .link(side)?
            .axis()
            .ok_or_else(|| self.unset("link axis", side))?;
        Ok(if side < 0 { -axis } else { axis })
    }

    /// Boundary rule of side `side`, complemented for a negative side.
    ///
    /// # Errors
    ///
    /// Returns an index error for a bad side, a lookup error if unset.
    pub fn full_rule(&self, side: i32) -> Result<HeadRule> {
        if side == 0 {
            return Ok(HeadRule::all_space());
        }
        let rule = self
            .link(side)?
            .rule()
            .ok_or_else(|| self.unset("link rule", side))?;
        Ok(if side < 0 { rule.complement() } else { rule.clone() })
    }

    /// The first signed surface of side `side`'s rule.
    ///
    /// # Errors
    ///
    /// Returns an error if the side is bad, unset or its rule has no surface.
    pub fn link_surf(&self, side: i32) -> Result<i32> {
        self.full_rule(side)?
            .primary_surface()
            .ok_or_else(|| self.unset("link surface", side))
    }
}
