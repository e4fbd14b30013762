//! The global surface register.
//!
//! Every surface of a model is registered here under the number its owning
//! component asked for (`build_index + offset`). A surface that is
//! geometrically equal to one already held is not stored twice: the
//! requested number becomes an alias for the existing (signed) surface.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use tracing::{debug, trace};

use crate::config::BuildConfig;
use crate::error::{IndexError, LookupError, Result};
use crate::geometry::{Cone, Cylinder, Plane, Primitive, Sphere, Surface};
use crate::math::{Point3, Vector3};

/// One row of the surface table handed to deck writers.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceRecord {
    /// Global surface number.
    pub number: i32,
    /// Card mnemonic (`p`, `c/y`, `gq`, ...).
    pub mnemonic: &'static str,
    /// Card parameters.
    pub parameters: Vec<f64>,
}

impl fmt::Display for SurfaceRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.number, self.mnemonic)?;
        for p in &self.parameters {
            write!(f, " {p}")?;
        }
        Ok(())
    }
}

/// Deduplicating store of all surfaces in one model build.
#[derive(Debug, Clone)]
pub struct SurfaceRegister {
    surfaces: BTreeMap<i32, Primitive>,
    aliases: HashMap<i32, i32>,
    config: BuildConfig,
}

impl Default for SurfaceRegister {
    fn default() -> Self {
        Self::new(BuildConfig::default())
    }
}

impl SurfaceRegister {
    /// Creates an empty register using the tolerances of `config`.
    #[must_use]
    pub fn new(config: BuildConfig) -> Self {
        Self {
            surfaces: BTreeMap::new(),
            aliases: HashMap::new(),
            config,
        }
    }

    /// The configuration the register was built with.
    #[must_use]
    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    /// Registers `surface` under `index` and returns the signed global number.
    ///
    /// If an equal surface already exists its number is returned instead,
    /// negated when the match has the opposite sense, and `index` becomes an
    /// alias for it. Registering the same geometry twice under one index is
    /// idempotent.
    ///
    /// # Errors
    ///
    /// Returns an error if `index` is not positive, or if `index` is already
    /// bound to a different surface.
    pub fn register(&mut self, index: i32, surface: Primitive) -> Result<i32> {
        if index <= 0 {
            return Err(IndexError::out_of_range("surface number", index, i32::MAX as usize).into());
        }
        let tol = self.config.surface_tolerance;
        let ang = self.config.angular_tolerance;

        if let Some(&bound) = self.aliases.get(&index) {
            let existing = self.surface(bound)?;
            return match existing.matches(&surface, tol, ang) {
                Some(sign) => Ok(bound * sign),
                None => Err(LookupError::duplicate("surface number", index).into()),
            };
        }

        let found = self
            .surfaces
            .iter()
            .find_map(|(&n, s)| s.matches(&surface, tol, ang).map(|sign| n * sign));
        if let Some(signed) = found {
            debug!(index, merged = signed, "surface matches existing surface");
            self.aliases.insert(index, signed);
            return Ok(signed);
        }

        trace!(index, kind = surface.mnemonic(), "surface registered");
        self.surfaces.insert(index, surface);
        self.aliases.insert(index, index);
        Ok(index)
    }

    /// Registers a plane through `origin` with the given normal.
    ///
    /// # Errors
    ///
    /// Returns an error if the normal is zero or `index` is unusable.
    pub fn build_plane(&mut self, index: i32, origin: Point3, normal: Vector3) -> Result<i32> {
        let plane = Plane::new(origin, normal)?;
        self.register(index, Primitive::Plane(plane))
    }

    /// Registers a cylinder about `axis` through `origin`.
    ///
    /// # Errors
    ///
    /// Returns an error if the geometry is degenerate or `index` is unusable.
    pub fn build_cylinder(
        &mut self,
        index: i32,
        origin: Point3,
        axis: Vector3,
        radius: f64,
    ) -> Result<i32> {
        let cyl = Cylinder::new(origin, axis, radius)?;
        self.register(index, Primitive::Cylinder(cyl))
    }

    /// Registers a two-sheet cone with half-angle in degrees.
    ///
    /// # Errors
    ///
    /// Returns an error if the geometry is degenerate or `index` is unusable.
    pub fn build_cone(
        &mut self,
        index: i32,
        apex: Point3,
        axis: Vector3,
        half_angle_deg: f64,
    ) -> Result<i32> {
        let cone = Cone::new(apex, axis, half_angle_deg)?;
        self.register(index, Primitive::Cone(cone))
    }

    /// Registers a sphere.
    ///
    /// # Errors
    ///
    /// Returns an error if the radius is non-positive or `index` is unusable.
    pub fn build_sphere(&mut self, index: i32, centre: Point3, radius: f64) -> Result<i32> {
        let sphere = Sphere::new(centre, radius)?;
        self.register(index, Primitive::Sphere(sphere))
    }

    /// Resolves a requested index (`build_index + offset`) to the signed
    /// global surface number it was registered as.
    ///
    /// # Errors
    ///
    /// Returns a lookup error if nothing was ever registered under `index`.
    pub fn real_surf(&self, index: i32) -> Result<i32> {
        self.aliases
            .get(&index)
            .copied()
            .ok_or_else(|| LookupError::not_found("surface index", index).into())
    }

    /// Signed resolution: `-index` resolves to the negated global surface.
    ///
    /// # Errors
    ///
    /// Returns a lookup error if `|index|` was never registered.
    pub fn real_surf_signed(&self, index: i32) -> Result<i32> {
        let magnitude = index
            .checked_abs()
            .ok_or_else(|| LookupError::not_found("surface index", index))?;
        let global = self.real_surf(magnitude)?;
        Ok(if index < 0 { -global } else { global })
    }

    /// Returns the primitive with global number `|id|`.
    ///
    /// # Errors
    ///
    /// Returns a lookup error for an unknown surface.
    pub fn surface(&self, id: i32) -> Result<&Primitive> {
        id.checked_abs()
            .and_then(|key| self.surfaces.get(&key))
            .ok_or_else(|| LookupError::not_found("surface", id).into())
    }

    /// True if `|id|` is a stored global surface.
    #[must_use]
    pub fn contains(&self, id: i32) -> bool {
        id.checked_abs().is_some_and(|key| self.surfaces.contains_key(&key))
    }

    /// Tests whether `point` lies in the half-space selected by the signed
    /// surface number. Points on the surface are inside both half-spaces.
    ///
    /// # Errors
    ///
    /// Returns a lookup error for an unknown surface.
    pub fn half_space_contains(&self, signed: i32, point: &Point3) -> Result<bool> {
        let side = self
            .surface(signed)?
            .side(point, self.config.on_surface_tolerance);
        Ok(side == 0 || (side > 0) == (signed > 0))
    }

    /// Number of distinct stored surfaces.
    #[must_use]
    pub fn len(&self) -> usize {
        self.surfaces.len()
    }

    /// True if no surfaces are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.surfaces.is_empty()
    }

    /// Ordered surface table.
    #[must_use]
    pub fn surface_table(&self) -> Vec<SurfaceRecord> {
        self.surfaces
            .iter()
            .map(|(&number, s)| SurfaceRecord {
                number,
                mnemonic: s.mnemonic(),
                parameters: s.parameters(),
            })
            .collect()
    }
}
