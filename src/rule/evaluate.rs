//! Point membership and line tracking against the surface register.

use std::collections::BTreeSet;

use crate::error::Result;
use crate::geometry::Line;
use crate::math::{Point3, Vector3};
use crate::register::SurfaceRegister;

use super::HeadRule;

/// A place where a line enters or leaves a rule's region.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Crossing {
    /// Distance along the (normalized) line direction.
    pub distance: f64,
    /// Signed surface crossed; the sign is the half-space being entered.
    pub surface: i32,
    /// The crossing point.
    pub point: Point3,
    /// True if the line moves into the region here.
    pub entering: bool,
}

impl HeadRule {
    /// Tests whether `point` is inside the region.
    ///
    /// Points on a surface satisfy both of its half-spaces.
    ///
    /// # Errors
    ///
    /// Returns a lookup error if the rule references an unknown surface.
    pub fn is_valid(&self, register: &SurfaceRegister, point: &Point3) -> Result<bool> {
        self.node()
            .evaluate(&mut |s| register.half_space_contains(s, point))
    }

    /// Tests membership with the signed surface `forced` taken as satisfied
    /// (and `-forced` as violated) regardless of where `point` is.
    ///
    /// # Errors
    ///
    /// Returns a lookup error if the rule references an unknown surface.
    pub fn is_valid_with(
        &self,
        register: &SurfaceRegister,
        point: &Point3,
        forced: i32,
    ) -> Result<bool> {
        self.node().evaluate(&mut |s| {
            if s == forced {
                Ok(true)
            } else if s == -forced {
                Ok(false)
            } else {
                register.half_space_contains(s, point)
            }
        })
    }

    /// True if the region has points on both sides of surface `|surf|` at
    /// `point`, i.e. the surface is a live boundary there.
    ///
    /// # Errors
    ///
    /// Returns a lookup error if the rule references an unknown surface.
    pub fn is_boundary_at(
        &self,
        register: &SurfaceRegister,
        point: &Point3,
        surf: i32,
    ) -> Result<bool> {
        let s = surf.abs();
        Ok(self.is_valid_with(register, point, s)? != self.is_valid_with(register, point, -s)?)
    }

    /// All places along the ray `origin + t * dir` (`t > 0`) where membership
    /// of the region changes, nearest first.
    ///
    /// # Errors
    ///
    /// Returns an error if `dir` is zero or a surface is unknown.
    pub fn line_crossings(
        &self,
        register: &SurfaceRegister,
        origin: &Point3,
        dir: &Vector3,
    ) -> Result<Vec<Crossing>> {
        let line = Line::new(*origin, *dir)?;
        let step = register.config().track_step;

        let mut hits: Vec<(f64, i32)> = Vec::new();
        for surf in self.surf_set() {
            let prim = register.surface(surf)?;
            hits.extend(line.hits(prim, step).into_iter().map(|t| (t, surf)));
        }
        hits.sort_by(|a, b| a.0.total_cmp(&b.0));

        // Hits closer than one step (corners, tangent surfaces) form one group
        let mut groups: Vec<(f64, Vec<i32>)> = Vec::new();
        for (t, surf) in hits {
            match groups.last_mut() {
                Some((start, surfs)) if t - *start < step => surfs.push(surf),
                _ => groups.push((t, vec![surf])),
            }
        }

        let mut out = Vec::new();
        for (t, surfs) in groups {
            let before = self.is_valid(register, &line.at(t - step))?;
            let after_pt = line.at(t + step);
            let after = self.is_valid(register, &after_pt)?;
            if before == after {
                continue;
            }
            let point = line.at(t);
            let mut surf = surfs[0];
            for &candidate in &surfs {
                if self.is_boundary_at(register, &point, candidate)? {
                    surf = candidate;
                    break;
                }
            }
            let side = register
                .surface(surf)?
                .side(&after_pt, register.config().on_surface_tolerance);
            out.push(Crossing {
                distance: t,
                surface: if side < 0 { -surf } else { surf },
                point,
                entering: after,
            });
        }
        Ok(out)
    }

    /// First crossing along the ray, entering or leaving.
    ///
    /// # Errors
    ///
    /// Returns an error if `dir` is zero or a surface is unknown.
    pub fn first_crossing(
        &self,
        register: &SurfaceRegister,
        origin: &Point3,
        dir: &Vector3,
    ) -> Result<Option<Crossing>> {
        Ok(self.line_crossings(register, origin, dir)?.into_iter().next())
    }

    /// Where a ray starting inside the region first leaves it.
    ///
    /// # Errors
    ///
    /// Returns an error if `dir` is zero or a surface is unknown.
    pub fn track_exit(
        &self,
        register: &SurfaceRegister,
        origin: &Point3,
        dir: &Vector3,
    ) -> Result<Option<Crossing>> {
        Ok(self
            .line_crossings(register, origin, dir)?
            .into_iter()
            .find(|c| !c.entering))
    }

    /// Deletes every leaf whose surface is a plane with normal parallel to
    /// `axis` (either sense) within `cos_tol`, i.e. `|n . axis| >= cos_tol`.
    ///
    /// Non-plane surfaces and planes at an angle are untouched, so a rule
    /// with no matching planes is unchanged.
    ///
    /// # Errors
    ///
    /// Returns a lookup error if the rule references an unknown surface.
    pub fn remove_matched_planes(
        &mut self,
        register: &SurfaceRegister,
        axis: &Vector3,
        cos_tol: f64,
    ) -> Result<()> {
        let mut matched = BTreeSet::new();
        for surf in self.surf_set() {
            if let Some(plane) = register.surface(surf)?.as_plane() {
                if plane.is_parallel_to(axis, cos_tol) {
                    matched.insert(surf);
                }
            }
        }
        if !matched.is_empty() {
            self.prune_leaves(&|s| matched.contains(&s.abs()));
        }
        Ok(())
    }
}
