use std::collections::BTreeMap;

use tracing::debug;

use crate::error::{LookupError, Result};
use crate::math::{Point3, Vector3};
use crate::register::SurfaceRegister;
use crate::rule::HeadRule;

use super::FixedComp;

/// Named boundary rules supplied from outside a component ("front",
/// "back", "floor", ...).
///
/// A cut rule is the half-space containing the component. The component
/// intersects it into its cells; its complement is what lies beyond.
#[derive(Debug, Clone, Default)]
pub struct ExternalCut {
    cuts: BTreeMap<String, HeadRule>,
}

impl ExternalCut {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets (or replaces) the cut rule `name`.
    pub fn set_cut_surf(&mut self, name: &str, rule: HeadRule) {
        self.cuts.insert(name.to_string(), rule);
    }

    /// Uses side `side` of `fc` as the cut `name`: the region beyond the
    /// other component's face is where this component sits.
    ///
    /// # Errors
    ///
    /// Returns an error if the side is bad or unset.
    pub fn set_cut_from_link(&mut self, name: &str, fc: &FixedComp, side: i32) -> Result<()> {
        self.set_cut_surf(name, fc.full_rule(side)?);
        Ok(())
    }

    /// True if `name` has a non-trivial rule.
    #[must_use]
    pub fn is_active(&self, name: &str) -> bool {
        self.cuts.get(name).is_some_and(|c| !c.is_empty())
    }

    /// # Errors
    ///
    /// Returns a lookup error for an unknown cut.
    pub fn cut_rule(&self, name: &str) -> Result<&HeadRule> {
        self.cuts
            .get(name)
            .ok_or_else(|| LookupError::not_found("cut rule", name).into())
    }

    /// The region beyond the cut.
    ///
    /// # Errors
    ///
    /// Returns a lookup error for an unknown cut.
    pub fn cut_complement(&self, name: &str) -> Result<HeadRule> {
        Ok(self.cut_rule(name)?.complement())
    }

    /// The cut rule if `name` is set, all space otherwise.
    #[must_use]
    pub fn cut_rule_or_all(&self, name: &str) -> HeadRule {
        self.cuts.get(name).cloned().unwrap_or_default()
    }

    /// Puts link `index` of `fc` where the line through `origin` along
    /// `axis` meets the boundary of cut `name`.
    ///
    /// The nearest crossing ahead (along `axis`) wins; behind is tried only
    /// if there is nothing ahead. The link axis points from `origin` to the
    /// crossing and the link rule is the region beyond the cut.
    ///
    /// # Errors
    ///
    /// Returns a lookup error if the cut is unknown or the line never meets
    /// it, and any geometry error from tracking.
    pub fn create_link(
        &self,
        name: &str,
        fc: &mut FixedComp,
        register: &SurfaceRegister,
        index: usize,
        origin: &Point3,
        axis: &Vector3,
    ) -> Result<()> {
        let rule = self.cut_rule(name)?;
        let ahead = rule.first_crossing(register, origin, axis)?;
        let hit = match ahead {
            Some(c) => Some((c.point, *axis)),
            None => rule
                .first_crossing(register, origin, &-axis)?
                .map(|c| (c.point, -axis)),
        };
        let (point, out_axis) =
            hit.ok_or_else(|| LookupError::not_found("cut crossing", format!("{}:{name}", fc.key())))?;
        debug!(cut = name, key = fc.key(), index, ?point, "link placed on cut");
        fc.set_connect(index, point, out_axis)?;
        fc.set_link_surf(index, rule.complement())?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn register() -> SurfaceRegister {
        let mut reg = SurfaceRegister::default();
        reg.build_plane(1, Point3::new(0.0, -5.0, 0.0), Vector3::y()).unwrap();
        reg.build_plane(2, Point3::new(0.0, 5.0, 0.0), Vector3::y()).unwrap();
        reg
    }

    #[test]
    fn rules_and_complements() {
        let mut cut = ExternalCut::new();
        cut.set_cut_surf("front", HeadRule::from(1));
        assert!(cut.is_active("front"));
        assert!(!cut.is_active("back"));
        assert_eq!(cut.cut_complement("front").unwrap().to_string(), "-1");
        assert!(cut.cut_rule("back").is_err());
        assert!(cut.cut_rule_or_all("back").is_empty());
    }

    #[test]
    fn link_lands_on_cut() {
        let reg = register();
        let mut cut = ExternalCut::new();
        cut.set_cut_surf("front", HeadRule::from(1));
        cut.set_cut_surf("back", HeadRule::from(-2));
        let mut fc = FixedComp::new("pipe", 2);

        cut.create_link("front", &mut fc, &reg, 0, &Point3::origin(), &-Vector3::y())
            .unwrap();
        cut.create_link("back", &mut fc, &reg, 1, &Point3::origin(), &-Vector3::y())
            .unwrap();

        assert_relative_eq!(fc.link_pt(1).unwrap(), Point3::new(0.0, -5.0, 0.0), epsilon = 1e-9);
        assert_relative_eq!(fc.link_axis(1).unwrap(), -Vector3::y());
        assert_eq!(fc.full_rule(1).unwrap().to_string(), "-1");
        // No crossing along -Y for the back cut, so it is found along +Y
        assert_relative_eq!(fc.link_pt(2).unwrap(), Point3::new(0.0, 5.0, 0.0), epsilon = 1e-9);
        assert_relative_eq!(fc.link_axis(2).unwrap(), Vector3::y());
        assert_eq!(fc.full_rule(2).unwrap().to_string(), "2");
    }

    #[test]
    fn missing_crossing_is_error() {
        let reg = register();
        let mut cut = ExternalCut::new();
        cut.set_cut_surf("front", HeadRule::from(1));
        let mut fc = FixedComp::new("pipe", 1);
        assert!(cut
            .create_link("front", &mut fc, &reg, 0, &Point3::origin(), &Vector3::x())
            .is_err());
    }

    #[test]
    fn cut_taken_from_neighbour_link() {
        let mut wall = FixedComp::new("wall", 1);
        wall.set_connect(0, Point3::new(0.0, 5.0, 0.0), Vector3::y()).unwrap();
        wall.set_link_surf_signed(0, 2).unwrap();
        let mut cut = ExternalCut::new();
        cut.set_cut_from_link("front", &wall, 1).unwrap();
        assert_eq!(cut.cut_rule("front").unwrap().to_string(), "2");
        cut.set_cut_from_link("back", &wall, -1).unwrap();
        assert_eq!(cut.cut_rule("back").unwrap().to_string(), "-2");
        assert!(cut.set_cut_from_link("side", &wall, 2).is_err());
    }
}
