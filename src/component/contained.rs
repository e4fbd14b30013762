use tracing::{debug, warn};

use crate::error::{LookupError, Result};
use crate::math::Point3;
use crate::register::SurfaceRegister;
use crate::rule::HeadRule;
use crate::simulation::Simulation;

/// Outer boundary of a component and the container cells it is carved out of.
#[derive(Debug, Clone, Default)]
pub struct ContainedComp {
    outer: HeadRule,
    insert_cells: Vec<i32>,
}

impl ContainedComp {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The region occupied by the component. All space until set.
    #[must_use]
    pub fn outer_surf(&self) -> &HeadRule {
        &self.outer
    }

    /// The complement of the outer region, as intersected into containers.
    #[must_use]
    pub fn exclude(&self) -> HeadRule {
        self.outer.complement()
    }

    #[must_use]
    pub fn has_outer_surf(&self) -> bool {
        !self.outer.is_empty()
    }

    /// Replaces the outer boundary.
    pub fn set_outer_surf(&mut self, rule: HeadRule) {
        self.outer = rule;
    }

    /// Intersects `rule` into the outer boundary.
    pub fn add_outer_surf(&mut self, rule: &HeadRule) {
        self.outer.add_intersection(rule);
    }

    /// Unions `rule` into the outer boundary. On an unset boundary this
    /// simply sets it.
    pub fn add_outer_union_surf(&mut self, rule: &HeadRule) {
        if self.outer.is_empty() {
            self.outer = rule.clone();
        } else {
            self.outer.add_union(rule);
        }
    }

    /// Records a container cell to insert into.
    pub fn add_insert_cell(&mut self, cell: i32) {
        if !self.insert_cells.contains(&cell) {
            self.insert_cells.push(cell);
        }
    }

    pub fn add_insert_cells(&mut self, cells: &[i32]) {
        for &cell in cells {
            self.add_insert_cell(cell);
        }
    }

    #[must_use]
    pub fn insert_cells(&self) -> &[i32] {
        &self.insert_cells
    }

    /// True if `point` lies inside the outer boundary.
    ///
    /// # Errors
    ///
    /// Returns a lookup error if the boundary references an unknown surface.
    pub fn is_inside(&self, register: &SurfaceRegister, point: &Point3) -> Result<bool> {
        self.outer.is_valid(register, point)
    }

    /// Carves the component out of every recorded container cell.
    ///
    /// Does nothing (with a warning) if the outer boundary is unset or no
    /// container cells were recorded.
    ///
    /// # Errors
    ///
    /// Returns a lookup error if a recorded cell is not in the simulation.
    pub fn insert_objects(&self, sim: &mut Simulation) -> Result<()> {
        if self.outer.is_empty() {
            warn!("insert_objects called without an outer boundary");
            return Ok(());
        }
        if self.insert_cells.is_empty() {
            warn!(outer = %self.outer, "component inserted into no cells");
            return Ok(());
        }
        let exclude = self.exclude();
        for &cell in &self.insert_cells {
            debug!(cell, %exclude, "object inserted");
            sim.cell_mut(cell)?.add_intersection(&exclude);
        }
        Ok(())
    }

    /// Carves `rule` (or the outer boundary when `None`) out of `cell`.
    ///
    /// # Errors
    ///
    /// Returns a lookup error if the cell is not in the simulation, or if
    /// `rule` is `None` and no outer boundary is set.
    pub fn insert_in_cell(&self, sim: &mut Simulation, cell: i32, rule: Option<&HeadRule>) -> Result<()> {
        let inserted = match rule {
            Some(rule) => rule,
            None if self.has_outer_surf() => &self.outer,
            None => return Err(LookupError::not_found("outer boundary", cell).into()),
        };
        let exclude = inserted.complement();
        debug!(cell, %exclude, "explicit insert");
        sim.cell_mut(cell)?.add_intersection(&exclude);
        Ok(())
    }
}
