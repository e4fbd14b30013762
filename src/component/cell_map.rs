use std::collections::BTreeMap;

use tracing::debug;

use crate::context::{BuildContext, ComponentId};
use crate::error::{IndexError, LookupError, Result};
use crate::rule::HeadRule;
use crate::simulation::{Cell, Simulation};

/// Component-local table of named cell groups.
///
/// A name may be registered many times; every number stays reachable under
/// it in creation order.
#[derive(Debug, Clone, Default)]
pub struct CellMap {
    groups: BTreeMap<String, Vec<i32>>,
}

impl CellMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `cell` to the group `name`.
    pub fn add_cell(&mut self, name: &str, cell: i32) {
        self.groups.entry(name.to_string()).or_default().push(cell);
    }

    /// Appends several cells to the group `name`.
    pub fn add_cells(&mut self, name: &str, cells: &[i32]) {
        self.groups
            .entry(name.to_string())
            .or_default()
            .extend_from_slice(cells);
    }

    #[must_use]
    pub fn has_cell(&self, name: &str) -> bool {
        self.groups.contains_key(name)
    }

    /// The first cell of the group.
    ///
    /// # Errors
    ///
    /// Returns a lookup error if `name` was never registered.
    pub fn cell(&self, name: &str) -> Result<i32> {
        self.cell_at(name, 0)
    }

    /// The `index`-th cell of the group.
    ///
    /// # Errors
    ///
    /// Returns a lookup error for an unknown name and an index error if the
    /// group is shorter than `index + 1`.
    pub fn cell_at(&self, name: &str, index: usize) -> Result<i32> {
        let group = self.cells(name)?;
        group.get(index).copied().ok_or_else(|| {
            IndexError::out_of_range("cell group", i64::try_from(index).unwrap_or(i64::MAX), group.len())
                .into()
        })
    }

    /// Every cell of the group, in creation order.
    ///
    /// # Errors
    ///
    /// Returns a lookup error if `name` was never registered.
    pub fn cells(&self, name: &str) -> Result<&[i32]> {
        self.groups
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| LookupError::not_found("named cell", name).into())
    }

    /// Every registered cell number, grouped by name order.
    #[must_use]
    pub fn all_cells(&self) -> Vec<i32> {
        self.groups.values().flatten().copied().collect()
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(String::as_str)
    }

    /// Allocates the next cell number of component `owner`, registers the
    /// cell with the simulation and records it under `name`.
    ///
    /// # Errors
    ///
    /// Returns an error if the owner's cell block is exhausted.
    pub fn make_cell(
        &mut self,
        ctx: &mut BuildContext,
        owner: ComponentId,
        name: &str,
        material: i32,
        temperature: f64,
        rule: HeadRule,
    ) -> Result<i32> {
        self.make_cell_with_density(ctx, owner, name, material, 0.0, temperature, rule)
    }

    /// [`Self::make_cell`] with an explicit density (`0.0` defers to the
    /// material's own).
    ///
    /// # Errors
    ///
    /// Returns an error if the owner's cell block is exhausted.
    #[allow(clippy::too_many_arguments)]
    pub fn make_cell_with_density(
        &mut self,
        ctx: &mut BuildContext,
        owner: ComponentId,
        name: &str,
        material: i32,
        density: f64,
        temperature: f64,
        rule: HeadRule,
    ) -> Result<i32> {
        let number = ctx.next_cell(owner)?;
        ctx.simulation.add_cell(
            Cell::new(number, material, temperature, rule)
                .with_density(density)
                .with_name(name),
        )?;
        self.add_cell(name, number);
        Ok(number)
    }

    /// Intersects `rule` into every cell of the group `name`.
    ///
    /// # Errors
    ///
    /// Returns a lookup error for an unknown name or a cell that is no
    /// longer in the simulation.
    pub fn insert_component(&self, sim: &mut Simulation, name: &str, rule: &HeadRule) -> Result<()> {
        for &number in self.cells(name)? {
            debug!(cell = number, group = name, %rule, "rule inserted into named cell");
            sim.cell_mut(number)?.add_intersection(rule);
        }
        Ok(())
    }

    /// Moves the group `old` to `new`, appending if `new` already exists.
    ///
    /// # Errors
    ///
    /// Returns a lookup error if `old` was never registered.
    pub fn rename_cell(&mut self, old: &str, new: &str) -> Result<()> {
        let group = self
            .groups
            .remove(old)
            .ok_or_else(|| LookupError::not_found("named cell", old))?;
        self.groups.entry(new.to_string()).or_default().extend(group);
        Ok(())
    }

    /// Forgets the name and returns its cells. The cells themselves stay in
    /// the simulation.
    ///
    /// # Errors
    ///
    /// Returns a lookup error if `name` was never registered.
    pub fn remove_cell_name(&mut self, name: &str) -> Result<Vec<i32>> {
        self.groups
            .remove(name)
            .ok_or_else(|| LookupError::not_found("named cell", name).into())
    }

    /// Merges every group of `other` into this map.
    pub fn merge(&mut self, other: CellMap) {
        for (name, cells) in other.groups {
            self.groups.entry(name).or_default().extend(cells);
        }
    }
}
