//! The model's cell table.

use std::collections::BTreeMap;
use std::fmt;

use tracing::debug;

use crate::error::{LookupError, Result};
use crate::math::Point3;
use crate::register::SurfaceRegister;
use crate::rule::HeadRule;

/// A numbered region of space filled with one material.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    number: i32,
    material: i32,
    density: f64,
    temperature: f64,
    rule: HeadRule,
    name: Option<String>,
}

impl Cell {
    /// Creates a cell. Material `0` is void.
    #[must_use]
    pub fn new(number: i32, material: i32, temperature: f64, rule: HeadRule) -> Self {
        Self {
            number,
            material,
            density: 0.0,
            temperature,
            rule,
            name: None,
        }
    }

    /// Sets the density (`0.0` defers to the material's own).
    #[must_use]
    pub fn with_density(mut self, density: f64) -> Self {
        self.density = density;
        self
    }

    /// Tags the cell with the name its component registered it under.
    #[must_use]
    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    #[must_use]
    pub fn number(&self) -> i32 {
        self.number
    }

    #[must_use]
    pub fn material(&self) -> i32 {
        self.material
    }

    #[must_use]
    pub fn density(&self) -> f64 {
        self.density
    }

    #[must_use]
    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The defining rule of the cell.
    #[must_use]
    pub fn rule(&self) -> &HeadRule {
        &self.rule
    }

    /// Replaces the material, keeping the geometry.
    pub fn set_material(&mut self, material: i32, density: f64) {
        self.material = material;
        self.density = density;
    }

    /// Replaces the defining rule.
    pub fn set_rule(&mut self, rule: HeadRule) {
        self.rule = rule;
    }

    /// Intersects `rule` into the cell (used to carve inserted objects out).
    pub fn add_intersection(&mut self, rule: &HeadRule) {
        self.rule.add_intersection(rule);
    }

    /// True if `point` lies inside the cell.
    ///
    /// # Errors
    ///
    /// Returns a lookup error if the cell references an unknown surface.
    pub fn contains(&self, register: &SurfaceRegister, point: &Point3) -> Result<bool> {
        self.rule.is_valid(register, point)
    }
}

/// One row of the cell table handed to deck writers.
#[derive(Debug, Clone, PartialEq)]
pub struct CellRecord {
    pub number: i32,
    pub material: i32,
    pub density: f64,
    pub temperature: f64,
    pub rule: String,
}

impl fmt::Display for CellRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.number, self.material)?;
        if self.material != 0 {
            write!(f, " {}", self.density)?;
        }
        write!(f, " {}", self.rule)?;
        if self.temperature > 0.0 {
            write!(f, " tmp={}", self.temperature)?;
        }
        Ok(())
    }
}

/// Owner of every cell registered during a model build.
#[derive(Debug, Clone, Default)]
pub struct Simulation {
    cells: BTreeMap<i32, Cell>,
}

impl Simulation {
    /// Creates an empty cell table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a cell under its own number.
    ///
    /// # Errors
    ///
    /// Returns an error if the number is already taken.
    pub fn add_cell(&mut self, cell: Cell) -> Result<i32> {
        let number = cell.number;
        if self.cells.contains_key(&number) {
            return Err(LookupError::duplicate("cell", number).into());
        }
        debug!(number, material = cell.material, rule = %cell.rule, "cell added");
        self.cells.insert(number, cell);
        Ok(number)
    }

    /// Removes and returns a cell.
    ///
    /// # Errors
    ///
    /// Returns a lookup error for an unknown cell.
    pub fn remove_cell(&mut self, number: i32) -> Result<Cell> {
        self.cells
            .remove(&number)
            .ok_or_else(|| LookupError::not_found("cell", number).into())
    }

    /// # Errors
    ///
    /// Returns a lookup error for an unknown cell.
    pub fn cell(&self, number: i32) -> Result<&Cell> {
        self.cells
            .get(&number)
            .ok_or_else(|| LookupError::not_found("cell", number).into())
    }

    /// # Errors
    ///
    /// Returns a lookup error for an unknown cell.
    pub fn cell_mut(&mut self, number: i32) -> Result<&mut Cell> {
        self.cells
            .get_mut(&number)
            .ok_or_else(|| LookupError::not_found("cell", number).into())
    }

    #[must_use]
    pub fn contains_cell(&self, number: i32) -> bool {
        self.cells.contains_key(&number)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Cells in number order.
    pub fn iter(&self) -> impl Iterator<Item = &Cell> {
        self.cells.values()
    }

    /// Every cell containing `point`. In a well-formed model this has
    /// exactly one entry for any point inside the model.
    ///
    /// # Errors
    ///
    /// Returns a lookup error if a cell references an unknown surface.
    pub fn cells_containing(&self, register: &SurfaceRegister, point: &Point3) -> Result<Vec<i32>> {
        let mut out = Vec::new();
        for cell in self.cells.values() {
            if cell.contains(register, point)? {
                out.push(cell.number);
            }
        }
        Ok(out)
    }

    /// The first cell (by number) containing `point`.
    ///
    /// # Errors
    ///
    /// Returns a lookup error if a cell references an unknown surface.
    pub fn find_cell(&self, register: &SurfaceRegister, point: &Point3) -> Result<Option<i32>> {
        for cell in self.cells.values() {
            if cell.contains(register, point)? {
                return Ok(Some(cell.number));
            }
        }
        Ok(None)
    }

    /// Checks that every surface referenced by a cell exists.
    ///
    /// # Errors
    ///
    /// Returns a lookup error naming the first dangling surface.
    pub fn validate(&self, register: &SurfaceRegister) -> Result<()> {
        for cell in self.cells.values() {
            for surf in cell.rule.surf_set() {
                if !register.contains(surf) {
                    return Err(LookupError::not_found(
                        "surface",
                        format!("{surf} (cell {})", cell.number),
                    )
                    .into());
                }
            }
        }
        Ok(())
    }

    /// Ordered cell table.
    #[must_use]
    pub fn cell_table(&self) -> Vec<CellRecord> {
        self.cells
            .values()
            .map(|c| CellRecord {
                number: c.number,
                material: c.material,
                density: c.density,
                temperature: c.temperature,
                rule: c.rule.to_string(),
            })
            .collect()
    }

    /// Drops every cell.
    pub fn clear(&mut self) {
        self.cells.clear();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::Vector3;

    fn register() -> SurfaceRegister {
        let mut reg = SurfaceRegister::default();
        reg.build_plane(1, Point3::new(0.0, -5.0, 0.0), Vector3::y()).unwrap();
        reg.build_plane(2, Point3::new(0.0, 5.0, 0.0), Vector3::y()).unwrap();
        reg.build_cylinder(3, Point3::origin(), Vector3::y(), 3.0).unwrap();
        reg
    }

    #[test]
    fn duplicate_number_rejected() {
        let mut sim = Simulation::new();
        sim.add_cell(Cell::new(10, 0, 0.0, HeadRule::from(1))).unwrap();
        assert!(sim.add_cell(Cell::new(10, 0, 0.0, HeadRule::from(2))).is_err());
    }

    #[test]
    fn find_and_remove() {
        let reg = register();
        let mut sim = Simulation::new();
        sim.add_cell(Cell::new(10, 3, 0.0, HeadRule::parse("1 -2 -3").unwrap()))
            .unwrap();
        sim.add_cell(Cell::new(11, 0, 0.0, HeadRule::parse("-1 : 2 : 3").unwrap()))
            .unwrap();
        assert_eq!(sim.find_cell(&reg, &Point3::origin()).unwrap(), Some(10));
        assert_eq!(sim.find_cell(&reg, &Point3::new(9.0, 0.0, 0.0)).unwrap(), Some(11));
        sim.remove_cell(10).unwrap();
        assert!(sim.cell(10).is_err());
        assert!(sim.remove_cell(10).is_err());
    }

    #[test]
    fn validate_reports_dangling_surface() {
        let reg = register();
        let mut sim = Simulation::new();
        sim.add_cell(Cell::new(10, 0, 0.0, HeadRule::parse("1 -2 -4").unwrap()))
            .unwrap();
        assert!(sim.validate(&reg).is_err());
    }

    #[test]
    fn table_rows() {
        let mut sim = Simulation::new();
        sim.add_cell(Cell::new(20, 0, 0.0, HeadRule::parse("-3").unwrap()))
            .unwrap();
        sim.add_cell(
            Cell::new(10, 5, 300.0, HeadRule::parse("1 -2").unwrap()).with_density(7.8),
        )
        .unwrap();
        let rows: Vec<String> = sim.cell_table().iter().map(ToString::to_string).collect();
        assert_eq!(rows, vec!["10 5 7.8 1 -2 tmp=300", "20 0 -3"]);
    }
}
