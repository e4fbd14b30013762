//! The open void along a chain of components.
//!
//! A [`BuildZone`] tracks the part of a segment's surround not yet claimed.
//! Each unit claims the slab from the current front up to a component's far
//! face, and the front then moves to that face.
//!
//! Every boundary the zone takes (front, a unit's far face, the back) is
//! given as the region *beyond* the face in the build direction, which is
//! exactly what a component's link rule on that side is. A unit is
//! therefore `surround ∩ front ∩ divider ∩ #(far)`.

use tracing::{debug, instrument};

use crate::component::{CellMap, FixedComp};
use crate::context::{BuildContext, ComponentId};
use crate::error::{LookupError, Result, ZoneError};
use crate::rule::HeadRule;
use crate::simulation::Cell;

/// Lifecycle of a zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoneState {
    /// No unit has been cut yet.
    Empty,
    /// At least one unit exists and the back is still open.
    Active,
    /// The back is set; nothing more can be added.
    Closed,
}

/// Sequencer that splits a segment's void into consecutive unit cells.
#[derive(Debug, Clone)]
pub struct BuildZone {
    name: String,
    owner: ComponentId,
    state: ZoneState,
    surround: Option<HeadRule>,
    front: Option<HeadRule>,
    initial_front: Option<HeadRule>,
    divider: HeadRule,
    max_extent: HeadRule,
    material: i32,
    temperature: f64,
    insert_cells: Vec<i32>,
    cells: CellMap,
    master_cell: Option<i32>,
    last_cell: Option<i32>,
}

impl BuildZone {
    /// A zone whose cells are numbered from component `owner`'s block.
    #[must_use]
    pub fn new(name: &str, owner: ComponentId) -> Self {
        Self {
            name: name.to_string(),
            owner,
            state: ZoneState::Empty,
            surround: None,
            front: None,
            initial_front: None,
            divider: HeadRule::all_space(),
            max_extent: HeadRule::all_space(),
            material: 0,
            temperature: 0.0,
            insert_cells: Vec::new(),
            cells: CellMap::new(),
            master_cell: None,
            last_cell: None,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn state(&self) -> ZoneState {
        self.state
    }

    /// The region beyond the last claimed face.
    #[must_use]
    pub fn front(&self) -> Option<&HeadRule> {
        self.front.as_ref()
    }

    #[must_use]
    pub fn surround(&self) -> Option<&HeadRule> {
        self.surround.as_ref()
    }

    /// The most recently emitted cell.
    #[must_use]
    pub fn last_cell(&self) -> Option<i32> {
        self.last_cell
    }

    #[must_use]
    pub fn master_cell(&self) -> Option<i32> {
        self.master_cell
    }

    /// Named groups of the cells emitted so far.
    #[must_use]
    pub fn cells(&self) -> &CellMap {
        &self.cells
    }

    fn ensure_open(&self) -> Result<()> {
        if self.state == ZoneState::Closed {
            return Err(ZoneError::Closed {
                zone: self.name.clone(),
            }
            .into());
        }
        Ok(())
    }

    fn not_ready(&self, missing: &'static str) -> ZoneError {
        ZoneError::NotReady {
            zone: self.name.clone(),
            missing,
        }
    }

    /// Sets the lateral boundary (the inside of the tunnel).
    ///
    /// # Errors
    ///
    /// Returns a zone error once the zone is closed.
    pub fn set_surround(&mut self, rule: HeadRule) -> Result<()> {
        self.ensure_open()?;
        self.surround = Some(rule);
        Ok(())
    }

    /// Sets the front: the region beyond the face the next unit starts at.
    ///
    /// Until the first unit is cut this also moves the start of the zone.
    ///
    /// # Errors
    ///
    /// Returns a zone error once the zone is closed.
    pub fn set_front(&mut self, rule: HeadRule) -> Result<()> {
        self.ensure_open()?;
        if self.state == ZoneState::Empty {
            self.initial_front = Some(rule.clone());
        }
        self.front = Some(rule);
        Ok(())
    }

    /// Sets an extra rule intersected into every unit (splits a zone in two
    /// side by side).
    ///
    /// # Errors
    ///
    /// Returns a zone error once the zone is closed.
    pub fn set_divider(&mut self, rule: HeadRule) -> Result<()> {
        self.ensure_open()?;
        self.divider = rule;
        Ok(())
    }

    /// Sets the far limit of the master cell.
    ///
    /// # Errors
    ///
    /// Returns a zone error once the zone is closed.
    pub fn set_max_extent(&mut self, rule: HeadRule) -> Result<()> {
        self.ensure_open()?;
        self.max_extent = rule;
        Ok(())
    }

    /// Sets the material and temperature of every cell emitted from now on.
    ///
    /// # Errors
    ///
    /// Returns a zone error once the zone is closed.
    pub fn set_material(&mut self, material: i32, temperature: f64) -> Result<()> {
        self.ensure_open()?;
        self.material = material;
        self.temperature = temperature;
        Ok(())
    }

    /// Records a container cell the whole zone is carved out of on close.
    ///
    /// # Errors
    ///
    /// Returns a zone error once the zone is closed.
    pub fn add_insert_cell(&mut self, cell: i32) -> Result<()> {
        self.ensure_open()?;
        if !self.insert_cells.contains(&cell) {
            self.insert_cells.push(cell);
        }
        Ok(())
    }

    fn base_rule(&self) -> Result<HeadRule> {
        let surround = self.surround.as_ref().ok_or_else(|| self.not_ready("surround"))?;
        let front = self.front.as_ref().ok_or_else(|| self.not_ready("front"))?;
        Ok(surround * front * self.divider.clone())
    }

    /// Emits one cell spanning the whole open zone, up to the max extent.
    ///
    /// Components can be inserted into it before the zone is split; every
    /// unit cut afterwards is taken out of the master cell and inherits
    /// those insertions.
    ///
    /// # Errors
    ///
    /// Returns a zone error if the zone is closed or not ready, and a
    /// duplicate error if a master cell already exists.
    pub fn construct_master_cell(&mut self, ctx: &mut BuildContext) -> Result<i32> {
        self.ensure_open()?;
        if let Some(existing) = self.master_cell {
            return Err(LookupError::duplicate("master cell", existing).into());
        }
        let rule = self.base_rule()? * self.max_extent.clone();
        let number = ctx.next_cell(self.owner)?;
        ctx.simulation.add_cell(
            Cell::new(number, self.material, self.temperature, rule).with_name("Master"),
        )?;
        debug!(zone = %self.name, number, "master cell built");
        self.master_cell = Some(number);
        Ok(number)
    }

    /// Cuts the unit from the front to the region `far` and advances the
    /// front to `far`.
    ///
    /// # Errors
    ///
    /// Returns a zone error if the zone is closed or not ready.
    #[instrument(skip(self, ctx, far), fields(zone = %self.name))]
    pub fn create_unit_rule(&mut self, ctx: &mut BuildContext, name: &str, far: &HeadRule) -> Result<i32> {
        self.ensure_open()?;
        let slab = far.complement();
        let rule = match self.master_cell {
            Some(master) => ctx.simulation.cell(master)?.rule() * &slab,
            None => self.base_rule()? * slab,
        };
        let number = ctx.next_cell(self.owner)?;
        ctx.simulation
            .add_cell(Cell::new(number, self.material, self.temperature, rule).with_name(name))?;
        if let Some(master) = self.master_cell {
            ctx.simulation.cell_mut(master)?.add_intersection(far);
        }
        self.cells.add_cell(name, number);
        self.front = Some(far.clone());
        self.state = ZoneState::Active;
        self.last_cell = Some(number);
        debug!(zone = %self.name, number, "unit created");
        Ok(number)
    }

    /// Cuts the unit ending at side `side` of `fc`.
    ///
    /// # Errors
    ///
    /// Returns an error if the side is bad or unset, or the zone is closed
    /// or not ready.
    pub fn create_unit(&mut self, ctx: &mut BuildContext, fc: &FixedComp, side: i32) -> Result<i32> {
        self.create_named_unit(ctx, "Unit", fc, side)
    }

    /// [`Self::create_unit`] filing the cell under `name`.
    ///
    /// # Errors
    ///
    /// Returns an error if the side is bad or unset, or the zone is closed
    /// or not ready.
    pub fn create_named_unit(
        &mut self,
        ctx: &mut BuildContext,
        name: &str,
        fc: &FixedComp,
        side: i32,
    ) -> Result<i32> {
        let far = fc.full_rule(side)?;
        self.create_unit_rule(ctx, name, &far)
    }

    /// Emits the closing unit up to `back` (the region beyond the zone's
    /// end), carves the whole zone out of the insert cells and closes it.
    ///
    /// With a master cell the remainder of the master cell becomes the
    /// closing unit.
    ///
    /// # Errors
    ///
    /// Returns a zone error if the zone is closed or not ready.
    pub fn set_back(&mut self, ctx: &mut BuildContext, back: &HeadRule) -> Result<i32> {
        self.ensure_open()?;
        let number = match self.master_cell {
            Some(master) => {
                ctx.simulation
                    .cell_mut(master)?
                    .add_intersection(&back.complement());
                self.cells.add_cell("Unit", master);
                self.last_cell = Some(master);
                master
            }
            None => self.create_unit_rule(ctx, "Unit", back)?,
        };

        if !self.insert_cells.is_empty() {
            let surround = self.surround.as_ref().ok_or_else(|| self.not_ready("surround"))?;
            let start = self.initial_front.as_ref().ok_or_else(|| self.not_ready("front"))?;
            let volume = surround * start * self.divider.clone() * back.complement();
            let exclude = volume.complement();
            for &cell in &self.insert_cells {
                ctx.simulation.cell_mut(cell)?.add_intersection(&exclude);
            }
        }

        self.state = ZoneState::Closed;
        debug!(zone = %self.name, number, "zone closed");
        Ok(number)
    }

    /// Hands every named cell group to `target`, consuming the zone.
    pub fn copy_all_cells(self, target: &mut CellMap) {
        target.merge(self.cells);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::CombLayerError;
    use crate::math::{Point3, Vector3};

    /// Surround: radius-10 cylinder about Y. Planes at y = 0, 10, 20, 30.
    fn setup() -> (BuildContext, ComponentId, Vec<i32>, i32) {
        let mut ctx = BuildContext::default();
        let (id, base) = ctx.register_component("Seg").unwrap();
        let cyl = ctx
            .surfaces
            .build_cylinder(base + 7, Point3::origin(), Vector3::y(), 10.0)
            .unwrap();
        let planes = (0..4)
            .map(|i| {
                ctx.surfaces
                    .build_plane(base + 1 + i, Point3::new(0.0, 10.0 * f64::from(i), 0.0), Vector3::y())
                    .unwrap()
            })
            .collect();
        (ctx, id, planes, cyl)
    }

    fn cell_at(ctx: &BuildContext, y: f64) -> Vec<i32> {
        ctx.simulation
            .cells_containing(&ctx.surfaces, &Point3::new(1.0, y, 0.0))
            .unwrap()
    }

    #[test]
    fn units_tile_the_zone() {
        let (mut ctx, id, p, cyl) = setup();
        let mut zone = BuildZone::new("Seg", id);
        zone.set_surround(HeadRule::from(-cyl)).unwrap();
        zone.set_front(HeadRule::from(p[0])).unwrap();
        assert_eq!(zone.state(), ZoneState::Empty);

        let a = zone.create_unit_rule(&mut ctx, "A", &HeadRule::from(p[1])).unwrap();
        assert_eq!(zone.state(), ZoneState::Active);
        let b = zone.create_unit_rule(&mut ctx, "B", &HeadRule::from(p[2])).unwrap();
        let c = zone.set_back(&mut ctx, &HeadRule::from(p[3])).unwrap();
        assert_eq!(zone.state(), ZoneState::Closed);
        assert_eq!(zone.last_cell(), Some(c));

        assert_eq!(cell_at(&ctx, 5.0), vec![a]);
        assert_eq!(cell_at(&ctx, 15.0), vec![b]);
        assert_eq!(cell_at(&ctx, 25.0), vec![c]);
        assert!(cell_at(&ctx, -5.0).is_empty());
        assert!(cell_at(&ctx, 35.0).is_empty());
    }

    #[test]
    fn not_ready_and_closed() {
        let (mut ctx, id, p, cyl) = setup();
        let mut zone = BuildZone::new("Seg", id);
        assert!(matches!(
            zone.create_unit_rule(&mut ctx, "A", &HeadRule::from(p[1])),
            Err(CombLayerError::Zone(ZoneError::NotReady { missing: "surround", .. }))
        ));
        zone.set_surround(HeadRule::from(-cyl)).unwrap();
        assert!(matches!(
            zone.construct_master_cell(&mut ctx),
            Err(CombLayerError::Zone(ZoneError::NotReady { missing: "front", .. }))
        ));
        zone.set_front(HeadRule::from(p[0])).unwrap();
        zone.set_back(&mut ctx, &HeadRule::from(p[1])).unwrap();
        assert!(matches!(
            zone.set_front(HeadRule::from(p[1])),
            Err(CombLayerError::Zone(ZoneError::Closed { .. }))
        ));
        assert!(zone.set_back(&mut ctx, &HeadRule::from(p[2])).is_err());
    }

    #[test]
    fn master_cell_insertions_reach_units() {
        let (mut ctx, id, p, cyl) = setup();
        let rod = ctx
            .surfaces
            .build_cylinder(ctx.build_index(id).unwrap() + 8, Point3::origin(), Vector3::y(), 0.5)
            .unwrap();
        let mut zone = BuildZone::new("Seg", id);
        zone.set_surround(HeadRule::from(-cyl)).unwrap();
        zone.set_front(HeadRule::from(p[0])).unwrap();
        zone.set_max_extent(HeadRule::from(-p[3])).unwrap();
        let master = zone.construct_master_cell(&mut ctx).unwrap();
        // A rod along the whole zone is inserted before splitting
        ctx.simulation
            .cell_mut(master)
            .unwrap()
            .add_intersection(&HeadRule::from(rod));

        let a = zone.create_unit_rule(&mut ctx, "A", &HeadRule::from(p[1])).unwrap();
        let last = zone.set_back(&mut ctx, &HeadRule::from(p[3])).unwrap();
        assert_eq!(last, master);
        assert_eq!(cell_at(&ctx, 5.0), vec![a]);
        assert_eq!(cell_at(&ctx, 25.0), vec![master]);
        let on_axis = ctx
            .simulation
            .cells_containing(&ctx.surfaces, &Point3::new(0.0, 5.0, 0.0))
            .unwrap();
        assert!(on_axis.is_empty());
        assert!(zone.construct_master_cell(&mut ctx).is_err());
    }

    fn container(ctx: &mut BuildContext, id: ComponentId) -> i32 {
        let base = ctx.build_index(id).unwrap();
        let outer = ctx
            .surfaces
            .build_sphere(base + 9, Point3::origin(), 100.0)
            .unwrap();
        let number = ctx.next_cell(id).unwrap();
        ctx.simulation
            .add_cell(Cell::new(number, 0, 0.0, HeadRule::from(-outer)))
            .unwrap();
        number
    }

    #[test]
    fn closing_carves_zone_from_container() {
        let (mut ctx, id, p, cyl) = setup();
        let container = container(&mut ctx, id);

        let mut zone = BuildZone::new("Seg", id);
        zone.set_surround(HeadRule::from(-cyl)).unwrap();
        zone.set_front(HeadRule::from(p[0])).unwrap();
        zone.add_insert_cell(container).unwrap();
        zone.set_back(&mut ctx, &HeadRule::from(p[2])).unwrap();

        assert_eq!(cell_at(&ctx, 15.0).len(), 1);
        assert_eq!(cell_at(&ctx, 25.0), vec![container]);
        assert_eq!(cell_at(&ctx, -5.0), vec![container]);
    }

    #[test]
    fn reset_front_moves_zone_start() {
        let (mut ctx, id, p, cyl) = setup();
        let outer = container(&mut ctx, id);
        let mut zone = BuildZone::new("Seg", id);
        zone.set_surround(HeadRule::from(-cyl)).unwrap();
        zone.set_front(HeadRule::from(p[0])).unwrap();
        zone.set_front(HeadRule::from(p[1])).unwrap();
        zone.add_insert_cell(outer).unwrap();
        let last = zone.set_back(&mut ctx, &HeadRule::from(p[3])).unwrap();

        assert_eq!(cell_at(&ctx, 5.0), vec![outer]);
        assert_eq!(cell_at(&ctx, 15.0), vec![last]);
        assert_eq!(cell_at(&ctx, 25.0), vec![last]);
    }

    #[test]
    fn divided_zones_sit_side_by_side() {
        let (mut ctx, id, p, cyl) = setup();
        let base = ctx.build_index(id).unwrap();
        let mid = ctx
            .surfaces
            .build_plane(base + 10, Point3::origin(), Vector3::x())
            .unwrap();

        let mut left = BuildZone::new("Left", id);
        let mut right = BuildZone::new("Right", id);
        for (zone, side) in [(&mut left, -mid), (&mut right, mid)] {
            zone.set_surround(HeadRule::from(-cyl)).unwrap();
            zone.set_front(HeadRule::from(p[0])).unwrap();
            zone.set_divider(HeadRule::from(side)).unwrap();
        }
        let l1 = left.create_unit_rule(&mut ctx, "Unit", &HeadRule::from(p[1])).unwrap();
        let l2 = left.set_back(&mut ctx, &HeadRule::from(p[3])).unwrap();
        let r1 = right.create_unit_rule(&mut ctx, "Unit", &HeadRule::from(p[2])).unwrap();
        let r2 = right.set_back(&mut ctx, &HeadRule::from(p[3])).unwrap();

        let at = |x: f64, y: f64| {
            ctx.simulation
                .cells_containing(&ctx.surfaces, &Point3::new(x, y, 0.0))
                .unwrap()
        };
        assert_eq!(at(-1.0, 5.0), vec![l1]);
        assert_eq!(at(-1.0, 15.0), vec![l2]);
        assert_eq!(at(1.0, 15.0), vec![r1]);
        assert_eq!(at(1.0, 25.0), vec![r2]);
        assert_eq!(at(-1.0, 25.0), vec![l2]);
    }

    #[test]
    fn copy_all_cells_merges_groups() {
        let (mut ctx, id, p, cyl) = setup();
        let mut zone = BuildZone::new("Seg", id);
        zone.set_surround(HeadRule::from(-cyl)).unwrap();
        zone.set_front(HeadRule::from(p[0])).unwrap();
        let a = zone.create_unit_rule(&mut ctx, "Unit", &HeadRule::from(p[1])).unwrap();
        let b = zone.set_back(&mut ctx, &HeadRule::from(p[2])).unwrap();

        let mut parent = CellMap::new();
        parent.add_cell("Unit", 1);
        zone.copy_all_cells(&mut parent);
        assert_eq!(parent.cells("Unit").unwrap(), &[1, a, b]);
    }
}
