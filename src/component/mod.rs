//! Model components as a composition of capabilities.
//!
//! A [`Component`] bundles the pieces most builders need: a frame with link
//! points ([`FixedComp`]), named cells ([`CellMap`]), named surfaces
//! ([`SurfMap`]), an outer boundary with container cells
//! ([`ContainedComp`]) and externally supplied cut rules ([`ExternalCut`]).
//! Concrete builders embed a `Component` and implement [`ModelComponent`].

pub mod cell_map;
pub mod contained;
pub mod external_cut;
pub mod fixed_comp;
pub mod surf_map;

pub use cell_map::CellMap;
pub use contained::ContainedComp;
pub use external_cut::ExternalCut;
pub use fixed_comp::{FixedComp, LinkUnit};
pub use surf_map::SurfMap;

use tracing::instrument;

use crate::context::{BuildContext, ComponentId};
use crate::error::{AbsMethodError, IndexError, Result};
use crate::math::{Point3, Vector3};
use crate::rule::{get_head_rule, Composite, HeadRule};
use crate::variables::VariableTable;

/// Shared state of one model component.
#[derive(Debug, Clone)]
pub struct Component {
    id: ComponentId,
    build_index: i32,
    pub fixed: FixedComp,
    pub cells: CellMap,
    pub surfs: SurfMap,
    pub contained: ContainedComp,
    pub cuts: ExternalCut,
}

impl Component {
    /// Registers `key` with the context and reserves its number block.
    ///
    /// # Errors
    ///
    /// Returns a duplicate error if `key` is already registered.
    pub fn new(ctx: &mut BuildContext, key: &str, n_links: usize) -> Result<Self> {
        let (id, build_index) = ctx.register_component(key)?;
        Ok(Self {
            id,
            build_index,
            fixed: FixedComp::new(key, n_links),
            cells: CellMap::new(),
            surfs: SurfMap::new(),
            contained: ContainedComp::new(),
            cuts: ExternalCut::new(),
        })
    }

    #[must_use]
    pub fn id(&self) -> ComponentId {
        self.id
    }

    #[must_use]
    pub fn key(&self) -> &str {
        self.fixed.key()
    }

    /// Base of this component's surface and cell numbers.
    #[must_use]
    pub fn build_index(&self) -> i32 {
        self.build_index
    }

    /// Global number of local surface `offset`, which must lie inside this
    /// component's block.
    fn surf_index(&self, ctx: &BuildContext, offset: i32) -> Result<i32> {
        let block = ctx.config().index_block;
        if offset <= 0 || offset >= block {
            return Err(IndexError::out_of_range(
                "surface offset",
                offset,
                usize::try_from(block).unwrap_or(0),
            )
            .into());
        }
        Ok(self.build_index + offset)
    }

    /// Registers a plane as surface `offset` of this component.
    ///
    /// # Errors
    ///
    /// Returns an error for degenerate geometry, a clashing number or an
    /// offset outside the component's block.
    pub fn build_plane(&self, ctx: &mut BuildContext, offset: i32, origin: Point3, normal: Vector3) -> Result<i32> {
        let index = self.surf_index(ctx, offset)?;
        ctx.surfaces.build_plane(index, origin, normal)
    }

    /// Registers a cylinder as surface `offset` of this component.
    ///
    /// # Errors
    ///
    /// Returns an error for degenerate geometry or a clashing number.
    pub fn build_cylinder(
        &self,
        ctx: &mut BuildContext,
        offset: i32,
        origin: Point3,
        axis: Vector3,
        radius: f64,
    ) -> Result<i32> {
        let index = self.surf_index(ctx, offset)?;
        ctx.surfaces.build_cylinder(index, origin, axis, radius)
    }

    /// Registers a cone as surface `offset` of this component.
    ///
    /// # Errors
    ///
    /// Returns an error for degenerate geometry or a clashing number.
    pub fn build_cone(
        &self,
        ctx: &mut BuildContext,
        offset: i32,
        apex: Point3,
        axis: Vector3,
        half_angle_deg: f64,
    ) -> Result<i32> {
        let index = self.surf_index(ctx, offset)?;
        ctx.surfaces.build_cone(index, apex, axis, half_angle_deg)
    }

    /// Registers a sphere as surface `offset` of this component.
    ///
    /// # Errors
    ///
    /// Returns an error for a non-positive radius or a clashing number.
    pub fn build_sphere(&self, ctx: &mut BuildContext, offset: i32, centre: Point3, radius: f64) -> Result<i32> {
        let index = self.surf_index(ctx, offset)?;
        ctx.surfaces.build_sphere(index, centre, radius)
    }

    /// Global signed number of local surface `offset`.
    ///
    /// # Errors
    ///
    /// Returns a lookup error if the offset was never built and an index
    /// error if it lies outside the component's block.
    pub fn real_surf(&self, ctx: &BuildContext, offset: i32) -> Result<i32> {
        let index = self.surf_index(ctx, offset.checked_abs().unwrap_or(0))?;
        ctx.surfaces.real_surf_signed(offset.signum() * index)
    }

    /// Resolves rule text written in this component's local offsets.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is malformed or an offset is unknown.
    pub fn rule(&self, ctx: &BuildContext, text: &str) -> Result<HeadRule> {
        get_head_rule(&ctx.surfaces, self.build_index, text)
    }

    /// A rule builder defaulting to this component's offsets.
    #[must_use]
    pub fn composite<'a>(&self, ctx: &'a BuildContext) -> Composite<'a> {
        Composite::new(&ctx.surfaces, self.build_index)
    }

    /// Creates a cell numbered from this component's block and files it
    /// under `name`. The density defers to the material's own.
    ///
    /// # Errors
    ///
    /// Returns an error if the component's cell block is exhausted.
    pub fn make_cell(
        &mut self,
        ctx: &mut BuildContext,
        name: &str,
        material: i32,
        temperature: f64,
        rule: HeadRule,
    ) -> Result<i32> {
        self.cells
            .make_cell(ctx, self.id, name, material, temperature, rule)
    }

    /// [`Self::make_cell`] with an explicit density.
    ///
    /// # Errors
    ///
    /// Returns an error if the component's cell block is exhausted.
    pub fn make_cell_with_density(
        &mut self,
        ctx: &mut BuildContext,
        name: &str,
        material: i32,
        density: f64,
        temperature: f64,
        rule: HeadRule,
    ) -> Result<i32> {
        self.cells
            .make_cell_with_density(ctx, self.id, name, material, density, temperature, rule)
    }

    /// Carves the outer boundary out of every recorded container cell.
    ///
    /// # Errors
    ///
    /// Returns a lookup error if a container cell is missing.
    pub fn insert_objects(&self, ctx: &mut BuildContext) -> Result<()> {
        self.contained.insert_objects(&mut ctx.simulation)
    }
}

/// The build protocol of a model component.
///
/// `create_all` runs the stages in order: populate, frame, surfaces,
/// objects, links, insertion. Builders implement the stages; the optional
/// layer queries fail until overridden.
pub trait ModelComponent {
    fn base(&self) -> &Component;

    fn base_mut(&mut self) -> &mut Component;

    /// Reads dimensions and materials.
    ///
    /// # Errors
    ///
    /// Returns an error for a missing or mistyped variable.
    fn populate(&mut self, ctx: &BuildContext, vars: &VariableTable) -> Result<()>;

    /// Places the frame on side `side` of `parent`.
    ///
    /// # Errors
    ///
    /// Returns an error if the parent link is bad or unset.
    fn create_unit_vector(&mut self, parent: &FixedComp, side: i32) -> Result<()> {
        self.base_mut().fixed.create_unit_vector(parent, side)
    }

    /// # Errors
    ///
    /// Returns an error for degenerate geometry or clashing numbers.
    fn create_surfaces(&mut self, ctx: &mut BuildContext) -> Result<()>;

    /// # Errors
    ///
    /// Returns an error for unknown surfaces or an exhausted cell block.
    fn create_objects(&mut self, ctx: &mut BuildContext) -> Result<()>;

    /// # Errors
    ///
    /// Returns an error for unknown surfaces or bad link indices.
    fn create_links(&mut self, ctx: &BuildContext) -> Result<()>;

    /// Runs every build stage.
    ///
    /// # Errors
    ///
    /// Propagates the first error of any stage.
    #[instrument(skip_all, fields(key = %self.base().key(), side = side))]
    fn create_all(
        &mut self,
        ctx: &mut BuildContext,
        vars: &VariableTable,
        parent: &FixedComp,
        side: i32,
    ) -> Result<()> {
        self.populate(ctx, vars)?;
        self.create_unit_vector(parent, side)?;
        self.create_surfaces(ctx)?;
        self.create_objects(ctx)?;
        self.create_links(ctx)?;
        self.base().insert_objects(ctx)
    }

    /// Rule of layer `layer` on side `side`.
    ///
    /// # Errors
    ///
    /// Fails with [`AbsMethodError`] unless overridden.
    fn layer_rule(&self, _layer: usize, _side: i32) -> Result<HeadRule> {
        Err(AbsMethodError::NotImplemented {
            component: self.base().key().to_string(),
            method: "layer_rule",
        }
        .into())
    }

    /// Point on layer `layer` at side `side`.
    ///
    /// # Errors
    ///
    /// Fails with [`AbsMethodError`] unless overridden.
    fn surface_point(&self, _layer: usize, _side: i32) -> Result<Point3> {
        Err(AbsMethodError::NotImplemented {
            component: self.base().key().to_string(),
            method: "surface_point",
        }
        .into())
    }
}
