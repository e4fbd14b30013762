//! Beamline demo: a chain of vacuum pipes placed through one build zone.
//!
//! Usage:
//! ```text
//! cargo run --example beamline
//! RUST_LOG=comblayer=debug cargo run --example beamline
//! ```
//!
//! Prints the surface and cell tables of the finished segment.

use comblayer::component::{Component, FixedComp, ModelComponent};
use comblayer::math::{Point3, Vector3};
use comblayer::variables::VariableTable;
use comblayer::zone::BuildZone;
use comblayer::{BuildContext, Result};

/// Pipe with a void bore and a single wall layer along its Y axis.
struct Pipe {
    base: Component,
    y_step: f64,
    length: f64,
    radius: f64,
    wall: f64,
    wall_mat: i32,
}

impl Pipe {
    fn new(ctx: &mut BuildContext, key: &str) -> Result<Self> {
        Ok(Self {
            base: Component::new(ctx, key, 2)?,
            y_step: 0.0,
            length: 0.0,
            radius: 0.0,
            wall: 0.0,
            wall_mat: 0,
        })
    }
}

impl ModelComponent for Pipe {
    fn base(&self) -> &Component {
        &self.base
    }

    fn base_mut(&mut self) -> &mut Component {
        &mut self.base
    }

    fn populate(&mut self, ctx: &BuildContext, vars: &VariableTable) -> Result<()> {
        let key = self.base.key().to_string();
        self.y_step = vars.eval_def(&format!("{key}YStep"), 0.0)?;
        self.length = vars.eval(&format!("{key}Length"))?;
        self.radius = vars.eval_pair(&format!("{key}Radius"), "PipeRadius")?;
        self.wall = vars.eval_pair(&format!("{key}Wall"), "PipeWall")?;
        self.wall_mat = ctx.materials.eval_mat(vars, "PipeWallMat")?;
        Ok(())
    }

    fn create_unit_vector(&mut self, parent: &FixedComp, side: i32) -> Result<()> {
        self.base.fixed.create_unit_vector(parent, side)?;
        self.base.fixed.apply_shift(0.0, self.y_step, 0.0);
        Ok(())
    }

    fn create_surfaces(&mut self, ctx: &mut BuildContext) -> Result<()> {
        let o = *self.base.fixed.origin();
        let y = *self.base.fixed.y();
        self.base.build_plane(ctx, 1, o, y)?;
        self.base.build_plane(ctx, 2, o + y * self.length, y)?;
        self.base.build_cylinder(ctx, 7, o, y, self.radius)?;
        self.base.build_cylinder(ctx, 17, o, y, self.radius + self.wall)?;
        Ok(())
    }

    fn create_objects(&mut self, ctx: &mut BuildContext) -> Result<()> {
        let void = self.base.rule(ctx, "1 -2 -7")?;
        self.base.make_cell(ctx, "Void", 0, 0.0, void)?;
        let wall = self.base.rule(ctx, "1 -2 7 -17")?;
        self.base.make_cell(ctx, "Wall", self.wall_mat, 0.0, wall)?;
        let outer = self.base.rule(ctx, "1 -2 -17")?;
        self.base.contained.add_outer_surf(&outer);
        Ok(())
    }

    fn create_links(&mut self, ctx: &BuildContext) -> Result<()> {
        let o = *self.base.fixed.origin();
        let y = *self.base.fixed.y();
        let front = self.base.real_surf(ctx, -1)?;
        let back = self.base.real_surf(ctx, 2)?;
        let fc = &mut self.base.fixed;
        fc.set_connect(0, o, -y)?;
        fc.set_link_surf_signed(0, front)?;
        fc.set_connect(1, o + y * self.length, y)?;
        fc.set_link_surf_signed(1, back)?;
        fc.name_side_index(0, "front")?;
        fc.name_side_index(1, "back")?;
        Ok(())
    }
}

fn variables() -> VariableTable {
    let mut vars = VariableTable::new();
    vars.add_variable("SegmentLength", 400.0);
    vars.add_variable("SegmentRadius", 30.0);
    vars.add_variable("PipeRadius", 2.0);
    vars.add_variable("PipeWall", 0.3);
    vars.add_variable("PipeWallMat", "Stainless304");
    vars.add_variable("PipeALength", 120.0);
    vars.add_variable("PipeBLength", 150.0);
    vars.add_variable("PipeBYStep", 5.0);
    vars.add_variable("PipeBRadius", 3.0);
    vars.add_variable("PipeCLength", 100.0);
    vars.add_variable("PipeCYStep", 5.0);
    vars
}

fn main() -> Result<()> {
    // Default: WARN for everything. Override with RUST_LOG.
    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing_subscriber::filter::LevelFilter::WARN.into());
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let vars = variables();
    let mut ctx = BuildContext::default();
    ctx.materials.add_material("Stainless304", 3)?;

    let length: f64 = vars.eval("SegmentLength")?;
    let radius: f64 = vars.eval("SegmentRadius")?;
    let mut segment = Component::new(&mut ctx, "Segment", 0)?;
    segment.build_plane(&mut ctx, 1, Point3::origin(), Vector3::y())?;
    segment.build_plane(&mut ctx, 2, Point3::new(0.0, length, 0.0), Vector3::y())?;
    segment.build_cylinder(&mut ctx, 7, Point3::origin(), Vector3::y(), radius)?;

    let mut zone = BuildZone::new("SegmentZone", segment.id());
    zone.set_surround(segment.rule(&ctx, "-7")?)?;
    zone.set_front(segment.rule(&ctx, "1")?)?;

    let mut parent = FixedComp::new("World", 0);
    let mut side = 0;
    for key in ["PipeA", "PipeB", "PipeC"] {
        let mut pipe = Pipe::new(&mut ctx, key)?;
        pipe.create_all(&mut ctx, &vars, &parent, side)?;
        side = pipe.base.fixed.side_index("back")?;
        let unit = zone.create_unit(&mut ctx, &pipe.base.fixed, side)?;
        pipe.base
            .contained
            .insert_in_cell(&mut ctx.simulation, unit, None)?;
        parent = pipe.base.fixed.clone();
    }
    let back = segment.rule(&ctx, "2")?;
    zone.set_back(&mut ctx, &back)?;
    zone.copy_all_cells(&mut segment.cells);
    ctx.simulation.validate(&ctx.surfaces)?;

    println!("c ---- cells ----");
    for record in ctx.simulation.cell_table() {
        println!("{record}");
    }
    println!();
    println!("c ---- surfaces ----");
    for record in ctx.surfaces.surface_table() {
        println!("{record}");
    }
    println!();
    println!("c segment units: {:?}", segment.cells.cells("Unit")?);
    Ok(())
}
