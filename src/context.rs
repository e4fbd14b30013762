//! Per-build state shared by every component.
//!
//! One [`BuildContext`] lives for one model build and is passed by
//! reference through every component's build steps.

use std::collections::HashMap;
use std::ops::Range;

use slotmap::SlotMap;
use tracing::debug;

use crate::config::BuildConfig;
use crate::error::{IndexError, LookupError, Result};
use crate::register::SurfaceRegister;
use crate::simulation::Simulation;
use crate::variables::MaterialTable;

slotmap::new_key_type! {
    /// Handle of a registered component.
    pub struct ComponentId;
}

/// Number block owned by one component.
#[derive(Debug, Clone)]
struct ComponentRecord {
    name: String,
    build_index: i32,
    next_cell: i32,
}

/// Registers, cell table and number allocation for one model build.
#[derive(Debug)]
pub struct BuildContext {
    config: BuildConfig,
    /// Global surface register.
    pub surfaces: SurfaceRegister,
    /// Global cell table.
    pub simulation: Simulation,
    /// Material name lookup.
    pub materials: MaterialTable,
    components: SlotMap<ComponentId, ComponentRecord>,
    names: HashMap<String, ComponentId>,
    next_index: i32,
}

impl Default for BuildContext {
    fn default() -> Self {
        Self::new(BuildConfig::default())
    }
}

impl BuildContext {
    #[must_use]
    pub fn new(config: BuildConfig) -> Self {
        Self {
            config,
            surfaces: SurfaceRegister::new(config),
            simulation: Simulation::new(),
            materials: MaterialTable::new(),
            components: SlotMap::with_key(),
            names: HashMap::new(),
            next_index: config.first_index,
        }
    }

    #[must_use]
    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    /// Registers a component and hands it the next block of numbers.
    ///
    /// # Errors
    ///
    /// Returns a duplicate error if `name` is taken and an index error if
    /// the number space is exhausted.
    pub fn register_component(&mut self, name: &str) -> Result<(ComponentId, i32)> {
        if self.names.contains_key(name) {
            return Err(LookupError::duplicate("component", name).into());
        }
        let build_index = self.next_index;
        self.next_index = build_index
            .checked_add(self.config.index_block)
            .ok_or_else(|| IndexError::out_of_range("build index", i64::from(build_index), i32::MAX as usize))?;
        let id = self.components.insert(ComponentRecord {
            name: name.to_string(),
            build_index,
            next_cell: build_index + 1,
        });
        self.names.insert(name.to_string(), id);
        debug!(name, build_index, "component registered");
        Ok((id, build_index))
    }

    fn record(&self, id: ComponentId) -> Result<&ComponentRecord> {
        self.components
            .get(id)
            .ok_or_else(|| LookupError::not_found("component", format!("{id:?}")).into())
    }

    /// # Errors
    ///
    /// Returns a lookup error for an unknown name.
    pub fn component_id(&self, name: &str) -> Result<ComponentId> {
        self.names
            .get(name)
            .copied()
            .ok_or_else(|| LookupError::not_found("component", name).into())
    }

    /// # Errors
    ///
    /// Returns a lookup error for a stale or foreign id.
    pub fn component_name(&self, id: ComponentId) -> Result<&str> {
        Ok(&self.record(id)?.name)
    }

    /// # Errors
    ///
    /// Returns a lookup error for a stale or foreign id.
    pub fn build_index(&self, id: ComponentId) -> Result<i32> {
        Ok(self.record(id)?.build_index)
    }

    /// Issues the next cell number of component `id`.
    ///
    /// # Errors
    ///
    /// Returns a lookup error for an unknown id and an index error once the
    /// component's block is used up.
    pub fn next_cell(&mut self, id: ComponentId) -> Result<i32> {
        let block = self.config.index_block;
        let record = self
            .components
            .get_mut(id)
            .ok_or_else(|| LookupError::not_found("component", format!("{id:?}")))?;
        let offset = record.next_cell - record.build_index;
        if offset >= block {
            return Err(IndexError::out_of_range(
                "cell",
                i64::from(offset),
                usize::try_from(block).unwrap_or(0),
            )
            .into());
        }
        let number = record.next_cell;
        record.next_cell += 1;
        Ok(number)
    }

    /// Cell numbers issued to `id` so far.
    ///
    /// # Errors
    ///
    /// Returns a lookup error for an unknown id.
    pub fn issued_cells(&self, id: ComponentId) -> Result<Range<i32>> {
        let record = self.record(id)?;
        Ok(record.build_index + 1..record.next_cell)
    }

    #[must_use]
    pub fn n_components(&self) -> usize {
        self.components.len()
    }

    /// Drops every surface, cell and component, ready for a fresh build.
    pub fn reset(&mut self) {
        self.surfaces = SurfaceRegister::new(self.config);
        self.simulation.clear();
        self.components.clear();
        self.names.clear();
        self.next_index = self.config.first_index;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::CombLayerError;

    #[test]
    fn blocks_are_disjoint() {
        let mut ctx = BuildContext::default();
        let (a, ia) = ctx.register_component("PipeA").unwrap();
        let (b, ib) = ctx.register_component("PipeB").unwrap();
        assert_eq!(ia, 1_000_000);
        assert_eq!(ib, 1_010_000);
        assert_eq!(ctx.next_cell(a).unwrap(), 1_000_001);
        assert_eq!(ctx.next_cell(b).unwrap(), 1_010_001);
        assert_eq!(ctx.next_cell(a).unwrap(), 1_000_002);
        assert_eq!(ctx.issued_cells(a).unwrap(), 1_000_001..1_000_003);
        assert_eq!(ctx.component_id("PipeB").unwrap(), b);
        assert_eq!(ctx.component_name(a).unwrap(), "PipeA");
    }

    #[test]
    fn duplicate_name_rejected() {
        let mut ctx = BuildContext::default();
        ctx.register_component("Wall").unwrap();
        assert!(matches!(
            ctx.register_component("Wall"),
            Err(CombLayerError::Lookup(LookupError::Duplicate { .. }))
        ));
    }

    #[test]
    fn exhausted_block_is_index_error() {
        let mut ctx = BuildContext::new(BuildConfig::default().with_index_range(100, 3));
        let (id, _) = ctx.register_component("Tiny").unwrap();
        assert_eq!(ctx.next_cell(id).unwrap(), 101);
        assert_eq!(ctx.next_cell(id).unwrap(), 102);
        assert!(matches!(ctx.next_cell(id), Err(CombLayerError::Index(_))));
    }

    #[test]
    fn reset_forgets_components() {
        let mut ctx = BuildContext::default();
        ctx.register_component("A").unwrap();
        ctx.reset();
        assert_eq!(ctx.n_components(), 0);
        let (_, index) = ctx.register_component("A").unwrap();
        assert_eq!(index, 1_000_000);
    }
}
