//! Grid facade: a mesh backend plus all numberings kept in step with it.
//!
//! [`Grid`] routes every refine/coarsen through the hierarchic index set, so
//! indices are allocated and freed as entities appear and disappear. Level
//! and leaf views are snapshots refreshed by [`Grid::update`]; the batch
//! entry points ([`Grid::adapt`], [`Grid::global_refine`]) call it for you.

pub mod factory;
pub mod structured;

pub use factory::{BoundarySegment, GridFactory, HierarchicalGridFactory};

use crate::index_set::id_set::{GlobalIdSet, IdSet, LocalIdSet, check_codim_shift};
use crate::index_set::validation::{
    ValidationOptions, validate_bijectivity, validate_hierarchy, validate_ids, validate_sub_indices,
};
use crate::index_set::{
    BoundIndexSet, EntityNumbering, HierarchicIndexSet, HierarchicIndexView, IndexSetOptions,
    LeafIndexSet, LeafIndexView, LevelIndexSet, LevelIndexView,
};
use crate::mesh_error::MeshIndexError;
use crate::topology::entity::{Codim, Entity};
use crate::topology::patch::RefinementPatch;
use crate::topology::storage::{AdaptiveMesh, MeshStorage};
use std::path::Path;

/// Mesh backend together with its hierarchic, level and leaf numberings.
#[derive(Debug)]
pub struct Grid<M> {
    mesh: M,
    hierarchic: HierarchicIndexSet,
    levels: Vec<LevelIndexSet>,
    leaf: LeafIndexSet,
    generation: u64,
}

impl<M: MeshStorage> Grid<M> {
    /// Number the freshly built `mesh` and create all views.
    pub fn new(mut mesh: M, options: IndexSetOptions) -> Result<Self, MeshIndexError> {
        check_codim_shift(options.codim_shift, mesh.dimension())?;
        let hierarchic = HierarchicIndexSet::build(&mut mesh, options)?;
        let levels = (0..=mesh.max_level())
            .map(|level| LevelIndexSet::new(&mesh, level))
            .collect::<Result<Vec<_>, _>>()?;
        let leaf = LeafIndexSet::new(&mesh)?;
        Ok(Self {
            mesh,
            hierarchic,
            levels,
            leaf,
            generation: 0,
        })
    }

    pub fn mesh(&self) -> &M {
        &self.mesh
    }

    pub fn dimension(&self) -> usize {
        self.mesh.dimension()
    }

    pub fn max_level(&self) -> usize {
        self.mesh.max_level()
    }

    /// Number of topology changes applied through this grid.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Leaf entity count of `codim` as of the last update.
    pub fn size(&self, codim: Codim) -> usize {
        self.leaf.size(codim)
    }

    /// Rebuild every level view and the leaf view.
    ///
    /// Level views are added or dropped to match the current `max_level`.
    pub fn update(&mut self) -> Result<(), MeshIndexError> {
        let max_level = self.mesh.max_level();
        self.levels.truncate(max_level + 1);
        for level in self.levels.iter_mut() {
            level.update(&self.mesh)?;
        }
        for level in self.levels.len()..=max_level {
            self.levels.push(LevelIndexSet::new(&self.mesh, level)?);
        }
        self.leaf.update(&self.mesh)?;
        log::debug!(
            "grid updated at generation {}: {} levels, leaf sizes {:?}",
            self.generation,
            self.levels.len(),
            (0..=self.dimension()).map(|c| self.leaf.size(c)).collect::<Vec<_>>()
        );
        Ok(())
    }

    pub fn hierarchic_index_set(&self) -> HierarchicIndexView<'_, M> {
        BoundIndexSet::new(&self.hierarchic, &self.mesh)
    }

    pub fn level_index_set(&self, level: usize) -> Result<LevelIndexView<'_, M>, MeshIndexError> {
        let set = self.levels.get(level).ok_or(MeshIndexError::UnknownLevel {
            level,
            max_level: self.levels.len().saturating_sub(1),
        })?;
        Ok(BoundIndexSet::new(set, &self.mesh))
    }

    pub fn leaf_index_set(&self) -> LeafIndexView<'_, M> {
        BoundIndexSet::new(&self.leaf, &self.mesh)
    }

    pub fn id_set(&self) -> IdSet<'_, M> {
        IdSet::from_checked(&self.hierarchic, &self.mesh, self.hierarchic.options().codim_shift)
    }

    pub fn local_id_set(&self) -> LocalIdSet<'_, M> {
        self.id_set()
    }

    /// Same encoding as [`local_id_set`](Self::local_id_set) on a single process.
    pub fn global_id_set(&self) -> GlobalIdSet<'_, M> {
        self.id_set()
    }

    /// Persist the hierarchic numbering to `<path>.cd<codim>`.
    pub fn write_indices(&self, path: impl AsRef<Path>) -> Result<(), MeshIndexError> {
        self.hierarchic.write(&self.mesh, path.as_ref())
    }

    /// Restore the hierarchic numbering; the grid is unchanged on error.
    pub fn read_indices(&mut self, path: impl AsRef<Path>) -> Result<(), MeshIndexError> {
        self.hierarchic.read(&mut self.mesh, path.as_ref())
    }

    /// Run the selected consistency checks over every numbering.
    pub fn validate(&self, options: ValidationOptions) -> Result<(), MeshIndexError> {
        let hierarchic = self.hierarchic_index_set();
        let leaf = self.leaf_index_set();
        if options.check_bijectivity {
            self.hierarchic.validate_against(&self.mesh)?;
            validate_bijectivity(&leaf, &self.mesh)?;
            for level in 0..self.levels.len() {
                validate_bijectivity(&self.level_index_set(level)?, &self.mesh)?;
            }
        }
        if options.check_sub_indices {
            validate_sub_indices(&hierarchic, &self.mesh)?;
            validate_sub_indices(&leaf, &self.mesh)?;
            for level in 0..self.levels.len() {
                validate_sub_indices(&self.level_index_set(level)?, &self.mesh)?;
            }
        }
        let ids = self.id_set();
        if options.check_ids {
            validate_ids(&ids, &self.mesh)?;
        }
        if options.check_hierarchy {
            validate_hierarchy(&ids, &self.mesh)?;
        }
        Ok(())
    }

    /// Give the mesh back, dropping all numberings.
    pub fn into_mesh(self) -> M {
        self.mesh
    }
}

impl<M: AdaptiveMesh> Grid<M> {
    /// Refine one leaf cell. Views stay stale until [`update`](Self::update).
    pub fn refine(&mut self, cell: Entity) -> Result<RefinementPatch, MeshIndexError> {
        let patch = self.mesh.refine(cell, &mut self.hierarchic)?;
        self.generation += 1;
        Ok(patch)
    }

    /// Remove the children of `cell`. Views stay stale until
    /// [`update`](Self::update).
    pub fn coarsen(&mut self, cell: Entity) -> Result<RefinementPatch, MeshIndexError> {
        let patch = self.mesh.coarsen(cell, &mut self.hierarchic)?;
        self.generation += 1;
        Ok(patch)
    }

    /// Coarsen then refine the given cells, then update all views.
    pub fn adapt(&mut self, refine: &[Entity], coarsen: &[Entity]) -> Result<(), MeshIndexError> {
        for &cell in coarsen {
            self.coarsen(cell)?;
        }
        for &cell in refine {
            self.refine(cell)?;
        }
        self.update()
    }

    /// Refine every leaf cell `times` times, then update all views.
    pub fn global_refine(&mut self, times: usize) -> Result<(), MeshIndexError> {
        for _ in 0..times {
            let leaves: Vec<Entity> = self.mesh.leaf_entities(0).collect();
            for cell in leaves {
                self.refine(cell)?;
            }
        }
        self.update()
    }
}
