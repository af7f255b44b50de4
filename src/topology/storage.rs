//! Contracts between the indexing subsystem and a mesh storage backend.
//!
//! The index sets never own entities. They consume three narrow traits:
//! - [`EntitySlots`]: one integer slot per entity, the only write surface;
//! - [`MeshStorage`]: read-only queries (levels, leaves, sub-entities,
//!   traversal in discovery order);
//! - [`AdaptiveMesh`]: refine/coarsen entry points that take an explicit
//!   [`AdaptationObserver`].
//!
//! Each backend implements the same contract and is chosen when the mesh is
//! constructed.

use crate::mesh_error::MeshIndexError;
use crate::topology::entity::{Codim, Entity};
use crate::topology::geometry_type::GeometryType;
use crate::topology::patch::{AdaptationObserver, RefinementPatch};
use hashbrown::HashSet;

/// Sentinel slot value: no index assigned (fresh or freed entity).
pub const INVALID_INDEX: usize = usize::MAX;

/// Per-entity integer slot supplied by mesh storage.
pub trait EntitySlots {
    /// Current slot value of `entity`.
    fn slot(&self, entity: Entity) -> Result<usize, MeshIndexError>;
    /// Overwrite the slot value of `entity`.
    fn set_slot(&mut self, entity: Entity, value: usize) -> Result<(), MeshIndexError>;
}

/// Read-only view of a hierarchical mesh.
///
/// Traversal methods yield entities in a stable *discovery order*: the order
/// in which the backend created them. Persisted index files rely on it.
pub trait MeshStorage: EntitySlots {
    /// Topological dimension of the cells.
    fn dimension(&self) -> usize;

    /// Counter bumped by every topology change.
    fn revision(&self) -> u64;

    /// `true` if `entity` is live in this mesh.
    fn contains_entity(&self, entity: Entity) -> bool;

    /// Refinement level the entity was created on.
    fn level(&self, entity: Entity) -> Result<usize, MeshIndexError>;

    /// Finest level holding at least one cell.
    fn max_level(&self) -> usize;

    /// Cells: no children. Lower-dimensional entities: used by a leaf cell.
    fn is_leaf(&self, entity: Entity) -> Result<bool, MeshIndexError>;

    fn geometry_type(&self, entity: Entity) -> Result<GeometryType, MeshIndexError>;

    /// Father of a cell (`None` on level 0 and for non-cells).
    fn father(&self, entity: Entity) -> Result<Option<Entity>, MeshIndexError>;

    /// Children of a cell in creation order (empty for leaves and non-cells).
    fn children(&self, entity: Entity) -> Result<Vec<Entity>, MeshIndexError>;

    /// All live entities of `codim`, in discovery order.
    fn entities(&self, codim: Codim) -> Box<dyn Iterator<Item = Entity> + '_>;

    /// Entities of `codim` seen from `level`, in discovery order: the cells
    /// on that level and every sub-entity of those cells, including the ones
    /// inherited from coarser levels.
    ///
    /// Backends without sub-entity numbering fall back to the entities
    /// created on `level`.
    fn level_entities(&self, level: usize, codim: Codim) -> Box<dyn Iterator<Item = Entity> + '_> {
        let created_on = move |e: Entity| self.level(e).is_ok_and(|l| l == level);
        if codim == 0 {
            return Box::new(self.entities(0).filter(move |&c| created_on(c)));
        }
        let mut members = HashSet::new();
        for cell in self.entities(0).filter(|&c| created_on(c)) {
            for local in 0..self.sub_entity_count(cell, codim).unwrap_or(0) {
                match self.sub_entity(cell, local, codim) {
                    Ok(sub) => {
                        members.insert(sub);
                    }
                    Err(_) => return Box::new(self.entities(codim).filter(move |&e| created_on(e))),
                }
            }
        }
        Box::new(self.entities(codim).filter(move |e| members.contains(e)))
    }

    /// Current leaf entities of `codim`, in discovery order.
    fn leaf_entities(&self, codim: Codim) -> Box<dyn Iterator<Item = Entity> + '_> {
        Box::new(
            self.entities(codim)
                .filter(move |&e| self.is_leaf(e).unwrap_or(false)),
        )
    }

    /// Number of live entities of `codim`.
    fn entity_count(&self, codim: Codim) -> usize {
        self.entities(codim).count()
    }

    /// Number of sub-entities of `codim` of the cell `cell`.
    fn sub_entity_count(&self, cell: Entity, codim: Codim) -> Result<usize, MeshIndexError>;

    /// Sub-entity `local` of codimension `codim` of the cell `cell`.
    ///
    /// Backends without persistent sub-entity numbering keep the default,
    /// which reports [`MeshIndexError::Unsupported`].
    fn sub_entity(&self, cell: Entity, local: usize, codim: Codim) -> Result<Entity, MeshIndexError> {
        let _ = (cell, local, codim);
        Err(MeshIndexError::Unsupported("sub-entity numbering"))
    }
}

/// Mesh backends that can refine and coarsen cells.
pub trait AdaptiveMesh: MeshStorage {
    /// Split a leaf cell into its children.
    ///
    /// `observer.on_refine` runs after the new entities exist. Returns the
    /// patch of created entities.
    fn refine(
        &mut self,
        cell: Entity,
        observer: &mut dyn AdaptationObserver,
    ) -> Result<RefinementPatch, MeshIndexError>;

    /// Remove the children of a cell whose children are all leaves.
    ///
    /// `observer.on_coarsen` runs before anything is removed. Returns the
    /// patch of destroyed entities.
    fn coarsen(
        &mut self,
        cell: Entity,
        observer: &mut dyn AdaptationObserver,
    ) -> Result<RefinementPatch, MeshIndexError>;
}
