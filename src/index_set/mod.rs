//! Entity numberings: the persistent hierarchic substrate, the re-compacted
//! level and leaf views, identifiers, and mappers built on top of them.
//!
//! Numberings never own the mesh. Each owner type ([`HierarchicIndexSet`],
//! [`LevelIndexSet`], [`LeafIndexSet`]) implements [`EntityNumbering`], whose
//! queries take the mesh explicitly; [`BoundIndexSet`] pairs a numbering with
//! a mesh borrow and exposes the consumer-facing [`IndexSet`] surface.

pub mod codim_table;
pub mod dense;
pub mod hierarchic;
pub mod id_set;
pub mod leaf;
pub mod level;
pub mod manager;
pub mod mapper;
pub mod validation;

pub use codim_table::CodimTable;
pub use hierarchic::HierarchicIndexSet;
pub use id_set::{GlobalIdSet, IdSet, IdType, LocalIdSet};
pub use leaf::LeafIndexSet;
pub use level::LevelIndexSet;
pub use manager::IndexManager;
pub use mapper::MultipleCodimMapper;

use crate::mesh_error::MeshIndexError;
use crate::topology::entity::{Codim, Entity};
use crate::topology::geometry_type::GeometryType;
use crate::topology::storage::MeshStorage;
use serde::{Deserialize, Serialize};

/// Default number of low bits reserved for the index part of an identifier.
pub const CODIM_SHIFT: u32 = 30;

/// Reuse order for freed indices.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecyclePolicy {
    /// Most recently freed index first.
    #[default]
    Lifo,
    /// Oldest freed index first.
    Fifo,
}

/// Configuration of a [`HierarchicIndexSet`] and the identifiers built on it.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexSetOptions {
    pub recycle: RecyclePolicy,
    /// Bit position of the codimension inside an identifier.
    pub codim_shift: u32,
    /// Overwrite slots of destroyed entities with `INVALID_INDEX`.
    pub poison_freed_slots: bool,
}

impl Default for IndexSetOptions {
    fn default() -> Self {
        Self {
            recycle: RecyclePolicy::Lifo,
            codim_shift: CODIM_SHIFT,
            poison_freed_slots: cfg!(debug_assertions),
        }
    }
}

/// Numbering state whose queries need the mesh it was built from.
pub trait EntityNumbering {
    /// Topological dimension of the numbered mesh.
    fn dimension(&self) -> usize;

    fn index_in<M: MeshStorage + ?Sized>(&self, mesh: &M, entity: Entity) -> Result<usize, MeshIndexError>;

    /// Number of numbered entities of `codim` (0 outside `0..=dimension`).
    fn size(&self, codim: Codim) -> usize;

    fn size_of_type_in<M: MeshStorage + ?Sized>(&self, mesh: &M, geometry: GeometryType) -> usize;

    fn contains_in<M: MeshStorage + ?Sized>(&self, mesh: &M, entity: Entity) -> bool;

    /// Geometry types present in `codim` (sorted, possibly empty).
    fn geometry_types(&self, codim: Codim) -> &[GeometryType];
}

/// Read-only query surface shared by hierarchic, level and leaf numberings.
pub trait IndexSet {
    fn dimension(&self) -> usize;

    /// Dense index of `entity` within its codimension.
    fn index(&self, entity: Entity) -> Result<usize, MeshIndexError>;

    /// Index of sub-entity `local` of codimension `codim` of `cell`.
    ///
    /// Equals `index` of that sub-entity. Reports
    /// [`MeshIndexError::Unsupported`] on backends without sub-entity
    /// numbering.
    fn sub_index(&self, cell: Entity, local: usize, codim: Codim) -> Result<usize, MeshIndexError>;

    fn size(&self, codim: Codim) -> usize;

    /// Number of numbered entities of the given geometry type.
    fn size_of_type(&self, geometry: GeometryType) -> usize;

    fn contains(&self, entity: Entity) -> bool;

    fn geometry_types(&self, codim: Codim) -> &[GeometryType];
}

/// A numbering paired with the mesh it numbers.
#[derive(Debug)]
pub struct BoundIndexSet<'a, N, M: ?Sized> {
    numbering: &'a N,
    mesh: &'a M,
}

impl<N, M: ?Sized> Clone for BoundIndexSet<'_, N, M> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<N, M: ?Sized> Copy for BoundIndexSet<'_, N, M> {}

impl<'a, N, M> BoundIndexSet<'a, N, M>
where
    N: EntityNumbering,
    M: MeshStorage + ?Sized,
{
    pub fn new(numbering: &'a N, mesh: &'a M) -> Self {
        Self { numbering, mesh }
    }

    pub fn numbering(&self) -> &'a N {
        self.numbering
    }

    pub fn mesh(&self) -> &'a M {
        self.mesh
    }
}

impl<'a, N, M> IndexSet for BoundIndexSet<'a, N, M>
where
    N: EntityNumbering,
    M: MeshStorage + ?Sized,
{
    fn dimension(&self) -> usize {
        self.numbering.dimension()
    }

    fn index(&self, entity: Entity) -> Result<usize, MeshIndexError> {
        self.numbering.index_in(self.mesh, entity)
    }

    fn sub_index(&self, cell: Entity, local: usize, codim: Codim) -> Result<usize, MeshIndexError> {
        if cell.codim != 0 {
            return Err(MeshIndexError::NotACell(cell));
        }
        if !self.numbering.contains_in(self.mesh, cell) {
            return Err(MeshIndexError::NotContained(cell));
        }
        let sub = self.mesh.sub_entity(cell, local, codim)?;
        self.numbering.index_in(self.mesh, sub)
    }

    fn size(&self, codim: Codim) -> usize {
        self.numbering.size(codim)
    }

    fn size_of_type(&self, geometry: GeometryType) -> usize {
        self.numbering.size_of_type_in(self.mesh, geometry)
    }

    fn contains(&self, entity: Entity) -> bool {
        self.numbering.contains_in(self.mesh, entity)
    }

    fn geometry_types(&self, codim: Codim) -> &[GeometryType] {
        self.numbering.geometry_types(codim)
    }
}

/// Hierarchic numbering bound to its mesh.
pub type HierarchicIndexView<'a, M> = BoundIndexSet<'a, HierarchicIndexSet, M>;
/// Level numbering bound to its mesh.
pub type LevelIndexView<'a, M> = BoundIndexSet<'a, LevelIndexSet, M>;
/// Leaf numbering bound to its mesh.
pub type LeafIndexView<'a, M> = BoundIndexSet<'a, LeafIndexSet, M>;
