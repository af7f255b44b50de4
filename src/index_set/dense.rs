//! Dense snapshot numbering shared by the level and leaf views.
//!
//! A snapshot enumerates a filtered entity set in discovery order and
//! assigns `0..n` per codimension. It is rebuilt from scratch on every
//! update and never patched. Queries made after the mesh changed are
//! answered from the snapshot; the first such query per mesh revision logs a
//! warning.

use crate::index_set::codim_table::CodimTable;
use crate::mesh_error::MeshIndexError;
use crate::topology::entity::{Codim, Entity, EntityHandle};
use crate::topology::geometry_type::GeometryType;
use crate::topology::storage::MeshStorage;
use hashbrown::HashMap;
use std::cell::Cell;
use std::collections::BTreeMap;

/// Per-codimension `0..n` numbering of one filtered entity set, taken at a
/// fixed mesh revision. Owned by [`LevelIndexSet`](super::LevelIndexSet)
/// and [`LeafIndexSet`](super::LeafIndexSet).
#[derive(Clone, Debug)]
pub struct DenseNumbering {
    name: String,
    indices: CodimTable<HashMap<EntityHandle, usize>>,
    geometry_types: CodimTable<Vec<GeometryType>>,
    type_counts: BTreeMap<GeometryType, usize>,
    revision: u64,
    warned_revision: Cell<Option<u64>>,
}

impl DenseNumbering {
    pub fn empty(name: String, dimension: usize) -> Self {
        Self {
            name,
            indices: CodimTable::from_fn(dimension, |_| HashMap::new()),
            geometry_types: CodimTable::from_fn(dimension, |_| Vec::new()),
            type_counts: BTreeMap::new(),
            revision: 0,
            warned_revision: Cell::new(None),
        }
    }

    /// Renumber from `select(codim)`, which yields the view's entities in
    /// discovery order.
    pub fn rebuild<'m, M, F>(&mut self, mesh: &'m M, mut select: F) -> Result<(), MeshIndexError>
    where
        M: MeshStorage + ?Sized,
        F: FnMut(Codim) -> Box<dyn Iterator<Item = Entity> + 'm>,
    {
        let dimension = mesh.dimension();
        let mut type_counts = BTreeMap::new();
        let mut geometry_types = CodimTable::from_fn(dimension, |_| Vec::new());
        let mut indices = CodimTable::from_fn(dimension, |_| HashMap::new());
        for codim in 0..=dimension {
            let map = indices.get_mut(codim)?;
            for e in select(codim) {
                let gt = mesh.geometry_type(e)?;
                *type_counts.entry(gt).or_insert(0) += 1;
                let next = map.len();
                map.insert(e.handle, next);
            }
        }
        for &gt in type_counts.keys() {
            if gt.dimension() <= dimension {
                geometry_types.get_mut(dimension - gt.dimension())?.push(gt);
            }
        }
        self.indices = indices;
        self.geometry_types = geometry_types;
        self.type_counts = type_counts;
        self.revision = mesh.revision();
        self.warned_revision.set(None);
        log::debug!(
            "{} updated: sizes {:?}",
            self.name,
            (0..=dimension).map(|c| self.size(c)).collect::<Vec<_>>()
        );
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dimension(&self) -> usize {
        self.indices.dimension()
    }

    /// Mesh revision the snapshot was taken at.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn is_stale<M: MeshStorage + ?Sized>(&self, mesh: &M) -> bool {
        mesh.revision() != self.revision
    }

    fn note_stale<M: MeshStorage + ?Sized>(&self, mesh: &M) {
        let current = mesh.revision();
        if current != self.revision && self.warned_revision.get() != Some(current) {
            self.warned_revision.set(Some(current));
            log::warn!(
                "{} queried at mesh revision {} but last updated at {}; answering from snapshot",
                self.name,
                current,
                self.revision
            );
        }
    }

    pub fn index_in<M: MeshStorage + ?Sized>(&self, mesh: &M, entity: Entity) -> Result<usize, MeshIndexError> {
        self.note_stale(mesh);
        self.indices
            .get(entity.codim)?
            .get(&entity.handle)
            .copied()
            .ok_or(MeshIndexError::NotContained(entity))
    }

    pub fn contains_in<M: MeshStorage + ?Sized>(&self, mesh: &M, entity: Entity) -> bool {
        self.note_stale(mesh);
        self.indices
            .get(entity.codim)
            .is_ok_and(|m| m.contains_key(&entity.handle))
    }

    pub fn size(&self, codim: Codim) -> usize {
        self.indices.get(codim).map_or(0, HashMap::len)
    }

    pub fn size_of_type(&self, geometry: GeometryType) -> usize {
        self.type_counts.get(&geometry).copied().unwrap_or(0)
    }

    pub fn geometry_types(&self, codim: Codim) -> &[GeometryType] {
        self.geometry_types.get(codim).map_or(&[], Vec::as_slice)
    }
}
