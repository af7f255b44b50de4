//! Dense numbering of the current leaf entities.

use crate::index_set::EntityNumbering;
use crate::index_set::dense::DenseNumbering;
use crate::mesh_error::MeshIndexError;
use crate::topology::entity::{Codim, Entity};
use crate::topology::geometry_type::GeometryType;
use crate::topology::storage::MeshStorage;

/// Snapshot view over the leaf entities: cells without children and the
/// lower-dimensional entities used by at least one such cell.
#[derive(Clone, Debug)]
pub struct LeafIndexSet {
    numbering: DenseNumbering,
}

impl LeafIndexSet {
    pub fn new<M: MeshStorage + ?Sized>(mesh: &M) -> Result<Self, MeshIndexError> {
        let mut set = Self {
            numbering: DenseNumbering::empty("leaf index set".to_string(), mesh.dimension()),
        };
        set.update(mesh)?;
        Ok(set)
    }

    /// Renumber `0..n` per codimension in discovery order.
    pub fn update<M: MeshStorage + ?Sized>(&mut self, mesh: &M) -> Result<(), MeshIndexError> {
        self.numbering.rebuild(mesh, |codim| mesh.leaf_entities(codim))
    }

    pub fn is_stale<M: MeshStorage + ?Sized>(&self, mesh: &M) -> bool {
        self.numbering.is_stale(mesh)
    }
}

impl EntityNumbering for LeafIndexSet {
    fn dimension(&self) -> usize {
        self.numbering.dimension()
    }

    fn index_in<M: MeshStorage + ?Sized>(&self, mesh: &M, entity: Entity) -> Result<usize, MeshIndexError> {
        self.numbering.index_in(mesh, entity)
    }

    fn size(&self, codim: Codim) -> usize {
        self.numbering.size(codim)
    }

    fn size_of_type_in<M: MeshStorage + ?Sized>(&self, _mesh: &M, geometry: GeometryType) -> usize {
        self.numbering.size_of_type(geometry)
    }

    fn contains_in<M: MeshStorage + ?Sized>(&self, mesh: &M, entity: Entity) -> bool {
        self.numbering.contains_in(mesh, entity)
    }

    fn geometry_types(&self, codim: Codim) -> &[GeometryType] {
        self.numbering.geometry_types(codim)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::structured::structured_quads;
    use crate::index_set::{BoundIndexSet, IndexSet};
    use crate::topology::patch::NoopObserver;
    use crate::topology::storage::AdaptiveMesh;

    #[test]
    fn refined_parent_leaves_the_view() {
        let mut mesh = structured_quads(2, 2).unwrap();
        let cell = mesh.entities(0).next().unwrap();
        mesh.refine(cell, &mut NoopObserver).unwrap();
        let leaf = LeafIndexSet::new(&mesh).unwrap();
        let view = BoundIndexSet::new(&leaf, &mesh);
        assert_eq!(view.size(0), 7);
        assert!(!view.contains(cell));
        // parent edges stay leaf through the neighbors; the two boundary
        // edges of the refined cell do not
        assert_eq!(view.size(1), 12 - 2 + 12);
        assert_eq!(view.size(2), 9 + 5);
        let mut seen: Vec<usize> = mesh
            .leaf_entities(0)
            .map(|c| view.index(c).unwrap())
            .collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..7).collect::<Vec<_>>());
    }

    #[test]
    fn sub_index_resolves_in_leaf_numbering() {
        let mut mesh = structured_quads(1, 1).unwrap();
        let cell = mesh.entities(0).next().unwrap();
        mesh.refine(cell, &mut NoopObserver).unwrap();
        let leaf = LeafIndexSet::new(&mesh).unwrap();
        let view = BoundIndexSet::new(&leaf, &mesh);
        let child = mesh.children(cell).unwrap()[2];
        for local in 0..4 {
            let sub = mesh.sub_entity(child, local, 2).unwrap();
            assert_eq!(view.sub_index(child, local, 2).unwrap(), view.index(sub).unwrap());
        }
        assert_eq!(
            view.sub_index(cell, 0, 2),
            Err(MeshIndexError::NotContained(cell))
        );
    }
}
