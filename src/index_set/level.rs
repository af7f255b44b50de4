//! Dense numbering of one refinement level: its cells and all of their
//! sub-entities.

use crate::index_set::EntityNumbering;
use crate::index_set::dense::DenseNumbering;
use crate::mesh_error::MeshIndexError;
use crate::topology::entity::{Codim, Entity};
use crate::topology::geometry_type::GeometryType;
use crate::topology::storage::MeshStorage;

/// Snapshot view over the cells of a fixed level and every sub-entity of
/// those cells, wherever it was created.
///
/// Call [`update`](Self::update) after every topology change; until then
/// queries answer from the previous snapshot.
#[derive(Clone, Debug)]
pub struct LevelIndexSet {
    level: usize,
    numbering: DenseNumbering,
}

impl LevelIndexSet {
    /// Build the view of `level`.
    pub fn new<M: MeshStorage + ?Sized>(mesh: &M, level: usize) -> Result<Self, MeshIndexError> {
        if level > mesh.max_level() {
            return Err(MeshIndexError::UnknownLevel {
                level,
                max_level: mesh.max_level(),
            });
        }
        let mut set = Self {
            level,
            numbering: DenseNumbering::empty(format!("level {level} index set"), mesh.dimension()),
        };
        set.update(mesh)?;
        Ok(set)
    }

    pub fn level(&self) -> usize {
        self.level
    }

    /// Renumber `0..n` per codimension in discovery order.
    pub fn update<M: MeshStorage + ?Sized>(&mut self, mesh: &M) -> Result<(), MeshIndexError> {
        let level = self.level;
        self.numbering.rebuild(mesh, |codim| mesh.level_entities(level, codim))
    }

    /// `true` if the mesh changed since the last update.
    pub fn is_stale<M: MeshStorage + ?Sized>(&self, mesh: &M) -> bool {
        self.numbering.is_stale(mesh)
    }
}

impl EntityNumbering for LevelIndexSet {
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
    fn level_views_hold_cells_and_their_sub_entities() {
        let mut mesh = structured_quads(2, 2).unwrap();
        let cell = mesh.entities(0).next().unwrap();
        mesh.refine(cell, &mut NoopObserver).unwrap();

        let l0 = LevelIndexSet::new(&mesh, 0).unwrap();
        let l1 = LevelIndexSet::new(&mesh, 1).unwrap();
        let v0 = BoundIndexSet::new(&l0, &mesh);
        let v1 = BoundIndexSet::new(&l1, &mesh);
        assert_eq!((v0.size(0), v0.size(1), v0.size(2)), (4, 12, 9));
        // the 4 parent corners belong to level 1 through the children
        assert_eq!((v1.size(0), v1.size(1), v1.size(2)), (4, 12, 9));
        assert!(v0.contains(cell));
        assert!(!v1.contains(cell));
        assert_eq!(v1.index(cell), Err(MeshIndexError::NotContained(cell)));
        let children = mesh.children(cell).unwrap();
        let idx: Vec<usize> = children.iter().map(|&c| v1.index(c).unwrap()).collect();
        assert_eq!(idx, vec![0, 1, 2, 3]);
        assert_eq!(v1.geometry_types(1), &[GeometryType::Line]);
        assert_eq!(v1.size_of_type(GeometryType::Quadrilateral), 4);
    }

    #[test]
    fn sub_index_reaches_inherited_corners() {
        let mut mesh = structured_quads(1, 1).unwrap();
        let cell = mesh.entities(0).next().unwrap();
        mesh.refine(cell, &mut NoopObserver).unwrap();
        let l1 = LevelIndexSet::new(&mesh, 1).unwrap();
        let view = BoundIndexSet::new(&l1, &mesh);
        let corner = mesh.sub_entity(cell, 0, 2).unwrap();
        assert!(view.contains(corner));
        for child in mesh.children(cell).unwrap() {
            for codim in 1..=2 {
                for local in 0..mesh.sub_entity_count(child, codim).unwrap() {
                    let sub = mesh.sub_entity(child, local, codim).unwrap();
                    assert_eq!(view.sub_index(child, local, codim).unwrap(), view.index(sub).unwrap());
                }
            }
        }
        crate::index_set::validation::validate_sub_indices(&view, &mesh).unwrap();
        crate::index_set::validation::validate_bijectivity(&view, &mesh).unwrap();
    }

    #[test]
    fn unknown_level_is_rejected() {
        let mesh = structured_quads(1, 1).unwrap();
        assert_eq!(
            LevelIndexSet::new(&mesh, 1).unwrap_err(),
            MeshIndexError::UnknownLevel { level: 1, max_level: 0 }
        );
    }

    #[test]
    fn stale_view_answers_from_snapshot() {
        let mut mesh = structured_quads(1, 1).unwrap();
        let mut l0 = LevelIndexSet::new(&mesh, 0).unwrap();
        let cell = mesh.entities(0).next().unwrap();
        mesh.refine(cell, &mut NoopObserver).unwrap();
        assert!(l0.is_stale(&mesh));
        assert_eq!(l0.index_in(&mesh, cell).unwrap(), 0);
        assert_eq!(l0.size(2), 4);
        l0.update(&mesh).unwrap();
        assert!(!l0.is_stale(&mesh));
        assert_eq!(l0.size(2), 4);
    }
}
