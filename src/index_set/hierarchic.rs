//! Persistent per-codimension numbering of every live entity.
//!
//! Indices live in the entity slots supplied by the mesh; one
//! [`IndexManager`] per codimension hands them out and takes them back as
//! the mesh refines and coarsens. An entity keeps its index for its whole
//! lifetime, so indices are never compacted.
//!
//! `size(codim)` is the extent of the index range, the manager watermark.
//! Live indices are distinct and below it; after coarsening out of creation
//! order the range has holes until later refinements reuse them.
//! [`live_count`](HierarchicIndexSet::live_count) is the number of live
//! entities. Both agree whenever no index is waiting for reuse.

use crate::debug_invariants::DebugInvariants;
use crate::index_set::codim_table::CodimTable;
use crate::index_set::manager::IndexManager;
use crate::index_set::{EntityNumbering, IndexSetOptions};
use crate::io::index_dump::{read_index_dump, write_index_dump};
use crate::mesh_error::MeshIndexError;
use crate::topology::entity::{Codim, Entity};
use crate::topology::geometry_type::GeometryType;
use crate::topology::patch::{AdaptationObserver, RefinementPatch};
use crate::topology::storage::{EntitySlots, INVALID_INDEX, MeshStorage};
use hashbrown::HashSet;
use itertools::Itertools;
use std::path::Path;

/// Hierarchic index set: the substrate for level/leaf views and identifiers.
#[derive(Clone, Debug)]
pub struct HierarchicIndexSet {
    dimension: usize,
    options: IndexSetOptions,
    managers: CodimTable<IndexManager>,
    geometry_types: CodimTable<Vec<GeometryType>>,
}

impl HierarchicIndexSet {
    /// Number every live entity of `mesh` in discovery order.
    pub fn build<M: MeshStorage + ?Sized>(
        mesh: &mut M,
        options: IndexSetOptions,
    ) -> Result<Self, MeshIndexError> {
        let dimension = mesh.dimension();
        let mut managers = CodimTable::from_fn(dimension, |c| IndexManager::new(c, options.recycle));
        for (codim, manager) in managers.iter_mut() {
            let entities: Vec<Entity> = mesh.entities(codim).collect();
            for e in entities {
                mesh.set_slot(e, manager.allocate())?;
            }
        }
        let geometry_types = collect_geometry_types(&*mesh);
        let set = Self {
            dimension,
            options,
            managers,
            geometry_types,
        };
        log::debug!(
            "hierarchic index set built: sizes {:?}",
            (0..=dimension).map(|c| set.size(c)).collect::<Vec<_>>()
        );
        set.debug_assert_invariants();
        Ok(set)
    }

    pub fn options(&self) -> &IndexSetOptions {
        &self.options
    }

    /// Number of live entities of `codim` (at most `size(codim)`).
    pub fn live_count(&self, codim: Codim) -> usize {
        self.managers.get(codim).map_or(0, IndexManager::live_count)
    }

    /// Allocator of one codimension.
    pub fn manager(&self, codim: Codim) -> Result<&IndexManager, MeshIndexError> {
        self.managers.get(codim)
    }

    /// Persist the numbering to `<path>.cd<codim>` for every codimension.
    pub fn write<M: MeshStorage + ?Sized>(&self, mesh: &M, path: &Path) -> Result<(), MeshIndexError> {
        for codim in 0..=self.dimension {
            let indices = mesh
                .entities(codim)
                .map(|e| self.index_in(mesh, e))
                .collect::<Result<Vec<_>, _>>()?;
            write_index_dump(path, codim, &indices)?;
        }
        Ok(())
    }

    /// Restore a numbering written by [`write`](Self::write).
    ///
    /// Every codimension is parsed and checked against the live entity
    /// counts of `mesh` before any slot is touched; on error the set and the
    /// mesh are unchanged. Indices must be distinct but may leave holes; each
    /// manager is re-primed to `max + 1` with the holes queued for reuse.
    pub fn read<M: MeshStorage + ?Sized>(&mut self, mesh: &mut M, path: &Path) -> Result<(), MeshIndexError> {
        let mut restored = Vec::with_capacity(self.dimension + 1);
        for codim in 0..=self.dimension {
            let indices = read_index_dump(path, codim)?;
            let live = mesh.entity_count(codim);
            if indices.len() != live {
                return Err(MeshIndexError::StructuralMismatch {
                    codim,
                    expected: live,
                    found: indices.len(),
                });
            }
            check_distinct(codim, &indices)?;
            restored.push(indices);
        }

        for (codim, indices) in restored.into_iter().enumerate() {
            let entities: Vec<Entity> = mesh.entities(codim).collect();
            for (e, &index) in entities.into_iter().zip(&indices) {
                mesh.set_slot(e, index)?;
            }
            self.managers.get_mut(codim)?.restore(&indices)?;
        }
        log::debug!("hierarchic index set restored from {}", path.display());
        Ok(())
    }

    /// Structural check against the mesh: every live entity holds an index,
    /// the indices of a codimension are distinct and below `size`, and the
    /// live entities are exactly what the manager holds.
    pub fn validate_against<M: MeshStorage + ?Sized>(&self, mesh: &M) -> Result<(), MeshIndexError> {
        for codim in 0..=self.dimension {
            let size = self.size(codim);
            let live = self.live_count(codim);
            let mut seen = vec![false; size];
            let mut count = 0;
            for e in mesh.entities(codim) {
                let i = self.index_in(mesh, e)?;
                match seen.get_mut(i) {
                    Some(s) if !*s => *s = true,
                    Some(_) => {
                        return Err(MeshIndexError::NonBijective {
                            codim,
                            reason: format!("index {i} assigned twice"),
                        });
                    }
                    None => {
                        return Err(MeshIndexError::NonBijective {
                            codim,
                            reason: format!("index {i} outside 0..{size}"),
                        });
                    }
                }
                count += 1;
            }
            if count != live {
                return Err(MeshIndexError::NonBijective {
                    codim,
                    reason: format!("{count} live entities, {live} indices held"),
                });
            }
        }
        Ok(())
    }

    /// Undo a partial refinement: give indices back and clear their slots.
    fn release(&mut self, assigned: &[(Entity, usize)], slots: &mut dyn EntitySlots) {
        for &(e, index) in assigned.iter().rev() {
            if let Ok(manager) = self.managers.get_mut(e.codim) {
                let _ = manager.free(index);
            }
            let _ = slots.set_slot(e, INVALID_INDEX);
        }
    }
}

fn collect_geometry_types<M: MeshStorage + ?Sized>(mesh: &M) -> CodimTable<Vec<GeometryType>> {
    CodimTable::from_fn(mesh.dimension(), |codim| {
        mesh.entities(codim)
            .filter_map(|e| mesh.geometry_type(e).ok())
            .sorted_unstable()
            .dedup()
            .collect()
    })
}

fn check_distinct(codim: Codim, indices: &[usize]) -> Result<(), MeshIndexError> {
    let mut seen = HashSet::with_capacity(indices.len());
    for &i in indices {
        if i == INVALID_INDEX {
            return Err(MeshIndexError::CorruptIndexFile {
                codim,
                reason: "unassigned index stored".into(),
            });
        }
        if !seen.insert(i) {
            return Err(MeshIndexError::CorruptIndexFile {
                codim,
                reason: format!("index {i} appears twice"),
            });
        }
    }
    Ok(())
}

impl EntityNumbering for HierarchicIndexSet {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn index_in<M: MeshStorage + ?Sized>(&self, mesh: &M, entity: Entity) -> Result<usize, MeshIndexError> {
        self.managers.get(entity.codim)?;
        let slot = mesh.slot(entity)?;
        if slot == INVALID_INDEX {
            return Err(MeshIndexError::UnassignedSlot(entity));
        }
        Ok(slot)
    }

    fn size(&self, codim: Codim) -> usize {
        self.managers.get(codim).map_or(0, IndexManager::watermark)
    }

    fn size_of_type_in<M: MeshStorage + ?Sized>(&self, mesh: &M, geometry: GeometryType) -> usize {
        if geometry.dimension() > self.dimension {
            return 0;
        }
        let codim = self.dimension - geometry.dimension();
        if self.geometry_types(codim) == [geometry] {
            return self.size(codim);
        }
        mesh.entities(codim)
            .filter(|&e| mesh.geometry_type(e).is_ok_and(|g| g == geometry))
            .count()
    }

    fn contains_in<M: MeshStorage + ?Sized>(&self, mesh: &M, entity: Entity) -> bool {
        entity.codim <= self.dimension && mesh.contains_entity(entity)
    }

    fn geometry_types(&self, codim: Codim) -> &[GeometryType] {
        self.geometry_types.get(codim).map_or(&[], Vec::as_slice)
    }
}

impl AdaptationObserver for HierarchicIndexSet {
    fn on_refine(&mut self, patch: &RefinementPatch, slots: &mut dyn EntitySlots) -> Result<(), MeshIndexError> {
        // every entity must be fresh before anything is allocated
        for e in patch.iter() {
            self.managers.get(e.codim)?;
            if slots.slot(e)? != INVALID_INDEX {
                return Err(MeshIndexError::SlotAlreadyAssigned(e));
            }
        }
        let mut assigned = Vec::with_capacity(patch.len());
        for e in patch.iter() {
            let index = self.managers.get_mut(e.codim)?.allocate();
            assigned.push((e, index));
            if let Err(err) = slots.set_slot(e, index) {
                self.release(&assigned, slots);
                return Err(err);
            }
        }
        Ok(())
    }

    fn on_coarsen(&mut self, patch: &RefinementPatch, slots: &mut dyn EntitySlots) -> Result<(), MeshIndexError> {
        // validate the whole patch first so a failure frees nothing
        let mut freed = Vec::with_capacity(patch.len());
        let mut pending: HashSet<(Codim, usize)> = HashSet::new();
        for e in patch.iter() {
            let index = slots.slot(e)?;
            if index == INVALID_INDEX {
                return Err(MeshIndexError::UnassignedSlot(e));
            }
            self.managers.get(e.codim)?.check_free(index)?;
            if !pending.insert((e.codim, index)) {
                return Err(MeshIndexError::DoubleFree { codim: e.codim, index });
            }
            freed.push((e, index));
        }
        for (e, index) in freed {
            self.managers.get_mut(e.codim)?.free(index)?;
            if self.options.poison_freed_slots {
                slots.set_slot(e, INVALID_INDEX)?;
            }
        }
        Ok(())
    }
}

impl DebugInvariants for HierarchicIndexSet {
    fn debug_assert_invariants(&self) {
        crate::debug_invariants!(self.validate_invariants(), "HierarchicIndexSet");
    }

    fn validate_invariants(&self) -> Result<(), MeshIndexError> {
        for (_, manager) in self.managers.iter() {
            manager.validate_invariants()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::structured::structured_quads;
    use crate::index_set::{BoundIndexSet, IndexSet, RecyclePolicy};
    use crate::topology::HierarchicalMesh;
    use crate::topology::storage::AdaptiveMesh;

    fn poisoning() -> IndexSetOptions {
        IndexSetOptions {
            poison_freed_slots: true,
            ..IndexSetOptions::default()
        }
    }

    #[test]
    fn build_numbers_in_discovery_order() {
        let mut mesh = structured_quads(2, 2).unwrap();
        let set = HierarchicIndexSet::build(&mut mesh, IndexSetOptions::default()).unwrap();
        let view = BoundIndexSet::new(&set, &mesh);
        assert_eq!(view.size(0), 4);
        assert_eq!(view.size(2), 9);
        let cells: Vec<usize> = mesh.entities(0).map(|e| view.index(e).unwrap()).collect();
        assert_eq!(cells, vec![0, 1, 2, 3]);
        let verts: Vec<usize> = mesh.entities(2).map(|e| view.index(e).unwrap()).collect();
        assert_eq!(verts, (0..9).collect::<Vec<_>>());
        assert_eq!(view.geometry_types(0), &[GeometryType::Quadrilateral]);
        assert_eq!(view.size_of_type(GeometryType::Line), 12);
    }

    #[test]
    fn refine_keeps_parent_and_adds_children() {
        let mut mesh = structured_quads(2, 2).unwrap();
        let mut set = HierarchicIndexSet::build(&mut mesh, poisoning()).unwrap();
        let cell = mesh.entities(0).next().unwrap();
        mesh.refine(cell, &mut set).unwrap();
        let view = BoundIndexSet::new(&set, &mesh);
        assert_eq!(view.size(0), 8);
        assert!(view.contains(cell));
        assert_eq!(view.index(cell).unwrap(), 0);
        set.validate_against(&mesh).unwrap();
    }

    #[test]
    fn coarsen_frees_and_poisons() {
        let mut mesh = structured_quads(2, 2).unwrap();
        let mut set = HierarchicIndexSet::build(&mut mesh, poisoning()).unwrap();
        let cells: Vec<_> = mesh.entities(0).collect();
        let patch = mesh.refine(cells[0], &mut set).unwrap();
        let child_indices: Vec<usize> = patch
            .codim(0)
            .iter()
            .map(|&c| set.index_in(&mesh, c).unwrap())
            .collect();
        mesh.coarsen(cells[0], &mut set).unwrap();
        // the extent stays, the freed indices wait for reuse
        assert_eq!(set.size(0), 8);
        assert_eq!(set.live_count(0), 4);
        assert_eq!(set.size(2), 14);
        assert_eq!(set.live_count(2), 9);
        set.validate_against(&mesh).unwrap();

        // LIFO: the next four cell allocations hand the freed values back reversed
        let patch = mesh.refine(cells[3], &mut set).unwrap();
        let reused: Vec<usize> = patch
            .codim(0)
            .iter()
            .map(|&c| set.index_in(&mesh, c).unwrap())
            .collect();
        let mut expected = child_indices.clone();
        expected.reverse();
        assert_eq!(reused, expected);
    }

    #[test]
    fn fifo_policy_reuses_in_free_order() {
        let mut mesh = structured_quads(2, 2).unwrap();
        let options = IndexSetOptions {
            recycle: RecyclePolicy::Fifo,
            ..poisoning()
        };
        let mut set = HierarchicIndexSet::build(&mut mesh, options).unwrap();
        let cells: Vec<_> = mesh.entities(0).collect();
        let patch = mesh.refine(cells[0], &mut set).unwrap();
        let first: Vec<usize> = patch.codim(0).iter().map(|&c| set.index_in(&mesh, c).unwrap()).collect();
        mesh.coarsen(cells[0], &mut set).unwrap();
        let patch = mesh.refine(cells[1], &mut set).unwrap();
        let second: Vec<usize> = patch.codim(0).iter().map(|&c| set.index_in(&mesh, c).unwrap()).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn coarsen_failure_frees_nothing() {
        let mut mesh = structured_quads(1, 1).unwrap();
        let mut set = HierarchicIndexSet::build(&mut mesh, poisoning()).unwrap();
        let cell = mesh.entities(0).next().unwrap();
        let patch = mesh.refine(cell, &mut set).unwrap();
        // corrupt one child slot so it aliases a live index
        let child = patch.codim(0)[1];
        let alias = set.index_in(&mesh, patch.codim(0)[0]).unwrap();
        mesh.set_slot(child, alias).unwrap();
        let before = set.size(0);
        assert!(mesh.coarsen(cell, &mut set).is_err());
        assert_eq!(set.size(0), before);
        assert_eq!(mesh.children(cell).unwrap().len(), 4);
    }

    #[test]
    fn refine_failure_allocates_nothing() {
        let mut quads = structured_quads(1, 1).unwrap();
        let mut set = HierarchicIndexSet::build(&mut quads, poisoning()).unwrap();
        // a planar set has no allocator for the vertices of a hexahedral patch
        let mut hexes = crate::grid::structured::structured_hexes(1, 1, 1).unwrap();
        let cell = hexes.entities(0).next().unwrap();
        let counts = |m: &HierarchicalMesh| (0..=3).map(|c| m.entity_count(c)).collect::<Vec<_>>();
        let before = counts(&hexes);

        assert!(matches!(
            hexes.refine(cell, &mut set),
            Err(MeshIndexError::InvalidCodim { codim: 3, .. })
        ));
        assert_eq!(counts(&hexes), before);
        assert!(hexes.children(cell).unwrap().is_empty());
        assert_eq!((set.size(0), set.size(1), set.size(2)), (1, 4, 4));
        set.validate_against(&quads).unwrap();
    }

    #[test]
    fn out_of_order_coarsening_leaves_holes() {
        let mut mesh = structured_quads(2, 2).unwrap();
        let mut set = HierarchicIndexSet::build(&mut mesh, poisoning()).unwrap();
        let cells: Vec<_> = mesh.entities(0).collect();
        mesh.refine(cells[0], &mut set).unwrap();
        mesh.refine(cells[3], &mut set).unwrap();
        mesh.coarsen(cells[0], &mut set).unwrap();

        let mut held: Vec<usize> = mesh.entities(0).map(|e| set.index_in(&mesh, e).unwrap()).collect();
        held.sort_unstable();
        assert_eq!(held, vec![0, 1, 2, 3, 8, 9, 10, 11]);
        assert_eq!(set.size(0), 12);
        assert_eq!(set.live_count(0), 8);
        set.validate_against(&mesh).unwrap();

        // the holes are filled before the range grows
        mesh.refine(cells[1], &mut set).unwrap();
        assert_eq!(set.size(0), 12);
        assert_eq!(set.live_count(0), 12);
        set.validate_against(&mesh).unwrap();
    }

    #[test]
    fn refine_rejects_indexed_entities_before_allocating() {
        let mut mesh = structured_quads(1, 1).unwrap();
        let mut set = HierarchicIndexSet::build(&mut mesh, poisoning()).unwrap();
        let cell = mesh.entities(0).next().unwrap();
        let vertex = mesh.entities(2).next().unwrap();
        let edge = mesh.entities(1).next().unwrap();
        let mut patch = RefinementPatch::new(cell, 2);
        patch.push(edge);
        patch.push(vertex);
        let edge_index = set.index_in(&mesh, edge).unwrap();

        assert_eq!(
            set.on_refine(&patch, &mut mesh),
            Err(MeshIndexError::SlotAlreadyAssigned(edge))
        );
        assert_eq!(set.size(1), 4);
        assert_eq!(set.size(2), 4);
        assert_eq!(set.index_in(&mesh, edge).unwrap(), edge_index);
        set.validate_against(&mesh).unwrap();
    }

    #[test]
    fn destroyed_entities_are_not_indexable() {
        let mut mesh = structured_quads(1, 1).unwrap();
        let mut set = HierarchicIndexSet::build(&mut mesh, poisoning()).unwrap();
        let cell = mesh.entities(0).next().unwrap();
        let patch = mesh.refine(cell, &mut set).unwrap();
        mesh.coarsen(cell, &mut set).unwrap();
        let child = patch.codim(0)[0];
        assert_eq!(
            set.index_in(&mesh, child),
            Err(MeshIndexError::InvalidEntity(child))
        );
    }
}
