//! Identifiers derived from the hierarchic numbering.
//!
//! `id = (codim << shift) | hierarchic_index`. Identifiers stay valid while
//! level and leaf views renumber, and are unique across all codimensions as
//! long as every codimension holds fewer than `1 << shift` live entities.

use crate::index_set::hierarchic::HierarchicIndexSet;
use crate::index_set::{BoundIndexSet, HierarchicIndexView, IndexSet};
use crate::mesh_error::MeshIndexError;
use crate::topology::entity::{Codim, Entity};
use crate::topology::storage::MeshStorage;

/// Identifier type: codimension in the high bits, hierarchic index below.
pub type IdType = u32;

/// Stateless identifier view over a hierarchic index set.
#[derive(Debug)]
pub struct IdSet<'a, M: ?Sized> {
    hierarchic: HierarchicIndexView<'a, M>,
    shift: u32,
}

impl<M: ?Sized> Clone for IdSet<'_, M> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<M: ?Sized> Copy for IdSet<'_, M> {}

/// Identifiers unique on this process.
pub type LocalIdSet<'a, M> = IdSet<'a, M>;
/// Identifiers shared between processes; identical to [`LocalIdSet`] for a
/// single-process mesh.
pub type GlobalIdSet<'a, M> = IdSet<'a, M>;

/// Reject shifts that cannot hold codimensions `0..=dimension` above the
/// index bits of an [`IdType`].
pub fn check_codim_shift(shift: u32, dimension: usize) -> Result<(), MeshIndexError> {
    let fits = shift < IdType::BITS
        && u64::try_from(dimension).is_ok_and(|d| d << shift <= u64::from(IdType::MAX));
    if fits {
        Ok(())
    } else {
        Err(MeshIndexError::InvalidCodimShift { shift, dimension })
    }
}

impl<'a, M: MeshStorage + ?Sized> IdSet<'a, M> {
    /// Identifier view using the shift configured on `hierarchic`.
    pub fn new(hierarchic: &'a HierarchicIndexSet, mesh: &'a M) -> Result<Self, MeshIndexError> {
        Self::with_shift(hierarchic, mesh, hierarchic.options().codim_shift)
    }

    /// Identifier view with an explicit codimension shift.
    pub fn with_shift(
        hierarchic: &'a HierarchicIndexSet,
        mesh: &'a M,
        shift: u32,
    ) -> Result<Self, MeshIndexError> {
        check_codim_shift(shift, mesh.dimension())?;
        Ok(Self::from_checked(hierarchic, mesh, shift))
    }

    /// Build from a shift already accepted by [`check_codim_shift`].
    pub(crate) fn from_checked(hierarchic: &'a HierarchicIndexSet, mesh: &'a M, shift: u32) -> Self {
        Self {
            hierarchic: BoundIndexSet::new(hierarchic, mesh),
            shift,
        }
    }

    pub fn shift(&self) -> u32 {
        self.shift
    }

    /// Largest live count a codimension may reach (exclusive).
    pub fn max_codim_size(&self) -> usize {
        1usize << self.shift
    }

    fn encode(&self, codim: Codim, index: usize) -> Result<IdType, MeshIndexError> {
        let max = self.max_codim_size();
        let size = self.hierarchic.size(codim);
        if size >= max || index >= max {
            return Err(MeshIndexError::IdSpaceOverflow {
                codim,
                size: size.max(index + 1),
                max,
            });
        }
        // both parts fit: checked above and at construction
        Ok(((codim as IdType) << self.shift) | index as IdType)
    }

    /// Identifier of `entity`.
    pub fn id(&self, entity: Entity) -> Result<IdType, MeshIndexError> {
        let index = self.hierarchic.index(entity)?;
        self.encode(entity.codim, index)
    }

    /// Identifier of sub-entity `local` of codimension `codim` of `cell`.
    pub fn sub_id(&self, cell: Entity, local: usize, codim: Codim) -> Result<IdType, MeshIndexError> {
        let index = self.hierarchic.sub_index(cell, local, codim)?;
        self.encode(codim, index)
    }

    /// Split an identifier back into `(codim, hierarchic index)`.
    pub fn decode(&self, id: IdType) -> (Codim, usize) {
        let mask = (1u64 << self.shift) - 1;
        let id = u64::from(id);
        ((id >> self.shift) as Codim, (id & mask) as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::structured::structured_quads;
    use crate::index_set::IndexSetOptions;
    use hashbrown::HashSet;

    #[test]
    fn same_index_different_codim_differs() {
        let mut mesh = structured_quads(3, 3).unwrap();
        let set = HierarchicIndexSet::build(&mut mesh, IndexSetOptions::default()).unwrap();
        let ids = IdSet::new(&set, &mesh).unwrap();
        let cell = mesh.entities(0).nth(5).unwrap();
        let vertex = mesh.entities(2).nth(5).unwrap();
        let a = ids.id(cell).unwrap();
        let b = ids.id(vertex).unwrap();
        assert_ne!(a, b);
        assert_eq!(ids.decode(a), (0, 5));
        assert_eq!(ids.decode(b), (2, 5));
    }

    #[test]
    fn ids_unique_across_codims() {
        let mut mesh = structured_quads(3, 2).unwrap();
        let set = HierarchicIndexSet::build(&mut mesh, IndexSetOptions::default()).unwrap();
        let ids = IdSet::new(&set, &mesh).unwrap();
        let mut seen = HashSet::new();
        for codim in 0..=2 {
            for e in mesh.entities(codim) {
                assert!(seen.insert(ids.id(e).unwrap()));
            }
        }
    }

    #[test]
    fn sub_id_matches_id() {
        let mut mesh = structured_quads(2, 1).unwrap();
        let set = HierarchicIndexSet::build(&mut mesh, IndexSetOptions::default()).unwrap();
        let ids = IdSet::new(&set, &mesh).unwrap();
        let cell = mesh.entities(0).nth(1).unwrap();
        for local in 0..4 {
            let edge = mesh.sub_entity(cell, local, 1).unwrap();
            assert_eq!(ids.sub_id(cell, local, 1).unwrap(), ids.id(edge).unwrap());
        }
    }

    #[test]
    fn small_shift_overflows() {
        // 9 vertices do not fit below 1 << 3
        let mut mesh = structured_quads(2, 2).unwrap();
        let set = HierarchicIndexSet::build(&mut mesh, IndexSetOptions::default()).unwrap();
        let ids = IdSet::with_shift(&set, &mesh, 3).unwrap();
        let cell = mesh.entities(0).next().unwrap();
        assert!(ids.id(cell).is_ok());
        let vertex = mesh.entities(2).next().unwrap();
        let err = ids.id(vertex).unwrap_err();
        assert_eq!(
            err,
            MeshIndexError::IdSpaceOverflow {
                codim: 2,
                size: 9,
                max: 8
            }
        );
        assert!(err.is_invariant_violation());
    }

    #[test]
    fn shift_must_leave_room_for_codim() {
        let mut mesh = structured_quads(1, 1).unwrap();
        let set = HierarchicIndexSet::build(&mut mesh, IndexSetOptions::default()).unwrap();
        assert_eq!(
            IdSet::with_shift(&set, &mesh, 31).unwrap_err(),
            MeshIndexError::InvalidCodimShift {
                shift: 31,
                dimension: 2
            }
        );
        assert!(IdSet::with_shift(&set, &mesh, 30).is_ok());
    }
}
