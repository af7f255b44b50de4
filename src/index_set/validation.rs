//! Consistency checks for numberings, identifiers and the refinement tree.

use crate::index_set::IndexSet;
use crate::index_set::id_set::{IdSet, IdType};
use crate::mesh_error::MeshIndexError;
use crate::topology::entity::Entity;
use crate::topology::storage::MeshStorage;
use hashbrown::HashMap;

/// Optional validation toggles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationOptions {
    /// Each codimension maps onto `0..size` without duplicates.
    pub check_bijectivity: bool,
    /// `sub_index(p, i, c) == index(sub_entity(p, i, c))`.
    pub check_sub_indices: bool,
    /// Distinct live entities carry distinct identifiers.
    pub check_ids: bool,
    /// Fathers and children reference each other consistently.
    pub check_hierarchy: bool,
}

impl ValidationOptions {
    /// Enable all validation checks.
    pub fn all() -> Self {
        Self {
            check_bijectivity: true,
            check_sub_indices: true,
            check_ids: true,
            check_hierarchy: true,
        }
    }
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self::all()
    }
}

/// Check that `set` is a bijection from its contained entities onto
/// `0..size(codim)` for every codimension.
pub fn validate_bijectivity<S, M>(set: &S, mesh: &M) -> Result<(), MeshIndexError>
where
    S: IndexSet,
    M: MeshStorage + ?Sized,
{
    for codim in 0..=set.dimension() {
        let size = set.size(codim);
        let mut owner: Vec<Option<Entity>> = vec![None; size];
        let mut count = 0;
        for e in mesh.entities(codim).filter(|&e| set.contains(e)) {
            let i = set.index(e)?;
            let slot = owner.get_mut(i).ok_or_else(|| MeshIndexError::NonBijective {
                codim,
                reason: format!("{e} has index {i} outside 0..{size}"),
            })?;
            if let Some(prev) = slot {
                return Err(MeshIndexError::NonBijective {
                    codim,
                    reason: format!("{prev} and {e} share index {i}"),
                });
            }
            *slot = Some(e);
            count += 1;
        }
        if count != size {
            return Err(MeshIndexError::NonBijective {
                codim,
                reason: format!("{count} contained entities for size {size}"),
            });
        }
    }
    Ok(())
}

/// Check sub-index equivalence for every contained cell.
///
/// Backends without sub-entity numbering pass trivially.
pub fn validate_sub_indices<S, M>(set: &S, mesh: &M) -> Result<(), MeshIndexError>
where
    S: IndexSet,
    M: MeshStorage + ?Sized,
{
    for cell in mesh.entities(0).filter(|&c| set.contains(c)) {
        for codim in 0..=set.dimension() {
            for local in 0..mesh.sub_entity_count(cell, codim)? {
                let sub = match mesh.sub_entity(cell, local, codim) {
                    Ok(sub) => sub,
                    Err(e) if e.is_unsupported() => {
                        log::debug!("sub-index check skipped: {e}");
                        return Ok(());
                    }
                    Err(e) => return Err(e),
                };
                let sub_index = set.sub_index(cell, local, codim)?;
                let index = set.index(sub)?;
                if sub_index != index {
                    return Err(MeshIndexError::SubIndexMismatch {
                        parent: cell,
                        local,
                        codim,
                        sub_index,
                        index,
                    });
                }
            }
        }
    }
    Ok(())
}

/// Check that no two live entities share an identifier.
pub fn validate_ids<M>(ids: &IdSet<'_, M>, mesh: &M) -> Result<(), MeshIndexError>
where
    M: MeshStorage + ?Sized,
{
    let mut seen: HashMap<IdType, Entity> = HashMap::new();
    for codim in 0..=mesh.dimension() {
        for e in mesh.entities(codim) {
            let id = ids.id(e)?;
            if let Some(&first) = seen.get(&id) {
                return Err(MeshIndexError::DuplicateId {
                    first,
                    second: e,
                    id,
                });
            }
            seen.insert(id, e);
        }
    }
    Ok(())
}

/// Check the refinement tree: level-zero cells have no father, every child
/// is found among its father's children, and father and child identifiers
/// differ.
pub fn validate_hierarchy<M>(ids: &IdSet<'_, M>, mesh: &M) -> Result<(), MeshIndexError>
where
    M: MeshStorage + ?Sized,
{
    for cell in mesh.entities(0) {
        let father = mesh.father(cell)?;
        let level = mesh.level(cell)?;
        match father {
            Some(_) if level == 0 => return Err(MeshIndexError::LevelZeroHasFather(cell)),
            None if level > 0 => {
                log::warn!("cell {cell} on level {level} has no father");
            }
            Some(father) => {
                if !mesh.children(father)?.contains(&cell) {
                    return Err(MeshIndexError::ChildNotInFather { child: cell, father });
                }
                let id = ids.id(cell)?;
                if id == ids.id(father)? {
                    return Err(MeshIndexError::DuplicateId {
                        first: father,
                        second: cell,
                        id,
                    });
                }
            }
            None => {}
        }
    }
    Ok(())
}
